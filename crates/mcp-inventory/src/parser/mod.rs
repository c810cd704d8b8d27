//! Shape matchers for loosely structured MCP configuration documents.
//!
//! Each matcher recognizes one document shape and translates the entries it finds
//! into [`ServerSpec`] values. A dispatcher tries an ordered list of matchers and
//! stops at the first that applies, whether or not its entries translated cleanly.

use serde_json::Value;

use crate::error::EntryError;
use crate::model::ServerSpec;

pub mod entry;
pub mod extensions;
pub mod flat_map;
pub mod models_list;
pub mod server_map;
pub mod tools_array;

pub use entry::{FieldAliases, UrlField, translate_entry};
pub use extensions::ExtensionsMap;
pub use flat_map::FlatMap;
pub use models_list::ModelsList;
pub use server_map::{NestedServers, ServerMap};
pub use tools_array::ToolsArray;

pub type JsonMap = serde_json::Map<String, Value>;

/// How an entry key becomes a record name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRule {
    Verbatim,
    /// Always `scope/name`.
    Scoped,
    /// `scope/name` unless the name already contains `/`.
    ScopedUnlessQualified,
}

impl NameRule {
    pub fn apply(self, scope: &str, name: &str) -> String {
        match self {
            Self::Verbatim => name.to_string(),
            Self::ScopedUnlessQualified if name.contains('/') => name.to_string(),
            Self::Scoped | Self::ScopedUnlessQualified => format!("{scope}/{name}"),
        }
    }
}

/// Per-file inputs a matcher may use for naming.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    /// Vendor label, or the extension directory name.
    pub scope: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeOutcome {
    /// The document does not carry this shape; try the next matcher.
    NotApplicable,
    /// The shape is present. Entries that failed translation are reported in `skipped`.
    Matched {
        specs: Vec<ServerSpec>,
        skipped: Vec<EntryError>,
    },
    /// The shape's key is present but its value is unusable; stop.
    Malformed(String),
}

impl ShapeOutcome {
    fn collect(results: impl IntoIterator<Item = Result<ServerSpec, EntryError>>) -> Self {
        let mut specs = Vec::new();
        let mut skipped = Vec::new();
        for result in results {
            match result {
                Ok(spec) => specs.push(spec),
                Err(err) => skipped.push(err),
            }
        }
        Self::Matched { specs, skipped }
    }
}

pub trait ShapeMatcher: Send + Sync {
    /// Short label used in logs.
    fn shape(&self) -> &'static str;
    fn try_parse(&self, doc: &JsonMap, ctx: &ParseContext<'_>) -> ShapeOutcome;
}

/// Result of running a matcher list over one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Unrecognized,
    Parsed {
        shape: &'static str,
        specs: Vec<ServerSpec>,
        skipped: Vec<EntryError>,
    },
    Malformed {
        shape: &'static str,
        detail: String,
    },
}

/// Try `matchers` in order; the first one that applies decides the outcome.
pub fn first_match(
    matchers: &[&dyn ShapeMatcher],
    doc: &JsonMap,
    ctx: &ParseContext<'_>,
) -> Dispatch {
    for matcher in matchers {
        match matcher.try_parse(doc, ctx) {
            ShapeOutcome::NotApplicable => continue,
            ShapeOutcome::Matched { specs, skipped } => {
                return Dispatch::Parsed {
                    shape: matcher.shape(),
                    specs,
                    skipped,
                };
            }
            ShapeOutcome::Malformed(detail) => {
                return Dispatch::Malformed {
                    shape: matcher.shape(),
                    detail,
                };
            }
        }
    }
    Dispatch::Unrecognized
}

/// Translate every `name -> entry` pair of a server map.
pub(crate) fn translate_server_map(
    servers: &JsonMap,
    ctx: &ParseContext<'_>,
    rule: NameRule,
    aliases: &FieldAliases,
) -> ShapeOutcome {
    // `Map` iterates keys in sorted order.
    ShapeOutcome::collect(
        servers
            .iter()
            .map(|(name, value)| translate_entry(&rule.apply(ctx.scope, name), value, aliases)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> JsonMap {
        match v {
            Value::Object(m) => m,
            _ => panic!("fixture must be an object"),
        }
    }

    const CTX: ParseContext<'static> = ParseContext { scope: "Gemini" };

    #[test]
    fn name_rules() {
        assert_eq!(NameRule::Verbatim.apply("s", "a"), "a");
        assert_eq!(NameRule::Scoped.apply("s", "a/b"), "s/a/b");
        assert_eq!(NameRule::ScopedUnlessQualified.apply("s", "a"), "s/a");
        assert_eq!(NameRule::ScopedUnlessQualified.apply("s", "a/b"), "a/b");
    }

    #[test]
    fn first_applicable_matcher_wins() {
        let nested = NestedServers {
            rule: NameRule::Verbatim,
            aliases: &FieldAliases::FLEXIBLE,
        };
        let tools = ToolsArray {
            rule: NameRule::ScopedUnlessQualified,
            aliases: &FieldAliases::FLEXIBLE,
        };
        let matchers: [&dyn ShapeMatcher; 2] = [&nested, &tools];
        let d = doc(json!({
            "mcp": {"servers": {"a": {"command": "x"}}},
            "tools": [{"type": "mcp", "name": "b", "command": "y"}]
        }));
        match first_match(&matchers, &d, &CTX) {
            Dispatch::Parsed { shape, specs, .. } => {
                assert_eq!(shape, nested.shape());
                assert_eq!(specs.len(), 1);
                assert_eq!(specs[0].name, "a");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_typed_container_falls_through() {
        let nested = NestedServers {
            rule: NameRule::Verbatim,
            aliases: &FieldAliases::FLEXIBLE,
        };
        let tools = ToolsArray {
            rule: NameRule::ScopedUnlessQualified,
            aliases: &FieldAliases::FLEXIBLE,
        };
        let matchers: [&dyn ShapeMatcher; 2] = [&nested, &tools];
        let d = doc(json!({
            "mcp": "enabled",
            "tools": [{"type": "mcp", "name": "b", "command": "y"}]
        }));
        match first_match(&matchers, &d, &CTX) {
            Dispatch::Parsed { specs, .. } => assert_eq!(specs[0].name, "Gemini/b"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn entry_failures_do_not_fall_through() {
        let map = ServerMap {
            rule: NameRule::Verbatim,
            aliases: &FieldAliases::STRICT,
        };
        let tools = ToolsArray {
            rule: NameRule::ScopedUnlessQualified,
            aliases: &FieldAliases::FLEXIBLE,
        };
        let matchers: [&dyn ShapeMatcher; 2] = [&map, &tools];
        let d = doc(json!({
            "mcpServers": {"bad": 7},
            "tools": [{"type": "mcp", "name": "b", "command": "y"}]
        }));
        match first_match(&matchers, &d, &CTX) {
            Dispatch::Parsed { specs, skipped, .. } => {
                assert!(specs.is_empty());
                assert_eq!(
                    skipped,
                    vec![EntryError::NotAnObject {
                        name: "bad".to_string()
                    }]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn nothing_applicable_is_unrecognized() {
        let map = ServerMap {
            rule: NameRule::Verbatim,
            aliases: &FieldAliases::STRICT,
        };
        let matchers: [&dyn ShapeMatcher; 1] = [&map];
        let d = doc(json!({"editor.fontSize": 12}));
        assert_eq!(first_match(&matchers, &d, &CTX), Dispatch::Unrecognized);
    }
}
