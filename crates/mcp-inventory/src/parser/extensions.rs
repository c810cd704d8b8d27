use crate::error::EntryError;

use super::server_map::SERVER_MAP_KEY;
use super::{
    FieldAliases, JsonMap, NameRule, ParseContext, ShapeMatcher, ShapeOutcome,
    translate_server_map,
};

/// `extensions: { key: { mcpServers: {...} } }`.
///
/// A sub-configuration is descended into when its key mentions `mcp` or it holds
/// `mcpServers`. An mcp-named key may also carry its map under `servers`.
#[derive(Debug, Clone, Copy)]
pub struct ExtensionsMap {
    pub rule: NameRule,
    pub aliases: &'static FieldAliases,
}

impl ShapeMatcher for ExtensionsMap {
    fn shape(&self) -> &'static str {
        "extensions"
    }

    fn try_parse(&self, doc: &JsonMap, ctx: &ParseContext<'_>) -> ShapeOutcome {
        let Some(extensions) = doc.get("extensions").and_then(|v| v.as_object()) else {
            return ShapeOutcome::NotApplicable;
        };
        let mut specs = Vec::new();
        let mut skipped = Vec::new();
        for (key, value) in extensions {
            let key_signals = key.to_lowercase().contains("mcp");
            let Some(sub) = value.as_object() else {
                continue;
            };
            let (field, servers) = match sub.get(SERVER_MAP_KEY) {
                Some(servers) => (SERVER_MAP_KEY, servers),
                None if key_signals => match sub.get("servers") {
                    Some(servers) => ("servers", servers),
                    None => continue,
                },
                None => continue,
            };
            let Some(servers) = servers.as_object() else {
                skipped.push(EntryError::invalid(key, field, "an object"));
                continue;
            };
            if let ShapeOutcome::Matched {
                specs: found,
                skipped: failed,
            } = translate_server_map(servers, ctx, self.rule, self.aliases)
            {
                specs.extend(found);
                skipped.extend(failed);
            }
        }
        ShapeOutcome::Matched { specs, skipped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matcher() -> ExtensionsMap {
        ExtensionsMap {
            rule: NameRule::ScopedUnlessQualified,
            aliases: &FieldAliases::FLEXIBLE,
        }
    }

    #[test]
    fn descends_only_into_relevant_sub_configs() {
        let d = json!({"extensions": {
            "linter": {"servers": {"ignored": {"command": "x"}}},
            "my-mcp-bridge": {"servers": {"bridge": {"command": "bridge"}}},
            "tools": {"mcpServers": {"search": {"command": "search"}}},
            "theme": "dark"
        }});
        let ctx = ParseContext { scope: "Cody" };
        match matcher().try_parse(d.as_object().unwrap(), &ctx) {
            ShapeOutcome::Matched { specs, skipped } => {
                assert!(skipped.is_empty());
                let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
                assert_eq!(names, ["Cody/bridge", "Cody/search"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_object_server_map_is_skipped() {
        let d = json!({"extensions": {"mcp": {"mcpServers": 3}}});
        let ctx = ParseContext { scope: "Cody" };
        match matcher().try_parse(d.as_object().unwrap(), &ctx) {
            ShapeOutcome::Matched { specs, skipped } => {
                assert!(specs.is_empty());
                assert_eq!(skipped, vec![EntryError::invalid("mcp", "mcpServers", "an object")]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
