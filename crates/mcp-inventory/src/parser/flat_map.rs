use super::{FieldAliases, JsonMap, ParseContext, ShapeMatcher, ShapeOutcome, translate_entry};

/// Top-level `name -> {command, ...}` objects, as older Cursor settings store them.
///
/// Keys whose value is not an object with a `command` are unrelated settings.
#[derive(Debug, Clone, Copy)]
pub struct FlatMap;

impl ShapeMatcher for FlatMap {
    fn shape(&self) -> &'static str {
        "flat"
    }

    fn try_parse(&self, doc: &JsonMap, _ctx: &ParseContext<'_>) -> ShapeOutcome {
        let mut entries = doc
            .iter()
            .filter(|(_, value)| value.get("command").is_some())
            .peekable();
        if entries.peek().is_none() {
            return ShapeOutcome::NotApplicable;
        }
        ShapeOutcome::collect(
            entries.map(|(name, value)| translate_entry(name, value, &FieldAliases::STRICT)),
        )
    }
}
