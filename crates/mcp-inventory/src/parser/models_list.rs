use serde_json::Value;

use super::{
    FieldAliases, JsonMap, NameRule, ParseContext, ShapeMatcher, ShapeOutcome, translate_entry,
};

/// `models: [...]` entries that declare tool-server usage.
///
/// An entry qualifies when it is an object with a `provider` and either
/// `useMcp: true` or any mention of `mcp` in its serialized form.
#[derive(Debug, Clone, Copy)]
pub struct ModelsList;

impl ModelsList {
    fn qualifies(model: &Value) -> bool {
        let Some(entry) = model.as_object() else {
            return false;
        };
        if !entry.contains_key("provider") {
            return false;
        }
        entry.get("useMcp").and_then(Value::as_bool) == Some(true)
            || model.to_string().to_lowercase().contains("mcp")
    }

    fn display_name(model: &Value) -> &str {
        model
            .get("title")
            .and_then(Value::as_str)
            .or_else(|| model.get("provider").and_then(Value::as_str))
            .unwrap_or("unknown")
    }
}

impl ShapeMatcher for ModelsList {
    fn shape(&self) -> &'static str {
        "models"
    }

    fn try_parse(&self, doc: &JsonMap, ctx: &ParseContext<'_>) -> ShapeOutcome {
        let Some(models) = doc.get("models").and_then(|v| v.as_array()) else {
            return ShapeOutcome::NotApplicable;
        };
        ShapeOutcome::collect(models.iter().filter(|m| Self::qualifies(m)).map(|model| {
            let name = NameRule::Scoped.apply(ctx.scope, Self::display_name(model));
            translate_entry(&name, model, &FieldAliases::MODEL)
        }))
    }
}
