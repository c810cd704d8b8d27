use serde_json::Value;

use super::{
    FieldAliases, JsonMap, NameRule, ParseContext, ShapeMatcher, ShapeOutcome, translate_entry,
};

/// `tools: [ {type: "mcp", name, ...}, ... ]`. Entries of other types are ignored.
#[derive(Debug, Clone, Copy)]
pub struct ToolsArray {
    pub rule: NameRule,
    pub aliases: &'static FieldAliases,
}

impl ShapeMatcher for ToolsArray {
    fn shape(&self) -> &'static str {
        "tools"
    }

    fn try_parse(&self, doc: &JsonMap, ctx: &ParseContext<'_>) -> ShapeOutcome {
        let Some(tools) = doc.get("tools").and_then(|v| v.as_array()) else {
            return ShapeOutcome::NotApplicable;
        };
        ShapeOutcome::collect(
            tools
                .iter()
                .filter(|tool| tool.get("type").and_then(Value::as_str) == Some("mcp"))
                .map(|tool| {
                    let name = tool.get("name").and_then(Value::as_str).unwrap_or("unknown");
                    translate_entry(&self.rule.apply(ctx.scope, name), tool, self.aliases)
                }),
        )
    }
}
