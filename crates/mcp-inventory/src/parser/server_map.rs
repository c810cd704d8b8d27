//! `mcpServers` maps and the nested `mcp.servers` variant.

use super::{
    FieldAliases, JsonMap, NameRule, ParseContext, ShapeMatcher, ShapeOutcome,
    translate_server_map,
};

pub const SERVER_MAP_KEY: &str = "mcpServers";

/// Top-level `mcpServers: { name: {command|url, args, env} }`.
#[derive(Debug, Clone, Copy)]
pub struct ServerMap {
    pub rule: NameRule,
    pub aliases: &'static FieldAliases,
}

impl ShapeMatcher for ServerMap {
    fn shape(&self) -> &'static str {
        "mcpServers"
    }

    fn try_parse(&self, doc: &JsonMap, ctx: &ParseContext<'_>) -> ShapeOutcome {
        match doc.get(SERVER_MAP_KEY) {
            None => ShapeOutcome::NotApplicable,
            Some(value) => match value.as_object() {
                Some(servers) => translate_server_map(servers, ctx, self.rule, self.aliases),
                None => ShapeOutcome::Malformed(format!("{SERVER_MAP_KEY} is not an object")),
            },
        }
    }
}

/// `mcp: { servers: {...} }`.
#[derive(Debug, Clone, Copy)]
pub struct NestedServers {
    pub rule: NameRule,
    pub aliases: &'static FieldAliases,
}

impl ShapeMatcher for NestedServers {
    fn shape(&self) -> &'static str {
        "mcp.servers"
    }

    fn try_parse(&self, doc: &JsonMap, ctx: &ParseContext<'_>) -> ShapeOutcome {
        let Some(container) = doc.get("mcp").and_then(|v| v.as_object()) else {
            return ShapeOutcome::NotApplicable;
        };
        match container.get("servers") {
            None => ShapeOutcome::NotApplicable,
            Some(value) => match value.as_object() {
                Some(servers) => translate_server_map(servers, ctx, self.rule, self.aliases),
                None => ShapeOutcome::Malformed("mcp.servers is not an object".to_string()),
            },
        }
    }
}
