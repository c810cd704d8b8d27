//! Translation of a single server entry into a [`ServerSpec`].

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::EntryError;
use crate::model::ServerSpec;

/// Where an entry's endpoint lives and how it relates to the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlField {
    /// Presence of the key switches the entry to the URL branch; command, args and env are ignored.
    Exclusive(&'static str),
    /// Captured next to the command when present.
    Alongside(&'static str),
}

/// Accepted key names per field, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAliases {
    pub command: &'static [&'static str],
    pub args: &'static [&'static str],
    pub env: &'static [&'static str],
    pub url: UrlField,
}

impl FieldAliases {
    /// `command` / `args` / `env` only.
    pub const STRICT: Self = Self {
        command: &["command"],
        args: &["args"],
        env: &["env"],
        url: UrlField::Exclusive("url"),
    };

    /// Also accepts `cmd`, `arguments` and `environment`.
    pub const FLEXIBLE: Self = Self {
        command: &["command", "cmd"],
        args: &["args", "arguments"],
        env: &["env", "environment"],
        url: UrlField::Exclusive("url"),
    };

    /// Model entries carry their endpoint in `apiBase`, possibly next to a command.
    pub const MODEL: Self = Self {
        url: UrlField::Alongside("apiBase"),
        ..Self::FLEXIBLE
    };
}

/// Translate one entry. `name` is the final record name; it is also used in errors.
pub fn translate_entry(
    name: &str,
    value: &Value,
    aliases: &FieldAliases,
) -> Result<ServerSpec, EntryError> {
    let Some(entry) = value.as_object() else {
        return Err(EntryError::NotAnObject {
            name: name.to_string(),
        });
    };
    let lookup = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| entry.get(*k).filter(|v| !v.is_null()))
    };

    match aliases.url {
        UrlField::Exclusive(key) => {
            if let Some(url) = entry.get(key).filter(|v| !v.is_null()) {
                let url = url
                    .as_str()
                    .ok_or_else(|| EntryError::invalid(name, "url", "a string"))?;
                return Ok(ServerSpec::remote(name, url));
            }
        }
        UrlField::Alongside(_) => {}
    }

    let command = match lookup(aliases.command) {
        Some(v) => v
            .as_str()
            .ok_or_else(|| EntryError::invalid(name, "command", "a string"))?
            .to_string(),
        None => String::new(),
    };
    let args = match lookup(aliases.args) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                scalar_text(item)
                    .ok_or_else(|| EntryError::invalid(name, "args", "an array of scalars"))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(EntryError::invalid(name, "args", "an array")),
        None => Vec::new(),
    };
    let env_vars = match lookup(aliases.env) {
        Some(Value::Object(vars)) => vars
            .iter()
            .map(|(k, v)| {
                scalar_text(v)
                    .map(|text| (k.clone(), text))
                    .ok_or_else(|| EntryError::invalid(name, "env", "an object of scalars"))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?,
        Some(_) => return Err(EntryError::invalid(name, "env", "an object")),
        None => BTreeMap::new(),
    };

    let mut spec = ServerSpec::command(name, command, args, env_vars);
    if let UrlField::Alongside(key) = aliases.url
        && let Some(url) = entry.get(key).filter(|v| !v.is_null())
    {
        let url = url
            .as_str()
            .ok_or_else(|| EntryError::invalid(name, "apiBase", "a string"))?;
        spec.url = Some(url.to_string());
    }
    Ok(spec)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
