use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::Vendor;
use crate::model::home_dir;

#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    pub logging: Option<LoggingCfg>,
    pub scan: Option<ScanCfg>,
    pub output: Option<OutputCfg>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingCfg {
    pub to_file: Option<bool>,
    pub dir: Option<String>,
    pub json: Option<bool>,
    pub compact: Option<bool>,
    pub pretty: Option<bool>,
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScanCfg {
    pub home: Option<String>,
    pub platform: Option<String>, // linux | windows | macos
    pub vendors: Option<Vec<String>>,
    pub extra_paths: Option<Vec<String>>,
    pub parallel: Option<bool>,
    pub max_depth: Option<usize>, // 0 = unlimited
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputCfg {
    pub dir: Option<String>,
    pub csv: Option<bool>,
    pub json: Option<bool>,
    pub print_summary: Option<bool>,
}

pub fn load_user_config(inventory_home: &Path) -> anyhow::Result<Option<UserConfig>> {
    let path = inventory_home.join("config.toml");
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let cfg: UserConfig =
        toml::from_str(&s).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(cfg))
}

/// `MCP_INVENTORY_HOME` when set, else `$HOME/.mcp-inventory`, else `./.mcp-inventory`.
pub fn inventory_home(explicit: &str) -> PathBuf {
    if !explicit.trim().is_empty() {
        return PathBuf::from(explicit.trim());
    }
    home_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
        .join(".mcp-inventory")
}

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

/// Split a comma-separated flag value, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_vendors(keys: &[String]) -> anyhow::Result<Vec<Vendor>> {
    keys.iter()
        .map(|k| k.parse::<Vendor>().map_err(anyhow::Error::msg))
        .collect()
}

/// An env flag that was set wins; otherwise the config file; otherwise the flag default.
pub fn layered<T>(env_is_set: bool, env_value: T, file_value: Option<T>) -> T {
    if env_is_set {
        env_value
    } else {
        file_value.unwrap_or(env_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_user_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn config_tables_are_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            r#"
[logging]
level = "debug"
to_file = false

[scan]
vendors = ["cursor", "claude_desktop"]
parallel = false
max_depth = 3

[output]
csv = false
"#,
        )
        .unwrap();
        let cfg = load_user_config(dir.path()).unwrap().unwrap();
        let logging = cfg.logging.unwrap();
        assert_eq!(logging.level.as_deref(), Some("debug"));
        assert_eq!(logging.to_file, Some(false));
        let scan = cfg.scan.unwrap();
        assert_eq!(
            parse_vendors(scan.vendors.as_deref().unwrap()).unwrap(),
            vec![Vendor::Cursor, Vendor::ClaudeDesktop]
        );
        assert_eq!(scan.parallel, Some(false));
        assert_eq!(scan.max_depth, Some(3));
        assert_eq!(cfg.output.unwrap().csv, Some(false));
    }

    #[test]
    fn invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[scan\nparallel = ").unwrap();
        let err = load_user_config(dir.path()).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn env_beats_file_beats_default() {
        assert!(!layered(true, false, Some(true)));
        assert!(layered(false, false, Some(true)));
        assert_eq!(layered(false, 7usize, None), 7);
    }

    #[test]
    fn lists_and_vendors() {
        assert_eq!(split_list(" cursor, ,vscode ,"), vec!["cursor", "vscode"]);
        assert!(parse_vendors(&["emacs".to_string()]).is_err());
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(inventory_home("/srv/inv"), PathBuf::from("/srv/inv"));
    }
}
