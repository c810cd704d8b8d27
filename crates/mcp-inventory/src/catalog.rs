//! Candidate configuration locations per vendor.
//!
//! The catalog is plain data derived from [`HostDirs`]; nothing here touches the
//! filesystem. Paths may repeat across vendors and do not need to exist.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::model::HostDirs;

/// Client applications and tools whose configuration we know how to find.
///
/// Declaration order is catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Vendor {
    ClaudeDesktop,
    ClaudeCode,
    VsCode,
    Cursor,
    Copilot,
    OpenAi,
    Gemini,
    HuggingFace,
    Continue,
    Cody,
    Ollama,
    Custom,
}

/// How a directory candidate is swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryStrategy {
    /// Each child directory is one extension with its own config file.
    Extensions,
    /// Every `*.json` below the directory.
    Recursive,
}

impl Vendor {
    pub const ALL: [Vendor; 12] = [
        Vendor::ClaudeDesktop,
        Vendor::ClaudeCode,
        Vendor::VsCode,
        Vendor::Cursor,
        Vendor::Copilot,
        Vendor::OpenAi,
        Vendor::Gemini,
        Vendor::HuggingFace,
        Vendor::Continue,
        Vendor::Cody,
        Vendor::Ollama,
        Vendor::Custom,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::ClaudeDesktop => "claude_desktop",
            Self::ClaudeCode => "claude_code",
            Self::VsCode => "vscode",
            Self::Cursor => "cursor",
            Self::Copilot => "copilot",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::HuggingFace => "huggingface",
            Self::Continue => "continue",
            Self::Cody => "cody",
            Self::Ollama => "ollama",
            Self::Custom => "custom",
        }
    }

    /// Human label, also the namespace prefix for scoped record names.
    pub fn label(self) -> &'static str {
        match self {
            Self::ClaudeDesktop => "Claude Desktop",
            Self::ClaudeCode => "Claude Code",
            Self::VsCode => "VS Code",
            Self::Cursor => "Cursor",
            Self::Copilot => "GitHub Copilot",
            Self::OpenAi => "OpenAI",
            Self::Gemini => "Gemini",
            Self::HuggingFace => "Hugging Face",
            Self::Continue => "continue",
            Self::Cody => "Cody",
            Self::Ollama => "Ollama",
            Self::Custom => "custom",
        }
    }

    pub fn directory_strategy(self) -> DirectoryStrategy {
        match self {
            Self::VsCode => DirectoryStrategy::Extensions,
            _ => DirectoryStrategy::Recursive,
        }
    }

    fn candidates(self, dirs: &HostDirs) -> Vec<PathBuf> {
        let home = dirs.home.as_path();
        let app = dirs.app_data.as_path();
        let local = dirs.local_app_data.as_path();
        let mac = home.join("Library").join("Application Support");
        let cfg = home.join(".config");
        match self {
            Self::ClaudeDesktop => vec![
                mac.join("Claude/claude_desktop_config.json"),
                app.join("Claude/claude_desktop_config.json"),
                local.join("Claude/claude_desktop_config.json"),
                cfg.join("claude/config.json"),
                cfg.join("Claude/claude_desktop_config.json"),
                home.join(".claude/config.json"),
            ],
            Self::ClaudeCode => vec![
                home.join(".claude/settings.json"),
                home.join(".claude.json"),
                cfg.join("claude-code/config.json"),
                mac.join("Claude Code/config.json"),
                app.join("Claude Code/config.json"),
            ],
            Self::VsCode => vec![
                home.join(".vscode/extensions"),
                home.join(".vscode/settings.json"),
                app.join("Code/User/settings.json"),
                mac.join("Code/User/settings.json"),
                cfg.join("Code/User/settings.json"),
            ],
            Self::Cursor => {
                let cline = "Cursor/User/globalStorage/saoudrizwan.claude-dev/settings/cline_mcp_settings.json";
                vec![
                    mac.join(cline),
                    app.join(cline),
                    cfg.join(cline),
                    home.join(".cursor/mcp.json"),
                    home.join(".cursor/settings.json"),
                ]
            }
            Self::Copilot => vec![
                cfg.join("github-copilot/config.json"),
                home.join(".copilot/config.json"),
                mac.join("GitHub Copilot/config.json"),
                app.join("GitHub Copilot/config.json"),
                local.join("GitHub Copilot/config.json"),
            ],
            Self::OpenAi => vec![
                cfg.join("openai/config.json"),
                home.join(".openai/config.json"),
                cfg.join("codex/config.json"),
                mac.join("OpenAI/config.json"),
                app.join("OpenAI/config.json"),
                app.join("ChatGPT/config.json"),
            ],
            Self::Gemini => vec![
                cfg.join("gemini/config.json"),
                home.join(".gemini/config.json"),
                cfg.join("google-ai/config.json"),
                mac.join("Gemini/config.json"),
                app.join("Gemini/config.json"),
                app.join("Google/Gemini/config.json"),
            ],
            Self::HuggingFace => vec![
                home.join(".cache/huggingface/mcp_config.json"),
                cfg.join("huggingface/config.json"),
                home.join(".huggingface/config.json"),
                local.join("huggingface/config.json"),
            ],
            Self::Continue => vec![
                home.join(".continue/config.json"),
                cfg.join("continue/config.json"),
            ],
            Self::Cody => vec![
                cfg.join("cody/config.json"),
                home.join(".cody/config.json"),
                mac.join("Cody/config.json"),
                app.join("Cody/config.json"),
            ],
            Self::Ollama => vec![
                home.join(".ollama/config.json"),
                cfg.join("ollama/config.json"),
                local.join("Ollama/config.json"),
            ],
            Self::Custom => vec![
                cfg.join("mcp"),
                home.join(".mcp"),
                home.join(".mcp.json"),
                cfg.join("ai-tools/mcp.json"),
            ],
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Vendor {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|v| v.key() == wanted)
            .ok_or_else(|| format!("unknown vendor: {value}"))
    }
}

/// Vendor to ordered candidate paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationCatalog {
    entries: BTreeMap<Vendor, Vec<PathBuf>>,
}

impl LocationCatalog {
    /// Every vendor's candidates for this host. Total for every platform.
    pub fn for_host(dirs: &HostDirs) -> Self {
        let entries = Vendor::ALL
            .into_iter()
            .map(|vendor| (vendor, vendor.candidates(dirs)))
            .collect();
        Self { entries }
    }

    /// Drop every vendor not listed in `keep`.
    pub fn retain_vendors(&mut self, keep: &[Vendor]) {
        self.entries.retain(|vendor, _| keep.contains(vendor));
    }

    /// Append user-supplied paths, attributed to [`Vendor::Custom`].
    pub fn extend_custom<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut paths = paths.into_iter().peekable();
        if paths.peek().is_none() {
            return;
        }
        self.entries.entry(Vendor::Custom).or_default().extend(paths);
    }

    pub fn candidates(&self, vendor: Vendor) -> &[PathBuf] {
        self.entries.get(&vendor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Vendors with their candidates, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (Vendor, &[PathBuf])> {
        self.entries.iter().map(|(v, paths)| (*v, paths.as_slice()))
    }

    pub fn vendors(&self) -> impl Iterator<Item = Vendor> + '_ {
        self.entries.keys().copied()
    }

    /// Total candidate count across vendors.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
