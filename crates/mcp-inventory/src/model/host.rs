//! Host platform, per-platform application-data directories, and identity.

use std::path::PathBuf;

/// Desktop platform families the location catalog knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    Windows,
    MacOs,
}

impl Platform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            // Every other unix-like desktop shares the XDG layout.
            _ => Self::Linux,
        }
    }

    /// Name reported in exports (`uname`-style).
    pub fn system_name(self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::Windows => "Windows",
            Self::MacOs => "Darwin",
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linux" | "unix" => Ok(Self::Linux),
            "windows" | "win" => Ok(Self::Windows),
            "macos" | "darwin" | "mac" => Ok(Self::MacOs),
            other => Err(format!("unsupported platform: {other} (linux|windows|macos)")),
        }
    }
}

/// Resolved directories the catalog is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDirs {
    pub platform: Platform,
    pub home: PathBuf,
    /// Roaming application data (`%APPDATA%`, `~/Library/Application Support`, `~/.config`).
    pub app_data: PathBuf,
    /// Local application data (`%LOCALAPPDATA%`, `~/Library/Application Support`, `~/.local/share`).
    pub local_app_data: PathBuf,
}

impl HostDirs {
    /// Resolve app-data directories from the process environment.
    pub fn resolve(platform: Platform, home: PathBuf) -> Self {
        Self::resolve_with(platform, home, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve_with<F>(platform: Platform, home: PathBuf, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_dir = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        };
        let (app_data, local_app_data) = match platform {
            Platform::Windows => (
                env_dir("APPDATA").unwrap_or_else(|| home.join("AppData").join("Roaming")),
                env_dir("LOCALAPPDATA").unwrap_or_else(|| home.join("AppData").join("Local")),
            ),
            Platform::MacOs => {
                let support = home.join("Library").join("Application Support");
                (support.clone(), support)
            }
            Platform::Linux => (home.join(".config"), home.join(".local").join("share")),
        };
        Self {
            platform,
            home,
            app_data,
            local_app_data,
        }
    }
}

/// Hostname and user stamped onto every exported row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub hostname: String,
    pub user: String,
}

impl HostIdentity {
    pub fn detect() -> Self {
        let hostname = gethostname::gethostname().to_string_lossy().into_owned();
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());
        Self { hostname, user }
    }
}

pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .or_else(|| directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()))
}
