//! Heuristic risk model for normalized server records.
//!
//! Conditions are detected once into a [`Signals`] set; the numeric score and the
//! factor tags are both read from that set so they can never disagree. Deltas are
//! summed in hundredths and clamped at 100 before converting to a float.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::model::ServerSpec;

/// Commands starting with these launch through a package runner, not a local binary.
pub const PACKAGE_RUNNER_PREFIXES: [&str; 3] = ["npx", "uvx", "uv"];

/// Upper-cased substrings that mark an env key as holding a secret.
pub const SENSITIVE_KEY_PATTERNS: [&str; 5] = ["TOKEN", "KEY", "SECRET", "PASSWORD", "CREDENTIAL"];

const DATABASE_MARKERS: [&str; 4] = ["postgres", "mysql", "redis", "mongo"];
const INTERPRETER_MARKERS: [&str; 3] = ["python", "node", "run"];
const AUTOMATION_MARKERS: [&str; 2] = ["playwright", "mobile"];

const CUSTOM_BINARY_DELTA: u32 = 30;
const SENSITIVE_ENV_DELTA: u32 = 25;
const FILE_SYSTEM_DELTA: u32 = 20;
const DATABASE_DELTA: u32 = 15;
const EXTERNAL_URL_DELTA: u32 = 10;
const INTERPRETER_DELTA: u32 = 5;
const MAX_UNITS: u32 = 100;

/// Discrete risk tag attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskFactor {
    CustomBinary,
    SensitiveEnvVars,
    FileSystemAccess,
    DatabaseAccess,
    ExternalUrl,
    CodeRepositoryAccess,
    AutomationCapability,
}

impl RiskFactor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CustomBinary => "CUSTOM_BINARY",
            Self::SensitiveEnvVars => "SENSITIVE_ENV_VARS",
            Self::FileSystemAccess => "FILE_SYSTEM_ACCESS",
            Self::DatabaseAccess => "DATABASE_ACCESS",
            Self::ExternalUrl => "EXTERNAL_URL",
            Self::CodeRepositoryAccess => "CODE_REPOSITORY_ACCESS",
            Self::AutomationCapability => "AUTOMATION_CAPABILITY",
        }
    }
}

impl std::fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation-only bucket derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    pub fn for_score(score: f64) -> Self {
        if score >= 0.5 {
            Self::High
        } else if score >= 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// Answers whether a command names a regular file on disk.
pub trait BinaryProbe {
    fn is_regular_file(&self, command: &str) -> bool;
}

/// Probe backed by the local filesystem.
pub struct DiskProbe;

impl BinaryProbe for DiskProbe {
    fn is_regular_file(&self, command: &str) -> bool {
        !command.is_empty() && Path::new(command).is_file()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// In `[0, 1]`.
    pub score: f64,
    pub factors: BTreeSet<RiskFactor>,
}

/// Every condition the model looks at, evaluated once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub custom_binary: bool,
    pub sensitive_env: bool,
    pub file_system: bool,
    pub database: bool,
    pub external_url: bool,
    pub interpreter: bool,
    pub code_repository: bool,
    pub automation: bool,
}

impl Signals {
    pub fn detect(spec: &ServerSpec, probe: &dyn BinaryProbe) -> Self {
        let name = spec.name.to_lowercase();
        let command = spec.command.as_str();
        let runner_launched = PACKAGE_RUNNER_PREFIXES
            .iter()
            .any(|prefix| command.starts_with(prefix));
        Self {
            custom_binary: !runner_launched && probe.is_regular_file(command),
            sensitive_env: spec.env_vars.keys().any(|k| is_sensitive_key(k)),
            file_system: name.contains("filesystem"),
            database: DATABASE_MARKERS.iter().any(|m| name.contains(m)),
            external_url: spec.url.as_deref().is_some_and(|u| !u.is_empty()),
            interpreter: INTERPRETER_MARKERS.iter().any(|m| command.contains(m)),
            code_repository: name.contains("github"),
            automation: AUTOMATION_MARKERS.iter().any(|m| name.contains(m)),
        }
    }

    /// Sum of matched deltas in hundredths, clamped to 100.
    pub fn score_units(&self) -> u32 {
        let weighted = [
            (self.custom_binary, CUSTOM_BINARY_DELTA),
            (self.sensitive_env, SENSITIVE_ENV_DELTA),
            (self.file_system, FILE_SYSTEM_DELTA),
            (self.database, DATABASE_DELTA),
            (self.external_url, EXTERNAL_URL_DELTA),
            (self.interpreter, INTERPRETER_DELTA),
        ];
        let total: u32 = weighted
            .iter()
            .filter(|(hit, _)| *hit)
            .map(|(_, delta)| delta)
            .sum();
        total.min(MAX_UNITS)
    }

    pub fn score(&self) -> f64 {
        f64::from(self.score_units()) / 100.0
    }

    pub fn factors(&self) -> BTreeSet<RiskFactor> {
        let tagged = [
            (self.custom_binary, RiskFactor::CustomBinary),
            (self.sensitive_env, RiskFactor::SensitiveEnvVars),
            (self.file_system, RiskFactor::FileSystemAccess),
            (self.database, RiskFactor::DatabaseAccess),
            (self.external_url, RiskFactor::ExternalUrl),
            (self.code_repository, RiskFactor::CodeRepositoryAccess),
            (self.automation, RiskFactor::AutomationCapability),
        ];
        tagged
            .into_iter()
            .filter_map(|(hit, factor)| hit.then_some(factor))
            .collect()
    }
}

pub fn assess(spec: &ServerSpec, probe: &dyn BinaryProbe) -> RiskAssessment {
    let signals = Signals::detect(spec, probe);
    RiskAssessment {
        score: signals.score(),
        factors: signals.factors(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let upper = key.to_uppercase();
    SENSITIVE_KEY_PATTERNS.iter().any(|p| upper.contains(p))
}

#[cfg(test)]
pub(crate) struct NoBinaries;

#[cfg(test)]
impl BinaryProbe for NoBinaries {
    fn is_regular_file(&self, _command: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    struct AllBinaries;

    impl BinaryProbe for AllBinaries {
        fn is_regular_file(&self, command: &str) -> bool {
            !command.is_empty()
        }
    }

    fn spec(name: &str, command: &str, env: &[(&str, &str)], url: Option<&str>) -> ServerSpec {
        ServerSpec {
            name: name.to_string(),
            command: command.to_string(),
            args: vec![],
            env_vars: env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            url: url.map(|u| u.to_string()),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn custom_binary_with_secret_env() {
        let s = spec(
            "fs",
            "/usr/local/bin/fs-server",
            &[("API_KEY", "xyz123xyz123")],
            None,
        );
        let a = assess(&s, &AllBinaries);
        assert!(approx(a.score, 0.55));
        assert_eq!(
            a.factors,
            BTreeSet::from([RiskFactor::CustomBinary, RiskFactor::SensitiveEnvVars])
        );
    }

    #[test]
    fn remote_server_scores_url_only() {
        let a = assess(&spec("hf", "", &[], Some("https://hf.example/mcp")), &NoBinaries);
        assert!(approx(a.score, 0.1));
        assert_eq!(a.factors, BTreeSet::from([RiskFactor::ExternalUrl]));
    }

    #[test]
    fn package_runner_is_never_custom_binary() {
        for cmd in ["npx", "uvx", "uv"] {
            let a = assess(&spec("x", cmd, &[], None), &AllBinaries);
            assert!(!a.factors.contains(&RiskFactor::CustomBinary), "{cmd}");
        }
    }

    #[test]
    fn missing_binary_is_not_custom() {
        let a = assess(&spec("x", "/nope/bin", &[], None), &NoBinaries);
        assert!(a.factors.is_empty());
        assert_eq!(a.score, 0.0);
    }

    #[test]
    fn sensitive_env_counts_once() {
        let a = assess(
            &spec(
                "x",
                "",
                &[("GITHUB_TOKEN", "a"), ("db_password", "b"), ("AWS_SECRET", "c")],
                None,
            ),
            &NoBinaries,
        );
        assert!(approx(a.score, 0.25));
    }

    #[test]
    fn name_markers_are_case_insensitive() {
        let a = assess(&spec("My-FileSystem-Postgres", "", &[], None), &NoBinaries);
        assert!(approx(a.score, 0.35));
        assert!(a.factors.contains(&RiskFactor::FileSystemAccess));
        assert!(a.factors.contains(&RiskFactor::DatabaseAccess));
    }

    #[test]
    fn interpreter_adds_score_without_factor() {
        let a = assess(&spec("x", "python3", &[], None), &NoBinaries);
        assert!(approx(a.score, 0.05));
        assert!(a.factors.is_empty());
        // "uv run" starts with a runner prefix but still contains "run".
        let b = assess(&spec("x", "uv run server.py", &[], None), &AllBinaries);
        assert!(approx(b.score, 0.05));
    }

    #[test]
    fn github_and_playwright_are_factor_only() {
        let a = assess(&spec("github-playwright", "", &[], None), &NoBinaries);
        assert_eq!(a.score, 0.0);
        assert_eq!(
            a.factors,
            BTreeSet::from([
                RiskFactor::CodeRepositoryAccess,
                RiskFactor::AutomationCapability
            ])
        );
    }

    #[test]
    fn score_clamps_at_one() {
        let a = assess(
            &spec(
                "filesystem-mongo",
                "/opt/node-runner",
                &[("TOKEN", "t")],
                Some("https://x"),
            ),
            &AllBinaries,
        );
        // 30 + 25 + 20 + 15 + 10 + 5 = 105 hundredths.
        assert_eq!(a.score, 1.0);
        assert_eq!(a.factors.len(), 5);
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(Tier::for_score(0.5), Tier::High);
        assert_eq!(Tier::for_score(0.3), Tier::Medium);
        assert_eq!(Tier::for_score(0.49), Tier::Medium);
        assert_eq!(Tier::for_score(0.25), Tier::Low);
        let medium = assess(&spec("x", "python", &[("API_KEY", "k")], None), &NoBinaries);
        assert_eq!(Tier::for_score(medium.score), Tier::Medium);
    }

    #[test]
    fn factor_names_are_screaming_snake() {
        assert_eq!(RiskFactor::SensitiveEnvVars.to_string(), "SENSITIVE_ENV_VARS");
        assert_eq!(
            serde_json::to_string(&RiskFactor::CodeRepositoryAccess).unwrap(),
            "\"CODE_REPOSITORY_ACCESS\""
        );
    }

    proptest! {
        #[test]
        fn score_matches_signal_sum(
            name in "[a-zA-Z/_-]{0,24}",
            command in "[a-z/ ]{0,16}",
            key in "[A-Z_]{0,12}",
            has_url in any::<bool>(),
            binary in any::<bool>(),
        ) {
            let s = spec(
                &name,
                &command,
                &[(key.as_str(), "v")],
                has_url.then_some("https://example.test"),
            );
            let a = if binary { assess(&s, &AllBinaries) } else { assess(&s, &NoBinaries) };
            let signals = if binary {
                Signals::detect(&s, &AllBinaries)
            } else {
                Signals::detect(&s, &NoBinaries)
            };
            prop_assert!((0.0..=1.0).contains(&a.score));
            prop_assert_eq!(a.score, f64::from(signals.score_units()) / 100.0);
            prop_assert_eq!(
                a.factors.contains(&RiskFactor::SensitiveEnvVars),
                is_sensitive_key(&key)
            );
            prop_assert_eq!(a.factors.contains(&RiskFactor::ExternalUrl), has_url);
        }
    }
}
