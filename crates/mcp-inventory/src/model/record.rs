//! Normalized server record produced by every schema adapter.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::risk::{self, BinaryProbe, DiskProbe, RiskFactor};

/// Launch parameters extracted from one configuration entry, prior to scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerSpec {
    pub name: String,
    /// Empty for URL-based servers.
    pub command: String,
    pub args: Vec<String>,
    pub env_vars: BTreeMap<String, String>,
    pub url: Option<String>,
}

impl ServerSpec {
    /// Command-launched server.
    pub fn command(
        name: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
        env_vars: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args,
            env_vars,
            url: None,
        }
    }

    /// Remote server reached over `url`; command, args and env stay empty.
    pub fn remote(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

/// One discovered server. Risk fields are computed once at construction.
#[derive(Debug, Clone)]
pub struct ServerRecord {
    name: String,
    command: String,
    args: Vec<String>,
    env_vars: BTreeMap<String, String>,
    config_path: String,
    url: Option<String>,
    discovered_at: DateTime<Utc>,
    risk_score: f64,
    risk_factors: BTreeSet<RiskFactor>,
}

impl ServerRecord {
    /// Build and score a record, probing the local disk for custom binaries.
    pub fn new(spec: ServerSpec, config_path: &Path) -> Self {
        Self::with_probe(spec, config_path, &DiskProbe)
    }

    pub fn with_probe(spec: ServerSpec, config_path: &Path, probe: &dyn BinaryProbe) -> Self {
        let assessment = risk::assess(&spec, probe);
        let ServerSpec {
            name,
            command,
            args,
            env_vars,
            url,
        } = spec;
        let name = if name.trim().is_empty() {
            "unknown".to_string()
        } else {
            name
        };
        Self {
            name,
            command,
            args,
            env_vars,
            config_path: std::path::absolute(config_path)
                .unwrap_or_else(|_| config_path.to_path_buf())
                .display()
                .to_string(),
            url: url.filter(|u| !u.is_empty()),
            discovered_at: Utc::now(),
            risk_score: assessment.score,
            risk_factors: assessment.factors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env_vars(&self) -> &BTreeMap<String, String> {
        &self.env_vars
    }

    pub fn config_path(&self) -> &str {
        &self.config_path
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }

    pub fn risk_score(&self) -> f64 {
        self.risk_score
    }

    pub fn risk_factors(&self) -> &BTreeSet<RiskFactor> {
        &self.risk_factors
    }

    /// What the server launches or connects to, for display.
    pub fn target(&self) -> &str {
        if self.command.is_empty() {
            self.url.as_deref().unwrap_or("")
        } else {
            &self.command
        }
    }
}
