//! Schema adapters: read a configuration file, pick a shape, emit records.
//!
//! An adapter is a profile (owner kind, server-map policy, ordered matchers).
//! Scanning runs in three steps. [`JobPlanner`] turns candidate directories into
//! [`ScanJob`]s without reading any file. [`FileScanner::claim`] takes a job's
//! file in the ledger. [`FileScanner::process`] reads and translates a claimed
//! file, handing the claim to the server-map profile when the document holds
//! `mcpServers` and the profile asks for it.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::catalog::Vendor;
use crate::error::ScanError;
use crate::ledger::{AdapterKind, Claim, DedupLedger};
use crate::model::ServerRecord;
use crate::parser::server_map::SERVER_MAP_KEY;
use crate::parser::{
    Dispatch, ExtensionsMap, FieldAliases, FlatMap, JsonMap, ModelsList, NameRule, NestedServers,
    ParseContext, ServerMap, ShapeMatcher, ToolsArray, first_match,
};

/// Files tried, in order, inside each extension directory.
pub const EXTENSION_CONFIG_FILES: [&str; 3] = ["mcp.json", "mcp-config.json", "package.json"];

/// What a profile does with a top-level `mcpServers` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMapPolicy {
    /// Left to the profile's own matchers.
    Own,
    /// The server-map profile takes the file instead of this one.
    Delegate,
    /// This profile's matchers run first, then the server-map profile adds its records.
    Append,
}

#[derive(Clone, Copy)]
pub struct AdapterProfile {
    pub kind: AdapterKind,
    pub server_map: ServerMapPolicy,
    pub matchers: &'static [&'static dyn ShapeMatcher],
}

impl std::fmt::Debug for AdapterProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shapes: Vec<_> = self.matchers.iter().map(|m| m.shape()).collect();
        f.debug_struct("AdapterProfile")
            .field("kind", &self.kind)
            .field("server_map", &self.server_map)
            .field("matchers", &shapes)
            .finish()
    }
}

pub static SERVER_MAP: AdapterProfile = AdapterProfile {
    kind: AdapterKind::ServerMap,
    server_map: ServerMapPolicy::Own,
    matchers: &[&ServerMap {
        rule: NameRule::Verbatim,
        aliases: &FieldAliases::STRICT,
    }],
};

pub static GENERIC: AdapterProfile = AdapterProfile {
    kind: AdapterKind::Generic,
    server_map: ServerMapPolicy::Delegate,
    matchers: &[
        &NestedServers {
            rule: NameRule::Verbatim,
            aliases: &FieldAliases::FLEXIBLE,
        },
        &ToolsArray {
            rule: NameRule::ScopedUnlessQualified,
            aliases: &FieldAliases::FLEXIBLE,
        },
        &ExtensionsMap {
            rule: NameRule::ScopedUnlessQualified,
            aliases: &FieldAliases::FLEXIBLE,
        },
    ],
};

pub static CURSOR: AdapterProfile = AdapterProfile {
    kind: AdapterKind::Cursor,
    server_map: ServerMapPolicy::Delegate,
    matchers: &[&FlatMap],
};

/// `models` and `mcpServers` describe different servers, so both are kept.
pub static CONTINUE: AdapterProfile = AdapterProfile {
    kind: AdapterKind::Continue,
    server_map: ServerMapPolicy::Append,
    matchers: &[&ModelsList],
};

pub static EXTENSION: AdapterProfile = AdapterProfile {
    kind: AdapterKind::Extension,
    server_map: ServerMapPolicy::Own,
    matchers: &[
        &ServerMap {
            rule: NameRule::Scoped,
            aliases: &FieldAliases::STRICT,
        },
        &NestedServers {
            rule: NameRule::Scoped,
            aliases: &FieldAliases::FLEXIBLE,
        },
        &ExtensionsMap {
            rule: NameRule::Scoped,
            aliases: &FieldAliases::FLEXIBLE,
        },
    ],
};

/// Profile applied to a file candidate of `vendor`.
pub fn profile_for(vendor: Vendor) -> &'static AdapterProfile {
    match vendor {
        Vendor::ClaudeDesktop => &SERVER_MAP,
        Vendor::Cursor => &CURSOR,
        Vendor::Continue => &CONTINUE,
        _ => &GENERIC,
    }
}

/// Counters accumulated over a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub locations_found: usize,
    pub files_parsed: usize,
    pub duplicates_skipped: usize,
    pub documents_failed: usize,
    pub entries_skipped: usize,
    pub io_failures: usize,
}

impl ScanStats {
    pub fn merge(&mut self, other: &ScanStats) {
        self.locations_found += other.locations_found;
        self.files_parsed += other.files_parsed;
        self.duplicates_skipped += other.duplicates_skipped;
        self.documents_failed += other.documents_failed;
        self.entries_skipped += other.entries_skipped;
        self.io_failures += other.io_failures;
    }
}

/// Records and counters produced by one unit of scanning work.
#[derive(Debug, Default)]
pub struct Harvest {
    pub records: Vec<ServerRecord>,
    pub stats: ScanStats,
}

/// One existing file queued for a profile.
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub path: PathBuf,
    pub profile: &'static AdapterProfile,
    /// Vendor label, or the extension directory name.
    pub scope: String,
}

impl ScanJob {
    pub fn new(
        path: impl Into<PathBuf>,
        profile: &'static AdapterProfile,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            profile,
            scope: scope.into(),
        }
    }
}

/// Expands candidate directories into jobs. Reads metadata only.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobPlanner {
    /// Bound for recursive sweeps; `None` is unlimited.
    max_depth: Option<usize>,
}

impl JobPlanner {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self { max_depth }
    }

    /// One job per child directory: its first existing extension config file.
    pub fn extension_root(&self, root: &Path, jobs: &mut Vec<ScanJob>, stats: &mut ScanStats) {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("{}", ScanError::io(root, e));
                stats.io_failures += 1;
                return;
            }
        };
        let mut children: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        children.sort();

        for child in children {
            let Some(extension) = child.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            let found = EXTENSION_CONFIG_FILES
                .iter()
                .map(|name| child.join(name))
                .find(|candidate| candidate.is_file());
            if let Some(config) = found {
                jobs.push(ScanJob::new(config, &EXTENSION, extension));
            }
        }
    }

    /// Every `*.json` below `root`, for the generic profile.
    ///
    /// Symlinked directories are not descended into; symlinked files are kept.
    pub fn directory(
        &self,
        root: &Path,
        scope: &str,
        jobs: &mut Vec<ScanJob>,
        stats: &mut ScanStats,
    ) {
        let mut walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("directory walk error under {}: {}", root.display(), e);
                    stats.io_failures += 1;
                    continue;
                }
            };
            if is_json(entry.path()) && entry.path().is_file() {
                jobs.push(ScanJob::new(entry.path(), &GENERIC, scope));
            }
        }
    }
}

/// Claims and translates files against one shared ledger.
#[derive(Debug, Clone, Copy)]
pub struct FileScanner<'a> {
    ledger: &'a DedupLedger,
}

impl<'a> FileScanner<'a> {
    pub fn new(ledger: &'a DedupLedger) -> Self {
        Self { ledger }
    }

    /// Take the job's file. `None`, counted as a duplicate, when another job holds it.
    pub fn claim(&self, job: &ScanJob, stats: &mut ScanStats) -> Option<Claim> {
        let claim = self.ledger.claim(&job.path, job.profile.kind);
        if claim.is_none() {
            tracing::debug!("already processed, skipping {}", job.path.display());
            stats.duplicates_skipped += 1;
        }
        claim
    }

    /// Claim, then process.
    pub fn scan_file(&self, job: &ScanJob, harvest: &mut Harvest) {
        if let Some(claim) = self.claim(job, &mut harvest.stats) {
            self.process(job, claim, harvest);
        }
    }

    /// Read and translate a file this scanner has claimed.
    pub fn process(&self, job: &ScanJob, claim: Claim, harvest: &mut Harvest) {
        let path = job.path.as_path();
        let doc = match read_document(path) {
            Ok(doc) => doc,
            Err(e @ ScanError::Io { .. }) => {
                tracing::warn!("{}", e);
                harvest.stats.io_failures += 1;
                return;
            }
            Err(e) => {
                tracing::warn!("{}", e);
                harvest.stats.documents_failed += 1;
                return;
            }
        };
        harvest.stats.files_parsed += 1;

        let ctx = ParseContext { scope: &job.scope };
        let profile = job.profile;
        let dispatches = match (profile.server_map, doc.contains_key(SERVER_MAP_KEY)) {
            (ServerMapPolicy::Delegate, true) => {
                self.delegate(claim);
                vec![first_match(SERVER_MAP.matchers, &doc, &ctx)]
            }
            (ServerMapPolicy::Append, true) => {
                let own = first_match(profile.matchers, &doc, &ctx);
                self.delegate(claim);
                vec![own, first_match(SERVER_MAP.matchers, &doc, &ctx)]
            }
            _ => vec![first_match(profile.matchers, &doc, &ctx)],
        };

        if dispatches
            .iter()
            .all(|d| matches!(d, Dispatch::Unrecognized))
        {
            tracing::debug!("no MCP server shape in {}", path.display());
            return;
        }
        for dispatch in dispatches {
            record_dispatch(path, dispatch, harvest);
        }
    }

    fn delegate(&self, claim: Claim) {
        let claim = self.ledger.hand_off(claim, SERVER_MAP.kind);
        tracing::debug!(
            "{} holds {}; delegated to {:?}",
            claim.key(),
            SERVER_MAP_KEY,
            claim.owner()
        );
    }
}

fn record_dispatch(path: &Path, dispatch: Dispatch, harvest: &mut Harvest) {
    match dispatch {
        Dispatch::Unrecognized => {}
        Dispatch::Malformed { shape, detail } => {
            let e = ScanError::shape(path, format!("{shape}: {detail}"));
            tracing::warn!("{}", e);
            harvest.stats.documents_failed += 1;
        }
        Dispatch::Parsed {
            shape,
            specs,
            skipped,
        } => {
            tracing::debug!(
                "{} matched {} ({} entries)",
                path.display(),
                shape,
                specs.len()
            );
            for err in skipped {
                tracing::warn!("skipping entry in {}: {}", path.display(), err);
                harvest.stats.entries_skipped += 1;
            }
            for spec in specs {
                let record = ServerRecord::new(spec, path);
                tracing::info!(
                    "discovered {} (risk {:.2})",
                    record.name(),
                    record.risk_score()
                );
                harvest.records.push(record);
            }
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn read_document(path: &Path) -> Result<JsonMap, ScanError> {
    let content = fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
    match serde_json::from_str::<Value>(&content).map_err(|e| ScanError::json(path, e))? {
        Value::Object(map) => Ok(map),
        _ => Err(ScanError::shape(path, "top-level value is not an object")),
    }
}
