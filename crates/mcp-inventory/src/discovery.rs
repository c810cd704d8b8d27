//! Scan driver: check every catalog candidate and route it to an adapter.
//!
//! This is the only place that checks whether a candidate exists. Every scan
//! plans its jobs per vendor, claims files in catalog order, then processes the
//! claimed files. The sequential scan interleaves the three steps vendor by
//! vendor. The concurrent scan plans and processes vendors on the blocking pool,
//! but claims every file from the driver in catalog order. A file listed under
//! several vendors therefore always belongs to the earliest one, in both modes.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapter::{FileScanner, Harvest, JobPlanner, ScanJob, ScanStats, profile_for};
use crate::catalog::{DirectoryStrategy, LocationCatalog, Vendor};
use crate::error::ScanError;
use crate::inventory::Inventory;
use crate::ledger::{Claim, DedupLedger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    /// Plan and process vendors on the blocking pool.
    pub parallel: bool,
    /// Depth bound for recursive directory sweeps; `None` is unlimited.
    pub max_depth: Option<usize>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            parallel: true,
            max_depth: None,
        }
    }
}

/// Check one vendor's candidates: existing files become jobs, directories are swept.
pub fn plan_vendor(
    vendor: Vendor,
    candidates: &[PathBuf],
    planner: &JobPlanner,
    stats: &mut ScanStats,
) -> Vec<ScanJob> {
    let mut jobs = Vec::new();
    for path in candidates {
        plan_location(vendor, path, planner, &mut jobs, stats);
    }
    jobs
}

fn plan_location(
    vendor: Vendor,
    path: &Path,
    planner: &JobPlanner,
    jobs: &mut Vec<ScanJob>,
    stats: &mut ScanStats,
) {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return,
        Err(e) => {
            tracing::warn!("{}", ScanError::io(path, e));
            stats.io_failures += 1;
            return;
        }
    };
    stats.locations_found += 1;

    if meta.is_dir() {
        tracing::info!("scanning {} directory: {}", vendor.label(), path.display());
        match vendor.directory_strategy() {
            DirectoryStrategy::Extensions => planner.extension_root(path, jobs, stats),
            DirectoryStrategy::Recursive => planner.directory(path, vendor.label(), jobs, stats),
        }
    } else {
        tracing::info!("found {} config: {}", vendor.label(), path.display());
        jobs.push(ScanJob::new(path, profile_for(vendor), vendor.label()));
    }
}

/// Plan, claim and process one vendor against a shared ledger.
pub fn scan_vendor(
    vendor: Vendor,
    candidates: &[PathBuf],
    ledger: &DedupLedger,
    settings: &ScanSettings,
) -> Harvest {
    let mut harvest = Harvest::default();
    let jobs = plan_vendor(
        vendor,
        candidates,
        &JobPlanner::new(settings.max_depth),
        &mut harvest.stats,
    );
    let scanner = FileScanner::new(ledger);
    for job in &jobs {
        scanner.scan_file(job, &mut harvest);
    }
    harvest
}

/// Scan every catalog location, one vendor after another.
pub fn scan(catalog: &LocationCatalog, settings: &ScanSettings) -> Inventory {
    let ledger = DedupLedger::new();
    let mut inventory = Inventory::new();
    for (vendor, candidates) in catalog.iter() {
        inventory.absorb(scan_vendor(vendor, candidates, &ledger, settings));
    }
    tracing::info!(
        "discovered {} MCP server(s) across {} file(s)",
        inventory.len(),
        ledger.files_claimed()
    );
    inventory
}

/// Scan vendors concurrently on the blocking pool.
///
/// Produces the same records, in the same order, as [`scan`].
pub async fn scan_concurrent(catalog: &LocationCatalog, settings: &ScanSettings) -> Inventory {
    let planner = JobPlanner::new(settings.max_depth);
    let vendors: Vec<(Vendor, Vec<PathBuf>)> = catalog
        .iter()
        .map(|(vendor, candidates)| (vendor, candidates.to_vec()))
        .collect();
    let plans = on_blocking_pool(vendors, move |(vendor, candidates)| {
        let mut stats = ScanStats::default();
        let jobs = plan_vendor(vendor, &candidates, &planner, &mut stats);
        (jobs, stats)
    })
    .await;

    let ledger = Arc::new(DedupLedger::new());
    let scanner = FileScanner::new(&ledger);
    let claimed: Vec<(Vec<(ScanJob, Claim)>, ScanStats)> = plans
        .into_iter()
        .flatten()
        .map(|(jobs, mut stats)| {
            let owned: Vec<(ScanJob, Claim)> = jobs
                .into_iter()
                .filter_map(|job| scanner.claim(&job, &mut stats).map(|claim| (job, claim)))
                .collect();
            (owned, stats)
        })
        .collect();

    let shared = Arc::clone(&ledger);
    let harvests = on_blocking_pool(claimed, move |(owned, stats)| {
        let scanner = FileScanner::new(&shared);
        let mut harvest = Harvest {
            records: Vec::new(),
            stats,
        };
        for (job, claim) in owned {
            scanner.process(&job, claim, &mut harvest);
        }
        harvest
    })
    .await;

    let mut inventory = Inventory::new();
    for harvest in harvests.into_iter().flatten() {
        inventory.absorb(harvest);
    }
    tracing::info!(
        "discovered {} MCP server(s) across {} file(s)",
        inventory.len(),
        ledger.files_claimed()
    );
    inventory
}

/// Run `work` over every input as its own blocking task; outputs keep input order.
///
/// A task that fails to join leaves `None` in its slot.
async fn on_blocking_pool<I, O, F>(inputs: Vec<I>, work: F) -> Vec<Option<O>>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let mut outputs: Vec<Option<O>> = Vec::new();
    outputs.resize_with(inputs.len(), || None);

    let mut set = tokio::task::JoinSet::new();
    for (index, input) in inputs.into_iter().enumerate() {
        let work = Arc::clone(&work);
        set.spawn_blocking(move || (index, work(input)));
    }
    while let Some(res) = set.join_next().await {
        match res {
            Ok((index, output)) => {
                if let Some(slot) = outputs.get_mut(index) {
                    *slot = Some(output);
                }
            }
            Err(e) => {
                tracing::warn!("vendor scan task join error: {}", e);
            }
        }
    }
    outputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HostDirs, Platform};
    use std::collections::BTreeSet;

    fn write(path: &Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn linux_catalog(home: &Path) -> LocationCatalog {
        let dirs = HostDirs::resolve_with(Platform::Linux, home.to_path_buf(), |_| None);
        LocationCatalog::for_host(&dirs)
    }

    fn identity(inv: &Inventory) -> BTreeSet<(String, String, String)> {
        inv.records()
            .iter()
            .map(|r| {
                (
                    r.name().to_string(),
                    r.config_path().to_string(),
                    format!("{:.2}", r.risk_score()),
                )
            })
            .collect()
    }

    #[test]
    fn shared_file_is_counted_once() {
        let home = tempfile::tempdir().unwrap();
        // Listed under claude_desktop twice on Linux (A/Claude and H/.config/Claude).
        write(
            &home.path().join(".config/Claude/claude_desktop_config.json"),
            r#"{"mcpServers": {"fs": {"command": "npx"}}}"#,
        );
        let inv = scan(&linux_catalog(home.path()), &ScanSettings::default());
        assert_eq!(inv.len(), 1);
        assert_eq!(inv.stats().duplicates_skipped, 1);
        assert_eq!(inv.stats().locations_found, 2);
    }

    #[test]
    fn bad_file_does_not_stop_later_candidates() {
        let home = tempfile::tempdir().unwrap();
        write(&home.path().join(".claude/settings.json"), "not json at all");
        write(
            &home.path().join(".claude.json"),
            r#"{"mcp": {"servers": {"db-postgres": {"command": "pg"}}}}"#,
        );
        let inv = scan(&linux_catalog(home.path()), &ScanSettings::default());
        let names: Vec<_> = inv.records().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["db-postgres"]);
        assert_eq!(inv.stats().documents_failed, 1);
    }

    #[test]
    fn repeated_scans_are_identical() {
        let home = tempfile::tempdir().unwrap();
        write(
            &home.path().join(".cursor/mcp.json"),
            r#"{"mcpServers": {"github": {"command": "npx", "env": {"GITHUB_TOKEN": "ghp_1234567890"}}}}"#,
        );
        write(
            &home.path().join(".mcp/team/tools.json"),
            r#"{"tools": [{"type": "mcp", "name": "search", "url": "https://s.example"}]}"#,
        );
        let catalog = linux_catalog(home.path());
        let first = scan(&catalog, &ScanSettings::default());
        let second = scan(&catalog, &ScanSettings::default());
        assert_eq!(first.len(), 2);
        assert_eq!(identity(&first), identity(&second));
    }

    #[test]
    fn empty_home_finds_nothing() {
        let home = tempfile::tempdir().unwrap();
        let inv = scan(&linux_catalog(home.path()), &ScanSettings::default());
        assert!(inv.is_empty());
        assert_eq!(inv.stats().locations_found, 0);
        assert_eq!(inv.stats().io_failures, 0);
    }

    #[tokio::test]
    async fn concurrent_scan_matches_sequential() {
        let home = tempfile::tempdir().unwrap();
        write(
            &home.path().join(".config/Claude/claude_desktop_config.json"),
            r#"{"mcpServers": {"fs": {"command": "npx"}, "hf": {"url": "https://hf.example"}}}"#,
        );
        write(
            &home.path().join(".continue/config.json"),
            r#"{"models": [{"title": "Local", "provider": "ollama", "useMcp": true}]}"#,
        );
        write(
            &home.path().join(".vscode/extensions/acme.mcp/mcp.json"),
            r#"{"mcpServers": {"browser": {"command": "playwright-mcp"}}}"#,
        );
        let catalog = linux_catalog(home.path());
        let sequential = scan(&catalog, &ScanSettings::default());
        let concurrent = scan_concurrent(&catalog, &ScanSettings::default()).await;
        assert_eq!(sequential.len(), 4);
        assert_eq!(identity(&sequential), identity(&concurrent));
        let names: Vec<_> = concurrent.records().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["fs", "hf", "acme.mcp/browser", "continue/Local"]);
    }

    #[tokio::test]
    async fn file_shared_by_two_vendors_always_goes_to_the_earlier_one() {
        let home = tempfile::tempdir().unwrap();
        let settings_file = home.path().join(".cursor/settings.json");
        write(
            &settings_file,
            r#"{"browser": {"command": "browser-mcp"}, "editor.fontSize": 12}"#,
        );
        let mut catalog = linux_catalog(home.path());
        catalog.retain_vendors(&[Vendor::Cursor, Vendor::Custom]);
        // Custom (generic profile) finds no shape here; Cursor's flat map does.
        catalog.extend_custom(vec![settings_file]);

        let sequential = scan(&catalog, &ScanSettings::default());
        assert_eq!(sequential.len(), 1);
        for _ in 0..50 {
            let concurrent = scan_concurrent(&catalog, &ScanSettings::default()).await;
            assert_eq!(identity(&concurrent), identity(&sequential));
            assert_eq!(concurrent.stats(), sequential.stats());
        }
    }
}
