use std::path::PathBuf;

use anyhow::Context;
use env_flags::env_flags;
use once_cell::sync::OnceCell;

use mcp_inventory::catalog::LocationCatalog;
use mcp_inventory::config::{
    UserConfig, expand_home, inventory_home, layered, load_user_config, parse_vendors, split_list,
};
use mcp_inventory::discovery::{ScanSettings, scan, scan_concurrent};
use mcp_inventory::export::{ExportTargets, export_inventory, iso8601};
use mcp_inventory::model::{HostDirs, HostIdentity, Platform, home_dir};
use mcp_inventory::report::render_summary;

type BoxedLayer =
    Box<dyn tracing_subscriber::Layer<tracing_subscriber::Registry> + Send + Sync + 'static>;

#[derive(Clone, Copy)]
enum LogStyle {
    Json,
    Compact,
    Pretty,
    Full,
}

fn fmt_layer<W>(writer: W, style: LogStyle, ansi: bool) -> BoxedLayer
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    use tracing_subscriber::Layer;

    let base = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_target(true)
        .with_ansi(ansi)
        .with_writer(writer);
    match style {
        LogStyle::Json => base.json().boxed(),
        LogStyle::Compact => base.compact().boxed(),
        LogStyle::Pretty => base.pretty().boxed(),
        LogStyle::Full => base.boxed(),
    }
}

fn resolve_inventory_home() -> PathBuf {
    env_flags! {
        /// Inventory home directory (absolute). Defaults to $HOME/.mcp-inventory
        MCP_INVENTORY_HOME: &str = "";
    }
    inventory_home(*MCP_INVENTORY_HOME)
}

fn env_set(key: &str) -> bool {
    std::env::var_os(key).is_some()
}

fn init_tracing(inv_home: &std::path::Path, user_cfg: Option<&UserConfig>) {
    env_flags! {
        /// Tracing filter, e.g. "info", "debug", or targets format.
        RUST_LOG: &str = "info";
        /// Preferred filter env (alias). If set, overrides RUST_LOG.
        TRACING_FILTER: &str = "";
        /// Pretty formatting for logs (ignored if TRACING_JSON=true). Prefer compact unless explicitly set.
        TRACING_PRETTY: bool = false;
        /// Compact single-line formatting for logs (ignored if TRACING_JSON=true)
        TRACING_COMPACT: bool = true;
        /// JSON formatting for logs
        TRACING_JSON: bool = false;
        /// If true, also log to file under <MCP_INVENTORY_HOME>/logs or LOG_DIR
        LOG_TO_FILE: bool = true;
        /// Optional explicit log directory (absolute). Defaults to <MCP_INVENTORY_HOME>/logs
        LOG_DIR: &str = "";
    }

    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, prelude::*};

    // Support TRACING_FILTER as primary; fall back to RUST_LOG; then user config.
    let mut rust_log = if !(*TRACING_FILTER).is_empty() {
        (*TRACING_FILTER).to_string()
    } else {
        (*RUST_LOG).to_string()
    };
    let mut tracing_json = *TRACING_JSON;
    let mut tracing_compact = *TRACING_COMPACT;
    let mut tracing_pretty = *TRACING_PRETTY;
    let mut log_to_file = *LOG_TO_FILE;
    let mut log_dir: Option<PathBuf> = if !(*LOG_DIR).is_empty() {
        Some(PathBuf::from((*LOG_DIR).to_string()))
    } else {
        None
    };

    if let Some(cfg) = user_cfg.and_then(|c| c.logging.as_ref()) {
        if !(env_set("TRACING_FILTER") || env_set("RUST_LOG"))
            && let Some(level) = cfg.level.as_ref()
        {
            rust_log = level.clone();
        }
        tracing_json = layered(env_set("TRACING_JSON"), tracing_json, cfg.json);
        tracing_compact = layered(env_set("TRACING_COMPACT"), tracing_compact, cfg.compact);
        tracing_pretty = layered(env_set("TRACING_PRETTY"), tracing_pretty, cfg.pretty);
        log_to_file = layered(env_set("LOG_TO_FILE"), log_to_file, cfg.to_file);
        if !env_set("LOG_DIR")
            && let Some(dir) = cfg.dir.as_ref()
        {
            log_dir = Some(expand_home(dir));
        }
    }

    let filter = EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new("info"));
    let style = if tracing_json {
        LogStyle::Json
    } else if tracing_compact {
        LogStyle::Compact
    } else if tracing_pretty {
        LogStyle::Pretty
    } else {
        LogStyle::Full
    };

    // Always write logs to stderr so stdout carries only the summary.
    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(std::io::stderr, style, true)];
    let mut dir_error = None;
    static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();
    if log_to_file {
        let dir = log_dir.unwrap_or_else(|| inv_home.join("logs"));
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, "mcp-inventory.log");
                let (nb, guard) = tracing_appender::non_blocking(appender);
                let _ = FILE_GUARD.set(guard);
                layers.push(fmt_layer(nb, style, false));
            }
            Err(e) => dir_error = Some((dir, e)),
        }
    }

    let subscriber = tracing_subscriber::registry().with(layers).with(filter);
    if let Err(e) = subscriber.try_init() {
        tracing::debug!("tracing already set: {:?}", e);
    }
    if let Some((dir, e)) = dir_error {
        tracing::warn!("failed to create log dir {}: {}", dir.display(), e);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let inv_home = resolve_inventory_home();
    // Config errors are reported once logging is up.
    let (user_cfg, cfg_error) = match load_user_config(&inv_home) {
        Ok(cfg) => (cfg, None),
        Err(e) => (None, Some(e)),
    };
    init_tracing(&inv_home, user_cfg.as_ref());
    if let Some(e) = cfg_error {
        tracing::warn!("ignoring user config: {:#}", e);
    }

    env_flags! {
        /// Home directory to scan. Defaults to the current user's home.
        SCAN_HOME: &str = "";
        /// Platform layout: "linux", "windows" or "macos". Defaults to the running OS.
        SCAN_PLATFORM: &str = "";
        /// Vendor keys to scan (comma-separated). Empty scans all vendors.
        SCAN_VENDORS: &str = "";
        /// Extra files or directories to scan as custom locations (comma-separated, ~/ expanded)
        SCAN_EXTRA_PATHS: &str = "";
        /// Scan vendors concurrently
        SCAN_PARALLEL: bool = true;
        /// Depth bound for recursive directory sweeps; 0 means unlimited
        SCAN_MAX_DEPTH: usize = 0;
        /// Export directory. Defaults to <MCP_INVENTORY_HOME>/output
        OUTPUT_DIR: &str = "";
        /// Write mcp_inventory.csv
        OUTPUT_CSV: bool = true;
        /// Write mcp_inventory.json
        OUTPUT_JSON: bool = true;
        /// Print the risk summary to stdout
        PRINT_SUMMARY: bool = true;
    }

    let scan_cfg = user_cfg.as_ref().and_then(|c| c.scan.as_ref());
    let output_cfg = user_cfg.as_ref().and_then(|c| c.output.as_ref());
    tracing::info!("inventory_home={}", inv_home.display());

    let scan_home = if !(*SCAN_HOME).is_empty() {
        expand_home(*SCAN_HOME)
    } else if let Some(home) = scan_cfg.and_then(|c| c.home.as_deref()) {
        expand_home(home)
    } else {
        home_dir().context("could not determine the home directory; set SCAN_HOME")?
    };

    let platform = if !(*SCAN_PLATFORM).is_empty() {
        SCAN_PLATFORM.parse::<Platform>().map_err(anyhow::Error::msg)?
    } else if let Some(p) = scan_cfg.and_then(|c| c.platform.as_deref()) {
        p.parse::<Platform>().map_err(anyhow::Error::msg)?
    } else {
        Platform::current()
    };

    let vendor_keys = if !(*SCAN_VENDORS).is_empty() {
        split_list(*SCAN_VENDORS)
    } else {
        scan_cfg
            .and_then(|c| c.vendors.clone())
            .unwrap_or_default()
    };
    let vendors = parse_vendors(&vendor_keys)?;

    let extra_raw = if !(*SCAN_EXTRA_PATHS).is_empty() {
        split_list(*SCAN_EXTRA_PATHS)
    } else {
        scan_cfg
            .and_then(|c| c.extra_paths.clone())
            .unwrap_or_default()
    };
    let extra_paths: Vec<PathBuf> = extra_raw.iter().map(|p| expand_home(p)).collect();

    let max_depth = layered(
        env_set("SCAN_MAX_DEPTH"),
        *SCAN_MAX_DEPTH,
        scan_cfg.and_then(|c| c.max_depth),
    );
    let settings = ScanSettings {
        parallel: layered(
            env_set("SCAN_PARALLEL"),
            *SCAN_PARALLEL,
            scan_cfg.and_then(|c| c.parallel),
        ),
        max_depth: (max_depth > 0).then_some(max_depth),
    };

    let mut catalog = LocationCatalog::for_host(&HostDirs::resolve(platform, scan_home.clone()));
    if !vendors.is_empty() {
        catalog.retain_vendors(&vendors);
    }
    catalog.extend_custom(extra_paths);
    if catalog.is_empty() {
        tracing::warn!("no candidate locations to scan");
    }
    for vendor in catalog.vendors() {
        tracing::debug!(
            "{}: {} candidate location(s)",
            vendor.key(),
            catalog.candidates(vendor).len()
        );
    }

    let host = HostIdentity::detect();
    tracing::info!(
        "starting MCP server discovery on {} (user={}, platform={}, home={}, candidates={}, at={})",
        host.hostname,
        host.user,
        platform.system_name(),
        scan_home.display(),
        catalog.len(),
        iso8601(chrono::Utc::now())
    );

    let inventory = if settings.parallel {
        scan_concurrent(&catalog, &settings).await
    } else {
        scan(&catalog, &settings)
    };

    let print_summary = layered(
        env_set("PRINT_SUMMARY"),
        *PRINT_SUMMARY,
        output_cfg.and_then(|c| c.print_summary),
    );
    if print_summary {
        print!("{}", render_summary(&inventory));
    }

    let targets = ExportTargets {
        dir: if !(*OUTPUT_DIR).is_empty() {
            expand_home(*OUTPUT_DIR)
        } else if let Some(dir) = output_cfg.and_then(|c| c.dir.as_deref()) {
            expand_home(dir)
        } else {
            inv_home.join("output")
        },
        csv: layered(env_set("OUTPUT_CSV"), *OUTPUT_CSV, output_cfg.and_then(|c| c.csv)),
        json: layered(env_set("OUTPUT_JSON"), *OUTPUT_JSON, output_cfg.and_then(|c| c.json)),
    };
    match export_inventory(&inventory, &host, platform, &targets) {
        Ok(paths) if !paths.is_empty() => {
            tracing::info!("discovery complete; results in {}", targets.dir.display());
        }
        Ok(_) => {}
        Err(e) => tracing::error!("export failed: {}", e),
    }
    Ok(())
}
