// # zonesync - DNS zone reconciler
//
// Thin integration layer: all reconciliation logic lives in zonesync-core.
//
// The zonesync binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime
// 3. Registering providers
// 4. Running one reconciliation pass over the configured zones
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Provider
// - `ZONESYNC_PROVIDER_TYPE`: Provider type (hostingde)
// - `ZONESYNC_API_KEY`: API key
// - `ZONESYNC_BASE_URL`: API endpoint (optional)
// - `ZONESYNC_LIMIT`: Page size for zone lookups (optional, integer)
//
// ### Zones
// - `ZONESYNC_ZONES_FILE`: JSON file with the desired zones
//
// ### Reconciler
// - `ZONESYNC_MODE`: `dry-run` (default) or `live`
// - `ZONESYNC_MAX_CONCURRENT_ZONES`: Zones reconciled in parallel
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export ZONESYNC_API_KEY=your_key
// export ZONESYNC_ZONES_FILE=/etc/zonesync/zones.json
// export ZONESYNC_MODE=live
//
// zonesync
// ```

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::config::{
    DEFAULT_HOSTINGDE_BASE_URL, DEFAULT_PAGE_LIMIT, DesiredState, EngineConfig, ProviderConfig,
    SyncConfig,
};
use zonesync_core::{ProviderRegistry, ReconcileEvent, ReconcileReport, Reconciler, ZoneOutcome};

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonesyncExitCode {
    /// Every zone reconciled (or planned)
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// At least one zone failed
    ZoneFailures = 2,
    /// Runtime error (unexpected failure)
    RuntimeError = 3,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    provider_type: String,
    api_key: String,
    base_url: String,
    limit: u32,
    zones_file: String,
    dry_run: bool,
    max_concurrent_zones: Option<usize>,
    log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider_type", &self.provider_type)
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("limit", &self.limit)
            .field("zones_file", &self.zones_file)
            .field("dry_run", &self.dry_run)
            .field("max_concurrent_zones", &self.max_concurrent_zones)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from a variable lookup
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let limit = match get("ZONESYNC_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("ZONESYNC_LIMIT can not be parsed to int: {:?}", raw))?,
            None => DEFAULT_PAGE_LIMIT,
        };

        let max_concurrent_zones = get("ZONESYNC_MAX_CONCURRENT_ZONES")
            .map(|raw| {
                raw.trim().parse().with_context(|| {
                    format!("ZONESYNC_MAX_CONCURRENT_ZONES must be an integer: {:?}", raw)
                })
            })
            .transpose()?;

        let dry_run = match get("ZONESYNC_MODE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("dry-run") => true,
            Some("live") => false,
            Some(other) => anyhow::bail!(
                "ZONESYNC_MODE '{}' is not valid. Valid modes: dry-run, live",
                other
            ),
        };

        Ok(Self {
            provider_type: get("ZONESYNC_PROVIDER_TYPE").unwrap_or_else(|| "hostingde".to_string()),
            api_key: get("ZONESYNC_API_KEY").unwrap_or_default(),
            base_url: get("ZONESYNC_BASE_URL")
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_HOSTINGDE_BASE_URL.to_string()),
            limit,
            zones_file: get("ZONESYNC_ZONES_FILE").unwrap_or_default(),
            dry_run,
            max_concurrent_zones,
            log_level: get("ZONESYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            anyhow::bail!(
                "ZONESYNC_API_KEY is required. \
                Set it via: export ZONESYNC_API_KEY=your_key"
            );
        }

        if self.zones_file.is_empty() {
            anyhow::bail!(
                "ZONESYNC_ZONES_FILE is required. \
                Set it via: export ZONESYNC_ZONES_FILE=/etc/zonesync/zones.json"
            );
        }

        if !std::path::Path::new(&self.zones_file).exists() {
            anyhow::bail!("ZONESYNC_ZONES_FILE does not exist: {}", self.zones_file);
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.provider_config().validate()?;
        self.engine_config().validate()?;

        Ok(())
    }

    fn provider_config(&self) -> ProviderConfig {
        match self.provider_type.as_str() {
            "hostingde" => ProviderConfig::HostingDe {
                api_key: self.api_key.clone(),
                base_url: self.base_url.clone(),
                limit: self.limit,
            },
            other => ProviderConfig::Custom {
                factory: other.to_string(),
                config: serde_json::json!({
                    "api_key": self.api_key,
                    "base_url": self.base_url,
                    "limit": self.limit,
                }),
            },
        }
    }

    fn engine_config(&self) -> EngineConfig {
        let mut engine = EngineConfig {
            dry_run: self.dry_run,
            ..EngineConfig::default()
        };
        if let Some(max) = self.max_concurrent_zones {
            engine.max_concurrent_zones = max;
        }
        engine
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    info!(
        "Starting zonesync [mode: {}]",
        if config.dry_run { "DRY-RUN" } else { "LIVE" }
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config).await {
            Ok(code) => code,
            Err(e) => {
                error!("zonesync error: {:#}", e);
                ZonesyncExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run one reconciliation pass
async fn run(config: Config) -> Result<ZonesyncExitCode> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "hostingde")]
    {
        info!("Registering hosting.de provider");
        zonesync_provider_hostingde::register(&registry);
    }

    let state = DesiredState::from_file(&config.zones_file)
        .with_context(|| format!("Failed to load zones from {}", config.zones_file))?;

    let sync_config = SyncConfig {
        provider: config.provider_config(),
        zones: state.zones,
        engine: config.engine_config(),
    };
    if let Err(e) = sync_config.validate() {
        error!("Invalid zones file: {}", e);
        return Ok(ZonesyncExitCode::ConfigError);
    }

    let client = match registry.create_client(&sync_config.provider) {
        Ok(client) => client,
        Err(e) => {
            error!(
                "Failed to create provider '{}': {} (registered: {:?})",
                sync_config.provider.type_name(),
                e,
                registry.list_providers()
            );
            return Ok(ZonesyncExitCode::ConfigError);
        }
    };

    let (reconciler, mut events) = Reconciler::new(client, sync_config.engine.clone())?;
    let reconciler = Arc::new(reconciler);

    let event_logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let report = tokio::select! {
        report = reconciler.reconcile(sync_config.zones) => report,
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("Interrupted; corrections already submitted are not rolled back");
            return Ok(ZonesyncExitCode::RuntimeError);
        }
    };

    // Dropping the reconciler closes the event channel.
    drop(reconciler);
    if let Err(e) = event_logger.await {
        warn!("Event logger task failed: {}", e);
    }

    print_report(&report);

    if report.has_failures() {
        error!("Failed zones: {}", report.failed_zones().join(", "));
        Ok(ZonesyncExitCode::ZoneFailures)
    } else {
        Ok(ZonesyncExitCode::Success)
    }
}

fn log_event(event: &ReconcileEvent) {
    match event {
        ReconcileEvent::ZonePlanned { zone, corrections } => {
            info!("Zone {}: {} correction(s) planned", zone, corrections)
        }
        ReconcileEvent::ZoneInSync { zone } => info!("Zone {}: in sync", zone),
        ReconcileEvent::CorrectionApplied { zone, .. } => info!("Zone {}: correction applied", zone),
        ReconcileEvent::CorrectionFailed { zone, error } => {
            error!("Zone {}: correction failed: {}", zone, error)
        }
        ReconcileEvent::ZoneFailed { zone, error } => error!("Zone {}: {}", zone, error),
    }
}

fn print_report(report: &ReconcileReport) {
    for zone in &report.zones {
        match &zone.outcome {
            ZoneOutcome::InSync => println!("{}: in sync", zone.zone),
            ZoneOutcome::Planned { descriptions } => {
                for description in descriptions {
                    println!("{}", description);
                }
            }
            ZoneOutcome::Applied { corrections } => {
                println!("{}: {} correction(s) applied", zone.zone, corrections)
            }
            ZoneOutcome::Failed { error } => println!("{}: FAILED: {}", zone.zone, error),
        }
    }
}
