//! Zone reconciler
//!
//! The Reconciler is responsible for:
//! - Fetching each zone from the remote authority
//! - Decoding and normalizing existing and desired records
//! - Diffing the two sets and building corrections
//! - Executing corrections (unless running dry)
//!
//! ## Architecture
//!
//! ```text
//!   ZoneSpec (desired)            ZoneClient::fetch_zone
//!          │                               │
//!          │                        adapter::decode
//!          ▼                               ▼
//!     normalize ─────────┐       ┌──── normalize
//!                        ▼       ▼
//!                       diff::diff
//!                           │
//!                           ▼
//!              correction::build_corrections
//!                           │
//!                           ▼
//!                 Correction::execute (live only)
//! ```
//!
//! ## Isolation
//!
//! Every zone is reconciled in its own task. Zones share no mutable state;
//! a failure in one zone never stops another. Within a zone, corrections
//! run strictly in order and the first failure abandons the rest.

use crate::adapter::decode;
use crate::config::{EngineConfig, ZoneSpec};
use crate::correction::{Correction, build_corrections};
use crate::diff::diff;
use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::traits::ZoneClient;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Corrections were planned for a zone
    ZonePlanned { zone: String, corrections: usize },

    /// A zone already matches the desired state
    ZoneInSync { zone: String },

    /// A correction was executed successfully
    CorrectionApplied { zone: String, description: String },

    /// A correction failed; the zone's remaining corrections are skipped
    CorrectionFailed { zone: String, error: String },

    /// A zone could not be planned
    ZoneFailed { zone: String, error: String },
}

/// Final state of one zone after reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneOutcome {
    /// Nothing to change
    InSync,
    /// Dry run: corrections planned but not executed
    Planned { descriptions: Vec<String> },
    /// Corrections executed
    Applied { corrections: usize },
    /// Planning or execution failed
    Failed { error: String },
}

/// Per-zone result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneReport {
    pub zone: String,
    pub outcome: ZoneOutcome,
}

/// Result of reconciling a set of zones, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub zones: Vec<ZoneReport>,
}

impl ReconcileReport {
    /// Whether any zone failed
    pub fn has_failures(&self) -> bool {
        self.zones
            .iter()
            .any(|report| matches!(report.outcome, ZoneOutcome::Failed { .. }))
    }

    /// Names of the zones that failed
    pub fn failed_zones(&self) -> Vec<&str> {
        self.zones
            .iter()
            .filter(|report| matches!(report.outcome, ZoneOutcome::Failed { .. }))
            .map(|report| report.zone.as_str())
            .collect()
    }
}

/// Reconciles desired zones against a remote authority
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Wrap in an `Arc` and call [`Reconciler::reconcile()`], or drive single
///    zones with [`Reconciler::plan_zone()`] and [`Reconciler::apply_zone()`]
///
/// ## Concurrency
///
/// At most `max_concurrent_zones` zones are in flight at once. The
/// reconciler never locks a zone against other processes; callers must
/// serialize runs against the same zone themselves.
pub struct Reconciler {
    /// Remote authority client
    client: Arc<dyn ZoneClient>,

    /// Reconciler settings
    config: EngineConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields
    /// reconciler events
    pub fn new(
        client: Arc<dyn ZoneClient>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let reconciler = Self {
            client,
            config,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Whether corrections are only planned, never executed
    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// Compute the corrections for one zone
    ///
    /// # Errors
    ///
    /// Lookup, conversion, diff and capability errors abort planning for
    /// the zone; no partial correction is ever returned.
    pub async fn plan_zone(&self, zone: &ZoneSpec) -> Result<Vec<Correction>> {
        let name = zone.normalized_name();
        let desired = normalize(zone.qualified_records()?);

        self.client
            .capabilities()
            .check(self.client.provider_name(), &desired)?;

        let fetched = self.client.fetch_zone(&name).await?;
        debug!(
            "Fetched zone {}: {} existing record(s), {} desired",
            name,
            fetched.records.len(),
            desired.len()
        );

        let existing = fetched
            .records
            .iter()
            .map(|record| decode(&name, record))
            .collect::<Result<Vec<_>>>()?;

        let existing = normalize(existing);

        let zone_diff = diff(&desired, &existing)?;
        let corrections =
            build_corrections(Arc::clone(&self.client), &fetched.handle, zone_diff.entries())?;

        if corrections.is_empty() {
            self.emit_event(ReconcileEvent::ZoneInSync { zone: name });
        } else {
            self.emit_event(ReconcileEvent::ZonePlanned {
                zone: name,
                corrections: corrections.len(),
            });
        }

        Ok(corrections)
    }

    /// Execute a zone's corrections in order
    ///
    /// Stops at the first failure; the remaining corrections of the zone
    /// are not attempted.
    ///
    /// # Returns
    ///
    /// The number of corrections executed.
    pub async fn apply_zone(&self, zone: &str, corrections: &[Correction]) -> Result<usize> {
        for (index, correction) in corrections.iter().enumerate() {
            match correction.execute().await {
                Ok(()) => {
                    self.emit_event(ReconcileEvent::CorrectionApplied {
                        zone: zone.to_string(),
                        description: correction.description().to_string(),
                    });
                }
                Err(e) => {
                    let skipped = corrections.len() - index - 1;
                    if skipped > 0 {
                        warn!("Skipping {} remaining correction(s) for zone {}", skipped, zone);
                    }
                    self.emit_event(ReconcileEvent::CorrectionFailed {
                        zone: zone.to_string(),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            }
        }

        Ok(corrections.len())
    }

    /// Plan and, unless running dry, apply one zone
    pub async fn reconcile_zone(&self, zone: &ZoneSpec) -> ZoneOutcome {
        let name = zone.normalized_name();

        let corrections = match self.plan_zone(zone).await {
            Ok(corrections) => corrections,
            Err(e) => {
                error!("Failed to plan zone {}: {}", name, e);
                self.emit_event(ReconcileEvent::ZoneFailed {
                    zone: name,
                    error: e.to_string(),
                });
                return ZoneOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        if corrections.is_empty() {
            info!("Zone {} is in sync", name);
            return ZoneOutcome::InSync;
        }

        if self.config.dry_run {
            for correction in &corrections {
                info!("[DRY-RUN] {}", correction.description());
            }
            return ZoneOutcome::Planned {
                descriptions: corrections
                    .iter()
                    .map(|c| c.description().to_string())
                    .collect(),
            };
        }

        match self.apply_zone(&name, &corrections).await {
            Ok(applied) => {
                info!("Zone {}: applied {} correction(s)", name, applied);
                ZoneOutcome::Applied {
                    corrections: applied,
                }
            }
            Err(e) => {
                error!("Failed to apply zone {}: {}", name, e);
                ZoneOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Reconcile several zones concurrently
    ///
    /// Each zone runs in its own task; the report lists zones in input
    /// order regardless of completion order.
    pub async fn reconcile(self: &Arc<Self>, zones: Vec<ZoneSpec>) -> ReconcileReport {
        let names: Vec<String> = zones.iter().map(ZoneSpec::normalized_name).collect();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_zones));
        let mut tasks = JoinSet::new();

        info!("Reconciling {} zone(s) via {}", zones.len(), self.client.provider_name());

        for (index, zone) in zones.into_iter().enumerate() {
            let reconciler = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // The semaphore is never closed, so acquisition only waits.
                let _permit = semaphore.acquire_owned().await;
                (index, reconciler.reconcile_zone(&zone).await)
            });
        }

        let mut outcomes: Vec<Option<ZoneOutcome>> = vec![None; names.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => error!("Zone task aborted: {}", e),
            }
        }

        let zones = names
            .into_iter()
            .zip(outcomes)
            .map(|(zone, outcome)| ZoneReport {
                zone,
                outcome: outcome.unwrap_or_else(|| ZoneOutcome::Failed {
                    error: Error::Other("zone task aborted".to_string()).to_string(),
                }),
            })
            .collect();

        ReconcileReport { zones }
    }

    /// Emit a reconciler event
    fn emit_event(&self, event: ReconcileEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(TrySendError::Closed(_)) => {
                // Nobody is listening; reconciliation does not depend on observers.
                debug!("Event receiver dropped, discarding event");
            }
        }
    }
}
