//! Worker pool supervision
//!
//! Runs one build stream per configured compiler profile, all profiles
//! concurrently. Each stream gets its own catalog snapshot and walks the
//! full top-level unit list sequentially; parallelism exists only across
//! compiler profiles, never inside one profile's dependency chain.
//! Streams are independent; one stream failing, or exhausting its units
//! with failures, never halts the others.

use serde::Serialize;

use crate::core::catalog::Catalog;
use crate::core::driver::ToolchainDriver;
use crate::core::manifest::CompilerProfile;
use crate::core::orchestrator::{Orchestrator, SkipReason, UnitOutcome};
use crate::core::resolver::BuildUnit;

/// Final status of one unit within one stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    /// Toolchain ran and succeeded
    Built,
    /// Toolchain bypassed
    Skipped,
    /// Build failed
    Failed,
}

/// Report for one top-level unit in one stream
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    /// Library name
    pub library: String,
    /// Library version
    pub version: String,
    /// Final status
    pub status: UnitStatus,
    /// Skip or failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Report for one compiler profile's stream
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    /// Profile name
    pub profile: String,
    /// Per-unit outcomes in schedule order
    pub units: Vec<UnitReport>,
    /// Fatal error that aborted the stream, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<String>,
}

impl ProfileReport {
    /// Number of units with the given status
    fn count(&self, status: &UnitStatus) -> usize {
        self.units.iter().filter(|u| &u.status == status).count()
    }

    /// Units whose toolchain ran and succeeded
    pub fn built(&self) -> usize {
        self.count(&UnitStatus::Built)
    }

    /// Units bypassed without an error
    pub fn skipped(&self) -> usize {
        self.count(&UnitStatus::Skipped)
    }

    /// Units that failed
    pub fn failed(&self) -> usize {
        self.count(&UnitStatus::Failed)
    }

    /// True when nothing failed and the stream was not aborted
    pub fn is_success(&self) -> bool {
        self.fatal.is_none() && self.failed() == 0
    }
}

/// Launches one build stream per compiler profile
pub struct Supervisor {
    catalog: Catalog,
    units: Vec<BuildUnit>,
    profiles: Vec<CompilerProfile>,
    driver: ToolchainDriver,
}

impl Supervisor {
    /// Create a supervisor over the full unit set and compiler matrix
    pub fn new(
        catalog: Catalog,
        units: Vec<BuildUnit>,
        profiles: Vec<CompilerProfile>,
        driver: ToolchainDriver,
    ) -> Self {
        Self {
            catalog,
            units,
            profiles,
            driver,
        }
    }

    /// Run all streams to completion and collect their reports
    ///
    /// One OS thread per profile; every thread works on its own catalog
    /// snapshot, so no `built` state is shared across streams and no
    /// locking is required. Reports come back in profile order.
    pub fn run(self) -> Vec<ProfileReport> {
        let Self {
            catalog,
            units,
            profiles,
            driver,
        } = self;

        std::thread::scope(|scope| {
            let handles: Vec<_> = profiles
                .into_iter()
                .map(|profile| {
                    let name = profile.name.clone();
                    let snapshot = catalog.clone();
                    let driver = driver.clone();
                    let units = &units;
                    (
                        name,
                        scope.spawn(move || run_stream(snapshot, units, profile, driver)),
                    )
                })
                .collect();

            handles
                .into_iter()
                .map(|(name, handle)| match handle.join() {
                    Ok(report) => report,
                    Err(_) => ProfileReport {
                        profile: name,
                        units: Vec::new(),
                        fatal: Some("build stream panicked".to_string()),
                    },
                })
                .collect()
        })
    }
}

/// Run the orchestrator over every top-level unit for one profile
fn run_stream(
    catalog: Catalog,
    units: &[BuildUnit],
    profile: CompilerProfile,
    driver: ToolchainDriver,
) -> ProfileReport {
    let profile_name = profile.name.clone();
    tracing::info!("starting build stream for {profile_name}");

    let mut orchestrator = Orchestrator::new(catalog, profile, driver);
    let mut reports = Vec::new();

    for unit in units {
        match orchestrator.build(unit) {
            Ok(outcome) => reports.push(unit_report(unit, &outcome)),
            Err(fatal) => {
                // Configuration-level problem: abort this stream only.
                tracing::error!("stream {profile_name} aborted: {fatal}");
                return ProfileReport {
                    profile: profile_name,
                    units: reports,
                    fatal: Some(fatal.to_string()),
                };
            }
        }
    }

    ProfileReport {
        profile: profile_name,
        units: reports,
        fatal: None,
    }
}

fn unit_report(unit: &BuildUnit, outcome: &UnitOutcome) -> UnitReport {
    let (status, detail) = match outcome {
        UnitOutcome::Built => (UnitStatus::Built, None),
        UnitOutcome::Skipped(reason) => {
            let detail = match reason {
                SkipReason::AlreadyBuilt => "already built",
                SkipReason::Disallowed64Bit => "64-bit build disallowed",
                SkipReason::PriorOutput => "prior output present",
            };
            (UnitStatus::Skipped, Some(detail.to_string()))
        }
        UnitOutcome::Failed(error) => (UnitStatus::Failed, Some(error.to_string())),
    };

    UnitReport {
        library: unit.name.clone(),
        version: unit.version.clone(),
        status,
        detail,
    }
}
