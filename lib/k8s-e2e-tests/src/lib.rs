//! Post-deployment checks of the Fence Agents Remediation (FAR) operator.
//!
//! The cases run against a live cluster, see `tests/far-operator.rs`. The
//! pieces that do not need one are unit tested in place.

pub mod error;
pub mod params;
pub mod rapidast;
pub mod report;
mod scenarios;
pub mod settings;

use std::env;

use k8s_test_framework::{Framework, Interface};

pub use error::{Error, Result};
pub use report::ScanReport;
pub use scenarios::{setup, verify_operator_pods_running, verify_trivy_scan};
pub use settings::Settings;

/// Install the log subscriber for a test run. `TEST_LOG` holds the filter,
/// `info` when unset. Safe to call from every test.
pub fn init() {
    let filter = env::var("TEST_LOG").unwrap_or_else(|_| "info".to_owned());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Build a [`Framework`] from the process environment.
pub async fn make_framework() -> Result<Framework> {
    let interface = Interface::from_env()?;
    Ok(Framework::connect(interface).await?)
}
