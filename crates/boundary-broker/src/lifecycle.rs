//! Process-scoped shared boundary instance.
//!
//! Most processes want exactly one boundary; this module holds it as
//! explicit state with a documented start/stop lifecycle instead of an
//! implicit global. Independent [`Boundary`] instances remain first-class
//! (tests create and tear down their own).

use tokio::sync::Mutex;

use boundary_core::error::Result;

use crate::boundary::Boundary;
use crate::config::BrokerConfig;

static SHARED: Mutex<Option<Boundary>> = Mutex::const_new(None);

/// Start the process-wide boundary, or return the one already running.
///
/// Idempotent at process scope: `config` is ignored when an instance
/// exists, and the existing addresses are reused.
pub async fn start_shared(config: BrokerConfig) -> Result<Boundary> {
    let mut shared = SHARED.lock().await;
    if let Some(boundary) = shared.as_ref() {
        return Ok(boundary.clone());
    }
    let boundary = Boundary::start(config).await?;
    *shared = Some(boundary.clone());
    Ok(boundary)
}

/// Stop and clear the process-wide boundary; a no-op when none is running.
pub async fn shutdown_shared() {
    let boundary = SHARED.lock().await.take();
    if let Some(boundary) = boundary {
        boundary.shutdown().await;
    }
}
