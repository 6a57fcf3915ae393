//! Cross-crate integration flows.

pub mod bridge_flows;
pub mod messaging_flows;
pub mod storage_flows;

use std::future::Future;
use std::time::Duration;

/// Await `future` or fail the test after two seconds.
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), future)
        .await
        .expect("timed out")
}
