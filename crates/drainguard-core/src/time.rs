//! Time helpers: duration strings, call deadlines, and wall-clock stamps.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{GuardError, GuardResult};

/// Parse a duration string like "5s", "500ms", "2m", or a bare number of seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

/// Run a collaborator call, failing with [`GuardError::Timeout`] if it
/// outlives `limit`. `None` leaves the call unbounded.
pub async fn with_timeout<T, F>(call: &'static str, limit: Option<Duration>, fut: F) -> GuardResult<T>
where
    F: Future<Output = GuardResult<T>>,
{
    match limit {
        Some(after) => match tokio::time::timeout(after, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(call, ?after, "external call timed out");
                Err(GuardError::Timeout { call, after })
            }
        },
        None => fut.await,
    }
}

/// Seconds since the unix epoch.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
