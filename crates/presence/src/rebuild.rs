use async_trait::async_trait;
use chrono::{DateTime, Utc};
use frontdesk_core::models::{PresenceMap, SwitchEvent};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::reconcile::reconcile;

/// Remote ledger page cap for switch requests.
pub const REBUILD_PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
#[error("switch source error: {0}")]
pub struct SourceError(pub String);

/// Backward-paginating supplier of switch history.
#[async_trait]
pub trait SwitchSource {
    /// Newest-first batch of up to `limit` events strictly before
    /// `cursor`.
    async fn fetch_before(
        &self,
        cursor: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SwitchEvent>, SourceError>;
}

/// Walk the entire switch history backward from `start` and fold every
/// page into the presence map.
///
/// Each page is applied with [`reconcile`] and the cursor advances to the
/// returned watermark, so consecutive pages overlap by exactly one event
/// and no boundary transition is lost. Pagination ends when a page holds
/// fewer than two events, which marks the start of history.
///
/// A transport failure on any page ends the run where it stands; the
/// partially-updated map is still valid, and a later rebuild or the
/// steady-state poller fills in the rest. `page_delay` spaces consecutive
/// requests to stay under the upstream rate limit.
pub async fn rebuild_history<S: SwitchSource>(
    source: &S,
    seen: &mut PresenceMap,
    zero_point: DateTime<Utc>,
    start: DateTime<Utc>,
    page_delay: Duration,
) {
    let mut cursor = start;
    info!("rebuilding presence history from {}", cursor);

    loop {
        tokio::time::sleep(page_delay).await;

        let batch = match source.fetch_before(cursor, REBUILD_PAGE_SIZE).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!("unable to fetch switch history before {}: {}", cursor, e);
                return;
            }
        };

        // A short page means we have reached the start of history
        if batch.len() < 2 {
            break;
        }

        match reconcile(&batch, seen, zero_point) {
            Some(watermark) => cursor = watermark,
            None => break,
        }
    }

    info!("presence rebuild complete, {} members tracked", seen.len());
}
