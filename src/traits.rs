//! Seams for the external services the aggregation consumes. The production
//! implementation is [`crate::alchemy::Alchemy`]; tests substitute mocks.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
    alchemy::{BlockStamp, LookupDirection, TransferQuery, TransfersPage},
    network::Network,
};

/// Paged transfer-history query. One call returns one page; the returned
/// page key, when present, goes into the next query's `page_key`.
pub trait TransferSource {
    fn transfers_page(
        &self,
        network: &Network,
        query: &TransferQuery,
    ) -> impl Future<Output = crate::Result<TransfersPage>> + Send;
}

/// Resolve a timestamp to the nearest block in the given direction.
pub trait BlockLookup {
    fn block_by_timestamp(
        &self,
        network: &Network,
        timestamp: DateTime<Utc>,
        direction: LookupDirection,
    ) -> impl Future<Output = crate::Result<BlockStamp>> + Send;
}
