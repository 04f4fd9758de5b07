use chrono::{DateTime, TimeZone, Utc};

use crate::{
    alchemy::LookupDirection,
    network::{BlockRange, Network},
    traits::BlockLookup,
};

/// Resolve the inclusive block window covering a calendar year on a chain.
///
/// Networks carrying a static entry for the year resolve without any
/// external call. Otherwise both boundaries are looked up through the
/// block-by-timestamp API, start and end concurrently. A failed lookup
/// surfaces as [`crate::Error::RangeUnavailable`]; the caller decides
/// whether to retry or abort.
pub async fn resolve_range<L>(lookup: &L, network: &Network, year: i32) -> crate::Result<BlockRange>
where
    L: BlockLookup + Sync,
{
    if let Some(range) = network.year_range(year) {
        return Ok(range);
    }

    let (start_ts, end_ts) = year_bounds(year)?;

    let (start, end) = tokio::join!(
        lookup.block_by_timestamp(network, start_ts, LookupDirection::After),
        lookup.block_by_timestamp(network, end_ts, LookupDirection::Before),
    );

    let start = start.map_err(|e| range_unavailable(network, year, e))?;
    let end = end.map_err(|e| range_unavailable(network, year, e))?;

    Ok(BlockRange {
        start: start.number,
        end: end.number,
    })
}

/// First and last instant of the year, UTC.
fn year_bounds(year: i32) -> crate::Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc
        .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .ok_or(crate::Error::InvalidYear(year))?;
    let end = Utc
        .with_ymd_and_hms(year, 12, 31, 23, 59, 59)
        .single()
        .ok_or(crate::Error::InvalidYear(year))?;
    Ok((start, end))
}

fn range_unavailable(network: &Network, year: i32, source: crate::Error) -> crate::Error {
    crate::Error::RangeUnavailable {
        network: network.name.clone(),
        year,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use chrono::Datelike;

    use super::*;
    use crate::alchemy::BlockStamp;

    struct BoundaryLookup;

    impl BlockLookup for BoundaryLookup {
        async fn block_by_timestamp(
            &self,
            _network: &Network,
            timestamp: DateTime<Utc>,
            direction: LookupDirection,
        ) -> crate::Result<BlockStamp> {
            // start boundary asks forwards from Jan 1, end backwards from Dec 31
            let number = match direction {
                LookupDirection::After => {
                    assert_eq!((timestamp.month(), timestamp.day()), (1, 1));
                    100
                }
                LookupDirection::Before => {
                    assert_eq!((timestamp.month(), timestamp.day()), (12, 31));
                    200
                }
            };
            Ok(BlockStamp {
                number,
                timestamp,
            })
        }
    }

    struct DownLookup;

    impl BlockLookup for DownLookup {
        async fn block_by_timestamp(
            &self,
            _network: &Network,
            _timestamp: DateTime<Utc>,
            _direction: LookupDirection,
        ) -> crate::Result<BlockStamp> {
            Err(crate::Error::AlchemyResponse("service down"))
        }
    }

    fn network_with_range() -> Network {
        Network {
            name: "Mainnet".to_string(),
            chain_id: 1,
            block_ranges: BTreeMap::from([(
                2024,
                BlockRange {
                    start: 18908895,
                    end: 21525890,
                },
            )]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn static_table_short_circuits() {
        // DownLookup errors on any call, so an Ok proves no call was made
        let range = resolve_range(&DownLookup, &network_with_range(), 2024)
            .await
            .unwrap();
        assert_eq!(
            range,
            BlockRange {
                start: 18908895,
                end: 21525890,
            }
        );
    }

    #[tokio::test]
    async fn dynamic_path_resolves_both_boundaries() {
        let network = Network {
            name: "Base".to_string(),
            chain_id: 8453,
            ..Default::default()
        };
        let range = resolve_range(&BoundaryLookup, &network, 2024).await.unwrap();
        assert_eq!(range, BlockRange { start: 100, end: 200 });
    }

    #[tokio::test]
    async fn lookup_failure_is_range_unavailable() {
        let network = Network {
            name: "Base".to_string(),
            chain_id: 8453,
            ..Default::default()
        };
        let err = resolve_range(&DownLookup, &network, 2024).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::RangeUnavailable { year: 2024, .. }
        ));
    }

    #[test]
    fn year_bounds_cover_the_whole_year() {
        let (start, end) = year_bounds(2024).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-12-31T23:59:59+00:00");
    }
}
