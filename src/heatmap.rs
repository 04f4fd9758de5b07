//! Aggregation pipeline turning a wallet's transfer history for one calendar
//! year into a fixed 12x12 grid of activity counts with a derived color
//! scale. Rows are months, columns are ~3-day buckets within the month.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use alloy::primitives::Address;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    alchemy::{AssetTransfer, TransferCategory, TransferQuery},
    network::{BlockRange, Network},
    range::resolve_range,
    traits::{BlockLookup, TransferSource},
};

pub const GRID_DIM: usize = 12;

/// Days per grid column within a month.
const DAYS_PER_CELL: u32 = 3;

/// Opacity assigned to a zero-count cell; a cell at the grid maximum gets 1.0.
const MIN_OPACITY: f64 = 0.1;

/// Upper bound on the pagination loop. The transfers API signals completion
/// by omitting the page key, so a cursor that never disappears (or cycles)
/// would otherwise loop forever.
pub const MAX_TRANSFER_PAGES: usize = 50;

/// Canvas color behind the rendered grid.
pub const BACKGROUND: Rgb = Rgb {
    r: 0x28,
    g: 0x27,
    b: 0x2c,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FromStr for Rgb {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6)
            .ok_or_else(|| crate::Error::InvalidColor(s.to_string()))?;
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| crate::Error::InvalidColor(s.to_string()))
        };
        Ok(Rgb {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = crate::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> String {
        color.to_string()
    }
}

/// Color endpoints of a network's heatmap scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatScale {
    pub low: Rgb,
    pub high: Rgb,
}

impl Default for HeatScale {
    // the Mainnet grays
    fn default() -> Self {
        HeatScale {
            low: Rgb {
                r: 0x3c,
                g: 0x3c,
                b: 0x3d,
            },
            high: Rgb {
                r: 0x8c,
                g: 0x8c,
                b: 0x8c,
            },
        }
    }
}

/// Aggregate for one calendar day, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub row: usize,
    pub column: usize,
    pub count: u32,
}

/// The 12x12 presentation grid. Always full-size regardless of year or
/// month length; cells no date maps into stay at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: [[u32; GRID_DIM]; GRID_DIM],
}

impl Grid {
    pub fn zero() -> Self {
        Grid {
            cells: [[0; GRID_DIM]; GRID_DIM],
        }
    }

    pub fn get(&self, row: usize, column: usize) -> u32 {
        self.cells[row][column]
    }

    pub fn rows(&self) -> &[[u32; GRID_DIM]; GRID_DIM] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, columns)| {
            columns
                .iter()
                .enumerate()
                .map(move |(column, &count)| GridCell { row, column, count })
        })
    }

    pub fn max_count(&self) -> u32 {
        self.iter().map(|cell| cell.count).max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.iter().map(|cell| u64::from(cell.count)).sum()
    }
}

/// How a day's count lands in its grid cell. `Sum` accumulates every day of
/// the ~3-day bucket. `Overwrite` is the legacy fold: each day replaces the
/// cell, so only the last day of a bucket stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridFold {
    #[default]
    Sum,
    Overwrite,
}

/// Continuous mapping from a cell count to a display color and opacity,
/// normalized to the maximum count in the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMapping {
    pub scale: HeatScale,
    pub color_max: u32,
}

impl ColorMapping {
    pub fn new(scale: HeatScale, color_max: u32) -> Self {
        ColorMapping { scale, color_max }
    }

    /// Position of a count on the scale. An all-zero grid has no spread, so
    /// everything sits at the low endpoint rather than dividing by zero.
    fn fraction(&self, count: u32) -> f64 {
        if self.color_max == 0 {
            0.0
        } else {
            f64::from(count.min(self.color_max)) / f64::from(self.color_max)
        }
    }

    pub fn opacity(&self, count: u32) -> f64 {
        MIN_OPACITY + (1.0 - MIN_OPACITY) * self.fraction(count)
    }

    pub fn color(&self, count: u32) -> Rgb {
        let fraction = self.fraction(count);
        let channel = |low: u8, high: u8| {
            (f64::from(low) + (f64::from(high) - f64::from(low)) * fraction).round() as u8
        };
        Rgb {
            r: channel(self.scale.low.r, self.scale.high.r),
            g: channel(self.scale.low.g, self.scale.high.g),
            b: channel(self.scale.low.b, self.scale.high.b),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeatmapRequest {
    /// No address is a legitimate state (no wallet connected yet) and
    /// produces the all-zero grid instead of an error.
    pub address: Option<Address>,
    pub year: i32,
    pub categories: Vec<TransferCategory>,
    pub fold: GridFold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub grid: Grid,
    pub colors: ColorMapping,
}

/// Run the full pipeline: resolve the year's block window, drive the
/// transfer pagination to completion, bucket by UTC day and fold into the
/// grid. Any failure mid-pagination aborts the whole run; a partial grid
/// would silently understate activity.
pub async fn aggregate<S, L>(
    source: &S,
    lookup: &L,
    network: &Network,
    request: &HeatmapRequest,
) -> crate::Result<Heatmap>
where
    S: TransferSource + Sync,
    L: BlockLookup + Sync,
{
    NaiveDate::from_ymd_opt(request.year, 1, 1)
        .ok_or(crate::Error::InvalidYear(request.year))?;

    let Some(address) = request.address else {
        return Ok(Heatmap {
            grid: Grid::zero(),
            colors: ColorMapping::new(network.palette(), 0),
        });
    };

    let range = resolve_range(lookup, network, request.year).await?;
    let transfers =
        fetch_all_transfers(source, network, &range, address, request.categories.clone()).await?;
    let days = daily_counts(request.year, &transfers)?;
    let grid = fold_grid(&days, request.fold);
    let colors = ColorMapping::new(network.palette(), grid.max_count());

    Ok(Heatmap { grid, colors })
}

/// Drive the paged transfer query until the response omits a continuation
/// cursor, accumulating every record. Pages are inherently sequential, each
/// request needs the cursor from the previous one.
async fn fetch_all_transfers<S>(
    source: &S,
    network: &Network,
    range: &BlockRange,
    address: Address,
    categories: Vec<TransferCategory>,
) -> crate::Result<Vec<AssetTransfer>>
where
    S: TransferSource + Sync,
{
    let base = TransferQuery::year_window(range, address, categories);

    let mut transfers = Vec::new();
    let mut page_key: Option<String> = None;
    let mut pages = 0usize;

    loop {
        if pages == MAX_TRANSFER_PAGES {
            return Err(crate::Error::TooManyPages {
                limit: MAX_TRANSFER_PAGES,
            });
        }

        let query = base.with_page_key(page_key.take());
        let page = source
            .transfers_page(network, &query)
            .await
            .map_err(|e| crate::Error::SourceUnavailable {
                page: pages + 1,
                source: Box::new(e),
            })?;
        pages += 1;

        tracing::debug!(page = pages, records = page.transfers.len(), "fetched transfer page");
        transfers.extend(page.transfers);

        match page.page_key {
            Some(key) => page_key = Some(key),
            None => break,
        }
    }

    Ok(transfers)
}

/// One count per calendar day of the year, in date order. A transfer counts
/// towards the UTC day window [00:00:00, 23:59:59] its block timestamp falls
/// in. Records without a usable timestamp are skipped, not fatal.
pub fn daily_counts(year: i32, transfers: &[AssetTransfer]) -> crate::Result<Vec<DailyCount>> {
    let first_day =
        NaiveDate::from_ymd_opt(year, 1, 1).ok_or(crate::Error::InvalidYear(year))?;

    let mut buckets: HashMap<NaiveDate, u32> = HashMap::new();
    for transfer in transfers {
        match transfer.timestamp() {
            Some(timestamp) => {
                let date = timestamp.date_naive();
                if date.year() == year {
                    *buckets.entry(date).or_default() += 1;
                }
            }
            None => {
                tracing::warn!(
                    block = %transfer.block_num,
                    "transfer has no usable block timestamp, skipping"
                );
            }
        }
    }

    Ok(first_day
        .iter_days()
        .take_while(|date| date.year() == year)
        .map(|date| DailyCount {
            date,
            count: buckets.get(&date).copied().unwrap_or(0),
        })
        .collect())
}

/// Fold the ordered daily counts into the 12x12 grid: row is the month,
/// column is the day's ~3-day bucket within the month.
pub fn fold_grid(days: &[DailyCount], fold: GridFold) -> Grid {
    let mut grid = Grid::zero();
    for day in days {
        let row = day.date.month0() as usize;
        let column = ((day.date.day() - 1) / DAYS_PER_CELL) as usize;
        match fold {
            GridFold::Sum => grid.cells[row][column] += day.count,
            GridFold::Overwrite => grid.cells[row][column] = day.count,
        }
    }
    grid
}
