//! Selection of the hourly data shown for a day.
//!
//! Two navigation modes share the same day filter: fixed 6-hour blocks, where
//! the selection key carries the block, and pages, where the whole day is
//! chunked into pages of [`PAGE_SIZE`] points.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::WindowError;
use crate::weather::ForecastPoint;

pub const BLOCK_HOURS: u32 = 6;
pub const PAGE_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HourlyMode {
    #[default]
    Pages,
    Blocks,
}

/// A 6-hour window of a day, identified by its start hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Block(u32);

impl Block {
    pub const ALL: [Block; 4] = [Block(0), Block(6), Block(12), Block(18)];

    /// Returns `None` unless `start_hour` is one of 0, 6, 12, 18.
    pub fn new(start_hour: u32) -> Option<Self> {
        (start_hour < 24 && start_hour % BLOCK_HOURS == 0).then_some(Block(start_hour))
    }

    pub fn start_hour(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.0 <= hour && hour < self.0 + BLOCK_HOURS
    }

    pub fn next(&self) -> Option<Self> {
        Block::new(self.0 + BLOCK_HOURS)
    }

    pub fn prev(&self) -> Option<Self> {
        self.0.checked_sub(BLOCK_HOURS).and_then(Block::new)
    }

    pub fn label(&self) -> String {
        format!("{:02}:00-{:02}:00", self.0, self.0 + BLOCK_HOURS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionKey {
    pub date: NaiveDate,
    pub block: Option<Block>,
}

impl SelectionKey {
    pub fn day(date: NaiveDate) -> Self {
        Self { date, block: None }
    }

    pub fn block(date: NaiveDate, block: Block) -> Self {
        Self {
            date,
            block: Some(block),
        }
    }
}

/// Points of `series` on `key.date`, restricted to `key.block` when present.
/// Input order is kept; an empty result means there is nothing to show.
pub fn select_window<'a>(series: &'a [ForecastPoint], key: &SelectionKey) -> Vec<&'a ForecastPoint> {
    series
        .iter()
        .filter(|p| p.date() == key.date)
        .filter(|p| key.block.map_or(true, |b| b.contains(p.hour())))
        .collect()
}

/// A day window split into pages of [`PAGE_SIZE`] points.
#[derive(Debug)]
pub struct Pages<'a> {
    window: Vec<&'a ForecastPoint>,
}

impl<'a> Pages<'a> {
    pub fn new(window: Vec<&'a ForecastPoint>) -> Self {
        Self { window }
    }

    pub fn page_count(&self) -> usize {
        self.window.len().div_ceil(PAGE_SIZE)
    }

    pub fn get_page(&self, page: isize) -> Result<&[&'a ForecastPoint], WindowError> {
        let invalid = WindowError::InvalidPage {
            page,
            page_count: self.page_count(),
        };
        let index = usize::try_from(page).map_err(|_| invalid.clone())?;
        if index >= self.page_count() {
            return Err(invalid);
        }
        let start = index * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(self.window.len());
        Ok(&self.window[start..end])
    }

    pub fn has_prev(&self, page: usize) -> bool {
        page > 0 && page < self.page_count()
    }

    pub fn has_next(&self, page: usize) -> bool {
        page + 1 < self.page_count()
    }
}
