//! Slot locator.
//!
//! The booking table shows one time-of-day bucket at a time. Each hour
//! occupies a block of 13 rows; the first row of a block carries its
//! reservation control in column 4, the remaining rows in column 3.

// ============================================================================
// Imports
// ============================================================================

use crate::browser::Locator;

// ============================================================================
// Constants
// ============================================================================

/// Rows per hour block.
pub const ROWS_PER_HOUR: u32 = 13;

/// Row of the first block (row 1 is the table header).
pub const FIRST_ROW: u32 = 2;

// ============================================================================
// SlotPosition
// ============================================================================

/// Inclusive table row range holding one hour's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotPosition {
    /// First row of the block.
    pub row_start: u32,
    /// Last row of the block.
    pub row_end: u32,
}

/// Maps an hour to its row range in the currently loaded bucket view.
///
/// Hours six apart share geometry (6, 12 and 18 all start at row 2); the
/// caller must already have loaded the bucket containing `hour`.
#[must_use]
pub fn position(hour: u8) -> SlotPosition {
    let row_start = u32::from(hour % 6) * ROWS_PER_HOUR + FIRST_ROW;
    SlotPosition {
        row_start,
        row_end: row_start + ROWS_PER_HOUR - 1,
    }
}

impl SlotPosition {
    /// Builds the single lookup covering both column variants.
    ///
    /// The XPath union is evaluated in document order, so the first match is
    /// the topmost available control in the block.
    #[must_use]
    pub fn locator(&self, table_id: &str) -> Locator {
        let table = format!(r#"//*[@id="{table_id}"]/table/tbody"#);
        Locator::xpath(format!(
            r#"{table}/tr[position()={start}]/td[4]/img[@name="PlaceBtn"] | {table}/tr[position()>={next} and position()<={end}]/td[3]/img[@name="PlaceBtn"]"#,
            start = self.row_start,
            next = self.row_start + 1,
            end = self.row_end,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
