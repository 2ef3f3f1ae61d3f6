//! The shift-history query capability the calculators depend on.

use crate::error::EngineResult;
use crate::identity::Identifier;
use crate::models::Shift;

use super::DateWindow;

/// Read access to a staff member's shifts.
pub trait ShiftHistory {
    /// Returns the staff member's shifts starting inside `window`, ordered by start.
    ///
    /// Implementations backed by a store fail with `NotFound` when
    /// `staff_id` does not resolve to a staff record.
    fn shifts_in_window(&self, staff_id: Identifier, window: &DateWindow) -> EngineResult<Vec<Shift>>;
}

/// In-memory history over a slice of shifts.
impl ShiftHistory for [Shift] {
    fn shifts_in_window(&self, staff_id: Identifier, window: &DateWindow) -> EngineResult<Vec<Shift>> {
        let mut shifts: Vec<Shift> = self
            .iter()
            .filter(|s| s.staff_id == staff_id && window.contains_timestamp(s.start_time))
            .cloned()
            .collect();
        shifts.sort_by_key(|s| s.start_time);
        Ok(shifts)
    }
}
