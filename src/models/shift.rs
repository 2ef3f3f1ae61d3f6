//! Shift model and related types.
//!
//! This module defines the Shift struct and ShiftType enum for representing
//! worked (and holiday-taken) time in the ledger.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::identity::{IdentityGenerator, Identifier};

use super::AccrualYear;

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// The kind of time a shift records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    /// Ordinary worked time.
    Ordinary,
    /// Holiday taken; excluded from hours-worked accrual.
    HolidayTaken,
}

impl ShiftType {
    /// Returns the stable tag used in natural keys and storage.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Ordinary => "ordinary",
            Self::HolidayTaken => "holiday_taken",
        }
    }

    /// Parses a stored tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ordinary" => Some(Self::Ordinary),
            "holiday_taken" => Some(Self::HolidayTaken),
            _ => None,
        }
    }
}

/// A shift as submitted by scheduling, before identifiers are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShift {
    /// The staff member who worked the shift.
    pub staff_name: String,
    /// The start time of the shift.
    pub start_time: NaiveDateTime,
    /// The end time of the shift.
    pub end_time: NaiveDateTime,
    /// Whether the hours were overtime.
    #[serde(default)]
    pub overtime: bool,
    /// The kind of time recorded.
    #[serde(default = "default_shift_type")]
    pub shift_type: ShiftType,
}

fn default_shift_type() -> ShiftType {
    ShiftType::Ordinary
}

/// A persisted shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Identifier derived from (accrual year id, staff name, start, shift type).
    pub id: Identifier,
    /// The accrual year containing the shift start.
    pub accrual_year_id: Identifier,
    /// The staff member's identifier.
    pub staff_id: Identifier,
    /// The staff member's name.
    pub staff_name: String,
    /// The start time of the shift.
    pub start_time: NaiveDateTime,
    /// The end time of the shift.
    pub end_time: NaiveDateTime,
    /// Whether the hours were overtime.
    pub overtime: bool,
    /// The kind of time recorded.
    pub shift_type: ShiftType,
}

impl Shift {
    /// Builds a persisted shift, deriving every identifier from natural keys.
    pub fn from_new(generator: &IdentityGenerator, year: &AccrualYear, new: NewShift) -> Self {
        let accrual_year_id = year.id(generator);
        Self {
            id: generator.shift_id(
                accrual_year_id,
                &new.staff_name,
                new.start_time,
                new.shift_type.tag(),
            ),
            accrual_year_id,
            staff_id: generator.staff_id(&new.staff_name),
            staff_name: new.staff_name,
            start_time: new.start_time,
            end_time: new.end_time,
            overtime: new.overtime,
            shift_type: new.shift_type,
        }
    }

    /// Calculates the worked hours for the shift.
    ///
    /// A shift whose end precedes its start counts as zero hours.
    ///
    /// # Examples
    ///
    /// ```
    /// use holiday_ledger::identity::IdentityGenerator;
    /// use holiday_ledger::models::{AccrualYear, NewShift, Shift, ShiftType};
    /// use chrono::{NaiveDate, NaiveDateTime};
    /// use rust_decimal::Decimal;
    ///
    /// let year = AccrualYear::starting(NaiveDate::from_ymd_opt(2025, 4, 6).unwrap());
    /// let shift = Shift::from_new(&IdentityGenerator::default(), &year, NewShift {
    ///     staff_name: "Alice".to_string(),
    ///     start_time: NaiveDateTime::parse_from_str("2025-05-01 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
    ///     end_time: NaiveDateTime::parse_from_str("2025-05-01 17:30:00", "%Y-%m-%d %H:%M:%S").unwrap(),
    ///     overtime: false,
    ///     shift_type: ShiftType::Ordinary,
    /// });
    /// assert_eq!(shift.worked_hours(), Decimal::new(85, 1));
    /// ```
    pub fn worked_hours(&self) -> Decimal {
        let millis = (self.end_time - self.start_time).num_milliseconds().max(0);
        Decimal::new(millis, 0) / Decimal::new(MILLIS_PER_HOUR, 0)
    }

    /// Returns true if the shift's hours count towards worked-hours accrual.
    pub fn accrues(&self) -> bool {
        self.shift_type != ShiftType::HolidayTaken
    }

    /// Returns the scheduling view of this shift.
    pub fn to_new(&self) -> NewShift {
        NewShift {
            staff_name: self.staff_name.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            overtime: self.overtime,
            shift_type: self.shift_type,
        }
    }
}
