//! Half-open time ranges in clinic-local time.
//!
//! All instants are naive local datetimes; callers normalize timestamps that
//! carry an offset before building an [`Interval`] (see [`crate::timezone`]).
//! Touching intervals (`a.end == b.start`) do not overlap, so back-to-back
//! bookings are legal.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

/// A half-open range `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

#[derive(Deserialize)]
struct RawInterval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TryFrom<RawInterval> for Interval {
    type Error = BookingError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        Interval::new(raw.start, raw.end)
    }
}

impl Interval {
    /// Build an interval, rejecting empty or inverted ranges.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if end <= start {
            return Err(BookingError::InvalidInterval);
        }
        Ok(Self { start, end })
    }

    /// An interval of `length` anchored at `start`.
    /// Fails with `InvalidInterval` when the end is not representable.
    pub fn starting_at(start: NaiveDateTime, length: Duration) -> Result<Self> {
        let end = start
            .checked_add_signed(length)
            .ok_or(BookingError::InvalidInterval)?;
        Self::new(start, end)
    }

    /// The whole calendar day `[date 00:00, date+1 00:00)`, or `None` for the
    /// last representable date.
    pub fn whole_day(date: NaiveDate) -> Option<Self> {
        Some(Self {
            start: date.and_time(NaiveTime::MIN),
            end: date.succ_opt()?.and_time(NaiveTime::MIN),
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Two intervals overlap iff `a.start < b.end && b.start < a.end`.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// `start <= instant < end`.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    /// True when `other` lies entirely inside `self`.
    pub fn covers(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest interval containing both `self` and `other`.
    pub fn hull(&self, other: &Interval) -> Interval {
        Interval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Remove `cut` from `self`, returning the zero, one, or two remaining pieces.
    pub fn subtract(&self, cut: &Interval) -> Vec<Interval> {
        if !self.overlaps(cut) {
            return vec![*self];
        }
        let mut pieces = Vec::with_capacity(2);
        if self.start < cut.start {
            pieces.push(Interval {
                start: self.start,
                end: cut.start,
            });
        }
        if cut.end < self.end {
            pieces.push(Interval {
                start: cut.end,
                end: self.end,
            });
        }
        pieces
    }
}

/// A half-open range of calendar dates `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range; `start == end` is a valid empty range.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(BookingError::InvalidInterval);
        }
        Ok(Self { start, end })
    }

    /// The range holding only `date`.
    pub fn single(date: NaiveDate) -> Result<Self> {
        let end = date.succ_opt().ok_or(BookingError::InvalidInterval)?;
        Ok(Self { start: date, end })
    }

    /// The dates in the range, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }

    /// The range as a datetime interval, or `None` when empty.
    pub fn as_interval(&self) -> Option<Interval> {
        let start = self.start.and_time(NaiveTime::MIN);
        let end = self.end.and_time(NaiveTime::MIN);
        Interval::new(start, end).ok()
    }
}
