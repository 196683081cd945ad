//! Free slot generation.
//!
//! For each date in the range, the doctor's absence-clipped windows are walked
//! in steps of the granularity. A candidate `[t, t + granularity)` is free
//! when it overlaps none of the doctor's occupied intervals (visits and
//! surgeries alike). Candidates from overlapping windows are deduplicated by
//! start time, and dates are produced lazily in ascending order.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::availability::WeeklyAvailabilityIndex;
use crate::error::{BookingError, Result};
use crate::interval::{DateRange, Interval};
use crate::ledger::BookingLedger;
use crate::model::DoctorId;

/// Why a scanned date did or did not produce slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// No window survives on this date (no rule, or absences cover them all).
    NoAvailability,
    /// Windows exist but every candidate is taken.
    FullyBooked,
    Open,
}

/// The result of scanning one date for one doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayScan {
    pub date: NaiveDate,
    /// Absence-clipped windows, sorted by start.
    pub windows: Vec<Interval>,
    /// Free slot starts, ascending and unique.
    pub slots: Vec<NaiveDateTime>,
}

impl DayScan {
    pub fn status(&self) -> DayStatus {
        if self.windows.is_empty() {
            DayStatus::NoAvailability
        } else if self.slots.is_empty() {
            DayStatus::FullyBooked
        } else {
            DayStatus::Open
        }
    }
}

/// Computes free slots from the availability index and the ledger.
///
/// A pure query: two calls with no intervening ledger writes return the
/// same sequence.
pub struct SlotGenerator<'a, L: BookingLedger + ?Sized> {
    index: &'a WeeklyAvailabilityIndex,
    ledger: &'a L,
    granularity: Duration,
}

impl<'a, L: BookingLedger + ?Sized> SlotGenerator<'a, L> {
    pub fn new(
        index: &'a WeeklyAvailabilityIndex,
        ledger: &'a L,
        granularity: Duration,
    ) -> Result<Self> {
        if granularity <= Duration::zero() {
            return Err(BookingError::InvalidConfig(
                "slot granularity must be positive".to_string(),
            ));
        }
        Ok(Self {
            index,
            ledger,
            granularity,
        })
    }

    /// Scan a single date.
    pub fn scan_day(&self, doctor: &DoctorId, date: NaiveDate) -> DayScan {
        let windows = self.index.windows_for(doctor, date);
        if windows.is_empty() {
            debug!(%doctor, %date, "no availability declared");
            return DayScan {
                date,
                windows,
                slots: Vec::new(),
            };
        }

        let span = windows.iter().fold(windows[0], |span, w| span.hull(w));
        let occupied: Vec<Interval> = self
            .ledger
            .occupied_by_doctor(doctor, &span)
            .into_iter()
            .map(|o| o.interval)
            .collect();
        let busy = merge_busy_periods(occupied);

        let mut free = BTreeSet::new();
        for window in &windows {
            let mut start = window.start();
            while let Some(end) = start
                .checked_add_signed(self.granularity)
                .filter(|end| *end <= window.end())
            {
                if !overlaps_any(&busy, start, end) {
                    free.insert(start);
                }
                start = end;
            }
        }

        debug!(
            %doctor,
            %date,
            windows = windows.len(),
            busy = busy.len(),
            free = free.len(),
            "scanned day"
        );

        DayScan {
            date,
            windows,
            slots: free.into_iter().collect(),
        }
    }

    /// Lazily produce every free slot start in `range`, in ascending order.
    pub fn slots(&self, doctor: &DoctorId, range: DateRange) -> Slots<'_, 'a, L> {
        Slots {
            generator: self,
            doctor: doctor.clone(),
            next_date: range.start,
            end: range.end,
            pending: Vec::new().into_iter(),
        }
    }
}

/// Iterator returned by [`SlotGenerator::slots`]. Each date is scanned only
/// once the slots of the previous date have been consumed.
pub struct Slots<'g, 'a, L: BookingLedger + ?Sized> {
    generator: &'g SlotGenerator<'a, L>,
    doctor: DoctorId,
    next_date: NaiveDate,
    end: NaiveDate,
    pending: std::vec::IntoIter<NaiveDateTime>,
}

impl<L: BookingLedger + ?Sized> Iterator for Slots<'_, '_, L> {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(slot) = self.pending.next() {
                return Some(slot);
            }
            if self.next_date >= self.end {
                return None;
            }
            let date = self.next_date;
            self.next_date = date.succ_opt()?;
            self.pending = self.generator.scan_day(&self.doctor, date).slots.into_iter();
        }
    }
}

/// Merge overlapping or adjacent busy periods into a sorted, disjoint list.
fn merge_busy_periods(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort();

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        if let Some(last) = merged.last_mut() {
            if interval.start() <= last.end() {
                *last = last.hull(&interval);
                continue;
            }
        }
        merged.push(interval);
    }
    merged
}

/// Whether `[start, end)` overlaps any of the sorted, disjoint `busy` periods.
fn overlaps_any(busy: &[Interval], start: NaiveDateTime, end: NaiveDateTime) -> bool {
    // The first period ending after `start` is the only one that can overlap.
    let idx = busy.partition_point(|b| b.end() <= start);
    busy.get(idx).is_some_and(|b| b.start() < end)
}
