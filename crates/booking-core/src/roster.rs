//! Nursing shift roster: clinic-wide shifts and the nurses assigned to them.
//!
//! Shifts share the half-open interval model of the ledger. Two shifts that
//! touch (one ends exactly when the next starts) do not overlap, so a nurse
//! may work back-to-back shifts.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{BookingError, Result};
use crate::interval::Interval;
use crate::ledger::{EventRef, Occupancy};
use crate::model::{NurseId, Shift, ShiftId, ShiftKind};

/// Hours worked by a nurse over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NurseWorkload {
    pub nurse: NurseId,
    pub shifts: usize,
    pub night_shifts: usize,
    pub total_minutes: i64,
}

impl NurseWorkload {
    pub fn total_hours(&self) -> f64 {
        self.total_minutes as f64 / 60.0
    }
}

#[derive(Debug, Clone)]
pub struct ShiftRoster {
    shifts: BTreeMap<ShiftId, Shift>,
    next_shift: u64,
}

impl Default for ShiftRoster {
    fn default() -> Self {
        Self::new()
    }
}

impl ShiftRoster {
    pub fn new() -> Self {
        Self {
            shifts: BTreeMap::new(),
            next_shift: 1,
        }
    }

    pub fn next_shift_id(&mut self) -> ShiftId {
        let id = ShiftId(self.next_shift);
        self.next_shift = self.next_shift.saturating_add(1);
        id
    }

    /// Store a shift as-is. Callers admit it through the shift guard first.
    pub fn insert_shift(&mut self, shift: Shift) {
        self.next_shift = self.next_shift.max(shift.id.0.saturating_add(1));
        self.shifts.insert(shift.id, shift);
    }

    pub fn shift(&self, id: ShiftId) -> Result<&Shift> {
        self.shifts
            .get(&id)
            .ok_or_else(|| BookingError::not_found("shift", id))
    }

    pub fn shifts(&self) -> impl Iterator<Item = &Shift> {
        self.shifts.values()
    }

    /// Every shift overlapping `range`, sorted by start.
    pub fn occupied(&self, range: &Interval) -> Vec<Occupancy> {
        collect_occupancy(self.shifts.values(), range)
    }

    /// Shifts the nurse is assigned to that overlap `range`, sorted by start.
    pub fn occupied_by_nurse(&self, nurse: &NurseId, range: &Interval) -> Vec<Occupancy> {
        collect_occupancy(
            self.shifts.values().filter(|s| s.nurses.contains(nurse)),
            range,
        )
    }

    /// Shifts of the nurse starting within `range`, ordered by start.
    pub fn shifts_for_nurse(&self, nurse: &NurseId, range: &Interval) -> Vec<&Shift> {
        let mut shifts: Vec<&Shift> = self
            .shifts
            .values()
            .filter(|s| s.nurses.contains(nurse) && range.contains(s.interval.start()))
            .collect();
        shifts.sort_by_key(|s| (s.interval, s.id));
        shifts
    }

    /// Add `nurse` to the shift. Assigning twice is a no-op.
    pub fn assign(&mut self, id: ShiftId, nurse: NurseId) -> Result<&Shift> {
        let shift = self
            .shifts
            .get_mut(&id)
            .ok_or_else(|| BookingError::not_found("shift", id))?;
        if !shift.nurses.contains(&nurse) {
            shift.nurses.push(nurse);
        }
        Ok(&*shift)
    }

    /// Drop the nurse from every shift; returns how many assignments were removed.
    pub(crate) fn remove_nurse(&mut self, nurse: &NurseId) -> usize {
        let mut removed = 0;
        for shift in self.shifts.values_mut() {
            let before = shift.nurses.len();
            shift.nurses.retain(|n| n != nurse);
            removed += before - shift.nurses.len();
        }
        removed
    }

    pub fn workload(&self, nurse: &NurseId, range: &Interval) -> NurseWorkload {
        let shifts = self.shifts_for_nurse(nurse, range);
        NurseWorkload {
            nurse: nurse.clone(),
            shifts: shifts.len(),
            night_shifts: shifts.iter().filter(|s| s.kind == ShiftKind::Night).count(),
            total_minutes: shifts.iter().map(|s| s.interval.duration().num_minutes()).sum(),
        }
    }
}

fn collect_occupancy<'a>(shifts: impl Iterator<Item = &'a Shift>, range: &Interval) -> Vec<Occupancy> {
    let mut occupied: Vec<Occupancy> = shifts
        .filter(|s| s.interval.overlaps(range))
        .map(|s| Occupancy {
            interval: s.interval,
            event: EventRef::Shift(s.id),
        })
        .collect();
    occupied.sort_by_key(|o| (o.interval, o.event));
    occupied
}
