//! Conflict guards: admit or reject a proposed visit or surgery against the
//! ledger, and a proposed shift or nurse assignment against the roster.
//!
//! A doctor's occupied time is the union of visits and surgeries, so both
//! event kinds are checked whichever kind is being proposed. Adjacent
//! intervals (one ends exactly when the other starts) are NOT conflicts.
//!
//! Visits must also fit inside one of the doctor's windows. Surgeries are not
//! checked against weekly availability and may be placed outside declared
//! working hours.

use chrono::NaiveDateTime;
use tracing::warn;

use crate::availability::WeeklyAvailabilityIndex;
use crate::error::{BookingError, Result};
use crate::interval::Interval;
use crate::ledger::{BookingLedger, EventRef, Occupancy};
use crate::model::{DoctorId, NurseId, PatientId, RoomId, Shift, Surgery, SurgeryId};
use crate::roster::ShiftRoster;

/// A detected clash between a proposed interval and an existing ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub existing: Occupancy,
    pub overlap_minutes: i64,
}

/// Find every occupancy overlapping `proposed`, skipping the excluded surgery.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
pub fn find_conflicts(
    occupied: &[Occupancy],
    proposed: &Interval,
    excluding: Option<SurgeryId>,
) -> Vec<Conflict> {
    occupied
        .iter()
        .filter(|o| excluding.is_none_or(|id| o.event != EventRef::Surgery(id)))
        .filter(|o| o.interval.overlaps(proposed))
        .map(|o| {
            let overlap_start = o.interval.start().max(proposed.start());
            let overlap_end = o.interval.end().min(proposed.end());
            Conflict {
                existing: *o,
                overlap_minutes: (overlap_end - overlap_start).num_minutes(),
            }
        })
        .collect()
}

/// The resources a surgery claims for its interval.
#[derive(Debug, Clone)]
pub struct SurgeryClaim<'r> {
    /// Lead surgeon first, then the team.
    pub doctors: Vec<&'r DoctorId>,
    pub patient: &'r PatientId,
    pub room: &'r RoomId,
    pub interval: Interval,
}

impl<'r> From<&'r Surgery> for SurgeryClaim<'r> {
    fn from(surgery: &'r Surgery) -> Self {
        Self {
            doctors: surgery.doctors(),
            patient: &surgery.patient,
            room: &surgery.room,
            interval: surgery.interval,
        }
    }
}

pub struct ConflictGuard<'a, L: BookingLedger + ?Sized> {
    index: &'a WeeklyAvailabilityIndex,
    ledger: &'a L,
}

impl<'a, L: BookingLedger + ?Sized> ConflictGuard<'a, L> {
    pub fn new(index: &'a WeeklyAvailabilityIndex, ledger: &'a L) -> Self {
        Self { index, ledger }
    }

    /// Check a visit at `instant`. On success returns the interval it will occupy.
    ///
    /// Checks run in order: availability window, doctor, patient.
    pub fn admit_visit(
        &self,
        doctor: &DoctorId,
        patient: &PatientId,
        instant: NaiveDateTime,
    ) -> Result<Interval> {
        let interval = Interval::starting_at(instant, self.ledger.visit_duration())?;

        if !self.index.covers(doctor, &interval) {
            warn!(%doctor, %instant, "visit outside declared availability");
            return Err(BookingError::OutsideAvailability);
        }
        self.check_doctor(doctor, &interval, None)?;
        self.check_patient(patient, &interval, None)?;
        Ok(interval)
    }

    /// Check a surgery claim, ignoring `excluding` (the surgery's own prior
    /// version when rescheduling).
    ///
    /// Checks run in order: room, each doctor, patient.
    pub fn admit_surgery(&self, claim: &SurgeryClaim<'_>, excluding: Option<SurgeryId>) -> Result<()> {
        let occupied = self.ledger.occupied_by_room(claim.room, &claim.interval);
        if let Some(conflict) = find_conflicts(&occupied, &claim.interval, excluding).first() {
            warn!(
                room = %claim.room,
                overlap_minutes = conflict.overlap_minutes,
                "operating room already booked"
            );
            return Err(BookingError::RoomBusy {
                room: claim.room.clone(),
            });
        }
        for doctor in &claim.doctors {
            self.check_doctor(doctor, &claim.interval, excluding)?;
        }
        self.check_patient(claim.patient, &claim.interval, excluding)
    }

    fn check_doctor(
        &self,
        doctor: &DoctorId,
        interval: &Interval,
        excluding: Option<SurgeryId>,
    ) -> Result<()> {
        let occupied = self.ledger.occupied_by_doctor(doctor, interval);
        if let Some(conflict) = find_conflicts(&occupied, interval, excluding).first() {
            warn!(%doctor, overlap_minutes = conflict.overlap_minutes, "doctor already booked");
            return Err(BookingError::DoctorBusy {
                doctor: doctor.clone(),
            });
        }
        Ok(())
    }

    fn check_patient(
        &self,
        patient: &PatientId,
        interval: &Interval,
        excluding: Option<SurgeryId>,
    ) -> Result<()> {
        let occupied = self.ledger.occupied_by_patient(patient, interval);
        if let Some(conflict) = find_conflicts(&occupied, interval, excluding).first() {
            warn!(%patient, overlap_minutes = conflict.overlap_minutes, "patient already booked");
            return Err(BookingError::PatientBusy {
                patient: patient.clone(),
            });
        }
        Ok(())
    }
}

/// Admission checks for nursing shifts and nurse assignments.
pub struct ShiftGuard<'a> {
    roster: &'a ShiftRoster,
}

impl<'a> ShiftGuard<'a> {
    pub fn new(roster: &'a ShiftRoster) -> Self {
        Self { roster }
    }

    /// Shifts are clinic-wide: a new one may not overlap any existing shift.
    pub fn admit_shift(&self, interval: &Interval) -> Result<()> {
        let occupied = self.roster.occupied(interval);
        if let Some(conflict) = find_conflicts(&occupied, interval, None).first() {
            warn!(
                start = %interval.start(),
                overlap_minutes = conflict.overlap_minutes,
                "overlapping shift exists"
            );
            return Err(BookingError::ShiftOverlap);
        }
        Ok(())
    }

    /// The nurse may not hold another shift overlapping `shift`.
    pub fn admit_assignment(&self, nurse: &NurseId, shift: &Shift) -> Result<()> {
        let occupied: Vec<Occupancy> = self
            .roster
            .occupied_by_nurse(nurse, &shift.interval)
            .into_iter()
            .filter(|o| o.event != EventRef::Shift(shift.id))
            .collect();
        if let Some(conflict) = find_conflicts(&occupied, &shift.interval, None).first() {
            warn!(%nurse, overlap_minutes = conflict.overlap_minutes, "nurse already on shift");
            return Err(BookingError::NurseBusy {
                nurse: nurse.clone(),
            });
        }
        Ok(())
    }
}
