//! Booking service: the single entry point external callers use.
//!
//! Reads go through the [`SlotGenerator`]; writes go through the
//! [`ConflictGuard`] and then the ledger. Every operation runs under one lock,
//! so an admission check and the write that follows it form a single atomic
//! step and two concurrent requests can never both claim the same time.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{info, instrument};

use crate::availability::WeeklyAvailabilityIndex;
use crate::config::SchedulingConfig;
use crate::conflict::{ConflictGuard, ShiftGuard, SurgeryClaim};
use crate::error::{BookingError, Result};
use crate::interval::{DateRange, Interval};
use crate::ledger::{BookingLedger, InMemoryLedger};
use crate::model::{
    surgical_team, Absence, AbsenceId, Doctor, DoctorId, Nurse, NurseId, OperatingRoom, Patient,
    PatientId, ProtocolRecordId, Role, RoomId, Shift, ShiftId, ShiftKind, Surgery, SurgeryId,
    SurgeryStatus, SurgeryType, SurgeryTypeId, TeamMember, Visit, VisitId,
    WeeklyAvailabilityRule,
};
use crate::registry::Registry;
use crate::roster::{NurseWorkload, ShiftRoster};
use crate::slots::{DayScan, SlotGenerator};

/// A request to schedule a new surgery.
#[derive(Debug, Clone)]
pub struct SurgeryRequest {
    pub doctor: DoctorId,
    pub patient: PatientId,
    pub room: RoomId,
    pub surgery_type: SurgeryTypeId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub team: Vec<TeamMember>,
}

/// Changes to an existing surgery. Unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct SurgeryUpdate {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub room: Option<RoomId>,
    pub status: Option<SurgeryStatus>,
}

impl SurgeryUpdate {
    fn reschedules(&self) -> bool {
        self.start.is_some() || self.end.is_some() || self.room.is_some()
    }
}

/// A doctor's bookings starting within a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorSchedule {
    pub doctor: DoctorId,
    pub visits: Vec<Visit>,
    pub surgeries: Vec<Surgery>,
}

/// What a cascade delete removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub fiscal_code: String,
    pub role: Role,
    pub protocol_records: usize,
    pub surgeries: usize,
    /// Surgeries the deleted doctor was dropped from as a team member.
    pub team_memberships: usize,
    pub visits: usize,
    /// Shifts the deleted nurse was removed from.
    pub shift_assignments: usize,
}

pub(crate) struct State<L> {
    pub(crate) registry: Registry,
    pub(crate) availability: WeeklyAvailabilityIndex,
    pub(crate) ledger: L,
    pub(crate) roster: ShiftRoster,
}

pub struct BookingService<L: BookingLedger = InMemoryLedger> {
    config: SchedulingConfig,
    state: Mutex<State<L>>,
}

impl BookingService<InMemoryLedger> {
    /// An empty clinic backed by an in-memory ledger.
    pub fn new(config: SchedulingConfig) -> Result<Self> {
        config.validate()?;
        let ledger = InMemoryLedger::new(config.visit_duration());
        Self::with_parts(
            config,
            Registry::new(),
            WeeklyAvailabilityIndex::new(),
            ledger,
            ShiftRoster::new(),
        )
    }
}

impl<L: BookingLedger> BookingService<L> {
    /// Assemble a service from existing parts. The ledger must expand visits
    /// to `config`'s visit duration.
    pub fn with_parts(
        config: SchedulingConfig,
        registry: Registry,
        availability: WeeklyAvailabilityIndex,
        ledger: L,
        roster: ShiftRoster,
    ) -> Result<Self> {
        config.validate()?;
        if ledger.visit_duration() != config.visit_duration() {
            return Err(BookingError::InvalidConfig(
                "ledger visit duration differs from configuration".to_string(),
            ));
        }
        Ok(Self {
            config,
            state: Mutex::new(State {
                registry,
                availability,
                ledger,
                roster,
            }),
        })
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, State<L>> {
        // State is only mutated after every check has passed, so a panic
        // elsewhere cannot leave it half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Reference data ──────────────────────────────────────────────────────

    /// Register or update a doctor. A fiscal code already held under another
    /// role is refused with `Forbidden`.
    pub fn register_doctor(&self, name: &str, doctor: Doctor) -> Result<()> {
        info!(doctor = %doctor.id, "registering doctor");
        self.lock().registry.add_doctor(name, doctor)
    }

    pub fn register_patient(&self, name: &str, patient: Patient) -> Result<()> {
        info!(patient = %patient.id, "registering patient");
        self.lock().registry.add_patient(name, patient)
    }

    pub fn register_nurse(&self, name: &str, nurse: Nurse) -> Result<()> {
        info!(nurse = %nurse.id, "registering nurse");
        self.lock().registry.add_nurse(name, nurse)
    }

    pub fn register_administrator(&self, fiscal_code: &str, name: &str) -> Result<()> {
        self.lock().registry.add_administrator(fiscal_code, name)
    }

    pub fn add_room(&self, room: OperatingRoom) {
        self.lock().registry.add_room(room);
    }

    pub fn set_room_available(&self, room: &RoomId, available: bool) -> Result<OperatingRoom> {
        let mut state = self.lock();
        state.registry.set_room_available(room, available).cloned()
    }

    pub fn add_surgery_type(&self, surgery_type: SurgeryType) {
        self.lock().registry.add_surgery_type(surgery_type);
    }

    /// Replace the doctor's weekly rules wholesale. Returns the number stored.
    #[instrument(skip(self, rules), fields(rule_count = rules.len()))]
    pub fn set_weekly_availability(
        &self,
        doctor: &DoctorId,
        rules: Vec<WeeklyAvailabilityRule>,
    ) -> Result<usize> {
        let mut state = self.lock();
        state.registry.doctor(doctor)?;
        let count = state.availability.replace_rules(doctor, rules)?;
        info!(%doctor, count, "weekly availability replaced");
        Ok(count)
    }

    pub fn weekly_availability(&self, doctor: &DoctorId) -> Result<Vec<WeeklyAvailabilityRule>> {
        let state = self.lock();
        state.registry.doctor(doctor)?;
        Ok(state
            .availability
            .rules_for(doctor)
            .into_iter()
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    pub fn add_absence(
        &self,
        doctor: &DoctorId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        approved: bool,
    ) -> Result<AbsenceId> {
        let period = Interval::new(start, end)?;
        let mut state = self.lock();
        state.registry.doctor(doctor)?;
        let id = state.availability.add_absence(doctor.clone(), period, approved);
        info!(%doctor, absence = %id, approved, "absence recorded");
        Ok(id)
    }

    pub fn approve_absence(&self, id: AbsenceId) -> Result<Absence> {
        let mut state = self.lock();
        let absence = state.availability.approve_absence(id)?.clone();
        info!(absence = %id, doctor = %absence.doctor, "absence approved");
        Ok(absence)
    }

    pub fn add_protocol_record(&self, surgery: SurgeryId, note: &str) -> Result<ProtocolRecordId> {
        let mut state = self.lock();
        if state.ledger.surgery(surgery).is_none() {
            return Err(BookingError::not_found("surgery", surgery));
        }
        Ok(state.registry.add_protocol_record(surgery, note))
    }

    // ── Read path ───────────────────────────────────────────────────────────

    /// Free slot starts for the doctor over `range`, using the configured granularity.
    pub fn available_slots(&self, doctor: &DoctorId, range: DateRange) -> Result<Vec<NaiveDateTime>> {
        self.available_slots_every(doctor, range, self.config.slot_granularity_minutes)
    }

    /// Free slot starts for the doctor over `range`, stepping by `granularity_minutes`.
    pub fn available_slots_every(
        &self,
        doctor: &DoctorId,
        range: DateRange,
        granularity_minutes: u32,
    ) -> Result<Vec<NaiveDateTime>> {
        let state = self.lock();
        state.registry.doctor(doctor)?;
        let granularity = chrono::Duration::minutes(i64::from(granularity_minutes));
        let generator = SlotGenerator::new(&state.availability, &state.ledger, granularity)?;
        Ok(generator.slots(doctor, range).collect())
    }

    /// Windows, free slots and status for one date.
    pub fn scan_day(&self, doctor: &DoctorId, date: NaiveDate) -> Result<DayScan> {
        let state = self.lock();
        state.registry.doctor(doctor)?;
        let generator = SlotGenerator::new(&state.availability, &state.ledger, self.config.granularity())?;
        Ok(generator.scan_day(doctor, date))
    }

    /// Visits and surgeries (led or assisted) that start within `range`.
    pub fn doctor_schedule(&self, doctor: &DoctorId, range: DateRange) -> Result<DoctorSchedule> {
        let state = self.lock();
        state.registry.doctor(doctor)?;
        let mut schedule = DoctorSchedule {
            doctor: doctor.clone(),
            visits: Vec::new(),
            surgeries: Vec::new(),
        };
        let Some(bounds) = range.as_interval() else {
            return Ok(schedule);
        };
        schedule.visits = state
            .ledger
            .visits_for_doctor(doctor)
            .into_iter()
            .filter(|v| bounds.contains(v.instant))
            .cloned()
            .collect();
        schedule.surgeries = state
            .ledger
            .surgeries_for_doctor(doctor)
            .into_iter()
            .filter(|s| bounds.contains(s.interval.start()))
            .cloned()
            .collect();
        Ok(schedule)
    }

    pub fn visit(&self, id: VisitId) -> Result<Visit> {
        self.lock()
            .ledger
            .visit(id)
            .cloned()
            .ok_or_else(|| BookingError::not_found("visit", id))
    }

    pub fn surgery(&self, id: SurgeryId) -> Result<Surgery> {
        self.lock()
            .ledger
            .surgery(id)
            .cloned()
            .ok_or_else(|| BookingError::not_found("surgery", id))
    }

    pub fn shift(&self, id: ShiftId) -> Result<Shift> {
        self.lock().roster.shift(id).cloned()
    }

    /// Shifts of the nurse starting within `range`.
    pub fn nurse_shifts(&self, nurse: &NurseId, range: DateRange) -> Result<Vec<Shift>> {
        let state = self.lock();
        state.registry.nurse(nurse)?;
        let Some(bounds) = range.as_interval() else {
            return Ok(Vec::new());
        };
        Ok(state
            .roster
            .shifts_for_nurse(nurse, &bounds)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Shift count, night shifts and worked time for shifts starting within `range`.
    pub fn nurse_workload(&self, nurse: &NurseId, range: DateRange) -> Result<NurseWorkload> {
        let state = self.lock();
        state.registry.nurse(nurse)?;
        Ok(match range.as_interval() {
            Some(bounds) => state.roster.workload(nurse, &bounds),
            None => NurseWorkload {
                nurse: nurse.clone(),
                shifts: 0,
                night_shifts: 0,
                total_minutes: 0,
            },
        })
    }

    // ── Write path ──────────────────────────────────────────────────────────

    /// Book a visit at `instant`, occupying the configured visit duration.
    #[instrument(skip(self, reason))]
    pub fn book_visit(
        &self,
        doctor: &DoctorId,
        patient: &PatientId,
        instant: NaiveDateTime,
        reason: &str,
    ) -> Result<Visit> {
        let mut state = self.lock();
        state.registry.doctor(doctor)?;
        state.registry.patient(patient)?;

        ConflictGuard::new(&state.availability, &state.ledger).admit_visit(doctor, patient, instant)?;

        let visit = Visit {
            id: state.ledger.next_visit_id(),
            doctor: doctor.clone(),
            patient: patient.clone(),
            instant,
            reason: reason.to_string(),
            outcome: None,
        };
        state.ledger.record_visit(visit.clone());
        info!(visit = %visit.id, %doctor, %patient, %instant, "visit booked");
        Ok(visit)
    }

    /// Record the outcome of a visit. The visit's time never changes.
    pub fn record_visit_outcome(&self, id: VisitId, outcome: &str) -> Result<Visit> {
        let mut state = self.lock();
        let visit = state
            .ledger
            .set_visit_outcome(id, outcome.to_string())
            .cloned()
            .ok_or_else(|| BookingError::not_found("visit", id))?;
        info!(visit = %id, "visit outcome recorded");
        Ok(visit)
    }

    /// Schedule a surgery. Weekly availability is not consulted.
    #[instrument(skip(self))]
    pub fn schedule_surgery(&self, request: SurgeryRequest) -> Result<Surgery> {
        let interval = Interval::new(request.start, request.end)?;

        let mut state = self.lock();
        let doctors = surgical_team(&request.doctor, &request.team);
        for doctor in &doctors {
            state.registry.doctor(doctor)?;
        }
        state.registry.patient(&request.patient)?;
        state.registry.surgery_type(&request.surgery_type)?;
        state.registry.usable_room(&request.room)?;

        let claim = SurgeryClaim {
            doctors,
            patient: &request.patient,
            room: &request.room,
            interval,
        };
        ConflictGuard::new(&state.availability, &state.ledger).admit_surgery(&claim, None)?;

        let surgery = Surgery {
            id: state.ledger.next_surgery_id(),
            doctor: request.doctor,
            patient: request.patient,
            room: request.room,
            surgery_type: request.surgery_type,
            interval,
            status: SurgeryStatus::Scheduled,
            team: request.team,
        };
        state.ledger.record_surgery(surgery.clone());
        info!(
            surgery = %surgery.id,
            doctor = %surgery.doctor,
            room = %surgery.room,
            start = %surgery.interval.start(),
            end = %surgery.interval.end(),
            "surgery scheduled"
        );
        Ok(surgery)
    }

    /// Reschedule a surgery and/or move it along its status machine.
    ///
    /// Interval and room changes are only allowed while the surgery is
    /// scheduled and are re-checked against the ledger, ignoring the
    /// surgery's own prior booking. The status change is applied after the
    /// reschedule; nothing is written unless every check passes.
    #[instrument(skip(self))]
    pub fn update_surgery(&self, id: SurgeryId, update: SurgeryUpdate) -> Result<Surgery> {
        let mut state = self.lock();
        let current = state
            .ledger
            .surgery(id)
            .cloned()
            .ok_or_else(|| BookingError::not_found("surgery", id))?;

        let rejected_transition = |to: SurgeryStatus| BookingError::InvalidTransition {
            from: current.status,
            to,
        };
        if let Some(status) = update.status {
            if !current.status.can_transition_to(status) {
                return Err(rejected_transition(status));
            }
        }

        let mut next = current.clone();
        if update.reschedules() {
            if current.status != SurgeryStatus::Scheduled {
                return Err(rejected_transition(update.status.unwrap_or(current.status)));
            }
            next.interval = Interval::new(
                update.start.unwrap_or(current.interval.start()),
                update.end.unwrap_or(current.interval.end()),
            )?;
            if let Some(room) = &update.room {
                state.registry.usable_room(room)?;
                next.room = room.clone();
            }
            ConflictGuard::new(&state.availability, &state.ledger)
                .admit_surgery(&SurgeryClaim::from(&next), Some(id))?;
        }
        if let Some(status) = update.status {
            next.status = status;
        }

        if next != current {
            state.ledger.replace_surgery(next.clone());
            info!(
                surgery = %id,
                status = %next.status,
                room = %next.room,
                start = %next.interval.start(),
                "surgery updated"
            );
        }
        Ok(next)
    }

    /// Open a clinic-wide shift. Rejected with `ShiftOverlap` when it overlaps
    /// any existing shift.
    #[instrument(skip(self))]
    pub fn create_shift(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        kind: ShiftKind,
    ) -> Result<Shift> {
        let interval = Interval::new(start, end)?;
        let mut state = self.lock();
        ShiftGuard::new(&state.roster).admit_shift(&interval)?;

        let shift = Shift {
            id: state.roster.next_shift_id(),
            interval,
            kind,
            nurses: Vec::new(),
        };
        state.roster.insert_shift(shift.clone());
        info!(shift = %shift.id, %kind, %start, %end, "shift created");
        Ok(shift)
    }

    /// Assign a nurse to a shift. Rejected with `NurseBusy` when the nurse
    /// already works an overlapping shift; assigning twice is a no-op.
    #[instrument(skip(self))]
    pub fn assign_nurse(&self, id: ShiftId, nurse: &NurseId) -> Result<Shift> {
        let mut state = self.lock();
        let shift = state.roster.shift(id)?.clone();
        state.registry.nurse(nurse)?;
        if shift.nurses.contains(nurse) {
            return Ok(shift);
        }
        ShiftGuard::new(&state.roster).admit_assignment(nurse, &shift)?;

        let shift = state.roster.assign(id, nurse.clone())?.clone();
        info!(shift = %id, %nurse, "nurse assigned");
        Ok(shift)
    }

    /// Delete a doctor, patient or nurse together with everything that depends on them.
    ///
    /// Removal order: protocol records, surgeries, visits, then the role
    /// record and finally the base record. A doctor who only assisted in a
    /// surgery is dropped from its team instead of deleting the surgery; a
    /// nurse is dropped from every shift. Administrators cannot be deleted.
    #[instrument(skip(self))]
    pub fn delete_person(&self, fiscal_code: &str) -> Result<DeletionReport> {
        let mut state = self.lock();
        let person = state.registry.person(fiscal_code)?.clone();

        let mut report = DeletionReport {
            fiscal_code: fiscal_code.to_string(),
            role: person.role,
            protocol_records: 0,
            surgeries: 0,
            team_memberships: 0,
            visits: 0,
            shift_assignments: 0,
        };

        match person.role {
            Role::Administrator => {
                return Err(BookingError::Forbidden(format!(
                    "administrator {fiscal_code} cannot be deleted"
                )));
            }
            Role::Doctor => {
                let doctor = DoctorId(fiscal_code.to_string());
                let involved: Vec<Surgery> = state
                    .ledger
                    .surgeries_for_doctor(&doctor)
                    .into_iter()
                    .cloned()
                    .collect();
                let (led, assisted): (Vec<Surgery>, Vec<Surgery>) =
                    involved.into_iter().partition(|s| s.doctor == doctor);
                let visits: Vec<VisitId> = state
                    .ledger
                    .visits_for_doctor(&doctor)
                    .iter()
                    .map(|v| v.id)
                    .collect();

                let led_ids: Vec<SurgeryId> = led.iter().map(|s| s.id).collect();
                report.protocol_records = state.registry.remove_protocol_records(&led_ids);
                for id in &led_ids {
                    state.ledger.remove_surgery(*id);
                }
                report.surgeries = led_ids.len();
                for mut surgery in assisted {
                    surgery.team.retain(|m| m.doctor != doctor);
                    state.ledger.replace_surgery(surgery);
                    report.team_memberships += 1;
                }
                for id in &visits {
                    state.ledger.remove_visit(*id);
                }
                report.visits = visits.len();

                state.availability.remove_doctor(&doctor);
                state.registry.remove_doctor(&doctor);
            }
            Role::Patient => {
                let patient = PatientId(fiscal_code.to_string());
                let surgeries: Vec<SurgeryId> = state
                    .ledger
                    .surgeries_for_patient(&patient)
                    .iter()
                    .map(|s| s.id)
                    .collect();
                let visits: Vec<VisitId> = state
                    .ledger
                    .visits_for_patient(&patient)
                    .iter()
                    .map(|v| v.id)
                    .collect();

                report.protocol_records = state.registry.remove_protocol_records(&surgeries);
                for id in &surgeries {
                    state.ledger.remove_surgery(*id);
                }
                report.surgeries = surgeries.len();
                for id in &visits {
                    state.ledger.remove_visit(*id);
                }
                report.visits = visits.len();

                state.registry.remove_patient(&patient);
            }
            Role::Nurse => {
                let nurse = NurseId(fiscal_code.to_string());
                report.shift_assignments = state.roster.remove_nurse(&nurse);
                state.registry.remove_nurse(&nurse);
            }
        }
        state.registry.remove_person(fiscal_code);

        info!(
            fiscal_code,
            surgeries = report.surgeries,
            visits = report.visits,
            protocol_records = report.protocol_records,
            shift_assignments = report.shift_assignments,
            "person deleted"
        );
        Ok(report)
    }
}
