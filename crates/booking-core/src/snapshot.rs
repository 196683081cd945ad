//! Serializable image of a whole clinic: configuration, reference data,
//! availability and every booked event.
//!
//! Events in a snapshot were admitted when they were booked; loading one
//! records them straight into the ledger without re-running admission.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::availability::WeeklyAvailabilityIndex;
use crate::config::SchedulingConfig;
use crate::error::{BookingError, Result};
use crate::ledger::{BookingLedger, InMemoryLedger};
use crate::model::{
    Absence, Doctor, DoctorId, Nurse, OperatingRoom, Patient, Person, ProtocolRecord, Shift,
    Surgery, SurgeryType, Visit, WeeklyAvailabilityRule,
};
use crate::registry::Registry;
use crate::roster::ShiftRoster;
use crate::service::BookingService;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicSnapshot {
    pub config: SchedulingConfig,
    pub people: Vec<Person>,
    pub doctors: Vec<Doctor>,
    pub patients: Vec<Patient>,
    pub nurses: Vec<Nurse>,
    pub rooms: Vec<OperatingRoom>,
    pub surgery_types: Vec<SurgeryType>,
    pub weekly_rules: Vec<WeeklyAvailabilityRule>,
    pub absences: Vec<Absence>,
    pub visits: Vec<Visit>,
    pub surgeries: Vec<Surgery>,
    pub protocol_records: Vec<ProtocolRecord>,
    pub shifts: Vec<Shift>,
}

impl ClinicSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl BookingService<InMemoryLedger> {
    /// Rebuild a service from a snapshot.
    ///
    /// Numeric ids must leave room for a successor, so `u64::MAX` is refused.
    pub fn from_snapshot(snapshot: ClinicSnapshot) -> Result<Self> {
        snapshot.config.validate()?;
        check_ids("visit", snapshot.visits.iter().map(|v| v.id.0))?;
        check_ids("surgery", snapshot.surgeries.iter().map(|s| s.id.0))?;
        check_ids("absence", snapshot.absences.iter().map(|a| a.id.0))?;
        check_ids("protocol record", snapshot.protocol_records.iter().map(|r| r.id.0))?;
        check_ids("shift", snapshot.shifts.iter().map(|s| s.id.0))?;

        let mut registry = Registry::new();
        for person in snapshot.people {
            registry.insert_person(person);
        }
        for doctor in snapshot.doctors {
            registry.insert_doctor(doctor);
        }
        for patient in snapshot.patients {
            registry.insert_patient(patient);
        }
        for nurse in snapshot.nurses {
            registry.insert_nurse(nurse);
        }
        for room in snapshot.rooms {
            registry.add_room(room);
        }
        for surgery_type in snapshot.surgery_types {
            registry.add_surgery_type(surgery_type);
        }
        for record in snapshot.protocol_records {
            registry.insert_protocol_record(record);
        }

        let mut availability = WeeklyAvailabilityIndex::new();
        let mut by_doctor: BTreeMap<DoctorId, Vec<WeeklyAvailabilityRule>> = BTreeMap::new();
        for rule in snapshot.weekly_rules {
            by_doctor.entry(rule.doctor.clone()).or_default().push(rule);
        }
        for (doctor, rules) in by_doctor {
            availability.replace_rules(&doctor, rules)?;
        }
        for absence in snapshot.absences {
            availability.insert_absence(absence);
        }

        let mut ledger = InMemoryLedger::new(snapshot.config.visit_duration());
        for visit in snapshot.visits {
            ledger.record_visit(visit);
        }
        for surgery in snapshot.surgeries {
            ledger.record_surgery(surgery);
        }

        let mut roster = ShiftRoster::new();
        for shift in snapshot.shifts {
            roster.insert_shift(shift);
        }

        Self::with_parts(snapshot.config, registry, availability, ledger, roster)
    }
}

fn check_ids(kind: &str, mut ids: impl Iterator<Item = u64>) -> Result<()> {
    match ids.find(|id| *id == u64::MAX) {
        Some(id) => Err(BookingError::Snapshot(format!("{kind} id out of range: {id}"))),
        None => Ok(()),
    }
}

impl<L: BookingLedger> BookingService<L> {
    /// Export the current state. Collections come out in a stable order.
    pub fn snapshot(&self) -> ClinicSnapshot {
        let state = self.lock();

        let mut weekly_rules: Vec<WeeklyAvailabilityRule> =
            state.availability.all_rules().cloned().collect();
        weekly_rules.sort_by(|a, b| {
            (&a.doctor, a.day.num_days_from_monday(), a.start, a.end).cmp(&(
                &b.doctor,
                b.day.num_days_from_monday(),
                b.start,
                b.end,
            ))
        });
        let mut absences: Vec<Absence> = state.availability.all_absences().cloned().collect();
        absences.sort_by_key(|a| a.id);

        ClinicSnapshot {
            config: *self.config(),
            people: state.registry.people().cloned().collect(),
            doctors: state.registry.doctors().cloned().collect(),
            patients: state.registry.patients().cloned().collect(),
            nurses: state.registry.nurses().cloned().collect(),
            rooms: state.registry.rooms().cloned().collect(),
            surgery_types: state.registry.surgery_types().cloned().collect(),
            weekly_rules,
            absences,
            visits: state.ledger.visits().into_iter().cloned().collect(),
            surgeries: state.ledger.surgeries().into_iter().cloned().collect(),
            protocol_records: state.registry.protocol_records().cloned().collect(),
            shifts: state.roster.shifts().cloned().collect(),
        }
    }
}
