//! The booking ledger: every accepted visit and surgery, indexed by doctor,
//! patient and operating room.
//!
//! The ledger performs no validation. Writes are only issued after the
//! conflict guard has admitted an event, and the service serializes
//! admit-then-record so no two writers can interleave between them.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

use chrono::Duration;
use serde::Serialize;

use crate::interval::Interval;
use crate::model::{DoctorId, PatientId, RoomId, ShiftId, Surgery, SurgeryId, Visit, VisitId};

/// Reference to a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EventRef {
    Visit(VisitId),
    Surgery(SurgeryId),
    /// A nursing shift; never stored in the ledger.
    Shift(ShiftId),
}

/// A time range claimed by a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub interval: Interval,
    pub event: EventRef,
}

/// Read/write contract of the ledger.
///
/// Occupancy queries return only entries that still claim time (cancelled
/// surgeries do not), overlapping `range`, sorted by interval start.
pub trait BookingLedger {
    /// Length of the interval a visit occupies.
    fn visit_duration(&self) -> Duration;

    fn visit(&self, id: VisitId) -> Option<&Visit>;
    fn surgery(&self, id: SurgeryId) -> Option<&Surgery>;
    fn visits(&self) -> Vec<&Visit>;
    fn surgeries(&self) -> Vec<&Surgery>;

    /// Visits of the doctor, ordered by instant.
    fn visits_for_doctor(&self, doctor: &DoctorId) -> Vec<&Visit>;
    /// Surgeries the doctor leads or takes part in, ordered by start.
    fn surgeries_for_doctor(&self, doctor: &DoctorId) -> Vec<&Surgery>;
    fn visits_for_patient(&self, patient: &PatientId) -> Vec<&Visit>;
    fn surgeries_for_patient(&self, patient: &PatientId) -> Vec<&Surgery>;

    fn occupied_by_doctor(&self, doctor: &DoctorId, range: &Interval) -> Vec<Occupancy>;
    fn occupied_by_patient(&self, patient: &PatientId, range: &Interval) -> Vec<Occupancy>;
    fn occupied_by_room(&self, room: &RoomId, range: &Interval) -> Vec<Occupancy>;

    fn next_visit_id(&mut self) -> VisitId;
    fn next_surgery_id(&mut self) -> SurgeryId;

    fn record_visit(&mut self, visit: Visit);
    fn record_surgery(&mut self, surgery: Surgery);
    /// Replace a stored surgery, reindexing it. Returns the previous version.
    fn replace_surgery(&mut self, surgery: Surgery) -> Option<Surgery>;
    fn set_visit_outcome(&mut self, id: VisitId, outcome: String) -> Option<&Visit>;
    fn remove_visit(&mut self, id: VisitId) -> Option<Visit>;
    fn remove_surgery(&mut self, id: SurgeryId) -> Option<Surgery>;
}

/// In-process ledger backed by ordered maps and three derived indices.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    visit_duration: Duration,
    visits: BTreeMap<VisitId, Visit>,
    surgeries: BTreeMap<SurgeryId, Surgery>,
    by_doctor: HashMap<DoctorId, BTreeSet<EventRef>>,
    by_patient: HashMap<PatientId, BTreeSet<EventRef>>,
    by_room: HashMap<RoomId, BTreeSet<SurgeryId>>,
    next_visit: u64,
    next_surgery: u64,
}

impl InMemoryLedger {
    /// `visit_duration` must be positive; it is taken from a validated
    /// [`SchedulingConfig`](crate::config::SchedulingConfig).
    pub fn new(visit_duration: Duration) -> Self {
        Self {
            visit_duration,
            visits: BTreeMap::new(),
            surgeries: BTreeMap::new(),
            by_doctor: HashMap::new(),
            by_patient: HashMap::new(),
            by_room: HashMap::new(),
            next_visit: 1,
            next_surgery: 1,
        }
    }

    fn occupancy_of(&self, event: EventRef) -> Option<Occupancy> {
        let interval = match event {
            EventRef::Visit(id) => self.visits.get(&id)?.occupied(self.visit_duration).ok()?,
            EventRef::Surgery(id) => {
                let surgery = self.surgeries.get(&id)?;
                if !surgery.status.occupies() {
                    return None;
                }
                surgery.interval
            }
            EventRef::Shift(_) => return None,
        };
        Some(Occupancy { interval, event })
    }

    fn resolve(&self, refs: impl Iterator<Item = EventRef>, range: &Interval) -> Vec<Occupancy> {
        let mut occupied: Vec<Occupancy> = refs
            .filter_map(|event| self.occupancy_of(event))
            .filter(|o| o.interval.overlaps(range))
            .collect();
        occupied.sort_by_key(|o| (o.interval, o.event));
        occupied
    }

    fn index_surgery(&mut self, surgery: &Surgery) {
        let event = EventRef::Surgery(surgery.id);
        for doctor in surgery.doctors() {
            self.by_doctor.entry(doctor.clone()).or_default().insert(event);
        }
        self.by_patient
            .entry(surgery.patient.clone())
            .or_default()
            .insert(event);
        self.by_room
            .entry(surgery.room.clone())
            .or_default()
            .insert(surgery.id);
    }

    fn unindex_surgery(&mut self, surgery: &Surgery) {
        let event = EventRef::Surgery(surgery.id);
        for doctor in surgery.doctors() {
            remove_from(&mut self.by_doctor, doctor, &event);
        }
        remove_from(&mut self.by_patient, &surgery.patient, &event);
        remove_from(&mut self.by_room, &surgery.room, &surgery.id);
    }
}

fn remove_from<K, V>(index: &mut HashMap<K, BTreeSet<V>>, key: &K, value: &V)
where
    K: Eq + Hash,
    V: Ord,
{
    if let Some(set) = index.get_mut(key) {
        set.remove(value);
        if set.is_empty() {
            index.remove(key);
        }
    }
}

impl BookingLedger for InMemoryLedger {
    fn visit_duration(&self) -> Duration {
        self.visit_duration
    }

    fn visit(&self, id: VisitId) -> Option<&Visit> {
        self.visits.get(&id)
    }

    fn surgery(&self, id: SurgeryId) -> Option<&Surgery> {
        self.surgeries.get(&id)
    }

    fn visits(&self) -> Vec<&Visit> {
        self.visits.values().collect()
    }

    fn surgeries(&self) -> Vec<&Surgery> {
        self.surgeries.values().collect()
    }

    fn visits_for_doctor(&self, doctor: &DoctorId) -> Vec<&Visit> {
        let mut visits: Vec<&Visit> = self.visits.values().filter(|v| v.doctor == *doctor).collect();
        visits.sort_by_key(|v| (v.instant, v.id));
        visits
    }

    fn surgeries_for_doctor(&self, doctor: &DoctorId) -> Vec<&Surgery> {
        let mut surgeries: Vec<&Surgery> = self
            .surgeries
            .values()
            .filter(|s| s.involves_doctor(doctor))
            .collect();
        surgeries.sort_by_key(|s| (s.interval, s.id));
        surgeries
    }

    fn visits_for_patient(&self, patient: &PatientId) -> Vec<&Visit> {
        let mut visits: Vec<&Visit> = self.visits.values().filter(|v| v.patient == *patient).collect();
        visits.sort_by_key(|v| (v.instant, v.id));
        visits
    }

    fn surgeries_for_patient(&self, patient: &PatientId) -> Vec<&Surgery> {
        let mut surgeries: Vec<&Surgery> = self
            .surgeries
            .values()
            .filter(|s| s.patient == *patient)
            .collect();
        surgeries.sort_by_key(|s| (s.interval, s.id));
        surgeries
    }

    fn occupied_by_doctor(&self, doctor: &DoctorId, range: &Interval) -> Vec<Occupancy> {
        match self.by_doctor.get(doctor) {
            Some(refs) => self.resolve(refs.iter().copied(), range),
            None => Vec::new(),
        }
    }

    fn occupied_by_patient(&self, patient: &PatientId, range: &Interval) -> Vec<Occupancy> {
        match self.by_patient.get(patient) {
            Some(refs) => self.resolve(refs.iter().copied(), range),
            None => Vec::new(),
        }
    }

    fn occupied_by_room(&self, room: &RoomId, range: &Interval) -> Vec<Occupancy> {
        match self.by_room.get(room) {
            Some(ids) => self.resolve(ids.iter().map(|id| EventRef::Surgery(*id)), range),
            None => Vec::new(),
        }
    }

    fn next_visit_id(&mut self) -> VisitId {
        let id = VisitId(self.next_visit);
        self.next_visit = self.next_visit.saturating_add(1);
        id
    }

    fn next_surgery_id(&mut self) -> SurgeryId {
        let id = SurgeryId(self.next_surgery);
        self.next_surgery = self.next_surgery.saturating_add(1);
        id
    }

    fn record_visit(&mut self, visit: Visit) {
        let event = EventRef::Visit(visit.id);
        self.next_visit = self.next_visit.max(visit.id.0.saturating_add(1));
        self.by_doctor
            .entry(visit.doctor.clone())
            .or_default()
            .insert(event);
        self.by_patient
            .entry(visit.patient.clone())
            .or_default()
            .insert(event);
        self.visits.insert(visit.id, visit);
    }

    fn record_surgery(&mut self, surgery: Surgery) {
        self.next_surgery = self.next_surgery.max(surgery.id.0.saturating_add(1));
        self.index_surgery(&surgery);
        self.surgeries.insert(surgery.id, surgery);
    }

    fn replace_surgery(&mut self, surgery: Surgery) -> Option<Surgery> {
        let previous = self.remove_surgery(surgery.id);
        self.record_surgery(surgery);
        previous
    }

    fn set_visit_outcome(&mut self, id: VisitId, outcome: String) -> Option<&Visit> {
        let visit = self.visits.get_mut(&id)?;
        visit.outcome = Some(outcome);
        Some(&*visit)
    }

    fn remove_visit(&mut self, id: VisitId) -> Option<Visit> {
        let visit = self.visits.remove(&id)?;
        let event = EventRef::Visit(id);
        remove_from(&mut self.by_doctor, &visit.doctor, &event);
        remove_from(&mut self.by_patient, &visit.patient, &event);
        Some(visit)
    }

    fn remove_surgery(&mut self, id: SurgeryId) -> Option<Surgery> {
        let surgery = self.surgeries.remove(&id)?;
        self.unindex_surgery(&surgery);
        Some(surgery)
    }
}
