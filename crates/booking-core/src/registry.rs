//! Reference data the scheduling core resolves ids against: people and their
//! role records, operating rooms, surgery types and post-operative protocol records.

use std::collections::BTreeMap;

use crate::error::{BookingError, Result};
use crate::model::{
    Doctor, DoctorId, Nurse, NurseId, OperatingRoom, Patient, PatientId, Person,
    ProtocolRecord, ProtocolRecordId, Role, RoomId, SurgeryId, SurgeryType, SurgeryTypeId,
};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    people: BTreeMap<String, Person>,
    doctors: BTreeMap<DoctorId, Doctor>,
    patients: BTreeMap<PatientId, Patient>,
    nurses: BTreeMap<NurseId, Nurse>,
    rooms: BTreeMap<RoomId, OperatingRoom>,
    surgery_types: BTreeMap<SurgeryTypeId, SurgeryType>,
    protocol_records: BTreeMap<ProtocolRecordId, ProtocolRecord>,
    next_protocol_record: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a doctor: base record plus doctor role record.
    pub fn add_doctor(&mut self, name: &str, doctor: Doctor) -> Result<()> {
        self.claim_person(doctor.id.as_str(), name, Role::Doctor)?;
        self.doctors.insert(doctor.id.clone(), doctor);
        Ok(())
    }

    /// Register a patient: base record plus patient role record.
    pub fn add_patient(&mut self, name: &str, patient: Patient) -> Result<()> {
        self.claim_person(patient.id.as_str(), name, Role::Patient)?;
        self.patients.insert(patient.id.clone(), patient);
        Ok(())
    }

    /// Register a nurse: base record plus nurse role record.
    pub fn add_nurse(&mut self, name: &str, nurse: Nurse) -> Result<()> {
        self.claim_person(nurse.id.as_str(), name, Role::Nurse)?;
        self.nurses.insert(nurse.id.clone(), nurse);
        Ok(())
    }

    pub fn add_administrator(&mut self, fiscal_code: &str, name: &str) -> Result<()> {
        self.claim_person(fiscal_code, name, Role::Administrator)
    }

    /// Write the base record for `fiscal_code`. Re-registering under the same
    /// role updates the name; a code held under another role is refused.
    fn claim_person(&mut self, fiscal_code: &str, name: &str, role: Role) -> Result<()> {
        if let Some(existing) = self.people.get(fiscal_code) {
            if existing.role != role {
                return Err(BookingError::Forbidden(format!(
                    "{fiscal_code} is already registered as {}",
                    existing.role
                )));
            }
        }
        self.people.insert(
            fiscal_code.to_string(),
            Person {
                fiscal_code: fiscal_code.to_string(),
                name: name.to_string(),
                role,
            },
        );
        Ok(())
    }

    /// Restore a base record as-is (snapshot loading).
    pub fn insert_person(&mut self, person: Person) {
        self.people.insert(person.fiscal_code.clone(), person);
    }

    pub fn insert_doctor(&mut self, doctor: Doctor) {
        self.doctors.insert(doctor.id.clone(), doctor);
    }

    pub fn insert_patient(&mut self, patient: Patient) {
        self.patients.insert(patient.id.clone(), patient);
    }

    pub fn insert_nurse(&mut self, nurse: Nurse) {
        self.nurses.insert(nurse.id.clone(), nurse);
    }

    pub fn add_room(&mut self, room: OperatingRoom) {
        self.rooms.insert(room.id.clone(), room);
    }

    pub fn add_surgery_type(&mut self, surgery_type: SurgeryType) {
        self.surgery_types
            .insert(surgery_type.id.clone(), surgery_type);
    }

    pub fn add_protocol_record(&mut self, surgery: SurgeryId, note: &str) -> ProtocolRecordId {
        let id = ProtocolRecordId(self.next_protocol_record);
        self.insert_protocol_record(ProtocolRecord {
            id,
            surgery,
            note: note.to_string(),
        });
        id
    }

    pub fn insert_protocol_record(&mut self, record: ProtocolRecord) {
        self.next_protocol_record = self
            .next_protocol_record
            .max(record.id.0.saturating_add(1));
        self.protocol_records.insert(record.id, record);
    }

    pub fn person(&self, fiscal_code: &str) -> Result<&Person> {
        self.people
            .get(fiscal_code)
            .ok_or_else(|| BookingError::not_found("person", fiscal_code))
    }

    pub fn doctor(&self, id: &DoctorId) -> Result<&Doctor> {
        self.doctors
            .get(id)
            .ok_or_else(|| BookingError::not_found("doctor", id))
    }

    pub fn patient(&self, id: &PatientId) -> Result<&Patient> {
        self.patients
            .get(id)
            .ok_or_else(|| BookingError::not_found("patient", id))
    }

    pub fn nurse(&self, id: &NurseId) -> Result<&Nurse> {
        self.nurses
            .get(id)
            .ok_or_else(|| BookingError::not_found("nurse", id))
    }

    pub fn room(&self, id: &RoomId) -> Result<&OperatingRoom> {
        self.rooms
            .get(id)
            .ok_or_else(|| BookingError::not_found("operating room", id))
    }

    pub fn surgery_type(&self, id: &SurgeryTypeId) -> Result<&SurgeryType> {
        self.surgery_types
            .get(id)
            .ok_or_else(|| BookingError::not_found("surgery type", id))
    }

    /// Resolve a room that can take new surgeries.
    pub fn usable_room(&self, id: &RoomId) -> Result<&OperatingRoom> {
        let room = self.room(id)?;
        if !room.available {
            return Err(BookingError::RoomUnavailable { room: id.clone() });
        }
        Ok(room)
    }

    pub fn set_room_available(&mut self, id: &RoomId, available: bool) -> Result<&OperatingRoom> {
        let room = self
            .rooms
            .get_mut(id)
            .ok_or_else(|| BookingError::not_found("operating room", id))?;
        room.available = available;
        Ok(room)
    }

    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    pub fn doctors(&self) -> impl Iterator<Item = &Doctor> {
        self.doctors.values()
    }

    pub fn patients(&self) -> impl Iterator<Item = &Patient> {
        self.patients.values()
    }

    pub fn nurses(&self) -> impl Iterator<Item = &Nurse> {
        self.nurses.values()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &OperatingRoom> {
        self.rooms.values()
    }

    pub fn surgery_types(&self) -> impl Iterator<Item = &SurgeryType> {
        self.surgery_types.values()
    }

    pub fn protocol_records(&self) -> impl Iterator<Item = &ProtocolRecord> {
        self.protocol_records.values()
    }

    pub fn protocol_records_for(&self, surgery: SurgeryId) -> Vec<&ProtocolRecord> {
        self.protocol_records
            .values()
            .filter(|r| r.surgery == surgery)
            .collect()
    }

    /// Remove every protocol record attached to one of `surgeries`; returns how many.
    pub(crate) fn remove_protocol_records(&mut self, surgeries: &[SurgeryId]) -> usize {
        let before = self.protocol_records.len();
        self.protocol_records
            .retain(|_, r| !surgeries.contains(&r.surgery));
        before - self.protocol_records.len()
    }

    pub(crate) fn remove_doctor(&mut self, id: &DoctorId) -> Option<Doctor> {
        self.doctors.remove(id)
    }

    pub(crate) fn remove_patient(&mut self, id: &PatientId) -> Option<Patient> {
        self.patients.remove(id)
    }

    pub(crate) fn remove_nurse(&mut self, id: &NurseId) -> Option<Nurse> {
        self.nurses.remove(id)
    }

    pub(crate) fn remove_person(&mut self, fiscal_code: &str) -> Option<Person> {
        self.people.remove(fiscal_code)
    }
}
