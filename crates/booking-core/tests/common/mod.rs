//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use booking_core::model::{
    Doctor, DoctorId, OperatingRoom, Patient, PatientId, RoomId, SurgeryType, SurgeryTypeId,
    WeeklyAvailabilityRule,
};
use booking_core::{BookingService, SchedulingConfig, SurgeryRequest};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

pub const ADMIN: &str = "ADM1";

pub fn dr(id: &str) -> DoctorId {
    DoctorId::from(id)
}

pub fn pt(id: &str) -> PatientId {
    PatientId::from(id)
}

pub fn room(id: &str) -> RoomId {
    RoomId::from(id)
}

/// 2026-03-02, a Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

pub fn at(date: NaiveDate, hour: u32, min: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, min, 0).unwrap()
}

/// A time on the reference Monday.
pub fn mon(hour: u32, min: u32) -> NaiveDateTime {
    at(monday(), hour, min)
}

pub fn rule(doctor: &str, day: Weekday, start: (u32, u32), end: (u32, u32)) -> WeeklyAvailabilityRule {
    WeeklyAvailabilityRule::new(
        dr(doctor),
        day,
        NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
    )
}

pub fn surgery_request(
    doctor: &str,
    patient: &str,
    room_id: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> SurgeryRequest {
    SurgeryRequest {
        doctor: dr(doctor),
        patient: pt(patient),
        room: room(room_id),
        surgery_type: SurgeryTypeId::from("APP"),
        start,
        end,
        team: Vec::new(),
    }
}

/// Two doctors, two patients, two rooms, one surgery type and an administrator.
/// No availability is declared.
pub fn clinic() -> BookingService {
    clinic_with(SchedulingConfig::default())
}

pub fn clinic_with(config: SchedulingConfig) -> BookingService {
    let service = BookingService::new(config).unwrap();
    for (id, name) in [("DR1", "Mario Rossi"), ("DR2", "Luca Verdi")] {
        service
            .register_doctor(
                name,
                Doctor {
                    id: dr(id),
                    registration_number: format!("RM-{id}"),
                    specialization: Some("general surgery".into()),
                },
            )
            .unwrap();
    }
    for (id, name) in [("PT1", "Anna Bianchi"), ("PT2", "Giulia Neri")] {
        service
            .register_patient(
                name,
                Patient {
                    id: pt(id),
                    blood_group: None,
                },
            )
            .unwrap();
    }
    for id in ["OR1", "OR2"] {
        service.add_room(OperatingRoom {
            id: room(id),
            name: format!("Theatre {id}"),
            available: true,
        });
    }
    service.add_surgery_type(SurgeryType {
        id: SurgeryTypeId::from("APP"),
        name: "Appendectomy".into(),
    });
    service.register_administrator(ADMIN, "Clinic Admin").unwrap();
    service
}
