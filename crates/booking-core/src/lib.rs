//! # booking-core
//!
//! Bookable time for doctors, patients and operating rooms.
//!
//! A doctor's recurring weekly availability, their approved absences and the
//! set of already-booked visits and surgeries are reconciled into a list of
//! free slots, and every new booking is admitted only if it leaves no doctor,
//! patient or room claimed twice at overlapping times.
//!
//! ## Quick start
//!
//! ```rust
//! use booking_core::{BookingService, DateRange, SchedulingConfig};
//! use booking_core::model::{Doctor, DoctorId, Patient, PatientId, WeeklyAvailabilityRule};
//! use chrono::{NaiveDate, NaiveTime, Weekday};
//!
//! let service = BookingService::new(SchedulingConfig::default()).unwrap();
//! let doctor = DoctorId::from("RSSMRA80A01H501U");
//! service.register_doctor("Mario Rossi", Doctor {
//!     id: doctor.clone(),
//!     registration_number: "RM-1234".into(),
//!     specialization: None,
//! }).unwrap();
//! service.register_patient("Anna Bianchi", Patient { id: PatientId::from("BNCNNA90B41F205X"), blood_group: None }).unwrap();
//! service.set_weekly_availability(&doctor, vec![WeeklyAvailabilityRule::new(
//!     doctor.clone(),
//!     Weekday::Mon,
//!     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
//!     NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
//! )]).unwrap();
//!
//! let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
//! let slots = service.available_slots(&doctor, DateRange::single(monday).unwrap()).unwrap();
//! assert_eq!(slots.len(), 2); // 09:00 and 09:30
//! ```
//!
//! ## Modules
//!
//! - [`interval`]: half-open `[start, end)` ranges and date ranges
//! - [`availability`]: weekly working windows clipped by approved absences
//! - [`ledger`]: accepted visits and surgeries indexed by doctor, patient and room
//! - [`slots`]: free slot generation and per-day diagnostics
//! - [`conflict`]: admission checks for proposed visits, surgeries and shifts
//! - [`service`]: the orchestrating entry point, including cascade deletes
//! - [`registry`]: people, rooms, surgery types and protocol records
//! - [`roster`]: nursing shifts and nurse assignments
//! - [`snapshot`]: serializable image of the whole clinic
//! - [`config`], [`timezone`], [`model`], [`error`]

pub mod availability;
pub mod config;
pub mod conflict;
pub mod error;
pub mod interval;
pub mod ledger;
pub mod model;
pub mod registry;
pub mod roster;
pub mod service;
pub mod slots;
pub mod snapshot;
pub mod timezone;

pub use availability::WeeklyAvailabilityIndex;
pub use config::SchedulingConfig;
pub use conflict::{find_conflicts, ConflictGuard, ShiftGuard};
pub use error::BookingError;
pub use interval::{DateRange, Interval};
pub use ledger::{BookingLedger, InMemoryLedger};
pub use roster::{NurseWorkload, ShiftRoster};
pub use service::{BookingService, DeletionReport, DoctorSchedule, SurgeryRequest, SurgeryUpdate};
pub use slots::{DayScan, DayStatus, SlotGenerator};
pub use snapshot::ClinicSnapshot;
