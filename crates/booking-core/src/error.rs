//! Error types for booking-core operations.
//!
//! The first group of variants are booking rejections: recoverable outcomes the
//! caller surfaces to the end user, who may retry with different parameters.
//! The remaining variants describe malformed input or configuration.

use thiserror::Error;

use crate::model::{DoctorId, NurseId, PatientId, RoomId, SurgeryStatus};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Requested time is outside the doctor's declared availability")]
    OutsideAvailability,

    #[error("Doctor {doctor} is already booked at the requested time")]
    DoctorBusy { doctor: DoctorId },

    #[error("Patient {patient} is already booked at the requested time")]
    PatientBusy { patient: PatientId },

    #[error("Operating room {room} is already booked at the requested time")]
    RoomBusy { room: RoomId },

    #[error("Operating room {room} is out of service")]
    RoomUnavailable { room: RoomId },

    #[error("Overlapping shift exists for this time period")]
    ShiftOverlap,

    #[error("Nurse {nurse} is already assigned to an overlapping shift")]
    NurseBusy { nurse: NurseId },

    #[error("Invalid interval: end must be after start")]
    InvalidInterval,

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: SurgeryStatus,
        to: SurgeryStatus,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl BookingError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        BookingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True for outcomes the end user can act on by choosing different
    /// parameters (busy resources, availability, bad intervals, transitions).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BookingError::OutsideAvailability
                | BookingError::DoctorBusy { .. }
                | BookingError::PatientBusy { .. }
                | BookingError::RoomBusy { .. }
                | BookingError::RoomUnavailable { .. }
                | BookingError::ShiftOverlap
                | BookingError::NurseBusy { .. }
                | BookingError::InvalidInterval
                | BookingError::NotFound { .. }
                | BookingError::InvalidTransition { .. }
                | BookingError::Forbidden(_)
        )
    }
}

impl From<serde_json::Error> for BookingError {
    fn from(err: serde_json::Error) -> Self {
        BookingError::Snapshot(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
