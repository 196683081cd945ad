//! Surgery rescheduling and status transitions.

mod common;

use booking_core::model::{SurgeryId, SurgeryStatus};
use booking_core::{BookingError, SurgeryUpdate};
use common::*;

fn status(status: SurgeryStatus) -> SurgeryUpdate {
    SurgeryUpdate {
        status: Some(status),
        ..Default::default()
    }
}

fn moved(start: chrono::NaiveDateTime, end: chrono::NaiveDateTime) -> SurgeryUpdate {
    SurgeryUpdate {
        start: Some(start),
        end: Some(end),
        ..Default::default()
    }
}

#[test]
fn surgery_runs_through_its_lifecycle() {
    let service = clinic();
    let surgery = service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(14, 0), mon(16, 0)))
        .unwrap();
    assert_eq!(surgery.status, SurgeryStatus::Scheduled);

    let started = service
        .update_surgery(surgery.id, status(SurgeryStatus::InProgress))
        .unwrap();
    assert_eq!(started.status, SurgeryStatus::InProgress);

    let done = service
        .update_surgery(surgery.id, status(SurgeryStatus::Completed))
        .unwrap();
    assert_eq!(done.status, SurgeryStatus::Completed);
    assert_eq!(service.surgery(surgery.id).unwrap().status, SurgeryStatus::Completed);
}

#[test]
fn terminal_surgeries_are_immutable() {
    let service = clinic();
    let surgery = service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(14, 0), mon(16, 0)))
        .unwrap();
    service
        .update_surgery(surgery.id, status(SurgeryStatus::Cancelled))
        .unwrap();

    let err = service
        .update_surgery(surgery.id, status(SurgeryStatus::InProgress))
        .unwrap_err();
    assert_eq!(
        err,
        BookingError::InvalidTransition {
            from: SurgeryStatus::Cancelled,
            to: SurgeryStatus::InProgress
        }
    );

    let err = service
        .update_surgery(surgery.id, moved(mon(17, 0), mon(18, 0)))
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidTransition { from: SurgeryStatus::Cancelled, .. }));
}

#[test]
fn skipping_or_repeating_a_state_is_rejected() {
    let service = clinic();
    let surgery = service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(14, 0), mon(16, 0)))
        .unwrap();

    assert_eq!(
        service
            .update_surgery(surgery.id, status(SurgeryStatus::Completed))
            .unwrap_err(),
        BookingError::InvalidTransition {
            from: SurgeryStatus::Scheduled,
            to: SurgeryStatus::Completed
        }
    );
    assert_eq!(
        service
            .update_surgery(surgery.id, status(SurgeryStatus::Scheduled))
            .unwrap_err(),
        BookingError::InvalidTransition {
            from: SurgeryStatus::Scheduled,
            to: SurgeryStatus::Scheduled
        }
    );
}

#[test]
fn reschedule_may_overlap_its_own_prior_slot() {
    let service = clinic();
    let surgery = service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(14, 0), mon(16, 0)))
        .unwrap();

    let updated = service
        .update_surgery(surgery.id, moved(mon(15, 0), mon(17, 0)))
        .unwrap();
    assert_eq!(updated.interval.start(), mon(15, 0));
    assert_eq!(updated.interval.end(), mon(17, 0));

    // Only the end changes.
    let updated = service
        .update_surgery(
            surgery.id,
            SurgeryUpdate {
                end: Some(mon(16, 30)),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.interval.start(), mon(15, 0));
    assert_eq!(updated.interval.end(), mon(16, 30));
}

#[test]
fn rejected_reschedule_leaves_surgery_untouched() {
    let service = clinic();
    let first = service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(9, 0), mon(10, 0)))
        .unwrap();
    service
        .schedule_surgery(surgery_request("DR2", "PT2", "OR1", mon(11, 0), mon(12, 0)))
        .unwrap();

    let err = service
        .update_surgery(first.id, moved(mon(10, 30), mon(11, 30)))
        .unwrap_err();
    assert_eq!(err, BookingError::RoomBusy { room: room("OR1") });
    assert_eq!(service.surgery(first.id).unwrap(), first);

    // A combined reschedule and start is all-or-nothing too.
    let err = service
        .update_surgery(
            first.id,
            SurgeryUpdate {
                start: Some(mon(10, 30)),
                end: Some(mon(11, 30)),
                status: Some(SurgeryStatus::InProgress),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err, BookingError::RoomBusy { room: room("OR1") });
    assert_eq!(service.surgery(first.id).unwrap().status, SurgeryStatus::Scheduled);
}

#[test]
fn reschedule_and_start_apply_together() {
    let service = clinic();
    let surgery = service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(9, 0), mon(10, 0)))
        .unwrap();

    let updated = service
        .update_surgery(
            surgery.id,
            SurgeryUpdate {
                start: Some(mon(8, 30)),
                end: Some(mon(9, 30)),
                room: Some(room("OR2")),
                status: Some(SurgeryStatus::InProgress),
            },
        )
        .unwrap();
    assert_eq!(updated.status, SurgeryStatus::InProgress);
    assert_eq!(updated.room, room("OR2"));
    assert_eq!(updated.interval.start(), mon(8, 30));
}

#[test]
fn in_progress_surgery_cannot_be_moved() {
    let service = clinic();
    let surgery = service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(9, 0), mon(10, 0)))
        .unwrap();
    service
        .update_surgery(surgery.id, status(SurgeryStatus::InProgress))
        .unwrap();

    let err = service
        .update_surgery(surgery.id, moved(mon(11, 0), mon(12, 0)))
        .unwrap_err();
    assert_eq!(
        err,
        BookingError::InvalidTransition {
            from: SurgeryStatus::InProgress,
            to: SurgeryStatus::InProgress
        }
    );
}

#[test]
fn cancelled_surgery_frees_its_room_and_people() {
    let service = clinic();
    let surgery = service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(14, 0), mon(16, 0)))
        .unwrap();
    service
        .update_surgery(surgery.id, status(SurgeryStatus::Cancelled))
        .unwrap();

    assert!(service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(14, 0), mon(16, 0)))
        .is_ok());
}

#[test]
fn out_of_service_room_refuses_new_bookings() {
    let service = clinic();
    let existing = service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(9, 0), mon(10, 0)))
        .unwrap();
    let other = service
        .schedule_surgery(surgery_request("DR2", "PT2", "OR2", mon(9, 0), mon(10, 0)))
        .unwrap();

    service.set_room_available(&room("OR1"), false).unwrap();

    let err = service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(14, 0), mon(15, 0)))
        .unwrap_err();
    assert_eq!(err, BookingError::RoomUnavailable { room: room("OR1") });

    let err = service
        .update_surgery(
            other.id,
            SurgeryUpdate {
                room: Some(room("OR1")),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err, BookingError::RoomUnavailable { room: room("OR1") });

    // Surgeries already booked there are left alone.
    assert_eq!(service.surgery(existing.id).unwrap(), existing);
    assert!(service
        .update_surgery(existing.id, status(SurgeryStatus::InProgress))
        .is_ok());
}

#[test]
fn empty_update_returns_the_surgery_unchanged() {
    let service = clinic();
    let surgery = service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(9, 0), mon(10, 0)))
        .unwrap();
    assert_eq!(
        service
            .update_surgery(surgery.id, SurgeryUpdate::default())
            .unwrap(),
        surgery
    );
}

#[test]
fn unknown_surgery_is_not_found() {
    let service = clinic();
    assert!(matches!(
        service.update_surgery(SurgeryId(42), status(SurgeryStatus::Cancelled)),
        Err(BookingError::NotFound { entity: "surgery", .. })
    ));
    assert!(matches!(
        service.add_protocol_record(SurgeryId(42), "note"),
        Err(BookingError::NotFound { entity: "surgery", .. })
    ));
}
