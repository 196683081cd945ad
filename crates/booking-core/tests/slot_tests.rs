//! Tests for free slot generation.

mod common;

use booking_core::{BookingError, DateRange, DayStatus};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use common::*;

#[test]
fn one_hour_window_yields_two_half_hour_slots() {
    let service = clinic();
    service
        .set_weekly_availability(&dr("DR1"), vec![rule("DR1", Weekday::Mon, (9, 0), (10, 0))])
        .unwrap();

    let slots = service
        .available_slots(&dr("DR1"), DateRange::single(monday()).unwrap())
        .unwrap();

    assert_eq!(slots, vec![mon(9, 0), mon(9, 30)]);
}

#[test]
fn booked_visit_is_excluded_from_slots() {
    // Mon 09:00-11:00 with a visit at 09:30 → 09:00, 10:00, 10:30
    let service = clinic();
    service
        .set_weekly_availability(&dr("DR1"), vec![rule("DR1", Weekday::Mon, (9, 0), (11, 0))])
        .unwrap();
    service
        .book_visit(&dr("DR1"), &pt("PT1"), mon(9, 30), "follow-up")
        .unwrap();

    let slots = service
        .available_slots(&dr("DR1"), DateRange::single(monday()).unwrap())
        .unwrap();

    assert_eq!(slots, vec![mon(9, 0), mon(10, 0), mon(10, 30)]);
}

#[test]
fn repeated_reads_are_identical() {
    let service = clinic();
    service
        .set_weekly_availability(
            &dr("DR1"),
            vec![
                rule("DR1", Weekday::Mon, (9, 0), (12, 0)),
                rule("DR1", Weekday::Wed, (14, 0), (17, 0)),
            ],
        )
        .unwrap();
    service
        .book_visit(&dr("DR1"), &pt("PT1"), mon(10, 0), "checkup")
        .unwrap();

    let range = DateRange::new(monday(), monday() + Duration::days(14)).unwrap();
    let first = service.available_slots(&dr("DR1"), range).unwrap();
    let second = service.available_slots(&dr("DR1"), range).unwrap();

    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn overlapping_windows_do_not_duplicate_slots() {
    let service = clinic();
    service
        .set_weekly_availability(
            &dr("DR1"),
            vec![
                rule("DR1", Weekday::Mon, (9, 0), (11, 0)),
                rule("DR1", Weekday::Mon, (10, 0), (12, 0)),
            ],
        )
        .unwrap();

    let slots = service
        .available_slots(&dr("DR1"), DateRange::single(monday()).unwrap())
        .unwrap();

    assert_eq!(
        slots,
        vec![
            mon(9, 0),
            mon(9, 30),
            mon(10, 0),
            mon(10, 30),
            mon(11, 0),
            mon(11, 30)
        ]
    );
}

#[test]
fn slots_span_multiple_dates_in_order() {
    let service = clinic();
    service
        .set_weekly_availability(
            &dr("DR1"),
            vec![
                rule("DR1", Weekday::Tue, (8, 0), (9, 0)),
                rule("DR1", Weekday::Mon, (16, 0), (17, 0)),
            ],
        )
        .unwrap();

    let range = DateRange::new(monday(), monday() + Duration::days(2)).unwrap();
    let slots = service.available_slots(&dr("DR1"), range).unwrap();
    let tuesday = monday() + Duration::days(1);

    assert_eq!(
        slots,
        vec![
            mon(16, 0),
            mon(16, 30),
            at(tuesday, 8, 0),
            at(tuesday, 8, 30)
        ]
    );
}

#[test]
fn range_end_date_is_excluded() {
    let service = clinic();
    service
        .set_weekly_availability(&dr("DR1"), vec![rule("DR1", Weekday::Tue, (8, 0), (9, 0))])
        .unwrap();

    let range = DateRange::new(monday(), monday() + Duration::days(1)).unwrap();
    assert!(service.available_slots(&dr("DR1"), range).unwrap().is_empty());
}

#[test]
fn window_shorter_than_granularity_yields_nothing() {
    let service = clinic();
    service
        .set_weekly_availability(&dr("DR1"), vec![rule("DR1", Weekday::Mon, (9, 0), (9, 20))])
        .unwrap();

    let scan = service.scan_day(&dr("DR1"), monday()).unwrap();
    assert!(scan.slots.is_empty());
    assert_eq!(scan.windows.len(), 1);
}

#[test]
fn custom_granularity_changes_the_step() {
    let service = clinic();
    service
        .set_weekly_availability(&dr("DR1"), vec![rule("DR1", Weekday::Mon, (9, 0), (10, 0))])
        .unwrap();

    let slots = service
        .available_slots_every(&dr("DR1"), DateRange::single(monday()).unwrap(), 15)
        .unwrap();
    assert_eq!(slots, vec![mon(9, 0), mon(9, 15), mon(9, 30), mon(9, 45)]);

    assert!(service
        .available_slots_every(&dr("DR1"), DateRange::single(monday()).unwrap(), 0)
        .is_err());
}

#[test]
fn surgeries_consume_slots_too() {
    let service = clinic();
    service
        .set_weekly_availability(&dr("DR1"), vec![rule("DR1", Weekday::Mon, (9, 0), (12, 0))])
        .unwrap();
    service
        .schedule_surgery(surgery_request("DR1", "PT1", "OR1", mon(9, 45), mon(11, 0)))
        .unwrap();

    let slots = service
        .available_slots(&dr("DR1"), DateRange::single(monday()).unwrap())
        .unwrap();

    assert_eq!(slots, vec![mon(9, 0), mon(11, 0), mon(11, 30)]);
}

#[test]
fn approved_absence_clips_windows() {
    let service = clinic();
    service
        .set_weekly_availability(&dr("DR1"), vec![rule("DR1", Weekday::Mon, (9, 0), (12, 0))])
        .unwrap();
    let absence = service
        .add_absence(&dr("DR1"), mon(10, 0), mon(11, 0), false)
        .unwrap();

    // Pending absences do not count.
    assert_eq!(
        service
            .available_slots(&dr("DR1"), DateRange::single(monday()).unwrap())
            .unwrap()
            .len(),
        6
    );

    service.approve_absence(absence).unwrap();
    let slots = service
        .available_slots(&dr("DR1"), DateRange::single(monday()).unwrap())
        .unwrap();
    assert_eq!(slots, vec![mon(9, 0), mon(9, 30), mon(11, 0), mon(11, 30)]);
}

#[test]
fn absence_covering_the_day_removes_all_windows() {
    let service = clinic();
    service
        .set_weekly_availability(&dr("DR1"), vec![rule("DR1", Weekday::Mon, (9, 0), (12, 0))])
        .unwrap();
    service
        .add_absence(
            &dr("DR1"),
            at(monday() - Duration::days(3), 0, 0),
            at(monday() + Duration::days(4), 0, 0),
            true,
        )
        .unwrap();

    let scan = service.scan_day(&dr("DR1"), monday()).unwrap();
    assert_eq!(scan.status(), DayStatus::NoAvailability);
    assert!(scan.windows.is_empty());
}

#[test]
fn day_status_distinguishes_undeclared_from_fully_booked() {
    let service = clinic();
    service
        .set_weekly_availability(&dr("DR1"), vec![rule("DR1", Weekday::Mon, (9, 0), (10, 0))])
        .unwrap();

    let tuesday = monday() + Duration::days(1);
    assert_eq!(
        service.scan_day(&dr("DR1"), tuesday).unwrap().status(),
        DayStatus::NoAvailability
    );
    assert_eq!(
        service.scan_day(&dr("DR1"), monday()).unwrap().status(),
        DayStatus::Open
    );

    service
        .book_visit(&dr("DR1"), &pt("PT1"), mon(9, 0), "a")
        .unwrap();
    service
        .book_visit(&dr("DR1"), &pt("PT2"), mon(9, 30), "b")
        .unwrap();

    let scan = service.scan_day(&dr("DR1"), monday()).unwrap();
    assert_eq!(scan.status(), DayStatus::FullyBooked);
    assert_eq!(scan.windows.len(), 1);
    assert!(scan.slots.is_empty());
}

#[test]
fn unknown_doctor_is_not_found() {
    let service = clinic();
    let err = service
        .available_slots(&dr("NOPE"), DateRange::single(monday()).unwrap())
        .unwrap_err();
    assert!(matches!(err, booking_core::BookingError::NotFound { entity: "doctor", .. }));
}

#[test]
fn rule_set_is_replaced_wholesale() {
    let service = clinic();
    service
        .set_weekly_availability(&dr("DR1"), vec![rule("DR1", Weekday::Mon, (9, 0), (10, 0))])
        .unwrap();
    service
        .set_weekly_availability(&dr("DR1"), vec![rule("DR1", Weekday::Tue, (9, 0), (10, 0))])
        .unwrap();

    let rules = service.weekly_availability(&dr("DR1")).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].day, Weekday::Tue);
    assert!(service
        .available_slots(&dr("DR1"), DateRange::single(monday()).unwrap())
        .unwrap()
        .is_empty());
}

#[test]
fn last_representable_date_scans_without_overflow() {
    let last = NaiveDate::MAX;
    let service = clinic();
    service
        .set_weekly_availability(&dr("DR1"), vec![rule("DR1", last.weekday(), (23, 0), (23, 59))])
        .unwrap();

    let scan = service.scan_day(&dr("DR1"), last).unwrap();
    assert_eq!(scan.slots, vec![at(last, 23, 0)]);

    let week_before = last - Duration::days(7);
    let range = DateRange::new(week_before, last).unwrap();
    assert_eq!(
        service.available_slots(&dr("DR1"), range).unwrap(),
        vec![at(week_before, 23, 0)]
    );
    assert_eq!(DateRange::single(last), Err(BookingError::InvalidInterval));
}
