//! Weekly availability index: recurring working windows minus approved absences.
//!
//! Rules are grouped per doctor and weekday. Projecting them onto a calendar
//! date yields that date's declared windows; approved absences are then
//! subtracted, clipping or removing windows. Windows are never merged with one
//! another, so overlapping declared rules surface as overlapping windows and the
//! slot generator deduplicates candidates itself.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::{BookingError, Result};
use crate::interval::Interval;
use crate::model::{Absence, AbsenceId, DoctorId, WeeklyAvailabilityRule};

type WeekRules = [Vec<WeeklyAvailabilityRule>; 7];

#[derive(Debug, Clone, Default)]
pub struct WeeklyAvailabilityIndex {
    rules: HashMap<DoctorId, WeekRules>,
    absences: HashMap<DoctorId, Vec<Absence>>,
    next_absence_id: u64,
}

impl WeeklyAvailabilityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the doctor's whole rule set.
    ///
    /// Every rule is validated before anything changes, so an invalid rule
    /// leaves the previous set in place. Each stored rule is attributed to
    /// `doctor` regardless of the doctor named inside it.
    pub fn replace_rules(
        &mut self,
        doctor: &DoctorId,
        rules: Vec<WeeklyAvailabilityRule>,
    ) -> Result<usize> {
        if rules.iter().any(|r| r.start >= r.end) {
            return Err(BookingError::InvalidInterval);
        }

        let mut week: WeekRules = Default::default();
        let count = rules.len();
        for mut rule in rules {
            rule.doctor = doctor.clone();
            week[rule.day.num_days_from_monday() as usize].push(rule);
        }
        self.rules.insert(doctor.clone(), week);
        Ok(count)
    }

    /// The doctor's rules, Monday first.
    pub fn rules_for(&self, doctor: &DoctorId) -> Vec<&WeeklyAvailabilityRule> {
        self.rules
            .get(doctor)
            .map(|week| week.iter().flatten().collect())
            .unwrap_or_default()
    }

    pub fn all_rules(&self) -> impl Iterator<Item = &WeeklyAvailabilityRule> {
        self.rules.values().flat_map(|week| week.iter().flatten())
    }

    /// Record an absence and return its id.
    pub fn add_absence(&mut self, doctor: DoctorId, period: Interval, approved: bool) -> AbsenceId {
        let id = AbsenceId(self.next_absence_id);
        self.insert_absence(Absence {
            id,
            doctor,
            period,
            approved,
        });
        id
    }

    /// Insert an absence with a known id (used when restoring a snapshot).
    pub fn insert_absence(&mut self, absence: Absence) {
        self.next_absence_id = self.next_absence_id.max(absence.id.0.saturating_add(1));
        self.absences
            .entry(absence.doctor.clone())
            .or_default()
            .push(absence);
    }

    pub fn approve_absence(&mut self, id: AbsenceId) -> Result<&Absence> {
        let absence = self
            .absences
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|a| a.id == id)
            .ok_or_else(|| BookingError::not_found("absence", id))?;
        absence.approved = true;
        Ok(&*absence)
    }

    pub fn absences_for(&self, doctor: &DoctorId) -> &[Absence] {
        self.absences.get(doctor).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_absences(&self) -> impl Iterator<Item = &Absence> {
        self.absences.values().flatten()
    }

    /// Drop every rule and absence belonging to `doctor`.
    pub fn remove_doctor(&mut self, doctor: &DoctorId) {
        self.rules.remove(doctor);
        self.absences.remove(doctor);
    }

    /// Rule windows projected onto `date`, sorted by start, before absences apply.
    pub fn declared_windows(&self, doctor: &DoctorId, date: NaiveDate) -> Vec<Interval> {
        let Some(week) = self.rules.get(doctor) else {
            return Vec::new();
        };
        let mut windows: Vec<Interval> = week[date.weekday().num_days_from_monday() as usize]
            .iter()
            .filter_map(|rule| rule.window_on(date))
            .collect();
        windows.sort();
        windows
    }

    /// Working windows on `date` after subtracting approved absences, sorted by start.
    ///
    /// A window split by an absence yields both remaining pieces; a window
    /// fully inside an absence yields nothing.
    pub fn windows_for(&self, doctor: &DoctorId, date: NaiveDate) -> Vec<Interval> {
        let mut windows = self.declared_windows(doctor, date);
        if windows.is_empty() {
            return windows;
        }

        for absence in self.absences_for(doctor).iter().filter(|a| a.approved) {
            windows = windows
                .iter()
                .flat_map(|w| w.subtract(&absence.period))
                .collect();
        }
        windows.sort();
        windows
    }

    /// True when `instant` falls inside one of the doctor's windows for its date.
    pub fn is_working_at(&self, doctor: &DoctorId, instant: NaiveDateTime) -> bool {
        self.windows_for(doctor, instant.date())
            .iter()
            .any(|w| w.contains(instant))
    }

    /// True when `interval` lies entirely inside a single window on its start date.
    pub fn covers(&self, doctor: &DoctorId, interval: &Interval) -> bool {
        self.windows_for(doctor, interval.start().date())
            .iter()
            .any(|w| w.covers(interval))
    }
}
