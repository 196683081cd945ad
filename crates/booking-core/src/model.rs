//! Entities of the scheduling core: people, rooms, rules, absences, visits and surgeries.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::interval::Interval;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// A doctor's fiscal/registration code.
    DoctorId
);
string_id!(
    /// A patient's fiscal code.
    PatientId
);
string_id!(
    /// A nurse's fiscal code.
    NurseId
);
string_id!(RoomId);
string_id!(SurgeryTypeId);

numeric_id!(VisitId);
numeric_id!(SurgeryId);
numeric_id!(AbsenceId);
numeric_id!(ProtocolRecordId);
numeric_id!(ShiftId);

/// Role attached to a base person record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Doctor,
    Patient,
    Nurse,
    Administrator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Doctor => "doctor",
            Role::Patient => "patient",
            Role::Nurse => "nurse",
            Role::Administrator => "administrator",
        };
        f.write_str(s)
    }
}

/// Base record shared by every account, keyed by fiscal code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub fiscal_code: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub registration_number: String,
    #[serde(default)]
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    #[serde(default)]
    pub blood_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nurse {
    pub id: NurseId,
    /// Ward the nurse belongs to.
    #[serde(default)]
    pub ward: Option<String>,
}

/// An operating room. Its busy periods come entirely from the surgeries that
/// reference it; `available = false` marks it out of service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingRoom {
    pub id: RoomId,
    pub name: String,
    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeryType {
    pub id: SurgeryTypeId,
    pub name: String,
}

/// A recurring weekly working window: `day` from `start` to `end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAvailabilityRule {
    pub doctor: DoctorId,
    pub day: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Last date the rule applies to; open-ended when absent.
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

impl WeeklyAvailabilityRule {
    pub fn new(doctor: DoctorId, day: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            doctor,
            day,
            start,
            end,
            valid_until: None,
        }
    }

    /// The rule's window on `date`, or `None` when the rule does not apply.
    pub fn window_on(&self, date: NaiveDate) -> Option<Interval> {
        use chrono::Datelike;

        if date.weekday() != self.day {
            return None;
        }
        if self.valid_until.is_some_and(|until| date > until) {
            return None;
        }
        Interval::new(date.and_time(self.start), date.and_time(self.end)).ok()
    }
}

/// An explicit "doctor unavailable" period. Only approved absences clip windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    pub id: AbsenceId,
    pub doctor: DoctorId,
    pub period: Interval,
    #[serde(default)]
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub doctor: DoctorId,
    pub patient: PatientId,
    pub instant: NaiveDateTime,
    pub reason: String,
    #[serde(default)]
    pub outcome: Option<String>,
}

impl Visit {
    /// The time a visit occupies: `visit_duration` anchored at its instant.
    pub fn occupied(&self, visit_duration: Duration) -> Result<Interval> {
        Interval::starting_at(self.instant, visit_duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurgeryStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl SurgeryStatus {
    /// `scheduled -> in_progress -> completed`, and either of the first two
    /// may be cancelled. Nothing leaves a terminal state.
    pub fn can_transition_to(self, next: SurgeryStatus) -> bool {
        use SurgeryStatus::*;
        matches!(
            (self, next),
            (Scheduled, InProgress)
                | (InProgress, Completed)
                | (Scheduled, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SurgeryStatus::Completed | SurgeryStatus::Cancelled)
    }

    /// Whether a surgery in this state still claims its doctor, patient and room.
    pub fn occupies(self) -> bool {
        self != SurgeryStatus::Cancelled
    }
}

impl fmt::Display for SurgeryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SurgeryStatus::Scheduled => "scheduled",
            SurgeryStatus::InProgress => "in_progress",
            SurgeryStatus::Completed => "completed",
            SurgeryStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl FromStr for SurgeryStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(SurgeryStatus::Scheduled),
            "in_progress" => Ok(SurgeryStatus::InProgress),
            "completed" => Ok(SurgeryStatus::Completed),
            "cancelled" => Ok(SurgeryStatus::Cancelled),
            other => Err(format!(
                "unknown surgery status '{other}' (expected scheduled, in_progress, completed or cancelled)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Assistant,
    Anesthetist,
}

impl FromStr for TeamRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "assistant" => Ok(TeamRole::Assistant),
            "anesthetist" => Ok(TeamRole::Anesthetist),
            other => Err(format!(
                "unknown team role '{other}' (expected assistant or anesthetist)"
            )),
        }
    }
}

/// A doctor other than the lead surgeon taking part in a surgery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub doctor: DoctorId,
    pub role: TeamRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surgery {
    pub id: SurgeryId,
    /// Lead surgeon.
    pub doctor: DoctorId,
    pub patient: PatientId,
    pub room: RoomId,
    pub surgery_type: SurgeryTypeId,
    pub interval: Interval,
    pub status: SurgeryStatus,
    #[serde(default)]
    pub team: Vec<TeamMember>,
}

/// Lead surgeon followed by the team, without duplicates.
pub fn surgical_team<'a>(lead: &'a DoctorId, team: &'a [TeamMember]) -> Vec<&'a DoctorId> {
    let mut doctors = vec![lead];
    for member in team {
        if !doctors.contains(&&member.doctor) {
            doctors.push(&member.doctor);
        }
    }
    doctors
}

impl Surgery {
    pub fn doctors(&self) -> Vec<&DoctorId> {
        surgical_team(&self.doctor, &self.team)
    }

    pub fn involves_doctor(&self, doctor: &DoctorId) -> bool {
        self.doctor == *doctor || self.team.iter().any(|m| m.doctor == *doctor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKind {
    Morning,
    Afternoon,
    Night,
}

impl fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShiftKind::Morning => "morning",
            ShiftKind::Afternoon => "afternoon",
            ShiftKind::Night => "night",
        };
        f.write_str(s)
    }
}

impl FromStr for ShiftKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "morning" => Ok(ShiftKind::Morning),
            "afternoon" => Ok(ShiftKind::Afternoon),
            "night" => Ok(ShiftKind::Night),
            other => Err(format!(
                "unknown shift kind '{other}' (expected morning, afternoon or night)"
            )),
        }
    }
}

/// A clinic-wide nursing shift. Shifts never overlap each other, and a nurse
/// is assigned to at most one shift at any instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub interval: Interval,
    pub kind: ShiftKind,
    #[serde(default)]
    pub nurses: Vec<NurseId>,
}

/// A post-operative protocol note attached to a surgery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolRecord {
    pub id: ProtocolRecordId,
    pub surgery: SurgeryId,
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_machine_is_one_directional() {
        use SurgeryStatus::*;
        assert!(Scheduled.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Cancelled));

        assert!(!InProgress.can_transition_to(Scheduled));
        assert!(!Scheduled.can_transition_to(Completed));
        assert!(!Scheduled.can_transition_to(Scheduled));
        for next in [Scheduled, InProgress, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn rule_projects_only_onto_its_weekday() {
        let rule = WeeklyAvailabilityRule::new(
            DoctorId::from("DR1"),
            Weekday::Mon,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        );
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();

        let window = rule.window_on(monday).unwrap();
        assert_eq!(window.start(), monday.and_hms_opt(9, 0, 0).unwrap());
        assert_eq!(window.end(), monday.and_hms_opt(11, 0, 0).unwrap());
        assert!(rule.window_on(tuesday).is_none());
    }

    #[test]
    fn expired_rule_projects_nothing() {
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut rule = WeeklyAvailabilityRule::new(
            DoctorId::from("DR1"),
            Weekday::Mon,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        );
        rule.valid_until = Some(monday);
        assert!(rule.window_on(monday).is_some());
        assert!(rule.window_on(monday + Duration::days(7)).is_none());
    }

    #[test]
    fn team_doctors_are_deduplicated() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let surgery = Surgery {
            id: SurgeryId(1),
            doctor: DoctorId::from("DR1"),
            patient: PatientId::from("PT1"),
            room: RoomId::from("OR1"),
            surgery_type: SurgeryTypeId::from("APP"),
            interval: Interval::new(
                day.and_hms_opt(14, 0, 0).unwrap(),
                day.and_hms_opt(16, 0, 0).unwrap(),
            )
            .unwrap(),
            status: SurgeryStatus::Scheduled,
            team: vec![
                TeamMember {
                    doctor: DoctorId::from("DR2"),
                    role: TeamRole::Anesthetist,
                },
                TeamMember {
                    doctor: DoctorId::from("DR1"),
                    role: TeamRole::Assistant,
                },
            ],
        };
        assert_eq!(surgery.doctors().len(), 2);
        assert!(surgery.involves_doctor(&DoctorId::from("DR2")));
        assert!(!surgery.involves_doctor(&DoctorId::from("DR3")));
    }
}
