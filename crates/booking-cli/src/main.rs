//! `booking` CLI: query free slots and book visits and surgeries against a
//! clinic snapshot from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Free slots for a doctor in the week starting 2 March (end date exclusive)
//! booking -s clinic.json slots --doctor RSSMRA80A01H501U --from 2026-03-02 --to 2026-03-09
//!
//! # Book a visit and save the updated snapshot
//! booking -s clinic.json -o clinic.json book-visit \
//!     --doctor RSSMRA80A01H501U --patient BNCNNA90B41F205X --at 2026-03-02T09:00 --reason checkup
//!
//! # Timestamps with an offset are converted into the clinic's zone
//! booking -s clinic.json --timezone Europe/Rome book-visit ... --at 2026-03-02T08:00:00Z
//!
//! # Schedule a surgery with an assistant
//! booking -s clinic.json schedule-surgery --doctor DR1 --patient PT1 --room OR1 \
//!     --surgery-type APP --start 2026-03-02T14:00 --end 2026-03-02T16:00 --team DR2:assistant
//!
//! # Open a night shift and put a nurse on it
//! booking -s clinic.json -o clinic.json create-shift --kind night \
//!     --start 2026-03-02T22:00 --end 2026-03-03T06:00
//! booking -s clinic.json -o clinic.json assign-nurse --shift 1 --nurse GLLSRA88E50H501T
//! ```
//!
//! Results are printed as JSON on stdout. Logs go to stderr; set `RUST_LOG`
//! to see more than warnings.

use anyhow::{bail, Context, Result};
use booking_core::model::{
    DoctorId, NurseId, PatientId, RoomId, ShiftId, ShiftKind, SurgeryId, SurgeryStatus,
    SurgeryTypeId, TeamMember, TeamRole, VisitId,
};
use booking_core::timezone::{parse_timezone, to_clinic_time};
use booking_core::{BookingService, ClinicSnapshot, DateRange, SurgeryRequest, SurgeryUpdate};
use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "booking",
    version,
    about = "Free slots and conflict-free bookings for a clinic"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Clinic snapshot (JSON). Reads from stdin if omitted
    #[arg(short, long, global = true)]
    snapshot: Option<String>,

    /// Write the updated snapshot to this file
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// IANA zone timestamps with an offset are converted into
    #[arg(long, global = true, default_value = "UTC")]
    timezone: String,

    /// Override the snapshot's visit duration (minutes)
    #[arg(long, global = true)]
    visit_minutes: Option<u32>,

    /// Override the snapshot's slot granularity (minutes)
    #[arg(long, global = true)]
    granularity: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// List free slot starts for a doctor
    Slots {
        #[arg(long)]
        doctor: String,
        /// First date (inclusive)
        #[arg(long)]
        from: NaiveDate,
        /// Last date (exclusive)
        #[arg(long)]
        to: NaiveDate,
    },
    /// Show windows, free slots and status for one date
    Scan {
        #[arg(long)]
        doctor: String,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Show a doctor's visits and surgeries starting within a date range
    Schedule {
        #[arg(long)]
        doctor: String,
        #[arg(long)]
        from: NaiveDate,
        /// Last date (exclusive)
        #[arg(long)]
        to: NaiveDate,
    },
    /// Book a visit
    BookVisit {
        #[arg(long)]
        doctor: String,
        #[arg(long)]
        patient: String,
        /// Visit start, e.g. 2026-03-02T09:00 or 2026-03-02T08:00:00Z
        #[arg(long)]
        at: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Record the outcome of a visit
    RecordOutcome {
        #[arg(long)]
        visit: u64,
        #[arg(long)]
        outcome: String,
    },
    /// Schedule a surgery
    ScheduleSurgery {
        /// Lead surgeon
        #[arg(long)]
        doctor: String,
        #[arg(long)]
        patient: String,
        #[arg(long)]
        room: String,
        #[arg(long)]
        surgery_type: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Additional team member as DOCTOR:ROLE (assistant or anesthetist); repeatable
        #[arg(long, value_parser = parse_team_member)]
        team: Vec<TeamMember>,
    },
    /// Reschedule a surgery and/or change its status
    UpdateSurgery {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        room: Option<String>,
        /// scheduled, in_progress, completed or cancelled
        #[arg(long)]
        status: Option<SurgeryStatus>,
    },
    /// Open a clinic-wide nursing shift
    CreateShift {
        /// morning, afternoon or night
        #[arg(long)]
        kind: ShiftKind,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Assign a nurse to a shift
    AssignNurse {
        #[arg(long)]
        shift: u64,
        #[arg(long)]
        nurse: String,
    },
    /// Show a nurse's shifts and worked hours within a date range
    Workload {
        #[arg(long)]
        nurse: String,
        #[arg(long)]
        from: NaiveDate,
        /// Last date (exclusive)
        #[arg(long)]
        to: NaiveDate,
    },
    /// Delete a doctor, patient or nurse and everything depending on them
    DeletePerson {
        /// Fiscal code of the person
        #[arg(long)]
        code: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let tz = parse_timezone(&cli.timezone)?;

    let mut snapshot = load_snapshot(cli.snapshot.as_deref())?;
    if let Some(minutes) = cli.visit_minutes {
        snapshot.config.visit_duration_minutes = minutes;
    }
    if let Some(minutes) = cli.granularity {
        snapshot.config.slot_granularity_minutes = minutes;
    }
    let service =
        BookingService::from_snapshot(snapshot).context("Failed to load clinic snapshot")?;
    debug!(
        visit_minutes = service.config().visit_duration_minutes,
        granularity = service.config().slot_granularity_minutes,
        timezone = %tz,
        "clinic loaded"
    );

    match cli.command {
        Commands::Slots { doctor, from, to } => {
            let range = date_range(from, to)?;
            let slots = service.available_slots(&DoctorId(doctor), range)?;
            print_json(&slots)?;
        }
        Commands::Scan { doctor, date } => {
            let scan = service.scan_day(&DoctorId(doctor), date)?;
            print_json(&serde_json::json!({
                "date": scan.date,
                "status": scan.status(),
                "windows": scan.windows,
                "slots": scan.slots,
            }))?;
        }
        Commands::Schedule { doctor, from, to } => {
            let range = date_range(from, to)?;
            print_json(&service.doctor_schedule(&DoctorId(doctor), range)?)?;
        }
        Commands::BookVisit {
            doctor,
            patient,
            at,
            reason,
        } => {
            let instant = timestamp(&at, tz)?;
            let visit = service
                .book_visit(&DoctorId(doctor), &PatientId(patient), instant, &reason)
                .context("Visit rejected")?;
            print_json(&visit)?;
        }
        Commands::RecordOutcome { visit, outcome } => {
            print_json(&service.record_visit_outcome(VisitId(visit), &outcome)?)?;
        }
        Commands::ScheduleSurgery {
            doctor,
            patient,
            room,
            surgery_type,
            start,
            end,
            team,
        } => {
            let request = SurgeryRequest {
                doctor: DoctorId(doctor),
                patient: PatientId(patient),
                room: RoomId(room),
                surgery_type: SurgeryTypeId(surgery_type),
                start: timestamp(&start, tz)?,
                end: timestamp(&end, tz)?,
                team,
            };
            let surgery = service
                .schedule_surgery(request)
                .context("Surgery rejected")?;
            print_json(&surgery)?;
        }
        Commands::UpdateSurgery {
            id,
            start,
            end,
            room,
            status,
        } => {
            let update = SurgeryUpdate {
                start: start.map(|s| timestamp(&s, tz)).transpose()?,
                end: end.map(|s| timestamp(&s, tz)).transpose()?,
                room: room.map(RoomId),
                status,
            };
            let surgery = service
                .update_surgery(SurgeryId(id), update)
                .context("Surgery update rejected")?;
            print_json(&surgery)?;
        }
        Commands::CreateShift { kind, start, end } => {
            let shift = service
                .create_shift(timestamp(&start, tz)?, timestamp(&end, tz)?, kind)
                .context("Shift rejected")?;
            print_json(&shift)?;
        }
        Commands::AssignNurse { shift, nurse } => {
            let shift = service
                .assign_nurse(ShiftId(shift), &NurseId(nurse))
                .context("Assignment rejected")?;
            print_json(&shift)?;
        }
        Commands::Workload { nurse, from, to } => {
            let range = date_range(from, to)?;
            let nurse = NurseId(nurse);
            let workload = service.nurse_workload(&nurse, range)?;
            print_json(&serde_json::json!({
                "nurse": workload.nurse,
                "shifts": service.nurse_shifts(&nurse, range)?,
                "night_shifts": workload.night_shifts,
                "total_hours": workload.total_hours(),
            }))?;
        }
        Commands::DeletePerson { code } => {
            let report = service
                .delete_person(&code)
                .with_context(|| format!("Failed to delete {code}"))?;
            print_json(&report)?;
        }
    }

    if let Some(path) = cli.output.as_deref() {
        let json = service.snapshot().to_json()?;
        std::fs::write(path, json).with_context(|| format!("Failed to write file: {}", path))?;
    }

    Ok(())
}

/// Parse `DOCTOR:ROLE`, e.g. `VRDLCU75C03F205Z:anesthetist`.
fn parse_team_member(raw: &str) -> std::result::Result<TeamMember, String> {
    let (doctor, role) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected DOCTOR:ROLE, got '{raw}'"))?;
    if doctor.is_empty() {
        return Err(format!("missing doctor in '{raw}'"));
    }
    Ok(TeamMember {
        doctor: DoctorId(doctor.to_string()),
        role: role.parse::<TeamRole>()?,
    })
}

fn date_range(from: NaiveDate, to: NaiveDate) -> Result<DateRange> {
    if to < from {
        bail!("--to ({to}) is before --from ({from})");
    }
    Ok(DateRange::new(from, to)?)
}

fn timestamp(raw: &str, tz: Tz) -> Result<NaiveDateTime> {
    to_clinic_time(raw, tz).with_context(|| format!("Invalid timestamp: '{}'", raw))
}

fn load_snapshot(path: Option<&str>) -> Result<ClinicSnapshot> {
    let json = read_input(path)?;
    if json.trim().is_empty() {
        return Ok(ClinicSnapshot::default());
    }
    ClinicSnapshot::from_json(&json).context("Failed to parse clinic snapshot")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
