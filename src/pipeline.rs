// 🔄 Pipeline - Files in, reconciled roster out
//
//   1. Parse roster / form / meeting exports
//   2. Build the normalized source indices
//   3. Reconcile
//   4. Summarize
//
// Writing files is left to the caller (see report::write_outputs) so the whole
// run can be exercised without touching the output directory.

use crate::config::ReconcileConfig;
use crate::entities::{roster_from_pairs, Student};
use crate::parser::{FormParser, MeetingParser, RosterParser, SourceKind, SourceParser};
use crate::reconciliation::{AttendanceReconciler, ReconciliationReport};
use crate::report::InputDigest;
use crate::sources::{build_form_record, build_meeting_record, FormRecord, MeetingRecord};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub roster: PathBuf,
    pub form: PathBuf,
    pub meeting: PathBuf,
}

impl InputPaths {
    pub fn digests(&self) -> Result<Vec<InputDigest>> {
        Ok(vec![
            InputDigest::from_file(SourceKind::Roster, &self.roster)?,
            InputDigest::from_file(SourceKind::Form, &self.form)?,
            InputDigest::from_file(SourceKind::Meeting, &self.meeting)?,
        ])
    }
}

/// Parsed and indexed inputs, ready for reconciliation
#[derive(Debug, Clone)]
pub struct LoadedSources {
    pub roster: Vec<Student>,
    pub form: FormRecord,
    pub meeting: MeetingRecord,
}

pub fn load_sources(paths: &InputPaths, config: &ReconcileConfig) -> Result<LoadedSources> {
    info!(path = %paths.roster.display(), "loading official roster");
    let roster_rows = RosterParser::new().parse(&paths.roster)?;
    let roster = roster_from_pairs(
        roster_rows
            .into_iter()
            .map(|row| (row.last_name, row.first_name)),
    );
    info!(students = roster.len(), "roster loaded");

    info!(path = %paths.form.display(), "processing form responses");
    let form_rows = FormParser::new(config.columns.clone()).parse(&paths.form)?;
    let form = build_form_record(form_rows.iter().map(|r| r.name.as_str()), config.duplicate_policy)
        .with_context(|| format!("Failed to index form responses from {}", paths.form.display()))?;
    info!(entries = form.len(), overwritten = form.overwrites(), "form responses indexed");

    info!(path = %paths.meeting.display(), "processing meeting participants");
    let meeting_rows = MeetingParser::new(config.columns.clone()).parse(&paths.meeting)?;
    let meeting = build_meeting_record(
        meeting_rows.iter().map(|r| (r.name.as_str(), r.hours)),
        config.duplicate_policy,
    )
    .with_context(|| format!("Failed to index meeting participants from {}", paths.meeting.display()))?;
    info!(entries = meeting.len(), overwritten = meeting.overwrites(), "meeting participants indexed");

    Ok(LoadedSources { roster, form, meeting })
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub students: Vec<Student>,
    pub report: ReconciliationReport,
}

/// Load, reconcile and summarize in one go
pub fn run(paths: &InputPaths, config: &ReconcileConfig) -> Result<RunOutcome> {
    config.validate()?;

    let sources = load_sources(paths, config)?;
    let reconciler = AttendanceReconciler::from_config(config);
    let students = reconciler.reconcile(sources.roster, &sources.form, &sources.meeting);
    let report = ReconciliationReport::from_students(&students, config.min_hours);

    info!("{}", report.summary());
    Ok(RunOutcome { students, report })
}
