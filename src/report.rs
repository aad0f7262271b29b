// 📄 Report Writers - Attendance sheet, detailed evidence, run manifest
//
// Output files (same timestamp suffix):
//   asistencia_final_<ts>.csv   APELLIDOS, NOMBRES, ASISTENCIA (A/F)
//   informe_detallado_<ts>.csv  + REGISTRO EN FORMULARIO (SÍ/NO), HORAS EN MEET
//   manifest_<ts>.json          run id, input digests, summary, full evidence

use crate::config::ReconcileConfig;
use crate::entities::Student;
use crate::parser::SourceKind;
use crate::reconciliation::ReconciliationReport;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const ATTENDANCE_HEADER: [&str; 3] = ["APELLIDOS", "NOMBRES", "ASISTENCIA"];
pub const DETAIL_HEADER: [&str; 5] = [
    "APELLIDOS",
    "NOMBRES",
    "REGISTRO EN FORMULARIO",
    "HORAS EN MEET",
    "ASISTENCIA",
];

// ============================================================================
// CSV OUTPUTS
// ============================================================================

/// Terse sheet: one attendance code per student, roster order
pub fn write_attendance_csv<W: Write>(writer: W, students: &[Student]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(ATTENDANCE_HEADER)?;

    for student in students {
        wtr.write_record([
            student.last_name.as_str(),
            student.first_name.as_str(),
            student.attendance.code(),
        ])?;
    }

    wtr.flush().context("Failed to flush attendance sheet")?;
    Ok(())
}

/// Detailed sheet: both signals next to the verdict
pub fn write_detail_csv<W: Write>(writer: W, students: &[Student]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(DETAIL_HEADER)?;

    for student in students {
        let hours = format!("{:.2}", student.meeting_hours);
        wtr.write_record([
            student.last_name.as_str(),
            student.first_name.as_str(),
            if student.registered_in_form { "SÍ" } else { "NO" },
            hours.as_str(),
            student.attendance.code(),
        ])?;
    }

    wtr.flush().context("Failed to flush detailed report")?;
    Ok(())
}

// ============================================================================
// RUN MANIFEST
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDigest {
    pub kind: SourceKind,
    pub path: String,
    pub sha256: String,
}

impl InputDigest {
    pub fn from_file(kind: SourceKind, path: &Path) -> Result<Self> {
        Ok(InputDigest {
            kind,
            path: path.display().to_string(),
            sha256: file_sha256(path)?,
        })
    }
}

/// Everything needed to audit a run after the fact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub config: ReconcileConfig,
    pub inputs: Vec<InputDigest>,
    pub summary: ReconciliationReport,
    pub students: Vec<Student>,
}

impl RunManifest {
    pub fn new(
        config: &ReconcileConfig,
        inputs: Vec<InputDigest>,
        summary: &ReconciliationReport,
        students: &[Student],
    ) -> Self {
        RunManifest {
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            config: config.clone(),
            inputs,
            summary: summary.clone(),
            students: students.to_vec(),
        }
    }
}

/// Hex SHA-256 of a file's bytes
pub fn file_sha256(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let read = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// OUTPUT DIRECTORY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub attendance: PathBuf,
    pub detail: PathBuf,
    pub manifest: Option<PathBuf>,
}

impl OutputFiles {
    /// Paths for a run stamped at `now` (local time, `%Y%m%d_%H%M%S`)
    pub fn stamped(output_dir: &Path, now: DateTime<Local>, with_manifest: bool) -> Self {
        let ts = now.format("%Y%m%d_%H%M%S").to_string();

        OutputFiles {
            attendance: output_dir.join(format!("asistencia_final_{}.csv", ts)),
            detail: output_dir.join(format!("informe_detallado_{}.csv", ts)),
            manifest: with_manifest.then(|| output_dir.join(format!("manifest_{}.json", ts))),
        }
    }
}

/// Write every output file, creating the directory when missing
pub fn write_outputs(
    files: &OutputFiles,
    students: &[Student],
    manifest: Option<&RunManifest>,
) -> Result<()> {
    if let Some(dir) = files.attendance.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        }
    }

    let file = File::create(&files.attendance).with_context(|| {
        format!("Failed to create attendance sheet: {}", files.attendance.display())
    })?;
    write_attendance_csv(file, students)?;
    info!(path = %files.attendance.display(), "attendance sheet written");

    let file = File::create(&files.detail).with_context(|| {
        format!("Failed to create detailed report: {}", files.detail.display())
    })?;
    write_detail_csv(file, students)?;
    info!(path = %files.detail.display(), "detailed report written");

    if let (Some(path), Some(manifest)) = (&files.manifest, manifest) {
        let file = File::create(path)
            .with_context(|| format!("Failed to create manifest: {}", path.display()))?;
        serde_json::to_writer_pretty(file, manifest).context("Failed to serialize manifest")?;
        info!(path = %path.display(), run_id = %manifest.run_id, "manifest written");
    }

    Ok(())
}

// ============================================================================
// CONSOLE SUMMARY
// ============================================================================

/// Human-readable summary with the reasons behind every absence
pub fn render_summary(report: &ReconciliationReport, files: Option<&OutputFiles>) -> String {
    let mut out = String::new();

    out.push_str("\n=== RESUMEN DE ASISTENCIA ===\n");
    out.push_str(&format!("Total de estudiantes: {}\n", report.total_students));
    out.push_str(&format!(
        "Asistentes: {} ({:.1}%)\n",
        report.present_count,
        report.present_pct()
    ));
    out.push_str(&format!(
        "Ausentes: {} ({:.1}%)\n",
        report.absent_count,
        report.absent_pct()
    ));

    if let Some(files) = files {
        out.push_str(&format!(
            "Archivo de asistencia generado: {}\n",
            files.attendance.display()
        ));
        out.push_str(&format!(
            "Informe detallado generado: {}\n",
            files.detail.display()
        ));
        if let Some(manifest) = &files.manifest {
            out.push_str(&format!("Manifiesto generado: {}\n", manifest.display()));
        }
    }

    out.push_str("\nEstudiantes sin asistencia:\n");
    for absent in &report.absentees {
        let reasons: Vec<String> = absent.reasons.iter().map(|r| r.describe()).collect();
        out.push_str(&format!("- {}\n", absent.full_name));
        out.push_str(&format!("  Motivo: {}\n", reasons.join(" y ")));
    }

    out
}

// ============================================================================
// TESTS
// ============================================================================
