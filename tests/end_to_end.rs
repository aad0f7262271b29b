use attendance_reconciliation::{
    run, write_outputs, AttendanceFlag, DuplicatePolicy, InputPaths, OutputFiles,
    ReconcileConfig, RunManifest,
};
use chrono::Local;
use std::fs;
use std::path::Path;

const ROSTER: &str = "APELLIDOS,NOMBRES\n\
GARCIA,ANA\n\
PEREZ LOPEZ,LUIS ALBERTO\n\
DIAZ,EVA\n\
ROJAS,MARCO\n\
,\n";

const FORM: &str = "Marca temporal,Correo,Apellidos y nombres\n\
19/05/2025 08:01,ana@x.com,Ana Garcia\n\
19/05/2025 08:03,luis@x.com,\"Perez Lopez, Luis\"\n\
19/05/2025 08:05,eva@x.com,Eva Díaz\n";

const MEETING: &str = "Apellido,Nombre,Correo,Duración\n\
Garcia,Ana,ana@x.com,4 h 30 min\n\
Perez Lopez,Luis,luis@x.com,3 h 50 min\n\
Monitor,Aula,m@x.com,6 h 0 min\n\
Rojas,Marco,marco@x.com,5 h 10 min\n\
Perez Lopez,Luis,luis@x.com,4 h 5 min\n";

fn write_inputs(dir: &Path) -> InputPaths {
    let paths = InputPaths {
        roster: dir.join("lista.csv"),
        form: dir.join("formulario.csv"),
        meeting: dir.join("meet.csv"),
    };
    fs::write(&paths.roster, ROSTER).unwrap();
    fs::write(&paths.form, FORM).unwrap();
    fs::write(&paths.meeting, MEETING).unwrap();
    paths
}

#[test]
fn test_full_run_from_csv_files() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = write_inputs(tmp.path());

    let outcome = run(&paths, &ReconcileConfig::default()).unwrap();
    let students = &outcome.students;

    // Blank roster row dropped; order preserved
    assert_eq!(students.len(), 4);
    let names: Vec<&str> = students.iter().map(|s| s.full_name.as_str()).collect();
    assert_eq!(names, vec!["GARCIA ANA", "PEREZ LOPEZ LUIS ALBERTO", "DIAZ EVA", "ROJAS MARCO"]);

    // Both signals
    assert_eq!(students[0].attendance, AttendanceFlag::Present);
    assert!((students[0].meeting_hours - 4.5).abs() < 1e-9);

    // Fuzzy in both sources (3/4 words); later meeting row overwrote the earlier one
    assert!(students[1].registered_in_form);
    assert!((students[1].meeting_hours - (4.0 + 5.0 / 60.0)).abs() < 1e-9);
    assert_eq!(students[1].attendance, AttendanceFlag::Present);

    // Accented form entry does not match the unaccented roster, no meeting row
    assert!(!students[2].registered_in_form);
    assert_eq!(students[2].meeting_hours, 0.0);
    assert_eq!(students[2].attendance, AttendanceFlag::Absent);

    // Meeting only
    assert!(!students[3].registered_in_form);
    assert!(students[3].meeting_hours > 5.0);
    assert_eq!(students[3].attendance, AttendanceFlag::Absent);

    assert_eq!(outcome.report.present_count, 2);
    assert_eq!(outcome.report.absent_count, 2);
}

#[test]
fn test_strict_duplicates_fail_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = write_inputs(tmp.path());

    let config = ReconcileConfig::default().with_duplicate_policy(DuplicatePolicy::Strict);
    let err = run(&paths, &config).unwrap_err();

    assert!(format!("{:#}", err).contains("PEREZ LOPEZ LUIS"));
}

#[test]
fn test_outputs_written() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = write_inputs(tmp.path());
    let config = ReconcileConfig::default();

    let outcome = run(&paths, &config).unwrap();
    let files = OutputFiles::stamped(&tmp.path().join("salida"), Local::now(), true);
    let manifest = RunManifest::new(&config, paths.digests().unwrap(), &outcome.report, &outcome.students);
    write_outputs(&files, &outcome.students, Some(&manifest)).unwrap();

    let sheet = fs::read_to_string(&files.attendance).unwrap();
    assert_eq!(
        sheet,
        "APELLIDOS,NOMBRES,ASISTENCIA\n\
         GARCIA,ANA,A\n\
         PEREZ LOPEZ,LUIS ALBERTO,A\n\
         DIAZ,EVA,F\n\
         ROJAS,MARCO,F\n"
    );

    let detail = fs::read_to_string(&files.detail).unwrap();
    assert!(detail.contains("ROJAS,MARCO,NO,5.17,F"));

    let manifest_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(files.manifest.unwrap()).unwrap()).unwrap();
    assert_eq!(manifest_json["inputs"].as_array().unwrap().len(), 3);
    assert_eq!(manifest_json["inputs"][0]["kind"], "Roster");
}

#[test]
fn test_missing_input_file_is_error() {
    let tmp = tempfile::tempdir().unwrap();
    let mut paths = write_inputs(tmp.path());
    paths.form = tmp.path().join("does_not_exist.csv");

    let err = run(&paths, &ReconcileConfig::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("does_not_exist.csv"));
}
