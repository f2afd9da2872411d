use assert_cmd::cargo::cargo_bin_cmd;
use riskysir::report::CurveRow;
use riskysir::{ExtinctionRecord, OffspringModel};
use tempfile::tempdir;

#[test]
fn probability_prints_csv_record() {
    let output = cargo_bin_cmd!("riskysir")
        .args(["probability", "--r0", "2", "--risk-mean", "0.25"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let mut reader = csv::Reader::from_reader(output.stdout.as_slice());
    let records: Vec<ExtinctionRecord> = reader.deserialize().map(Result::unwrap).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].model, OffspringModel::Poisson);
    assert!((records[0].extinction_probability - 0.2032).abs() < 1e-4);
    assert!((records[0].outbreak_probability - 0.7968).abs() < 1e-4);
}

#[test]
fn curve_writes_family_to_output_dir() {
    let temp_dir = tempdir().unwrap();
    let output = cargo_bin_cmd!("riskysir")
        .arg("--output-dir")
        .arg(temp_dir.path())
        .args([
            "curve",
            "--hotspot-fraction",
            "0.25,0.75",
            "--risk-mean",
            "0.5",
            "--end",
            "4",
            "--step",
            "0.5",
            "--model",
            "binomial",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let mut reader = csv::Reader::from_path(temp_dir.path().join("curve.csv")).unwrap();
    let rows: Vec<CurveRow> = reader.deserialize().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 18);
    assert!(rows
        .iter()
        .all(|row| row.model == Some(OffspringModel::Binomial)));
    assert_eq!(rows[0].r0, 0.0);
    assert_eq!(rows[0].outbreak_probability, 0.0);
    assert_eq!(rows[9].hotspot_fraction, 0.75);
}

#[test]
fn log_messages_go_to_stderr() {
    let output = cargo_bin_cmd!("riskysir")
        .args(["--log-level", "riskysir::runner=info", "probability"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Logging enabled for riskysir::runner at level INFO"));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("model,r0,"));
    assert!(!stdout.contains("Logging enabled"));
}

#[test]
fn verbosity_levels() {
    let output = cargo_bin_cmd!("riskysir")
        .args(["-v", "probability"])
        .output()
        .unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Logging enabled at level INFO"));
    assert!(!stderr.contains("DEBUG"));

    let output = cargo_bin_cmd!("riskysir")
        .args(["-vv", "probability"])
        .output()
        .unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Logging enabled at level DEBUG"));
}

#[test]
fn invalid_parameters_fail() {
    let output = cargo_bin_cmd!("riskysir")
        .args(["probability", "--hotspot-fraction", "1.5"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("hotspot_fraction"));
}
