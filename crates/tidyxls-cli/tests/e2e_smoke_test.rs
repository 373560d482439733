use std::{fs, path::PathBuf};

use tempfile::tempdir;

use tidyxls_cli::{Args, CliError, Mode, run};

const MODES: [Mode; 7] = [
    Mode::Tidy,
    Mode::Flat,
    Mode::Dump,
    Mode::Rpn,
    Mode::Tree,
    Mode::Deps,
    Mode::Order,
];

/// The sample book, at the workspace root rather than in the crate
fn demo_book() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
        .join("lanes_raw.txt")
}

fn args(input: String, output: Option<PathBuf>, mode: Mode) -> Args {
    Args {
        input,
        output: output.map(|path| path.to_string_lossy().to_string()),
        mode,
        config: None,
        separator: None,
        formula: false,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_demo_book() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let book = demo_book();
    assert!(book.exists(), "Demo book not found at {}", book.display());

    let mut failed_modes = Vec::new();

    for mode in MODES {
        let output_path = temp_dir.path().join(format!("{mode:?}.txt"));
        let args = args(book.to_string_lossy().to_string(), Some(output_path.clone()), mode);

        match run(&args) {
            Ok(()) => {
                let output = fs::read_to_string(&output_path).expect("Output was not written");
                assert!(!output.is_empty(), "{mode:?} produced no output");
            }
            Err(e) => failed_modes.push((mode, e)),
        }
    }

    if !failed_modes.is_empty() {
        eprintln!("\nModes that failed:");
        for (mode, err) in &failed_modes {
            eprintln!("  - {mode:?}: {err}");
        }
        panic!("{} mode(s) failed unexpectedly", failed_modes.len());
    }
}

#[test]
fn e2e_tidy_report_layout() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("lanes_tidy.txt");
    let args = args(demo_book().to_string_lossy().to_string(), Some(output_path.clone()), Mode::Tidy);

    run(&args).expect("Demo book should render");

    let output = fs::read_to_string(&output_path).unwrap();
    let rule = "-".repeat(100);
    assert!(output.starts_with(&format!("{rule}\n----- ExcludedRow\n{rule}\nIF(\n\tOR(\n")));
    for name in ["OrderValue", "IsRent", "Lane", "LaneLabel", "Totals"] {
        assert!(output.contains(&format!("\n----- {name}\n")), "missing section {name}");
    }
}

#[test]
fn e2e_literal_formula() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("formula.txt");
    let mut args = args("=SUM(A1, B1 * 2)".to_string(), Some(output_path.clone()), Mode::Flat);
    args.formula = true;

    run(&args).expect("Formula should render");
    assert_eq!(fs::read_to_string(&output_path).unwrap(), "SUM(A1,B1*2)\n");
}

#[test]
fn e2e_failed_formula_keeps_output() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input_path = temp_dir.path().join("broken_raw.txt");
    let output_path = temp_dir.path().join("broken_tidy.txt");
    fs::write(&input_path, ">>>\tBroken\n=SUM(A1\n<<<\n>>>\tFine\n=A1+1\n<<<\n").unwrap();

    let args = args(input_path.to_string_lossy().to_string(), Some(output_path.clone()), Mode::Flat);
    let err = run(&args).expect_err("Broken formula should fail the run");

    assert!(matches!(err, CliError::FormulasFailed { failed: 1, total: 2 }));
    let output = fs::read_to_string(&output_path).unwrap();
    assert!(output.contains("----- Fine\n"));
    assert!(output.contains("\nA1+1\n"));
}

#[test]
fn e2e_cycle_fails_order() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input_path = temp_dir.path().join("cycle_raw.txt");
    fs::write(&input_path, ">>>\tX\n=[@Y]+1\n<<<\n>>>\tY\n=[@X]*2\n<<<\n").unwrap();

    let args = args(
        input_path.to_string_lossy().to_string(),
        Some(temp_dir.path().join("order.txt")),
        Mode::Order,
    );
    assert!(matches!(run(&args), Err(CliError::Tidyxls(_))));
}

#[test]
fn e2e_missing_input_and_config() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let missing = args(
        temp_dir.path().join("absent.txt").to_string_lossy().to_string(),
        None,
        Mode::Tidy,
    );
    assert!(run(&missing).is_err());

    let mut bad_config = args(demo_book().to_string_lossy().to_string(), None, Mode::Tidy);
    bad_config.config = Some(temp_dir.path().join("absent.toml").to_string_lossy().to_string());
    assert!(run(&bad_config).is_err());
}

#[test]
fn e2e_separator_override() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("semicolon.txt");
    let mut args = args("=IF(A1,1,0)".to_string(), Some(output_path.clone()), Mode::Tidy);
    args.formula = true;
    args.separator = Some(';');

    run(&args).expect("Formula should render");
    assert_eq!(fs::read_to_string(&output_path).unwrap(), "IF(\n\tA1\n\t;1\n\t;0\n)\n");

    args.separator = Some('|');
    assert!(run(&args).is_err());
}
