use std::{fs, path::Path, process::Command};
use tempfile::TempDir;

fn parse_scenario(cwd: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_parse_scenario"))
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch parse_scenario")
}

#[test]
fn converts_default_scenario_in_working_directory() {
    let tmp = TempDir::new().unwrap();
    let scenarios = tmp.path().join("Content").join("Scenarios");
    fs::create_dir_all(&scenarios).unwrap();
    fs::write(
        scenarios.join("example_scenario.yaml"),
        "title: Example\nsteps:\n  - brief\n  - engage\n",
    )
    .unwrap();

    let output = parse_scenario(tmp.path());
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("example_scenario.yaml -> "));
    assert!(stdout.contains("example_scenario.json"));

    let json = fs::read_to_string(scenarios.join("example_scenario.json")).unwrap();
    assert_eq!(
        json,
        "{\n  \"title\": \"Example\",\n  \"steps\": [\n    \"brief\",\n    \"engage\"\n  ]\n}"
    );
}

#[test]
fn missing_scenario_fails_with_one_line() {
    let tmp = TempDir::new().unwrap();

    let output = parse_scenario(tmp.path());
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.trim_end().lines().count(), 1, "{stderr}");
    assert!(stderr.contains("example_scenario.yaml"));
}
