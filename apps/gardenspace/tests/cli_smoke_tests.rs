//! CLI smoke tests for the gardenspace binary
//!
//! These tests run the compiled binary against a throwaway home directory and
//! check configuration handling plus the member and profile commands.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Helper to run the gardenspace binary with given arguments
fn run_gardenspace(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gardenspace"))
        .args(args)
        .env_remove("GARDEN__DATABASE__DSN")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute gardenspace")
}

/// Run with `--config <path>` prepended.
fn run_with_config(config: &Path, args: &[&str]) -> Output {
    let mut full = vec!["--config", config.to_str().expect("utf-8 path")];
    full.extend_from_slice(args);
    run_gardenspace(&full)
}

/// Write a config whose home directory and SQLite file live under `home`.
fn write_config(home: &Path, database: &str) -> PathBuf {
    let config_path = home.join("gardenspace.yaml");
    let config_content = format!(
        r#"
app:
  home_dir: "{home}"

database:
{database}

logging:
  default:
    console_level: error
    file: ""
"#,
        home = home.display(),
    );
    std::fs::write(&config_path, config_content).expect("Failed to write config file");
    config_path
}

fn sqlite_config(home: &Path) -> PathBuf {
    write_config(home, "  dsn: \"sqlite://database/garden.db\"")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        eprintln!("STDOUT: {}", String::from_utf8_lossy(&output.stdout));
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert!(output.status.success(), "Command should succeed");
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_cli_help_command() {
    let output = run_gardenspace(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = stdout_of(&output);
    assert!(stdout.contains("gardenspace") || stdout.contains("Gardenspace"));
    assert!(
        stdout.contains("Usage:") || stdout.contains("USAGE:"),
        "Should contain usage information"
    );
    for sub in ["seed", "register", "profile", "members", "migrate", "check"] {
        assert!(stdout.contains(sub), "Should contain '{sub}' subcommand");
    }
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--mock"), "Should mention mock option");
}

#[test]
fn test_cli_version_command() {
    let output = run_gardenspace(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = stdout_of(&output);
    assert!(stdout.contains("gardenspace"), "Should contain binary name");
    assert!(stdout.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_gardenspace(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid") || stderr.contains("unexpected"),
        "Should contain error message about invalid command"
    );
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_gardenspace(&["--config", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("not found"),
        "Should mention config file issue: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_with_config(&config_path, &["check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to load config"),
        "Should mention config loading issue: {stderr}"
    );
}

#[test]
fn test_cli_check_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = sqlite_config(temp_dir.path());

    let output = run_with_config(&config_path, &["check"]);

    assert_success(&output);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Configuration check passed"));
    assert!(
        stdout.contains(&temp_dir.path().join("database").display().to_string()),
        "SQLite path should be resolved under home: {stdout}"
    );
    assert!(
        !temp_dir.path().join("database").exists(),
        "check must not open the database"
    );
}

#[test]
fn test_cli_check_rejects_unknown_pragma() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        "  dsn: \"sqlite://database/garden.db\"\n  params:\n    not_a_pragma: \"1\"",
    );

    let output = run_with_config(&config_path, &["check"]);

    assert!(!output.status.success(), "Unknown pragma should fail check");
}

#[test]
fn test_cli_print_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = sqlite_config(temp_dir.path());

    let output = run_with_config(&config_path, &["--print-config"]);

    assert_success(&output);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("home_dir"));
    assert!(stdout.contains("dsn"));
}

#[test]
fn test_cli_seed_is_default_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = sqlite_config(temp_dir.path());

    let output = run_with_config(&config_path, &[]);

    assert_success(&output);
    assert!(stdout_of(&output).contains("Garden saved successfully!"));
    assert!(temp_dir.path().join("database").join("garden.db").exists());
}

#[test]
fn test_cli_seed_twice_registers_two_members() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = sqlite_config(temp_dir.path());

    assert_success(&run_with_config(&config_path, &["seed"]));
    assert_success(&run_with_config(&config_path, &["seed"]));

    let output = run_with_config(&config_path, &["members", "list"]);
    assert_success(&output);
    let stdout = stdout_of(&output);
    let members: Vec<_> = stdout
        .lines()
        .filter(|l| l.starts_with("member "))
        .collect();
    assert_eq!(members.len(), 2, "{stdout}");
    assert!(members[0].contains("id=1 name=Goodness role=-"));
    assert!(members[1].contains("id=2 name=Goodness role=-"));
}

#[test]
fn test_cli_register_with_role() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = sqlite_config(temp_dir.path());

    let output = run_with_config(
        &config_path,
        &["register", "--name", "Amaka", "--role", "Composter"],
    );

    assert_success(&output);
    assert!(stdout_of(&output).contains("name=Amaka role=Composter"));
}

#[test]
fn test_cli_register_empty_name_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = sqlite_config(temp_dir.path());

    let output = run_with_config(&config_path, &["register", "--name", ""]);

    assert!(!output.status.success(), "Empty name should be rejected");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("name"), "Should mention the name: {stderr}");
}

#[test]
fn test_cli_profile_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = sqlite_config(temp_dir.path());
    let id = "6f1c2a4e-3b7d-4c1e-9a55-0d2f8e7b1c90";

    let created = run_with_config(
        &config_path,
        &[
            "profile",
            "create",
            "--id",
            id,
            "--full-name",
            "Ada Obi",
            "--email",
            "ada@garden.test",
        ],
    );
    assert_success(&created);
    assert!(stdout_of(&created).contains(&format!("profile id={id} full_name=Ada Obi")));

    let updated = run_with_config(
        &config_path,
        &[
            "profile",
            "update",
            id,
            "--avatar-url",
            "https://garden.test/ada.png",
        ],
    );
    assert_success(&updated);

    let shown = run_with_config(&config_path, &["profile", "show", id]);
    assert_success(&shown);
    let stdout = stdout_of(&shown);
    assert!(stdout.contains("full_name=Ada Obi"));
    assert!(stdout.contains("avatar_url=https://garden.test/ada.png"));

    let duplicate = run_with_config(
        &config_path,
        &[
            "profile",
            "create",
            "--full-name",
            "Someone Else",
            "--email",
            "ada@garden.test",
        ],
    );
    assert!(!duplicate.status.success(), "Duplicate email should fail");
}

#[test]
fn test_cli_profile_sync_creates_then_refreshes() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = sqlite_config(temp_dir.path());
    let id = "0b8e6d1a-5f2c-4a7e-8d3b-9c4f1e2a7b60";

    let first = run_with_config(
        &config_path,
        &["profile", "sync", "--id", id, "--email", "Tobi@Garden.test"],
    );
    assert_success(&first);
    let stdout = stdout_of(&first);
    assert!(
        stdout.contains(&format!(
            "profile id={id} full_name=tobi@garden.test email=tobi@garden.test"
        )),
        "{stdout}"
    );

    let second = run_with_config(
        &config_path,
        &[
            "profile",
            "sync",
            "--id",
            id,
            "--email",
            "tobi@garden.test",
            "--full-name",
            "Tobi Eze",
        ],
    );
    assert_success(&second);

    let shown = run_with_config(&config_path, &["profile", "show", id]);
    assert_success(&shown);
    assert!(stdout_of(&shown).contains("full_name=Tobi Eze email=tobi@garden.test"));
}

#[test]
fn test_cli_profile_show_missing_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = sqlite_config(temp_dir.path());

    let output = run_with_config(
        &config_path,
        &["profile", "show", "00000000-0000-4000-8000-000000000001"],
    );

    assert!(!output.status.success(), "Missing profile should fail");
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn test_cli_mock_flag() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    // PostgreSQL settings are replaced by the in-memory database under --mock
    let config_path = write_config(
        temp_dir.path(),
        "  dsn: \"postgresql://localhost/nonexistent\"",
    );

    let output = run_with_config(&config_path, &["--mock", "seed"]);

    assert_success(&output);
    assert!(stdout_of(&output).contains("Garden saved successfully!"));
    assert!(!temp_dir.path().join("database").exists());
}

#[test]
fn test_cli_unavailable_database_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    // A regular file where the database directory should be
    std::fs::write(temp_dir.path().join("database"), b"not a directory").unwrap();
    let config_path = sqlite_config(temp_dir.path());

    let output = run_with_config(&config_path, &["seed"]);

    assert!(!output.status.success(), "Seed should fail without storage");
    assert!(!stdout_of(&output).contains("Garden saved successfully!"));
}

#[test]
fn test_cli_migrate_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = sqlite_config(temp_dir.path());

    let output = run_with_config(&config_path, &["migrate"]);

    assert_success(&output);
    assert!(stdout_of(&output).contains("Migrations applied"));

    let listed = run_with_config(&config_path, &["members", "list"]);
    assert_success(&listed);
    assert!(!stdout_of(&listed).contains("member "));
}

#[test]
fn test_cli_verbose_flag() {
    let output = run_gardenspace(&["-vv", "--help"]);

    assert!(output.status.success(), "Verbose help should succeed");
    assert!(stdout_of(&output).contains("Usage:"));
}
