// CLI tests for everything that is validated before a browser is launched
use anyhow::Result;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run pageshot in `dir`
fn run_command(dir: &Path, args: &[&str]) -> Result<(Value, String, i32)> {
    let output = Command::new(env!("CARGO_BIN_EXE_pageshot"))
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "pageshot=warn")
        .output()?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    let json = serde_json::from_str(stdout.trim()).unwrap_or(Value::Null);
    Ok((json, stderr, exit_code))
}

#[test]
fn test_help_lists_scroll_options() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = Command::new(env!("CARGO_BIN_EXE_pageshot"))
        .arg("--help")
        .current_dir(temp_dir.path())
        .output()?;

    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for flag in ["--urls", "--single", "--delay", "--step-size", "--steps-limit", "--mobile"] {
        assert!(help.contains(flag), "help is missing {flag}");
    }

    Ok(())
}

#[test]
fn test_headed_has_no_short_flag() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = Command::new(env!("CARGO_BIN_EXE_pageshot"))
        .arg("-h")
        .current_dir(temp_dir.path())
        .output()?;

    // -h still prints help, and the help says why --headed has no short form
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    assert!(help.contains("--headed"));
    assert!(help.contains("long form only, -h is help"));

    Ok(())
}

#[test]
fn test_missing_url_file() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let (json, stderr, exit_code) = run_command(temp_dir.path(), &[])?;

    assert_eq!(exit_code, 3);
    assert_eq!(json["error"].as_bool(), Some(true));
    assert_eq!(json["exit_code"].as_i64(), Some(3));
    assert!(json["message"].as_str().unwrap().contains("urls.txt"));
    assert!(stderr.contains("Error:"));

    Ok(())
}

#[test]
fn test_empty_url_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("urls.txt"), "\n\n# nothing yet\n")?;

    let (json, _, exit_code) = run_command(temp_dir.path(), &[])?;

    assert_eq!(exit_code, 3);
    assert!(json["message"].as_str().unwrap().contains("No URLs to capture"));

    Ok(())
}

#[test]
fn test_invalid_url_in_list() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let (json, _, exit_code) = run_command(temp_dir.path(), &["--urls", "http://"])?;

    assert_eq!(exit_code, 3);
    assert!(json["message"].as_str().unwrap().contains("Invalid URL"));

    Ok(())
}

#[test]
fn test_zero_step_size_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let (json, _, exit_code) =
        run_command(temp_dir.path(), &["--urls", "example.com", "--step-size", "0"])?;

    assert_eq!(exit_code, 2);
    assert!(json["message"].as_str().unwrap().contains("step size"));

    Ok(())
}

#[test]
fn test_zero_steps_limit_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let (_, _, exit_code) =
        run_command(temp_dir.path(), &["--urls", "example.com", "--steps-limit", "0"])?;

    assert_eq!(exit_code, 2);

    Ok(())
}

#[test]
fn test_quality_out_of_range() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let (json, _, exit_code) = run_command(
        temp_dir.path(),
        &["--urls", "example.com", "--ext", "jpg", "--quality", "0"],
    )?;

    assert_eq!(exit_code, 2);
    assert!(json["message"].as_str().unwrap().contains("quality"));

    Ok(())
}

#[test]
fn test_invalid_viewport() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let (json, _, exit_code) =
        run_command(temp_dir.path(), &["--urls", "example.com", "--viewport", "1920"])?;

    assert_eq!(exit_code, 2);
    assert!(json["message"].as_str().unwrap().contains("WIDTHxHEIGHT"));

    Ok(())
}

#[test]
fn test_config_checked_before_urls() -> Result<()> {
    let temp_dir = TempDir::new()?;

    // No urls.txt either, the configuration error wins
    let (_, _, exit_code) = run_command(temp_dir.path(), &["--step-size", "-10"])?;

    assert_eq!(exit_code, 2);

    Ok(())
}

#[test]
fn test_output_dir_not_created_on_config_error() -> Result<()> {
    let temp_dir = TempDir::new()?;

    run_command(
        temp_dir.path(),
        &["--urls", "example.com", "--output", "shots", "--steps-limit", "0"],
    )?;

    assert!(!temp_dir.path().join("shots").exists());

    Ok(())
}
