//! CLI integration tests
//! Run with: cargo test --test cli_test

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn bot(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_random-voice-bot"))
        .args(args)
        .current_dir(cwd)
        .env_remove("BOT_TOKEN")
        .env_remove("VOICE_DATA_DIR")
        .output()
        .expect("binary should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_version() {
    let temp_dir = TempDir::new().unwrap();
    let output = bot(&["version"], temp_dir.path());

    assert!(output.status.success());
    assert!(stdout(&output).starts_with("random-voice-bot v"));
}

#[test]
fn test_init_config_writes_default_yaml() {
    let temp_dir = TempDir::new().unwrap();
    let output = bot(&["init-config", "--config", "bot.yaml"], temp_dir.path());

    assert!(output.status.success());
    let yaml = fs::read_to_string(temp_dir.path().join("bot.yaml")).unwrap();
    assert!(yaml.contains("voices-dir: voices"));
    assert!(yaml.contains("command: ww"));

    let again = bot(&["init-config", "--config", "bot.yaml"], temp_dir.path());
    assert!(stdout(&again).contains("already exists"));
}

#[test]
fn test_scan_lists_categories_and_clips() {
    let temp_dir = TempDir::new().unwrap();
    let voices = temp_dir.path().join("data").join("voices");
    fs::create_dir_all(voices.join("ktxy")).unwrap();
    fs::create_dir_all(voices.join("zspms")).unwrap();
    fs::write(voices.join("ktxy").join("a.wav"), b"RIFF").unwrap();
    fs::write(voices.join("ktxy").join("b.mp3"), b"ID3").unwrap();
    fs::write(voices.join("ktxy").join("cover.png"), b"PNG").unwrap();

    let output = bot(&["scan", "--data-dir", "data"], temp_dir.path());
    assert!(output.status.success());
    let listing = stdout(&output);
    assert!(listing.contains("ktxy\t2"));
    assert!(listing.contains("zspms\t0"));

    let output = bot(&["scan", "KTXY", "--data-dir", "data"], temp_dir.path());
    let listing = stdout(&output);
    assert!(listing.contains("a.wav"));
    assert!(listing.contains("2 clips in"));
    assert!(!listing.contains("cover.png"));
}

#[test]
fn test_scan_skips_mixed_case_directories() {
    let temp_dir = TempDir::new().unwrap();
    let voices = temp_dir.path().join("data").join("voices");
    fs::create_dir_all(voices.join("KTXY")).unwrap();
    fs::write(voices.join("KTXY").join("a.wav"), b"RIFF").unwrap();

    let output = bot(&["scan", "--data-dir", "data"], temp_dir.path());
    assert!(output.status.success());
    let listing = stdout(&output);
    assert!(!listing.contains("ktxy"));
    assert!(!listing.contains("KTXY"));
    assert!(listing.contains("No voice categories"));
}

#[test]
fn test_scan_rejects_path_escape() {
    let temp_dir = TempDir::new().unwrap();
    let output = bot(&["scan", "..", "--data-dir", "data"], temp_dir.path());
    assert!(!output.status.success());
}
