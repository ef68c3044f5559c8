use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

fn run_audiogram(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_audiogram"))
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("audiogram command should run")
}

const CONFIG: &str = r#"
fps: 25
colors:
  primary: [10, 20, 30]
formats:
  horizontal:
    enabled: false
  vertical:
    safe_area: { top: 200, bottom: 300 }
podcast:
  title: Il Podcast
  episode_title: Puntata di prova
  episode_number: 42
  transcript: episode.srt
soundbites:
  - { start: 1.0, duration: 3.0, title: Primo }
  - { start: "00:01:05,250", duration: 10 }
"#;

const SRT: &str = "1\n00:00:00,000 --> 00:00:02,000\nCiao a tutti.\n\n2\n00:00:02,000 --> 00:00:05,000\nBenvenuti!\n";

fn write_fixture(dir: &Path) {
    fs::write(dir.join("config.yaml"), CONFIG).expect("config should write");
    fs::write(dir.join("episode.srt"), SRT).expect("srt should write");
}

#[test]
fn check_summarises_configuration() {
    let dir = tempdir().expect("tempdir should create");
    write_fixture(dir.path());
    let output = run_audiogram(dir.path(), &["check", "--config", "config.yaml"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("25 fps"));
    assert!(stdout.contains("horizontal"));
    assert!(stdout.contains("disabled"));
    assert!(stdout.contains("safe area l0 r0 t200 b300"));
    assert!(stdout.contains("Soundbites: 2"));
}

#[test]
fn check_without_config_uses_defaults() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_audiogram(dir.path(), &["check"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("24 fps"));
}

#[test]
fn check_reports_invalid_configuration() {
    let dir = tempdir().expect("tempdir should create");
    fs::write(dir.path().join("bad.yaml"), "fps: 0\n").expect("config should write");
    let output = run_audiogram(dir.path(), &["check", "--config", "bad.yaml"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("audiogram check:"));
    assert!(stderr.contains("fps"));
}

#[test]
fn check_uses_defaults_when_config_file_is_absent() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_audiogram(dir.path(), &["check", "--config", "absent.yaml"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("24 fps"));
}

#[test]
fn dry_run_lists_selected_soundbites() {
    let dir = tempdir().expect("tempdir should create");
    write_fixture(dir.path());
    let output = run_audiogram(
        dir.path(),
        &["dry-run", "--config", "config.yaml", "--soundbites", "2,1"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let second = stdout.find("Soundbite 2:").expect("soundbite 2 listed");
    let first = stdout.find("Soundbite 1:").expect("soundbite 1 listed");
    assert!(second < first, "selection order is kept");
    assert!(stdout.contains("start 00:01:05.250 duration 00:00:10.000 end 00:01:15.250"));
    assert!(stdout.contains("title: Primo"));
    assert!(stdout.contains("text: Ciao a tutti. Benvenuti!"));
}

#[test]
fn dry_run_with_explicit_window() {
    let dir = tempdir().expect("tempdir should create");
    write_fixture(dir.path());
    let output = run_audiogram(
        dir.path(),
        &["dry-run", "--srt", "episode.srt", "--start", "00:00:02,500", "--duration", "1"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("start 00:00:02.500 duration 00:00:01.000 end 00:00:03.500"));
    assert!(stdout.contains("text: Benvenuti!"));
}

#[test]
fn selection_errors_are_usage_errors() {
    let dir = tempdir().expect("tempdir should create");
    write_fixture(dir.path());
    let output = run_audiogram(
        dir.path(),
        &["dry-run", "--config", "config.yaml", "--soundbites", "5"],
    );
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("audiogram dry-run:"));
    assert!(stderr.contains("soundbite_out_of_range"));
}

#[test]
fn json_error_envelope_is_machine_readable() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_audiogram(
        dir.path(),
        &["still", "--json-errors", "--start", "0", "--duration", "2", "--format", "panorama", "-o", "x.png"],
    );
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr
        .lines()
        .find(|line| line.starts_with('{'))
        .expect("json envelope on stderr");
    let parsed: Value = serde_json::from_str(line).expect("envelope should parse");
    assert_eq!(parsed["ok"], Value::Bool(false));
    assert_eq!(parsed["error"]["code"], "unknown_format");
    assert_eq!(parsed["error"]["details"]["value"], "panorama");
}

#[test]
fn start_without_duration_is_rejected() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_audiogram(dir.path(), &["dry-run", "--start", "3"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing_duration"));
}

#[test]
fn still_writes_png_without_audio() {
    let dir = tempdir().expect("tempdir should create");
    write_fixture(dir.path());
    let output = run_audiogram(
        dir.path(),
        &[
            "still", "--config", "config.yaml", "--soundbites", "1", "--format", "square",
            "--time", "0.5", "-o", "frames/still.png",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let image = image::open(dir.path().join("frames/still.png")).expect("png should decode");
    assert_eq!((image.width(), image.height()), (1080, 1080));
    assert!(String::from_utf8_lossy(&output.stdout).contains("subtitle lines 1"));
}

#[test]
fn still_renders_one_file_per_enabled_format() {
    let dir = tempdir().expect("tempdir should create");
    write_fixture(dir.path());
    let output = run_audiogram(
        dir.path(),
        &["still", "--config", "config.yaml", "--soundbites", "1", "-o", "still.png"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(dir.path().join("still_vertical.png").is_file());
    assert!(dir.path().join("still_square.png").is_file());
    assert!(!dir.path().join("still_horizontal.png").exists());
}
