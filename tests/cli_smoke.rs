use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn combined_output(output: &std::process::Output) -> String {
    format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn cli(settings_dir: &TempDir) -> Command {
    let mut command = Command::cargo_bin("video-mixer").expect("video-mixer binary");
    command
        .arg("--settings")
        .arg(settings_dir.path().join("mixer-settings.json"))
        .env("RUST_LOG", "warn");
    command
}

#[test]
fn help_lists_subcommands() {
    let settings = tempfile::tempdir().unwrap();
    let output = cli(&settings).arg("--help").output().expect("--help runs");
    assert!(output.status.success());
    let text = combined_output(&output);
    for subcommand in ["scan", "mix", "tools"] {
        assert!(text.contains(subcommand), "help text missing {subcommand}: {text}");
    }
}

#[test]
fn mix_help_documents_flags() {
    let settings = tempfile::tempdir().unwrap();
    let output = cli(&settings)
        .arg("mix")
        .arg("--help")
        .output()
        .expect("mix --help runs");
    assert!(output.status.success());
    let text = combined_output(&output);
    for flag in ["--folder", "--output-dir", "--seed", "--ffmpeg"] {
        assert!(text.contains(flag), "help text missing {flag}: {text}");
    }
}

#[test]
fn scan_prints_folder_descriptors_as_json() {
    let settings = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let alpha = root.path().join("alpha");
    let beta = root.path().join("beta");
    fs::create_dir(&alpha).unwrap();
    fs::create_dir(&beta).unwrap();
    fs::write(alpha.join("one.mp4"), b"clip").unwrap();
    fs::write(alpha.join("two.MOV"), b"clip").unwrap();
    fs::write(beta.join("notes.txt"), b"text").unwrap();

    let output = cli(&settings)
        .arg("scan")
        .arg(root.path())
        .arg("--json")
        .output()
        .expect("scan runs");
    assert!(output.status.success(), "{}", combined_output(&output));

    let folders: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let folders = folders.as_array().unwrap();
    assert_eq!(folders.len(), 2);
    assert_eq!(folders[0]["name"], "alpha");
    assert_eq!(folders[0]["videoCount"], 2);
    assert_eq!(folders[1]["name"], "beta");
    assert_eq!(folders[1]["videoCount"], 0);
}

#[test]
fn scan_of_missing_root_fails() {
    let settings = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let output = cli(&settings)
        .arg("scan")
        .arg(root.path().join("missing"))
        .output()
        .expect("scan runs");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("failed to scan"));
}

#[test]
fn mix_rejects_unknown_folder_names() {
    let settings = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    fs::create_dir(root.path().join("alpha")).unwrap();
    let output = cli(&settings)
        .arg("mix")
        .arg(root.path())
        .arg("--folder")
        .arg("gamma")
        .arg("--ffmpeg")
        .arg(root.path().join("ffmpeg"))
        .arg("--output-dir")
        .arg(root.path().join("out"))
        .output()
        .expect("mix runs");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("no subfolder named \"gamma\""));
    assert!(!root.path().join("out").exists());
}
