// Command line behaviour of the tilemark binary

use super::fixtures;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;
use tilemark::digest::sha256_file;

fn tilemark(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tilemark"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_missing_input_exits_2() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("nowhere.pdf");
    let output = dir.path().join("out.pdf");

    let result = tilemark(
        &["-i", path_arg(&input), "-o", path_arg(&output), "--non-interactive"],
        "",
    );

    assert_eq!(result.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("[!] Input file not found"), "stderr: {}", stderr);
    assert!(!output.exists());
}

#[test]
fn test_unsupported_extension_exits_3_without_prompting() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("notes.txt");
    std::fs::write(&input, "plain text").unwrap();

    let result = tilemark(
        &["-i", path_arg(&input), "-o", path_arg(&dir.path().join("out.txt"))],
        "",
    );

    assert_eq!(result.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("[!] Unsupported format"));
    assert!(!stderr.contains("WATERMARK SETUP"));
}

#[test]
fn test_non_interactive_success_reports_hash() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scan.png");
    let output = dir.path().join("scan_wm.jpg");
    fixtures::write_image(&input, 300, 200);

    let result = tilemark(
        &[
            "-i",
            path_arg(&input),
            "-o",
            path_arg(&output),
            "--recipient",
            "Copy for Bank XYZ",
            "--angle",
            "-20",
            "--opacity",
            "0.3",
            "--non-interactive",
        ],
        "",
    );

    assert_eq!(result.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains(&format!("[OK] Watermark applied -> {}", output.display())));
    assert!(stdout.contains(&format!(
        "[i] SHA-256 of original: {}",
        sha256_file(&input).unwrap()
    )));
    assert!(output.exists());
}

#[test]
fn test_prompts_read_answers_from_stdin() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("statement.pdf");
    let output = dir.path().join("statement_wm.pdf");
    fixtures::save_pdf(fixtures::letter_pdf(1), &input);

    let result = tilemark(
        &["-i", path_arg(&input), "-o", path_arg(&output)],
        "Copy for Bank XYZ\nKYC 2025\n\nn\nn\n",
    );

    assert_eq!(result.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("=== WATERMARK SETUP ==="));
    assert!(stderr.contains("Recipient"));
    assert!(output.exists());
}

#[test]
fn test_closed_stdin_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scan.bmp");
    let output = dir.path().join("scan_wm.png");
    fixtures::write_image(&input, 120, 90);

    let result = tilemark(&["-i", path_arg(&input), "-o", path_arg(&output)], "");

    assert_eq!(result.status.code(), Some(0));
    assert!(output.exists());
}

#[test]
fn test_broken_config_exits_1() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scan.png");
    fixtures::write_image(&input, 64, 64);
    let config = dir.path().join("tilemark.yaml");
    std::fs::write(&config, "watermark:\n  opacity: [not, a, number]\n").unwrap();

    let result = tilemark(
        &[
            "-i",
            path_arg(&input),
            "-o",
            path_arg(&dir.path().join("out.png")),
            "-c",
            path_arg(&config),
            "--non-interactive",
        ],
        "",
    );

    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stderr).contains("[!] Configuration error"));
}

#[test]
fn test_missing_input_wins_over_broken_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("tilemark.yaml");
    std::fs::write(&config, "watermark: [broken\n").unwrap();

    let result = tilemark(
        &[
            "-i",
            path_arg(&dir.path().join("nowhere.png")),
            "-o",
            path_arg(&dir.path().join("out.png")),
            "-c",
            path_arg(&config),
            "--non-interactive",
        ],
        "",
    );

    assert_eq!(result.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&result.stderr).contains("[!] Input file not found"));
}

#[test]
fn test_missing_required_output_is_usage_error() {
    let result = tilemark(&["-i", "scan.png"], "");

    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("--output"));
}
