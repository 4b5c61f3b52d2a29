//! End-to-end tests for the tessera binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn tessera(config_dir: &Path) -> Command {
    let config = config_dir.join("config.toml");
    if !config.exists() {
        std::fs::write(&config, "[factory]\ndefault_endianness = \"little\"\n").unwrap();
    }
    let mut cmd = Command::cargo_bin("tessera").unwrap();
    cmd.env_remove("TESSERA_DEFAULT_ENDIANNESS")
        .arg("--config")
        .arg(config);
    cmd
}

fn f32_file(dir: &Path, name: &str, values: &[f32], big_endian: bool) -> std::path::PathBuf {
    let bytes: Vec<u8> = values
        .iter()
        .flat_map(|v| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() })
        .collect();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_inspect_reports_stats() {
    let dir = tempfile::tempdir().unwrap();
    let file = f32_file(dir.path(), "m.bin", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], false);

    tessera(dir.path())
        .args(["inspect", "--dtype", "fp32", "--shape", "2,3"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("(2, 3)"))
        .stdout(predicate::str::contains("24"))
        .stdout(predicate::str::contains("3.5000"));
}

#[test]
fn test_inspect_json_big_endian() {
    let dir = tempfile::tempdir().unwrap();
    let file = f32_file(dir.path(), "v.bin", &[-1.5, 0.5], true);

    let output = tessera(dir.path())
        .args(["--json", "inspect", "--dtype", "fp32", "--shape", "2", "--big-endian"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["dtype"], "fp32");
    assert_eq!(json["min"], -1.5);
    assert_eq!(json["max"], 0.5);
    assert_eq!(json["preview"], serde_json::json!([-1.5, 0.5]));
}

#[test]
fn test_inspect_size_mismatch_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("short.bin");
    std::fs::write(&file, [0u8; 23]).unwrap();

    tessera(dir.path())
        .args(["inspect", "--dtype", "fp32", "--shape", "2,3"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Size mismatch"));
}

#[test]
fn test_batch_manifest() {
    let dir = tempfile::tempdir().unwrap();
    f32_file(dir.path(), "bias.bin", &[0.25, -0.25], false);
    // int4 (1, -1, 7, -8) -> 0x1F, 0x78
    std::fs::write(dir.path().join("w.bin"), [0x1Fu8, 0x78]).unwrap();
    std::fs::write(
        dir.path().join("manifest.toml"),
        r#"
[[tensor]]
name = "weights"
dtype = "int4"
shape = [2, 2]
file = "w.bin"

[[tensor]]
dtype = "fp32"
shape = [2]
file = "bias.bin"
"#,
    )
    .unwrap();

    tessera(dir.path())
        .arg("batch")
        .arg(dir.path().join("manifest.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("weights"))
        .stdout(predicate::str::contains("tensor_1"))
        .stdout(predicate::str::contains("Decoded 2 tensors"));
}

#[test]
fn test_batch_names_failing_entry() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("t.bin"), [0b1111_1111u8]).unwrap();
    std::fs::write(
        dir.path().join("manifest.toml"),
        "[[tensor]]\nname = \"trits\"\ndtype = \"ternary\"\nshape = [4]\nfile = \"t.bin\"\n",
    )
    .unwrap();

    tessera(dir.path())
        .arg("batch")
        .arg(dir.path().join("manifest.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("trits"))
        .stderr(predicate::str::contains("reserved"));
}
