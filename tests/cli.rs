//! Runs the binary end to end on a small corpus.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const SAMPLES: &[(&str, &str, &str, &str)] = &[
    ("the quick brown fox", "us-ascii", "en", "Latn"),
    ("jumps over the lazy dog", "us-ascii", "en", "Latn"),
    ("plain ascii sentence", "us-ascii", "en", "Latn"),
    ("привет мир", "utf-8", "ru", "Cyrl"),
    ("да выпей чаю", "utf-8", "ru", "Cyrl"),
    ("короткая строка", "utf-8", "ru", "Cyrl"),
];

fn write_corpus(root: &Path) -> PathBuf {
    let mut index = String::from("file,encoding,language,script\n");
    for (i, (text, encoding, language, script)) in SAMPLES.iter().enumerate() {
        fs::write(root.join(format!("{i}.txt")), text).unwrap();
        index.push_str(&format!("{i}.txt,{encoding},{language},{script}\n"));
    }
    let path = root.join("index.csv");
    fs::write(&path, index).unwrap();
    path
}

fn provenance(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_provenance"))
        .args(args)
        .arg("--quiet")
        .output()
        .unwrap()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn analyzers_lists_the_pool() {
    let output = provenance(&["analyzers"]);
    assert!(output.status.success());
    let listing = stdout_json(&output);
    assert_eq!(listing[0]["id"], "bom");
    assert_eq!(listing[1]["id"], "unicode");
}

#[test]
fn train_then_test() {
    let dir = TempDir::new().unwrap();
    let index = write_corpus(dir.path());
    let index = index.to_str().unwrap();
    let out = dir.path().join("out");
    let out = out.to_str().unwrap();

    let output = provenance(&[
        "train", "--name", "cli", "--train", index, "--output-dir", out, "--trees", "10",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let trained = stdout_json(&output);
    assert_eq!(trained["profile"], "cli");
    assert_eq!(trained["training_records"], SAMPLES.len());
    assert!(trained["test"].is_null());
    assert!(dir.path().join("out/cli/model.bin").is_file());

    let output = provenance(&["test", "--name", "cli", "--test", index, "--output-dir", out]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let tested = stdout_json(&output);
    assert_eq!(tested["test_records"], SAMPLES.len());
    assert_eq!(tested["analyzers"][0]["analyzer"], "cli");
    assert_eq!(tested["analyzers"][2]["strict_encoding"], 1.0);
    assert!(tested["analyzers"][3]["strict_encoding"].is_null());
    assert!(dir.path().join("out/cli_report.json").is_file());
}

#[test]
fn train_skips_a_missing_test_index() {
    let dir = TempDir::new().unwrap();
    let index = write_corpus(dir.path());
    let index = index.to_str().unwrap();
    let missing = dir.path().join("missing.csv");
    let out = dir.path().join("out");

    let output = provenance(&[
        "train",
        "--name",
        "skip",
        "--train",
        index,
        "--output-dir",
        out.to_str().unwrap(),
        "--trees",
        "5",
        "--test",
        missing.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let trained = stdout_json(&output);
    assert_eq!(trained["profile"], "skip");
    assert!(trained["test"].is_null());
    assert!(out.join("skip/model.bin").is_file());
    assert!(!out.join("skip_report.json").exists());
}

#[test]
fn failures_map_to_exit_codes() {
    let dir = TempDir::new().unwrap();
    let index = write_corpus(dir.path());
    let index = index.to_str().unwrap();
    let missing = dir.path().join("missing.csv");
    let out = dir.path().to_str().unwrap();

    let output = provenance(&["train", "--name", " ", "--train", index]);
    assert_eq!(output.status.code(), Some(254));

    let output = provenance(&["train", "--name", "x", "--train", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(253));

    let output = provenance(&["train", "--name", "x", "--train", index, "--analyzers", "cld2"]);
    assert_eq!(output.status.code(), Some(251));

    let output = provenance(&["test", "--name", "nothing", "--test", index, "--output-dir", out]);
    assert_eq!(output.status.code(), Some(254));
}
