use serde_json::{json, Value};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const VERSION: &str = "1.19.8";

fn modmaker_exe() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_modmaker"))
}

fn create_dir_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel_path, content) in files {
        let full = root.join(rel_path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content).unwrap();
    }
}

struct Workspace {
    _temp: tempfile::TempDir,
    root: PathBuf,
}

impl Workspace {
    /// Baseline is pre-seeded in the cache, so no download happens.
    fn new(baseline: &[(&str, &str)], modified: &[(&str, &str)]) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().to_path_buf();
        create_dir_tree(&root.join("cache").join(VERSION).join("assets"), baseline);
        create_dir_tree(&root.join("modded"), modified);
        Workspace { _temp: temp, root }
    }

    fn run(&self, extra: &[&str]) -> Output {
        let root = &self.root;
        Command::new(modmaker_exe())
            .arg(VERSION)
            .args(["--cache-dir", root.join("cache").to_str().unwrap()])
            .args(["--assets", root.join("modded").to_str().unwrap()])
            .args(["--mods-dir", root.join("mods").to_str().unwrap()])
            .args(["--staging-dir", root.join("staging").to_str().unwrap()])
            .args(["--origin", "http://127.0.0.1:9"])
            .args(["--name", "Better Soil", "--author", "Tester", "--no-wait"])
            .args(extra)
            .env_remove("MODMAKER_LOG")
            .output()
            .expect("Failed to run modmaker")
    }

    fn archive(&self) -> PathBuf {
        self.root.join("mods").join("BetterSoil.zip")
    }
}

fn read_entries(archive: &Path) -> Vec<(String, Vec<u8>)> {
    let mut zip = zip::ZipArchive::new(fs::File::open(archive).unwrap()).unwrap();
    let mut entries = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        entries.push((entry.name().to_string(), data));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "modmaker failed:\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_patch_mode_end_to_end() {
    let ws = Workspace::new(
        &[
            ("game/block/soil.json", r#"{"a":1,"b":2}"#),
            ("game/item/axe.json", "{\r\n  \"durability\": 10\r\n}"),
            ("game/lang/en.json", r#"{"k":"v"}"#),
        ],
        &[
            ("game/block/soil.json", r#"{"a":1,"b":3}"#),
            ("game/item/axe.json", "{\n  \"durability\": 10\n}"),
            ("game/lang/en.json", r#"{"k":"v2","extra":true}"#),
            ("game/new/only-mine.json", r#"{"x":1}"#),
        ],
    );

    let output = ws.run(&["--verify"]);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("game/block/soil.json is different."));
    assert!(!stdout.contains("axe.json is different"));

    let entries = read_entries(&ws.archive());
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "assets/game/patches/game-block-soil.json",
            "assets/game/patches/game-lang-en.json",
            "modinfo.json",
        ]
    );

    let soil: Value = serde_json::from_slice(&entries[0].1).unwrap();
    assert_eq!(
        soil,
        json!([{"op": "replace", "path": "/b", "value": 3, "file": "game/block/soil.json"}])
    );

    let lang: Value = serde_json::from_slice(&entries[1].1).unwrap();
    let ops = lang.as_array().unwrap();
    assert_eq!(ops.len(), 2);
    assert!(ops.iter().all(|op| op["file"] == "game/lang/en.json"));

    let modinfo: Value = serde_json::from_slice(&entries[2].1).unwrap();
    assert_eq!(modinfo["modid"], "BetterSoil");
    assert_eq!(modinfo["name"], "Better Soil");
    assert_eq!(modinfo["authors"], json!(["Tester"]));
    assert_eq!(modinfo["type"], "content");
}

#[test]
fn test_copy_mode_end_to_end() {
    let ws = Workspace::new(
        &[("game/block/soil.json", r#"{"a":1}"#)],
        &[("game/block/soil.json", r#"{"a":2}"#)],
    );

    let output = ws.run(&["--mode", "copy"]);
    assert_success(&output);

    let entries = read_entries(&ws.archive());
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, "assets/game/game/block/soil.json");
    assert_eq!(entries[0].1, br#"{"a":2}"#.to_vec());
}

#[test]
fn test_no_differences_builds_nothing() {
    let files: &[(&str, &str)] = &[("game/a.json", "{}"), ("game/sub/b.json", "[1, 2]")];
    let mut modified = files.to_vec();
    modified.push(("game/added.json", r#"{"new": true}"#));
    let ws = Workspace::new(files, &modified);

    let output = ws.run(&[]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("No differences detected"));
    assert!(!ws.archive().exists());
}

#[test]
fn test_invalid_json_exits_with_parse_code() {
    let ws = Workspace::new(
        &[("game/broken.json", r#"{"a":1}"#)],
        &[("game/broken.json", r#"{"a":"#)],
    );

    let output = ws.run(&[]);
    assert_eq!(output.status.code(), Some(3));
    assert!(!ws.archive().exists());
}

#[test]
fn test_missing_baseline_exits_with_acquisition_code() {
    let ws = Workspace::new(&[], &[("game/a.json", "{}")]);

    let output = Command::new(modmaker_exe())
        .arg("0.0.0-missing")
        .args(["--cache-dir", ws.root.join("cache").to_str().unwrap()])
        .args(["--assets", ws.root.join("modded").to_str().unwrap()])
        .args(["--mods-dir", ws.root.join("mods").to_str().unwrap()])
        .args(["--origin", "http://127.0.0.1:9", "--no-wait"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(!ws.root.join("cache").join("0.0.0-missing").exists());
}
