use assert_cmd::Command;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn cli() -> Command {
    Command::cargo_bin("mm-cli").expect("mm-cli binary")
}

fn stdout_of(args: &[&str]) -> String {
    let output = cli().args(args).assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("utf-8 output")
}

fn json_of(args: &[&str]) -> Value {
    serde_json::from_str(&stdout_of(args)).expect("JSON output")
}

fn path_str(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

fn child<'a>(node: &'a Value, id: &str) -> &'a Value {
    node["children"]
        .as_array()
        .and_then(|c| c.iter().find(|n| n["id"] == id))
        .unwrap_or_else(|| panic!("no child {id}"))
}

// ─── layout ──────────────────────────────────────────────────────────────

#[test]
fn layout_emits_coordinates_and_connectors() {
    let polity = path_str(&fixture("polity.json"));
    let out = json_of(&["layout", &polity]);

    let root = &out["root"];
    assert_eq!(root["x"], 0.0);
    assert_eq!(root["y"], 0.0);
    assert_eq!(root["subtreeHeight"], 290.0);

    let parliament = child(root, "parliament");
    assert_eq!(parliament["x"], 240.0);
    assert_eq!(parliament["y"], -80.0);
    assert_eq!(child(parliament, "lok_sabha")["x"], 480.0);

    assert_eq!(out["connectors"].as_array().unwrap().len(), 6);
    assert_eq!(out["config"]["nodeWidth"], 160.0);
    assert_eq!(out["viewBox"]["width"], 600.0);
}

#[test]
fn layout_config_file_and_flags() {
    let polity = path_str(&fixture("polity.json"));
    let compact = path_str(&fixture("compact.json"));

    let out = json_of(&["layout", "--config", &compact, &polity]);
    assert_eq!(child(&out["root"], "parliament")["x"], 150.0);
    assert_eq!(out["config"]["padding"], 20.0);

    // Flags win over the file.
    let out = json_of(&["layout", "--config", &compact, "--node-width", "120", &polity]);
    assert_eq!(child(&out["root"], "parliament")["x"], 170.0);
}

#[test]
fn layout_reads_outline_from_stdin() {
    let outline = std::fs::read_to_string(fixture("economy.txt")).unwrap();
    let output = cli()
        .args(["layout", "-"])
        .write_stdin(outline)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let out: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(out["root"]["text"], "Indian Economy");
    assert_eq!(out["root"]["children"].as_array().unwrap().len(), 3);
}

// ─── render ──────────────────────────────────────────────────────────────

#[test]
fn render_uses_stored_view_window() {
    let polity = path_str(&fixture("polity.json"));
    let svg = stdout_of(&["render", &polity]);
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("viewBox=\"-300 -300 600 600\""));
    assert!(svg.contains("Rajya Sabha"));
    assert_eq!(svg.matches("<path").count(), 6);
}

#[test]
fn render_fit_and_theme() {
    let polity = path_str(&fixture("polity.json"));
    let svg = stdout_of(&["render", "--fit", "--theme", "dark", &polity]);
    assert!(svg.contains("viewBox=\"-100 -165 680 330\""));
    assert!(svg.contains("#1C1C1E"));
}

#[test]
fn render_to_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("polity.svg");
    let out_path = path_str(&out);
    let polity = path_str(&fixture("polity.json"));
    cli()
        .args(["render", "--width", "1200", "--out", out_path.as_str(), polity.as_str()])
        .assert()
        .success();
    let svg = std::fs::read_to_string(&out).expect("read svg");
    assert!(svg.contains("width=\"1200\" height=\"600\""));
}

// ─── convert / validate ──────────────────────────────────────────────────

#[test]
fn convert_json_to_outline() {
    let polity = path_str(&fixture("polity.json"));
    let outline = stdout_of(&["convert", "--to", "outline", &polity]);
    assert_eq!(
        outline,
        "Indian Polity\n  - Parliament\n    - Lok Sabha\n    - Rajya Sabha\n  - Judiciary\n    - Supreme Court\n  - Executive\n"
    );
}

#[test]
fn convert_through_msgpack() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let packed = path_str(&tmp.path().join("polity.mpk"));
    let polity = path_str(&fixture("polity.json"));
    cli()
        .args(["convert", "--to", "msgpack", "--out", packed.as_str(), polity.as_str()])
        .assert()
        .success();

    assert_eq!(stdout_of(&["validate", &packed]), "ok: 7 nodes\n");
    let back = json_of(&["convert", "--to", "json", &packed]);
    let direct = json_of(&["convert", "--to", "json", &polity]);
    assert_eq!(back, direct);
}

#[test]
fn malformed_input_exits_with_3() {
    cli()
        .args(["validate", "-"])
        .write_stdin(r#"{"viewBox":{"x":0,"y":0,"width":1,"height":1}}"#)
        .assert()
        .code(3);
}

#[test]
fn missing_command_is_usage_error() {
    cli().assert().code(2);
    cli().args(["render", "--theme", "sepia"]).assert().code(2);
}
