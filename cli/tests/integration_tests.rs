use std::fs;
use std::path::PathBuf;
use std::process::Output;

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("record_store_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Runs the binary inside `dir` with logging silenced.
fn run(dir: &TempDir, args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_record-store"))
        .current_dir(&dir.path)
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("failed to run record-store")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    stdout(output)
        .lines()
        .map(|line| serde_json::from_str(line).expect("invalid JSON line"))
        .collect()
}

// ---------------------------------------------------------------------------
// Readiness
// ---------------------------------------------------------------------------

#[test]
fn status_before_init_reports_missing_file() {
    let dir = TempDir::new("status_missing");
    let out = run(&dir, &["status"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "FileNotFound");
    assert!(!dir.join("Database").exists(), "status must not create files");
}

#[test]
fn init_creates_default_store() {
    let dir = TempDir::new("init_default");
    let out = run(&dir, &["init"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "Ok\ncreated Item");
    assert!(dir.join("Database/records.sqlite").is_file());

    let out = run(&dir, &["status"]);
    assert_eq!(stdout(&out), "Ok");

    // Second init finds everything in place.
    let out = run(&dir, &["init"]);
    assert_eq!(stdout(&out), "Ok");
}

#[test]
fn missing_explicit_config_reports_config_not_found() {
    let dir = TempDir::new("config_missing");
    let out = run(&dir, &["--config", "absent.yml", "status"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "ConfigNotFound");
}

#[test]
fn config_file_relocates_store() {
    let dir = TempDir::new("config_relocate");
    fs::write(
        dir.join("record-store.yml"),
        "database:\n  directory: data\n  file_name: items.sqlite\n",
    )
    .unwrap();

    let out = run(&dir, &["init"]);
    assert!(out.status.success());
    assert!(dir.join("data/items.sqlite").is_file());
    assert!(!dir.join("Database").exists());
}

#[test]
fn db_flag_overrides_config() {
    let dir = TempDir::new("db_flag");
    let out = run(&dir, &["--db", "custom/store.sqlite", "init"]);
    assert!(out.status.success());
    assert!(dir.join("custom/store.sqlite").is_file());
}

#[test]
fn uncreatable_store_exits_with_error() {
    let dir = TempDir::new("uncreatable");
    fs::write(dir.join("blocker"), "file").unwrap();
    let out = run(&dir, &["--db", "blocker/store.sqlite", "init"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("error:"));
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[test]
fn insert_then_get_round_trips() {
    let dir = TempDir::new("insert_get");
    let out = run(&dir, &["insert", "--id", "44", "--action", "5"]);
    assert_eq!(stdout(&out), "true");

    let found = json_lines(&run(&dir, &["get", "--action", "5"]));
    assert_eq!(
        found,
        vec![serde_json::json!({"id": 44, "action": 5, "name": null})]
    );

    let found = json_lines(&run(&dir, &["get", "--id", "44"]));
    assert_eq!(found.len(), 1);
}

#[test]
fn insert_without_id_is_rejected() {
    let dir = TempDir::new("insert_no_id");
    let out = run(&dir, &["insert", "--action", "5"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "false");
    assert!(json_lines(&run(&dir, &["get"])).is_empty());
}

#[test]
fn insert_if_not_exists_is_idempotent() {
    let dir = TempDir::new("insert_if_not_exists");
    let args = ["insert", "--id", "1", "--name", "O'Brien", "--if-not-exists"];
    assert_eq!(stdout(&run(&dir, &args)), "true");
    assert_eq!(stdout(&run(&dir, &args)), "false");

    let found = json_lines(&run(&dir, &["get"]));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "O'Brien");
}

#[test]
fn update_assigns_given_fields_only() {
    let dir = TempDir::new("update");
    run(&dir, &["insert", "--id", "3", "--action", "1", "--name", "old"]);

    assert_eq!(
        stdout(&run(&dir, &["update", "--id", "3", "--action", "2"])),
        "true"
    );
    let found = json_lines(&run(&dir, &["get", "--id", "3"]));
    assert_eq!(
        found,
        vec![serde_json::json!({"id": 3, "action": 2, "name": "old"})]
    );

    assert_eq!(
        stdout(&run(&dir, &["update", "--id", "99", "--action", "2"])),
        "false"
    );
}

// ---------------------------------------------------------------------------
// Describe
// ---------------------------------------------------------------------------

#[test]
fn describe_prints_table_definitions() {
    let dir = TempDir::new("describe");
    let out = run(&dir, &["describe"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("CREATE TABLE Item ( Id integer PRIMARY KEY, Action integer, Name varchar )"));
    assert!(text.contains("SELECT * FROM Item WHERE 1=1"));
    assert!(text.contains("Id: integer (primary key)"));
}

#[test]
fn describe_json_lists_shapes() {
    let dir = TempDir::new("describe_json");
    let out = run(&dir, &["describe", "--json"]);
    let catalog: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    let fields = &catalog["shapes"][0]["fields"];
    assert_eq!(catalog["shapes"][0]["name"], "Item");
    assert_eq!(fields[0]["name"], "Id");
    assert_eq!(fields[0]["primary_key"], true);
    assert_eq!(fields[2]["field_type"], "Text");
}
