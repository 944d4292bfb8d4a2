use std::path::{Path, PathBuf};

use record_store_db::{DEFAULT_CONFIG_FILE, StoreConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rs_db_integ_{name}_{}", std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn test_hand_written_config_resolves_store_path() {
    let dir = scratch_dir("hand_written");
    let path = dir.join(DEFAULT_CONFIG_FILE);
    std::fs::write(
        &path,
        "version: \"1.0\"\ndatabase:\n  directory: /var/lib/records\n  file_name: xiv.sqlite\n",
    )
    .unwrap();

    let config = StoreConfig::load(&path).unwrap();
    assert_eq!(config.file_path(), Path::new("/var/lib/records/xiv.sqlite"));
    assert_eq!(config.connection.busy_timeout_ms, 5_000);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let dir = scratch_dir("missing");
    let config = StoreConfig::load_optional(dir.join(DEFAULT_CONFIG_FILE))
        .unwrap()
        .unwrap_or_default();
    assert_eq!(config, StoreConfig::default());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_saved_override_survives_reload() {
    let dir = scratch_dir("override");
    let path = dir.join(DEFAULT_CONFIG_FILE);
    let store = dir.join("nested").join("records.sqlite");

    StoreConfig::default()
        .with_file_path(&store)
        .save(&path)
        .unwrap();

    let reloaded = StoreConfig::load(&path).unwrap();
    assert_eq!(reloaded.file_path(), store);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_unreadable_path_is_io_error() {
    let dir = scratch_dir("unreadable");
    // A directory is not a readable config file.
    let err = StoreConfig::load(&dir).unwrap_err();
    assert!(matches!(
        err,
        record_store_db::ConfigError::IoError(_) | record_store_db::ConfigError::YamlError(_)
    ));

    std::fs::remove_dir_all(&dir).ok();
}
