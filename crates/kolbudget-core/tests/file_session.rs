//! File-backed sessions: persistence across restarts and recovery from bad
//! blobs on disk.

use kolbudget_core::config::BudgetConfig;
use kolbudget_core::model::{NewLevel, Span};
use kolbudget_core::session::MSG_LOADED_RECENT;
use kolbudget_core::store::{FileStore, LoadSource, STORAGE_KEY};
use kolbudget_core::Session;
use std::path::Path;
use tempfile::TempDir;

fn config_for(dir: &Path) -> BudgetConfig {
    let mut config = BudgetConfig::default();
    config.storage.dir = Some(dir.to_path_buf());
    config
}

fn blob_path(dir: &Path) -> std::path::PathBuf {
    FileStore::new(dir).path_for(STORAGE_KEY)
}

#[test]
fn first_run_seeds_defaults_and_writes_nothing() {
    let tmp = TempDir::new().expect("tempdir");
    let session = Session::open(&config_for(tmp.path())).expect("open");
    assert_eq!(session.levels().len(), 3);
    assert_eq!(session.startup_report().source, LoadSource::Absent);
    assert!(!blob_path(tmp.path()).exists());
}

#[test]
fn saved_work_survives_restart() {
    let tmp = TempDir::new().expect("tempdir");
    let config = config_for(tmp.path());
    let expected = {
        let mut session = Session::open(&config).expect("open");
        let _ = session
            .add_level(NewLevel::new("Nano", 5, Span::new(100, 200), Span::new(300, 400)))
            .expect("add");
        let _ = session.save("Plan A").expect("save");
        session.levels().to_vec()
    };

    let raw = std::fs::read_to_string(blob_path(tmp.path())).expect("blob on disk");
    assert!(raw.contains(r#""name":"Plan A""#));

    let session = Session::open(&config).expect("reopen");
    assert_eq!(session.startup_report().source, LoadSource::Stored);
    assert_eq!(session.levels(), expected.as_slice());
    assert_eq!(
        session.notification().map(|n| n.message.as_str()),
        Some(MSG_LOADED_RECENT)
    );
}

#[test]
fn corrupt_blob_is_quarantined_and_defaults_seeded() {
    let tmp = TempDir::new().expect("tempdir");
    std::fs::write(blob_path(tmp.path()), "definitely not json").expect("write corrupt blob");

    let mut session = Session::open(&config_for(tmp.path())).expect("open");
    assert_eq!(
        session.startup_report().source,
        LoadSource::Corrupt { quarantined: true }
    );
    assert_eq!(session.levels().len(), 3);
    assert!(session.saved().is_empty());
    assert!(session.notification().is_none());

    let quarantined = FileStore::new(tmp.path()).path_for("kol-budget-calcs.corrupt");
    assert_eq!(
        std::fs::read_to_string(quarantined).expect("quarantine copy"),
        "definitely not json"
    );

    // The next save replaces the corrupt blob with a valid one.
    let _ = session.save("fresh").expect("save");
    let session = Session::open(&config_for(tmp.path())).expect("reopen");
    assert_eq!(session.saved().len(), 1);
}

#[test]
fn invalid_key_in_config_is_rejected() {
    let tmp = TempDir::new().expect("tempdir");
    let mut config = config_for(tmp.path());
    config.storage.key = "../outside".to_string();
    let err = Session::open(&config).err().expect("invalid key");
    assert!(err.to_string().contains("Invalid storage key"));
}

#[test]
fn configured_capacity_applies() {
    let tmp = TempDir::new().expect("tempdir");
    let mut config = config_for(tmp.path());
    config.store.capacity = 2;
    let mut session = Session::open(&config).expect("open");
    for name in ["a", "b", "c"] {
        let _ = session.save(name).expect("save");
    }
    let names: Vec<_> = session.saved().iter().map(|entry| entry.name().to_string()).collect();
    assert_eq!(names, vec!["c", "b"]);
}
