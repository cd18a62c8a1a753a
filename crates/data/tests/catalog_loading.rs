use heropick_core::{filter_catalog, LoadError, MemoryStore, PickerConfig, Session};
use heropick_data::{catalog_path, load_catalog};
use std::fs;
use std::path::PathBuf;

fn assets_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("assets")
}

#[test]
fn bundled_catalog_loads() {
    let heroes = load_catalog(&catalog_path(&assets_root())).expect("load catalog");
    assert!(heroes.len() >= 20, "{}", heroes.len());
    assert!(heroes.iter().all(|hero| !hero.image_ref.is_empty()));
}

#[test]
fn bundled_catalog_filters_case_insensitively() {
    let heroes = load_catalog(&catalog_path(&assets_root())).expect("load catalog");
    let lower = filter_catalog(&heroes, "ash");
    let upper = filter_catalog(&heroes, "ASH");
    assert_eq!(lower, upper);
    assert!(lower.iter().any(|hero| hero.name == "Ember Ashcroft"));
}

#[test]
fn session_reports_broken_catalog_and_recovers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = catalog_path(dir.path());
    fs::write(&path, "{ not a list").expect("write");

    let mut session = Session::open(
        PickerConfig {
            seed: Some(9),
            ..PickerConfig::default()
        },
        MemoryStore::new(),
    );
    session.finish_load(load_catalog(&path));
    assert!(matches!(
        session.catalog().error(),
        Some(LoadError::Malformed(_))
    ));

    fs::write(&path, r#"[{"name": "Orla", "imageUrl": "img/orla.png"}]"#).expect("write");
    assert!(session.retry_load());
    session.finish_load(load_catalog(&path));
    assert_eq!(session.filtered().len(), 1);
}
