use crate::schema::CatalogRecord;
use heropick_core::{Entity, LoadError};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CATALOG_FILE: &str = "heroes.json";

pub fn catalog_path(assets_dir: &Path) -> PathBuf {
    assets_dir.join(CATALOG_FILE)
}

pub fn load_catalog(path: &Path) -> Result<Vec<Entity>, LoadError> {
    let raw = fs::read_to_string(path).map_err(|err| {
        warn!(path = %path.display(), error = %err, "catalog read failed");
        if err.kind() == io::ErrorKind::NotFound {
            LoadError::Missing(path.display().to_string())
        } else {
            LoadError::Io(format!("{}: {err}", path.display()))
        }
    })?;
    let entities = parse_catalog(&raw)?;
    debug!(path = %path.display(), count = entities.len(), "catalog parsed");
    Ok(entities)
}

/// Parses a catalog document, keeping file order. Names must be non-blank and
/// unique.
pub fn parse_catalog(raw: &str) -> Result<Vec<Entity>, LoadError> {
    let records: Vec<CatalogRecord> =
        serde_json::from_str(raw).map_err(|err| LoadError::Malformed(err.to_string()))?;
    let mut seen = HashSet::new();
    let mut entities = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        if record.name.trim().is_empty() {
            return Err(LoadError::Malformed(format!("entry {index} has an empty name")));
        }
        if !seen.insert(record.name.clone()) {
            return Err(LoadError::Malformed(format!(
                "duplicate name {:?} at entry {index}",
                record.name
            )));
        }
        entities.push(Entity::from(record));
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_in_order() {
        let raw = r#"[
            {"name": "Orla", "imageUrl": "img/orla.png"},
            {"name": "Brann", "imageRef": "img/brann.png"}
        ]"#;
        let entities = parse_catalog(raw).expect("parse");
        assert_eq!(
            entities,
            vec![
                Entity::new("Orla", "img/orla.png"),
                Entity::new("Brann", "img/brann.png"),
            ]
        );
    }

    #[test]
    fn empty_array_is_an_empty_catalog() {
        assert_eq!(parse_catalog("[]"), Ok(Vec::new()));
    }

    #[test]
    fn rejects_non_array_documents() {
        let err = parse_catalog(r#"{"name": "Orla"}"#).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn rejects_records_without_image() {
        let err = parse_catalog(r#"[{"name": "Orla"}]"#).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn rejects_blank_names() {
        let err = parse_catalog(r#"[{"name": "  ", "imageUrl": "x"}]"#).unwrap_err();
        assert_eq!(
            err,
            LoadError::Malformed("entry 0 has an empty name".to_string())
        );
    }

    #[test]
    fn rejects_duplicate_names() {
        let raw = r#"[
            {"name": "Orla", "imageUrl": "a"},
            {"name": "Orla", "imageUrl": "b"}
        ]"#;
        let err = parse_catalog(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate name"));
    }

    #[test]
    fn missing_file_is_reported_as_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_catalog(&catalog_path(dir.path())).unwrap_err();
        assert!(matches!(err, LoadError::Missing(_)));
    }

    #[test]
    fn unreadable_path_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_catalog(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)), "{err:?}");
    }
}
