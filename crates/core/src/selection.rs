use crate::{load_json, save_json, Entity, KeyValueStore};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on candidates for a random pick.
pub const MAX_SELECTION: usize = 10;
pub const SELECTION_KEY: &str = "selectedCharacters";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("you can only select up to {capacity} heroes")]
    CapacityExceeded { capacity: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

/// Owns the ordered, name-unique selection and writes it through to the
/// store after every mutation.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    items: Vec<Entity>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the persisted selection. Anything that is not a list of at most
    /// `MAX_SELECTION` uniquely named heroes is treated as absent.
    pub fn restore(store: &dyn KeyValueStore) -> Self {
        let Some(items) = load_json::<Vec<Entity>>(store, SELECTION_KEY) else {
            return Self::new();
        };
        if !is_valid_selection(&items) {
            warn!(
                len = items.len(),
                "stored selection breaks the size or uniqueness bound, starting empty"
            );
            return Self::new();
        }
        debug!(len = items.len(), "restored selection");
        Self { items }
    }

    pub fn toggle(
        &mut self,
        entity: &Entity,
        store: &mut dyn KeyValueStore,
    ) -> Result<Toggled, SelectionError> {
        if let Some(pos) = self.position(&entity.name) {
            self.items.remove(pos);
            self.persist(store);
            return Ok(Toggled::Removed);
        }
        if self.is_full() {
            return Err(SelectionError::CapacityExceeded {
                capacity: MAX_SELECTION,
            });
        }
        self.items.push(entity.clone());
        self.persist(store);
        Ok(Toggled::Added)
    }

    /// Empties the selection and returns how many heroes were removed.
    pub fn clear(&mut self, store: &mut dyn KeyValueStore) -> usize {
        let removed = self.items.len();
        self.items.clear();
        self.persist(store);
        removed
    }

    pub fn is_selected(&self, entity: &Entity) -> bool {
        self.contains(&entity.name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn items(&self) -> &[Entity] {
        &self.items
    }

    pub fn snapshot(&self) -> Vec<Entity> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_SELECTION
    }

    pub fn can_pick(&self) -> bool {
        (1..=MAX_SELECTION).contains(&self.items.len())
    }

    pub fn persist(&self, store: &mut dyn KeyValueStore) {
        save_json(store, SELECTION_KEY, &self.items);
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|item| item.name == name)
    }
}

fn is_valid_selection(items: &[Entity]) -> bool {
    let mut names = HashSet::new();
    items.len() <= MAX_SELECTION && items.iter().all(|item| names.insert(item.name.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn hero(name: &str) -> Entity {
        Entity::new(name, format!("img/{name}.png"))
    }

    fn names(selection: &SelectionManager) -> Vec<&str> {
        selection.items().iter().map(|item| item.name.as_str()).collect()
    }

    #[test]
    fn toggle_adds_then_removes_exactly_that_hero() {
        let mut store = MemoryStore::new();
        let mut selection = SelectionManager::new();
        for name in ["a", "b", "c"] {
            assert_eq!(selection.toggle(&hero(name), &mut store), Ok(Toggled::Added));
        }
        assert_eq!(selection.toggle(&hero("b"), &mut store), Ok(Toggled::Removed));
        assert_eq!(names(&selection), vec!["a", "c"]);
    }

    #[test]
    fn membership_is_by_name() {
        let mut store = MemoryStore::new();
        let mut selection = SelectionManager::new();
        selection.toggle(&hero("a"), &mut store).expect("add");
        assert!(selection.is_selected(&Entity::new("a", "other.png")));
        assert_eq!(
            selection.toggle(&Entity::new("a", "other.png"), &mut store),
            Ok(Toggled::Removed)
        );
        assert!(selection.is_empty());
    }

    #[test]
    fn eleventh_hero_is_rejected_without_change() {
        let mut store = MemoryStore::new();
        let mut selection = SelectionManager::new();
        for idx in 0..MAX_SELECTION {
            selection
                .toggle(&hero(&format!("h{idx}")), &mut store)
                .expect("room left");
        }
        let before = names(&selection).join(",");
        let err = selection.toggle(&hero("late"), &mut store).unwrap_err();
        assert_eq!(err, SelectionError::CapacityExceeded { capacity: 10 });
        assert_eq!(names(&selection).join(","), before);
        assert!(selection.toggle(&hero("h3"), &mut store).is_ok());
        assert_eq!(selection.len(), 9);
    }

    #[test]
    fn random_toggle_sequences_keep_bounds() {
        let mut store = MemoryStore::new();
        let mut selection = SelectionManager::new();
        let mut rng = crate::RngState::from_seed(11);
        for _ in 0..2_000 {
            let name = format!("h{}", rng.next_u64() % 17);
            let _ = selection.toggle(&hero(&name), &mut store);
            assert!(selection.len() <= MAX_SELECTION);
            assert!(is_valid_selection(selection.items()));
        }
    }

    #[test]
    fn every_mutation_writes_through() {
        let mut store = MemoryStore::new();
        let mut selection = SelectionManager::new();
        selection.toggle(&hero("a"), &mut store).expect("add");
        selection.toggle(&hero("b"), &mut store).expect("add");
        let restored = SelectionManager::restore(&store);
        assert_eq!(names(&restored), vec!["a", "b"]);

        selection.clear(&mut store);
        assert!(SelectionManager::restore(&store).is_empty());
    }

    #[test]
    fn corrupt_or_oversized_state_restores_empty() {
        let corrupt = MemoryStore::new().with_raw(SELECTION_KEY, "[{\"name\":");
        assert!(SelectionManager::restore(&corrupt).is_empty());

        let dupes = MemoryStore::new().with_raw(
            SELECTION_KEY,
            r#"[{"name":"a","imageUrl":""},{"name":"a","imageUrl":""}]"#,
        );
        assert!(SelectionManager::restore(&dupes).is_empty());

        let many: Vec<Entity> = (0..11).map(|idx| hero(&format!("h{idx}"))).collect();
        let raw = serde_json::to_string(&many).expect("encode");
        let oversized = MemoryStore::new().with_raw(SELECTION_KEY, &raw);
        assert!(SelectionManager::restore(&oversized).is_empty());
    }

    #[test]
    fn pick_enablement_follows_size() {
        let mut store = MemoryStore::new();
        let mut selection = SelectionManager::new();
        assert!(!selection.can_pick());
        selection.toggle(&hero("a"), &mut store).expect("add");
        assert!(selection.can_pick());
    }
}
