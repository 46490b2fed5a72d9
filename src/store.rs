//! Cube record storage.
//!
//! The layout engine only ever sees the snapshot returned by `list()`.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

use crate::model::{Cube, CubeDraft, CubeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Cube {0} not found")]
    NotFound(CubeId),
}

/// Storage of cube records keyed by an identifier the store assigns.
pub trait CubeStore: Send + Sync {
    /// All records in ascending id order, which is creation order.
    fn list(&self) -> Vec<Cube>;

    fn get(&self, id: CubeId) -> Result<Cube, StoreError>;

    /// Stores a new record under the next free identifier.
    fn create(&self, draft: CubeDraft) -> Cube;

    /// Replaces every field except the identifier.
    fn update(&self, id: CubeId, draft: CubeDraft) -> Result<Cube, StoreError>;

    /// Removes the record and returns it.
    fn delete(&self, id: CubeId) -> Result<Cube, StoreError>;

    /// Removes every record and returns how many there were.
    fn clear_all(&self) -> usize;
}

#[derive(Debug)]
struct Records {
    next_id: CubeId,
    cubes: BTreeMap<CubeId, Cube>,
}

/// Volatile store kept behind a read-write lock.
///
/// Identifiers start at 1 and are never handed out twice, even after
/// `delete` or `clear_all`.
#[derive(Debug)]
pub struct InMemoryCubeStore {
    records: RwLock<Records>,
}

impl InMemoryCubeStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Records {
                next_id: 1,
                cubes: BTreeMap::new(),
            }),
        }
    }

    /// Creates a store pre-filled with the given drafts, in order.
    pub fn with_cubes(drafts: impl IntoIterator<Item = CubeDraft>) -> Self {
        let store = Self::new();
        for draft in drafts {
            store.create(draft);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.read(|records| records.cubes.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read<T>(&self, f: impl FnOnce(&Records) -> T) -> T {
        let guard = self.records.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Records) -> T) -> T {
        let mut guard = self.records.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Default for InMemoryCubeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeStore for InMemoryCubeStore {
    fn list(&self) -> Vec<Cube> {
        self.read(|records| records.cubes.values().cloned().collect())
    }

    fn get(&self, id: CubeId) -> Result<Cube, StoreError> {
        self.read(|records| records.cubes.get(&id).cloned())
            .ok_or(StoreError::NotFound(id))
    }

    fn create(&self, draft: CubeDraft) -> Cube {
        let cube = self.write(|records| {
            let id = records.next_id;
            records.next_id += 1;
            let cube = Cube::from_draft(id, draft);
            records.cubes.insert(id, cube.clone());
            cube
        });
        debug!(id = cube.id, "cube created");
        cube
    }

    fn update(&self, id: CubeId, draft: CubeDraft) -> Result<Cube, StoreError> {
        self.write(|records| {
            let cube = records.cubes.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            cube.apply(draft);
            Ok(cube.clone())
        })
    }

    fn delete(&self, id: CubeId) -> Result<Cube, StoreError> {
        self.write(|records| records.cubes.remove(&id))
            .ok_or(StoreError::NotFound(id))
    }

    fn clear_all(&self) -> usize {
        let removed = self.write(|records| {
            let removed = records.cubes.len();
            records.cubes.clear();
            removed
        });
        debug!(removed, "store cleared");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, width: f64) -> CubeDraft {
        CubeDraft {
            case_name: name.to_string(),
            width,
            height: 1.0,
            length: 1.0,
            mass: 2.0,
        }
    }

    #[test]
    fn create_assigns_increasing_ids() {
        let store = InMemoryCubeStore::new();
        let a = store.create(draft("A", 1.0));
        let b = store.create(draft("B", 2.0));
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn list_is_in_creation_order() {
        let store = InMemoryCubeStore::with_cubes([draft("A", 1.0), draft("B", 1.0), draft("C", 1.0)]);
        let names: Vec<String> = store.list().into_iter().map(|c| c.case_name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn get_and_update_existing_cube() {
        let store = InMemoryCubeStore::new();
        let created = store.create(draft("A", 1.0));

        let updated = store.update(created.id, draft("Renamed", 3.0)).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.case_name, "Renamed");
        assert_eq!(store.get(created.id).unwrap(), updated);
    }

    #[test]
    fn missing_ids_report_not_found() {
        let store = InMemoryCubeStore::new();
        assert_eq!(store.get(42), Err(StoreError::NotFound(42)));
        assert_eq!(store.update(42, draft("A", 1.0)), Err(StoreError::NotFound(42)));
        assert_eq!(store.delete(42), Err(StoreError::NotFound(42)));
    }

    #[test]
    fn delete_returns_removed_cube_and_ids_are_not_reused() {
        let store = InMemoryCubeStore::new();
        let first = store.create(draft("A", 1.0));
        let removed = store.delete(first.id).unwrap();
        assert_eq!(removed, first);
        assert!(store.is_empty());

        let next = store.create(draft("B", 1.0));
        assert_eq!(next.id, 2);
    }

    #[test]
    fn clear_all_returns_count() {
        let store = InMemoryCubeStore::with_cubes([draft("A", 1.0), draft("B", 1.0)]);
        assert_eq!(store.clear_all(), 2);
        assert_eq!(store.clear_all(), 0);
        assert!(store.list().is_empty());
        assert_eq!(store.create(draft("C", 1.0)).id, 3);
    }
}
