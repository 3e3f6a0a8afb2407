//! Concurrency-safe in-memory todo store.
//!
//! # Design
//! One `RwLock` guards the id map together with the insertion counter, so a
//! record and its position in the listing order are always written in the
//! same critical section. `list` and `get` take the lock shared; `create`,
//! `update` and `delete` take it exclusively. No operation awaits or calls
//! out while holding the lock.
//!
//! Listing order is `(created_at, seq)` where `seq` is a per-store insertion
//! counter, so two records stamped with the same instant still list in the
//! order they were created.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::types::{Todo, UpdateTodo};

#[derive(Debug)]
struct Entry {
    seq: u64,
    todo: Todo,
}

#[derive(Debug, Default)]
struct Inner {
    todos: HashMap<Uuid, Entry>,
    next_seq: u64,
}

/// In-memory collection of todos shared between request handlers.
///
/// Construct one per process (or per test) and hand it to whoever needs it,
/// typically behind an `Arc`.
pub struct TodoStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }

    /// Insert a new, not yet completed todo and return a copy of it.
    pub fn create(&self, title: impl Into<String>) -> Todo {
        let mut inner = self.write();
        let mut id = Uuid::new_v4();
        while inner.todos.contains_key(&id) {
            id = Uuid::new_v4();
        }
        let todo = Todo {
            id,
            title: title.into(),
            completed: false,
            created_at: self.clock.now(),
        };
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.todos.insert(
            id,
            Entry {
                seq,
                todo: todo.clone(),
            },
        );
        debug!(%id, "todo created");
        todo
    }

    /// Snapshot of every todo, oldest first.
    pub fn list(&self) -> Vec<Todo> {
        let mut entries: Vec<(u64, Todo)> = {
            let inner = self.read();
            inner
                .todos
                .values()
                .map(|entry| (entry.seq, entry.todo.clone()))
                .collect()
        };
        entries.sort_by(|(a_seq, a), (b_seq, b)| {
            a.created_at.cmp(&b.created_at).then(a_seq.cmp(b_seq))
        });
        entries.into_iter().map(|(_, todo)| todo).collect()
    }

    pub fn get(&self, id: Uuid) -> Option<Todo> {
        self.read().todos.get(&id).map(|entry| entry.todo.clone())
    }

    /// Merge the provided fields into an existing todo.
    ///
    /// Returns `None` if no todo has this id. An empty patch is a no-op that
    /// still returns the current record.
    pub fn update(&self, id: Uuid, patch: UpdateTodo) -> Option<Todo> {
        let mut inner = self.write();
        let entry = inner.todos.get_mut(&id)?;
        patch.apply(&mut entry.todo);
        debug!(%id, completed = entry.todo.completed, "todo updated");
        Some(entry.todo.clone())
    }

    /// Remove a todo. Returns whether it existed.
    pub fn delete(&self, id: Uuid) -> bool {
        let removed = self.write().todos.remove(&id).is_some();
        if removed {
            debug!(%id, "todo deleted");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.read().todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Every mutation is a single map call, so a panic elsewhere while the
    // lock was held cannot leave the map half-written.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TodoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoStore").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::clock::FixedClock;

    fn completed(value: bool) -> UpdateTodo {
        UpdateTodo {
            title: None,
            completed: Some(value),
        }
    }

    fn titled(title: &str) -> UpdateTodo {
        UpdateTodo {
            title: Some(title.to_string()),
            completed: None,
        }
    }

    fn fixed_store(at: DateTime<Utc>) -> TodoStore {
        TodoStore::with_clock(Arc::new(FixedClock(at)))
    }

    #[test]
    fn create_defaults_completed_to_false() {
        let store = TodoStore::new();
        let todo = store.create("Buy milk");
        assert_eq!(todo.title, "Buy milk");
        assert!(!todo.completed);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_stamps_created_at_from_clock() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let store = fixed_store(at);
        assert_eq!(store.create("Stamped").created_at, at);
    }

    #[test]
    fn get_returns_created_record() {
        let store = TodoStore::new();
        let created = store.create("Round trip");
        let fetched = store.get(created.id).unwrap();
        assert_eq!(fetched, created);
        assert!(!fetched.completed);
    }

    #[test]
    fn get_missing_is_none() {
        let store = TodoStore::new();
        assert!(store.get(Uuid::nil()).is_none());
    }

    #[test]
    fn ids_are_unique() {
        let store = TodoStore::new();
        let ids: std::collections::HashSet<Uuid> =
            (0..500).map(|i| store.create(format!("todo {i}")).id).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn update_completed_leaves_title() {
        let store = TodoStore::new();
        let todo = store.create("Walk dog");
        let updated = store.update(todo.id, completed(true)).unwrap();
        assert_eq!(updated.title, "Walk dog");
        assert!(updated.completed);
    }

    #[test]
    fn update_title_leaves_completed() {
        let store = TodoStore::new();
        let todo = store.create("Walk dog");
        store.update(todo.id, completed(true)).unwrap();
        let updated = store.update(todo.id, titled("Walk cat")).unwrap();
        assert_eq!(updated.title, "Walk cat");
        assert!(updated.completed);
        assert_eq!(store.get(todo.id).unwrap(), updated);
    }

    #[test]
    fn update_never_changes_id_or_created_at() {
        let store = TodoStore::new();
        let todo = store.create("Stable");
        let updated = store
            .update(
                todo.id,
                UpdateTodo {
                    title: Some("Changed".to_string()),
                    completed: Some(true),
                },
            )
            .unwrap();
        assert_eq!(updated.id, todo.id);
        assert_eq!(updated.created_at, todo.created_at);
    }

    #[test]
    fn update_missing_leaves_store_unchanged() {
        let store = TodoStore::new();
        let todo = store.create("Untouched");
        assert!(store.update(Uuid::new_v4(), completed(true)).is_none());
        assert_eq!(store.list(), vec![todo]);
    }

    #[test]
    fn delete_reports_whether_removed() {
        let store = TodoStore::new();
        let todo = store.create("Remove me");
        assert!(store.delete(todo.id));
        assert!(!store.delete(todo.id));
        assert!(!store.delete(todo.id));
        assert!(store.get(todo.id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn delete_missing_is_always_false() {
        let store = TodoStore::new();
        for _ in 0..3 {
            assert!(!store.delete(Uuid::nil()));
        }
    }

    #[test]
    fn list_is_a_snapshot() {
        let store = TodoStore::new();
        let first = store.create("First");
        let snapshot = store.list();

        store.update(first.id, completed(true)).unwrap();
        store.create("Second");
        store.delete(first.id);

        assert_eq!(snapshot, vec![first]);
    }

    /// Hands out pre-set instants in order, repeating the last one.
    struct ScriptedClock(std::sync::Mutex<Vec<DateTime<Utc>>>);

    impl Clock for ScriptedClock {
        fn now(&self) -> DateTime<Utc> {
            let mut instants = self.0.lock().unwrap();
            if instants.len() > 1 {
                instants.remove(0)
            } else {
                instants[0]
            }
        }
    }

    #[test]
    fn list_orders_by_created_at_before_insertion() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let clock = ScriptedClock(std::sync::Mutex::new(vec![late, early]));
        let store = TodoStore::with_clock(Arc::new(clock));

        store.create("inserted first, stamped late");
        store.create("inserted second, stamped early");

        let titles: Vec<String> = store.list().into_iter().map(|t| t.title).collect();
        assert_eq!(
            titles,
            vec!["inserted second, stamped early", "inserted first, stamped late"]
        );
    }

    #[test]
    fn timestamp_ties_list_in_insertion_order() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let store = fixed_store(at);
        let titles: Vec<String> = (0..50).map(|i| format!("todo {i}")).collect();
        for title in &titles {
            store.create(title.clone());
        }

        let listed: Vec<String> = store.list().into_iter().map(|t| t.title).collect();
        assert_eq!(listed, titles);
    }

    #[test]
    fn repeated_lists_agree() {
        let store = TodoStore::new();
        for i in 0..20 {
            store.create(format!("todo {i}"));
        }
        let first = store.list();
        for _ in 0..5 {
            assert_eq!(store.list(), first);
        }
    }

    #[test]
    fn delete_keeps_relative_order_of_the_rest() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let store = fixed_store(at);
        let a = store.create("a");
        let b = store.create("b");
        let c = store.create("c");
        store.delete(b.id);
        let ids: Vec<Uuid> = store.list().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[test]
    fn write_tests_scenario() {
        let store = TodoStore::new();
        let todo = store.create("Write tests");
        assert!(!todo.completed);

        let listed = store.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, todo.id);

        let updated = store.update(todo.id, completed(true)).unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, "Write tests");

        assert!(store.delete(todo.id));
        assert!(!store.delete(todo.id));
        assert!(store.get(todo.id).is_none());
    }
}
