// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! Owner-scoped todo record store.
//!
//! All read and write operations are scoped by the owning user id (the
//! verified token's subject claim); a caller can never observe or mutate
//! another user's items through this interface. The only exceptions are
//! [`TodoStore::completed`] and [`TodoStore::remove_many`], which exist
//! for the cleanup sweep and operate across owners.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::models::{CreateTodoRequest, Todo};

#[derive(Default)]
pub struct TodoStore {
    todos: BTreeMap<i64, Todo>,
    next_id: i64,
}

impl TodoStore {
    pub fn new() -> Self {
        Self {
            todos: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new item owned by `user_id` and return it.
    pub fn insert(&mut self, user_id: &str, request: CreateTodoRequest) -> Todo {
        let id = self.next_id;
        self.next_id += 1;

        let todo = Todo {
            id,
            title: request.title,
            description: request.description,
            due_date: request.due_date,
            completed: false,
            image_key: request.image_key,
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        self.todos.insert(id, todo.clone());
        todo
    }

    /// List `user_id`'s items, newest first.
    pub fn list(&self, user_id: &str) -> Vec<Todo> {
        self.todos
            .values()
            .rev()
            .filter(|todo| todo.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Fetch a single item, if it exists and belongs to `user_id`.
    pub fn get(&self, user_id: &str, id: i64) -> Option<Todo> {
        self.todos
            .get(&id)
            .filter(|todo| todo.user_id == user_id)
            .cloned()
    }

    /// Update the completion flag of an owned item.
    pub fn set_completed(&mut self, user_id: &str, id: i64, completed: bool) -> Option<Todo> {
        let todo = self
            .todos
            .get_mut(&id)
            .filter(|todo| todo.user_id == user_id)?;
        todo.completed = completed;
        Some(todo.clone())
    }

    /// All completed items across owners, for the cleanup sweep.
    pub fn completed(&self) -> Vec<Todo> {
        self.todos
            .values()
            .filter(|todo| todo.completed)
            .cloned()
            .collect()
    }

    /// Remove items by id, returning how many were actually present.
    pub fn remove_many(&mut self, ids: &[i64]) -> usize {
        ids.iter()
            .filter(|id| self.todos.remove(id).is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str) -> CreateTodoRequest {
        CreateTodoRequest {
            title: title.to_string(),
            description: None,
            due_date: None,
            image_key: None,
        }
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let mut store = TodoStore::new();
        let first = store.insert("user-a", request("one"));
        let second = store.insert("user-a", request("two"));
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(!first.completed);
    }

    #[test]
    fn list_is_owner_scoped_and_newest_first() {
        let mut store = TodoStore::new();
        store.insert("user-a", request("one"));
        store.insert("user-b", request("foreign"));
        store.insert("user-a", request("two"));

        let listed = store.list("user-a");
        let titles: Vec<&str> = listed.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["two", "one"]);
    }

    #[test]
    fn get_refuses_foreign_items() {
        let mut store = TodoStore::new();
        let todo = store.insert("user-a", request("mine"));
        assert!(store.get("user-a", todo.id).is_some());
        assert!(store.get("user-b", todo.id).is_none());
        assert!(store.get("user-a", 999).is_none());
    }

    #[test]
    fn set_completed_updates_only_owned_items() {
        let mut store = TodoStore::new();
        let todo = store.insert("user-a", request("mine"));

        assert!(store.set_completed("user-b", todo.id, true).is_none());
        assert!(!store.get("user-a", todo.id).unwrap().completed);

        let updated = store.set_completed("user-a", todo.id, true).unwrap();
        assert!(updated.completed);
    }

    #[test]
    fn completed_and_remove_many_span_owners() {
        let mut store = TodoStore::new();
        let a = store.insert("user-a", request("a"));
        let b = store.insert("user-b", request("b"));
        store.insert("user-a", request("open"));
        store.set_completed("user-a", a.id, true);
        store.set_completed("user-b", b.id, true);

        let done = store.completed();
        assert_eq!(done.len(), 2);

        let ids: Vec<i64> = done.iter().map(|t| t.id).collect();
        assert_eq!(store.remove_many(&ids), 2);
        // Removing again is a no-op.
        assert_eq!(store.remove_many(&ids), 0);
        assert_eq!(store.list("user-a").len(), 1);
    }
}
