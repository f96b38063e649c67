//! In-process [`Store`] with Redis semantics, for tests and local runs.
//!
//! Expiry uses tokio's clock, so tests running with paused time can
//! advance past a TTL deterministically.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use super::Store;
use crate::error::{Error, Result};

#[derive(Debug)]
enum Entry {
    Value {
        value: String,
        expires_at: Option<Instant>,
    },
    List(VecDeque<String>),
    Set(BTreeSet<String>),
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self, Entry::Value { expires_at: Some(at), .. } if *at <= now)
    }
}

type Entries = HashMap<String, Entry>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<Entries>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the keyspace, dropping any expired values first.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired(now));
        entries
    }
}

fn wrong_type(key: &str, expected: &'static str) -> Error {
    Error::WrongType {
        key: key.to_string(),
        expected,
    }
}

fn list<'a>(entries: &'a Entries, key: &str) -> Result<Option<&'a VecDeque<String>>> {
    match entries.get(key) {
        None => Ok(None),
        Some(Entry::List(items)) => Ok(Some(items)),
        Some(_) => Err(wrong_type(key, "list")),
    }
}

fn list_mut<'a>(entries: &'a mut Entries, key: &str) -> Result<&'a mut VecDeque<String>> {
    match entries
        .entry(key.to_string())
        .or_insert_with(|| Entry::List(VecDeque::new()))
    {
        Entry::List(items) => Ok(items),
        _ => Err(wrong_type(key, "list")),
    }
}

fn set<'a>(entries: &'a Entries, key: &str) -> Result<Option<&'a BTreeSet<String>>> {
    match entries.get(key) {
        None => Ok(None),
        Some(Entry::Set(members)) => Ok(Some(members)),
        Some(_) => Err(wrong_type(key, "set")),
    }
}

/// Redis deletes a collection once it becomes empty.
fn drop_if_empty(entries: &mut Entries, key: &str) {
    let empty = match entries.get(key) {
        Some(Entry::List(items)) => items.is_empty(),
        Some(Entry::Set(members)) => members.is_empty(),
        _ => false,
    };
    if empty {
        entries.remove(key);
    }
}

impl Store for MemoryStore {
    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let entries = self.lock();
        Ok(set(&entries, key)?
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_to_set(&self, key: &str, member: &str) -> Result<()> {
        let mut entries = self.lock();
        match entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(BTreeSet::new()))
        {
            Entry::Set(members) => {
                members.insert(member.to_string());
                Ok(())
            }
            _ => Err(wrong_type(key, "set")),
        }
    }

    async fn remove_from_set(&self, key: &str, member: &str) -> Result<bool> {
        let mut entries = self.lock();
        let removed = match entries.get_mut(key) {
            None => false,
            Some(Entry::Set(members)) => members.remove(member),
            Some(_) => return Err(wrong_type(key, "set")),
        };
        drop_if_empty(&mut entries, key);
        Ok(removed)
    }

    async fn key_exists(&self, key: &str) -> Result<bool> {
        Ok(self.lock().contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.lock().get(key) {
            None => Ok(None),
            Some(Entry::Value { value, .. }) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key, "string")),
        }
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.lock().insert(
            key.to_string(),
            Entry::Value {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.lock().remove(key).is_some())
    }

    async fn push(&self, key: &str, value: &str) -> Result<usize> {
        let mut entries = self.lock();
        let items = list_mut(&mut entries, key)?;
        items.push_front(value.to_string());
        Ok(items.len())
    }

    async fn move_oldest(&self, source: &str, destination: &str) -> Result<Option<String>> {
        let mut entries = self.lock();
        // Type-check the destination before touching the source, as Redis does.
        if !matches!(entries.get(destination), None | Some(Entry::List(_))) {
            return Err(wrong_type(destination, "list"));
        }
        let value = match entries.get_mut(source) {
            None => return Ok(None),
            Some(Entry::List(items)) => items.pop_back(),
            Some(_) => return Err(wrong_type(source, "list")),
        };
        drop_if_empty(&mut entries, source);
        if let Some(ref value) = value {
            list_mut(&mut entries, destination)?.push_front(value.clone());
        }
        Ok(value)
    }

    async fn remove_from_list(&self, key: &str, value: &str) -> Result<usize> {
        let mut entries = self.lock();
        let removed = match entries.get_mut(key) {
            None => 0,
            Some(Entry::List(items)) => match items.iter().position(|item| item == value) {
                Some(index) => {
                    items.remove(index);
                    1
                }
                None => 0,
            },
            Some(_) => return Err(wrong_type(key, "list")),
        };
        drop_if_empty(&mut entries, key);
        Ok(removed)
    }

    async fn list_len(&self, key: &str) -> Result<usize> {
        let entries = self.lock();
        Ok(list(&entries, key)?.map_or(0, VecDeque::len))
    }

    async fn list_items(&self, key: &str) -> Result<Vec<String>> {
        let entries = self.lock();
        Ok(list(&entries, key)?
            .map(|items| items.iter().cloned().collect())
            .unwrap_or_default())
    }
}
