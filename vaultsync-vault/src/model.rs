//! Vault entries and the vault aggregate.
//!
//! Entries are never physically removed by edits: deleting one sets
//! `deleted_at` and leaves a tombstone behind, so the deletion reaches other
//! devices on their next sync.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use vaultsync_types::{DeviceId, EntryId, Timestamp};

use crate::codec::SCHEMA_VERSION;

/// Kind of credential an entry stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Login,
    Note,
    Card,
    Identity,
}

/// Username, password and the sites they belong to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl Login {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            urls: Vec::new(),
        }
    }

    /// Adds an associated URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.urls.push(url.into());
        self
    }
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("urls", &self.urls)
            .finish()
    }
}

/// One credential or note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<Login>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
    /// Device that made the last edit.
    pub modified_by: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
}

impl Entry {
    /// Creates an entry of the given type with a fresh id.
    pub fn new(entry_type: EntryType, name: impl Into<String>, device: DeviceId) -> Self {
        let now = Timestamp::now();
        Self {
            id: EntryId::new(),
            entry_type,
            name: name.into(),
            login: None,
            note: None,
            favorite: false,
            created_at: now,
            modified_at: now,
            modified_by: device,
            deleted_at: None,
        }
    }

    /// Creates a login entry.
    pub fn new_login(name: impl Into<String>, login: Login, device: DeviceId) -> Self {
        let mut entry = Self::new(EntryType::Login, name, device);
        entry.login = Some(login);
        entry
    }

    /// Creates a secure note.
    pub fn new_note(name: impl Into<String>, text: impl Into<String>, device: DeviceId) -> Self {
        let mut entry = Self::new(EntryType::Note, name, device);
        entry.note = Some(text.into());
        entry
    }

    /// True if this entry is a tombstone.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Records an edit by `device`, advancing `modified_at` monotonically.
    pub fn touch(&mut self, device: DeviceId) {
        self.modified_at = Timestamp::after(self.modified_at);
        self.modified_by = device;
    }

    /// Turns the entry into a tombstone. Content is kept so a later
    /// resurrecting edit from another device has something to merge into.
    pub fn mark_deleted(&mut self, device: DeviceId) {
        self.touch(device);
        self.deleted_at = Some(self.modified_at);
    }

    /// Case-insensitive match against name, username, URLs and note.
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle);
        hit(self.name.as_str())
            || self.login.as_ref().is_some_and(|l| {
                hit(l.username.as_str()) || l.urls.iter().any(|u| hit(u.as_str()))
            })
            || self.note.as_deref().is_some_and(hit)
    }
}

/// The unit that is encrypted and synchronized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    /// Data format version; devices refuse to sync across versions.
    pub schema_version: u32,
    /// Incremented once per successful remote write.
    pub sync_version: u64,
    entries: BTreeMap<EntryId, Entry>,
}

impl Default for Vault {
    fn default() -> Self {
        Self::new()
    }
}

impl Vault {
    /// Creates an empty vault at the current schema version.
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            sync_version: 0,
            entries: BTreeMap::new(),
        }
    }

    /// Builds a vault from parts. Later duplicates replace earlier ones;
    /// use [`crate::deserialize`] when duplicates must be rejected.
    pub fn from_entries(
        schema_version: u32,
        sync_version: u64,
        entries: impl IntoIterator<Item = Entry>,
    ) -> Self {
        Self {
            schema_version,
            sync_version,
            entries: entries.into_iter().map(|e| (e.id, e)).collect(),
        }
    }

    /// Looks up an entry, tombstones included.
    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Inserts or replaces an entry.
    pub fn upsert(&mut self, entry: Entry) {
        self.entries.insert(entry.id, entry);
    }

    /// All entries in id order, tombstones included.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Entries that are not tombstoned.
    pub fn live_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values().filter(|e| !e.is_deleted())
    }

    /// All entry ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &EntryId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if both vaults hold exactly the same entries, ignoring version
    /// counters.
    pub fn same_entries(&self, other: &Vault) -> bool {
        self.entries == other.entries
    }

    /// Live entries whose name, username, URLs or note contain `query`,
    /// ignoring case. An empty query matches every live entry.
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        let needle = query.trim().to_lowercase();
        self.live_entries()
            .filter(|e| needle.is_empty() || e.matches(&needle))
            .collect()
    }
}
