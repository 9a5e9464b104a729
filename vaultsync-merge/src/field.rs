//! Field-level view of an entry.
//!
//! Login fields live inside an optional [`Login`]; for merging they are
//! flattened so each one can be compared against the base independently.

use serde::{Deserialize, Serialize};
use std::fmt;
use vaultsync_vault::{Entry, EntryType, Login};

/// A field that is merged independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Type,
    Name,
    Username,
    Password,
    Urls,
    Note,
    Favorite,
}

impl Field {
    /// Every mergeable field, in the order conflicts are reported.
    pub const ALL: [Field; 7] = [
        Field::Type,
        Field::Name,
        Field::Username,
        Field::Password,
        Field::Urls,
        Field::Note,
        Field::Favorite,
    ];
}

/// The value of one [`Field`]. `None` means the entry has no login or no
/// note at all.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Type(EntryType),
    Text(Option<String>),
    /// Same as `Text`, but never printed.
    Secret(Option<String>),
    Urls(Option<Vec<String>>),
    Flag(bool),
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Type(t) => f.debug_tuple("Type").field(t).finish(),
            FieldValue::Text(t) => f.debug_tuple("Text").field(t).finish(),
            FieldValue::Secret(None) => f.write_str("Secret(None)"),
            FieldValue::Secret(Some(_)) => f.write_str("Secret([REDACTED])"),
            FieldValue::Urls(u) => f.debug_tuple("Urls").field(u).finish(),
            FieldValue::Flag(b) => f.debug_tuple("Flag").field(b).finish(),
        }
    }
}

/// Flattened, mergeable content of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fields {
    entry_type: EntryType,
    name: String,
    username: Option<String>,
    password: Option<String>,
    urls: Option<Vec<String>>,
    note: Option<String>,
    favorite: bool,
}

impl Fields {
    pub(crate) fn of(entry: &Entry) -> Self {
        let login = entry.login.as_ref();
        Self {
            entry_type: entry.entry_type,
            name: entry.name.clone(),
            username: login.map(|l| l.username.clone()),
            password: login.map(|l| l.password.clone()),
            urls: login.map(|l| l.urls.clone()),
            note: entry.note.clone(),
            favorite: entry.favorite,
        }
    }

    pub(crate) fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::Type => FieldValue::Type(self.entry_type),
            Field::Name => FieldValue::Text(Some(self.name.clone())),
            Field::Username => FieldValue::Text(self.username.clone()),
            Field::Password => FieldValue::Secret(self.password.clone()),
            Field::Urls => FieldValue::Urls(self.urls.clone()),
            Field::Note => FieldValue::Text(self.note.clone()),
            Field::Favorite => FieldValue::Flag(self.favorite),
        }
    }

    /// Stores `value` into `field`. Values always come from [`Fields::get`]
    /// of the same field, so mismatched variants cannot occur.
    pub(crate) fn set(&mut self, field: Field, value: FieldValue) {
        match (field, value) {
            (Field::Type, FieldValue::Type(t)) => self.entry_type = t,
            (Field::Name, FieldValue::Text(t)) => self.name = t.unwrap_or_default(),
            (Field::Username, FieldValue::Text(t)) => self.username = t,
            (Field::Password, FieldValue::Secret(t)) => self.password = t,
            (Field::Urls, FieldValue::Urls(u)) => self.urls = u,
            (Field::Note, FieldValue::Text(t)) => self.note = t,
            (Field::Favorite, FieldValue::Flag(b)) => self.favorite = b,
            _ => {}
        }
    }

    /// Writes the content back into `entry`. The login exists if any of its
    /// fields survived the merge.
    pub(crate) fn apply(self, entry: &mut Entry) {
        entry.entry_type = self.entry_type;
        entry.name = self.name;
        entry.note = self.note;
        entry.favorite = self.favorite;
        entry.login = if self.username.is_none() && self.password.is_none() && self.urls.is_none()
        {
            None
        } else {
            Some(Login {
                username: self.username.unwrap_or_default(),
                password: self.password.unwrap_or_default(),
                urls: self.urls.unwrap_or_default(),
            })
        };
    }
}
