//! Records of conflicts the merge resolved on its own.

use crate::field::{Field, FieldValue};
use serde::{Deserialize, Serialize};
use vaultsync_types::{DeviceId, EntryId, Timestamp};

/// Which input of the merge a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Local,
    Remote,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Local => Side::Remote,
            Side::Remote => Side::Local,
        }
    }
}

/// What collided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConflictKind {
    /// Both sides changed `field` to different values.
    Field {
        field: Field,
        kept: FieldValue,
        discarded: FieldValue,
    },
    /// One side deleted the entry while the other edited it.
    DeleteEdit {
        deleted_at: Timestamp,
        edited_at: Timestamp,
        /// True if the edit won and brought the entry back.
        resurrected: bool,
    },
}

/// One automatically resolved conflict, kept for later review by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub entry_id: EntryId,
    pub kind: ConflictKind,
    /// Side whose value is in the merged vault.
    pub winner: Side,
    /// Device that wrote the kept value.
    pub kept_from: DeviceId,
    /// Device that wrote the discarded value.
    pub discarded_from: DeviceId,
}
