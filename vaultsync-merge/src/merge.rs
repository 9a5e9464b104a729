//! The three-way merge.

use crate::conflict::{ConflictKind, ConflictRecord, Side};
use crate::field::{Field, Fields};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use vaultsync_types::EntryId;
use vaultsync_vault::{Entry, Vault};

/// Output of [`merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// The fully resolved vault. Its `sync_version` is the larger of the
    /// two inputs; assigning the next version is up to the caller.
    pub vault: Vault,
    /// Conflicts resolved by tie-break, in entry id then field order.
    pub conflicts: Vec<ConflictRecord>,
}

/// Merges `local` and `remote`, both descended from `base`.
pub fn merge(base: &Vault, local: &Vault, remote: &Vault) -> MergeResult {
    let ids: BTreeSet<EntryId> = base
        .ids()
        .chain(local.ids())
        .chain(remote.ids())
        .copied()
        .collect();

    let mut vault = Vault::from_entries(
        local.schema_version,
        local.sync_version.max(remote.sync_version),
        std::iter::empty(),
    );
    let mut conflicts = Vec::new();

    for id in ids {
        let merged = merge_entry(base.get(&id), local.get(&id), remote.get(&id), &mut conflicts);
        if let Some(entry) = merged {
            vault.upsert(entry);
        }
    }

    MergeResult { vault, conflicts }
}

fn merge_entry(
    base: Option<&Entry>,
    local: Option<&Entry>,
    remote: Option<&Entry>,
    conflicts: &mut Vec<ConflictRecord>,
) -> Option<Entry> {
    match (base, local, remote) {
        (_, Some(l), Some(r)) if l == r => Some(l.clone()),
        (_, None, None) => None,

        // Created on one side only.
        (None, Some(only), None) | (None, None, Some(only)) => Some(only.clone()),

        // Gone from one side (compacted there). Keep the other side only if
        // it still has something to say.
        (Some(b), Some(kept), None) | (Some(b), None, Some(kept)) => {
            (kept != b).then(|| kept.clone())
        }

        (Some(b), Some(l), Some(r)) if l == b => Some(r.clone()),
        (Some(b), Some(l), Some(r)) if r == b => Some(l.clone()),

        (base, Some(l), Some(r)) => Some(merge_diverged(base, l, r, conflicts)),
    }
}

/// Both sides changed the entry (or created the same id independently).
fn merge_diverged(
    base: Option<&Entry>,
    local: &Entry,
    remote: &Entry,
    conflicts: &mut Vec<ConflictRecord>,
) -> Entry {
    let base_live = base.is_some_and(|b| !b.is_deleted());
    let local_deleted = base_live && local.is_deleted();
    let remote_deleted = base_live && remote.is_deleted();

    match (local_deleted, remote_deleted) {
        (true, false) => delete_vs_edit(local, Side::Local, remote, conflicts),
        (false, true) => delete_vs_edit(remote, Side::Remote, local, conflicts),
        (true, true) => match precedence(local, remote) {
            Side::Local => local.clone(),
            Side::Remote => remote.clone(),
        },
        (false, false) => merge_fields(base, local, remote, conflicts),
    }
}

/// A tombstone on one side against an edit on the other. The edit wins only
/// if it is strictly later than the deletion.
fn delete_vs_edit(
    tombstone: &Entry,
    tombstone_side: Side,
    edit: &Entry,
    conflicts: &mut Vec<ConflictRecord>,
) -> Entry {
    let deleted_at = tombstone.deleted_at.unwrap_or(tombstone.modified_at);
    let resurrected = edit.modified_at > deleted_at;
    let (kept, discarded, winner) = if resurrected {
        (edit, tombstone, tombstone_side.other())
    } else {
        (tombstone, edit, tombstone_side)
    };

    conflicts.push(ConflictRecord {
        entry_id: tombstone.id,
        kind: ConflictKind::DeleteEdit {
            deleted_at,
            edited_at: edit.modified_at,
            resurrected,
        },
        winner,
        kept_from: kept.modified_by,
        discarded_from: discarded.modified_by,
    });

    kept.clone()
}

/// Field-by-field merge. A field that diverged on one side takes that side;
/// one that diverged on both to different values goes to the entry that
/// wins [`precedence`].
fn merge_fields(
    base: Option<&Entry>,
    local: &Entry,
    remote: &Entry,
    conflicts: &mut Vec<ConflictRecord>,
) -> Entry {
    let winner = precedence(local, remote);
    let (win_entry, lose_entry) = match winner {
        Side::Local => (local, remote),
        Side::Remote => (remote, local),
    };

    let base_fields = base.map(Fields::of);
    let local_fields = Fields::of(local);
    let remote_fields = Fields::of(remote);
    let mut merged = Fields::of(win_entry);

    for field in Field::ALL {
        let l = local_fields.get(field);
        let r = remote_fields.get(field);
        if l == r {
            merged.set(field, l);
            continue;
        }
        let b = base_fields.as_ref().map(|f| f.get(field));
        if b.as_ref() == Some(&l) {
            merged.set(field, r);
        } else if b.as_ref() == Some(&r) {
            merged.set(field, l);
        } else {
            let (kept, discarded) = match winner {
                Side::Local => (l, r),
                Side::Remote => (r, l),
            };
            merged.set(field, kept.clone());
            conflicts.push(ConflictRecord {
                entry_id: local.id,
                kind: ConflictKind::Field {
                    field,
                    kept,
                    discarded,
                },
                winner,
                kept_from: win_entry.modified_by,
                discarded_from: lose_entry.modified_by,
            });
        }
    }

    let mut entry = win_entry.clone();
    merged.apply(&mut entry);
    entry.created_at = local.created_at.min(remote.created_at);
    entry.modified_at = local.modified_at.max(remote.modified_at);
    entry.deleted_at = match base.map(|b| b.deleted_at) {
        Some(b) if local.deleted_at == b => remote.deleted_at,
        Some(b) if remote.deleted_at == b => local.deleted_at,
        _ => win_entry.deleted_at,
    };
    entry
}

/// Total order between two versions of an entry: later `modified_at` wins,
/// then the greater device id, then the greater encoded content so that
/// the choice never depends on argument order.
fn precedence(local: &Entry, remote: &Entry) -> Side {
    let ordering = local
        .modified_at
        .cmp(&remote.modified_at)
        .then_with(|| local.modified_by.cmp(&remote.modified_by))
        .then_with(|| content_order(local, remote));
    match ordering {
        Ordering::Less => Side::Remote,
        _ => Side::Local,
    }
}

fn content_order(a: &Entry, b: &Entry) -> Ordering {
    let encode = |e: &Entry| serde_json::to_vec(e).unwrap_or_default();
    encode(a).cmp(&encode(b))
}
