//! Three-way merge of vault snapshots.
//!
//! Given the last synced snapshot (`base`) and two copies edited
//! independently from it (`local`, `remote`), [`merge`] produces one vault
//! that keeps every non-conflicting change from both sides.
//!
//! Resolution works per entry, then per field:
//! - an entry changed on one side only is taken from that side
//! - an entry changed on both sides is merged field by field
//! - a field changed to different values on both sides is a hard conflict,
//!   won by the later `modified_at`, then by the greater device id
//! - a deletion racing an edit is won by the edit only if the edit is
//!   strictly later than the deletion
//!
//! The merge is a pure function. It never fails and never blocks on a
//! conflict: losing values are returned as [`ConflictRecord`]s next to a
//! fully resolved vault.
//!
//! Properties:
//! - **Idempotent**: `merge(b, l, l) == l` and `merge(b, l, b) == l`
//! - **Commutative on disjoint edits**: `merge(b, l, r) == merge(b, r, l)`

mod conflict;
mod field;
mod merge;

pub use conflict::{ConflictKind, ConflictRecord, Side};
pub use field::{Field, FieldValue};
pub use merge::{merge, MergeResult};
