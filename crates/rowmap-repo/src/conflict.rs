//! Conflict-based multi-row update.
//!
//! The store has no multi-row positional UPDATE, so batch update is an
//! insert with conflict resolution: the conflict target is the primary key
//! (or a column marked as the conflict target for natural-key upserts), and
//! on conflict every other column takes the value proposed in the incoming
//! row, except `created_at` (never touched) and `updated_at` (forced to
//! now).

use rowmap_core::descriptor::{ColumnDescriptor, EntityDescriptor, FieldDescriptor};
use rowmap_core::{Entity, Error, Result, Value};
use rowmap_query::{ConflictValue, OnConflict};

fn collect_columns(desc: &EntityDescriptor, out: &mut Vec<&'static ColumnDescriptor>) {
    for field in desc.fields {
        match field {
            FieldDescriptor::Column(col) => out.push(col),
            FieldDescriptor::Embedded { shape } | FieldDescriptor::Inner { shape } => {
                collect_columns(shape(), out);
            }
            FieldDescriptor::Relation(_) => {}
        }
    }
}

/// Build the conflict clause for a batch update of the given shape.
///
/// Errors when the descriptor declares neither a primary key nor a conflict
/// target, so there is nothing to upsert against.
#[allow(clippy::result_large_err)]
pub fn build_conflict_update(table: &str, desc: &EntityDescriptor) -> Result<OnConflict> {
    let mut columns = Vec::new();
    collect_columns(desc, &mut columns);

    let mut primary_key = None;
    let mut conflict_target = None;
    let mut assignments = Vec::new();

    for col in columns {
        if col.primary_key {
            primary_key = Some(col.column);
            continue;
        }
        if col.conflict_target {
            conflict_target = Some(col.column);
            continue;
        }
        if col.column == "created_at" {
            continue;
        }
        if col.column == "updated_at" {
            assignments.push((col.column.to_string(), ConflictValue::Bind(Value::now())));
            continue;
        }
        assignments.push((col.column.to_string(), ConflictValue::Excluded));
    }

    let target = conflict_target.or(primary_key).ok_or_else(|| {
        Error::build(table, "no primary key or conflict target for batch update")
    })?;

    Ok(OnConflict {
        target: target.to_string(),
        assignments,
    })
}

/// Drop batch rows that repeat an earlier row's primary key.
///
/// First occurrence wins; a conflict-resolution statement cannot touch the
/// same key twice, so duplicates are dropped with a diagnostic warning.
pub fn dedup_by_primary_key<E: Entity>(entities: &[E]) -> Vec<&E> {
    let mut seen: Vec<Value> = Vec::with_capacity(entities.len());
    let mut kept = Vec::with_capacity(entities.len());

    for entity in entities {
        let key = entity.primary_key();
        if seen.contains(&key) {
            tracing::warn!(
                table = E::TABLE,
                key = ?key,
                "duplicate primary key in batch update, dropping row"
            );
            continue;
        }
        seen.push(key);
        kept.push(entity);
    }

    kept
}
