//! Column projection derived from entity descriptors.
//!
//! The introspector walks declared fields in order and emits the column
//! references a query should select. The materializer walks the same tree
//! with the same rules, which is what guarantees that projection order and
//! scan-target order never diverge.

use rowmap_core::descriptor::{EntityDescriptor, FieldDescriptor};

/// Derive the ordered column projection for an entity shape and a set of
/// requested relations.
///
/// Relation columns are spliced in place at the relation field's position
/// and prefixed with the relation name; relations not requested contribute
/// nothing. A zero-field entity yields an empty projection.
#[must_use]
pub fn columns(desc: &EntityDescriptor, relations: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    walk(desc, None, relations, &mut out);
    out
}

/// Like [`columns`], with every top-level column qualified as
/// `prefix.column`.
///
/// The prefix applies once, at the top level; relation sub-walks prefix
/// with the relation name themselves, so prefixes never stack.
#[must_use]
pub fn columns_with_prefix(desc: &EntityDescriptor, prefix: &str, relations: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    walk(desc, Some(prefix), relations, &mut out);
    out
}

fn walk(
    desc: &EntityDescriptor,
    prefix: Option<&str>,
    relations: &[&str],
    out: &mut Vec<String>,
) {
    for field in desc.fields {
        match field {
            FieldDescriptor::Column(col) => match prefix {
                Some(p) => out.push(format!("{p}.{}", col.column)),
                None => out.push(col.column.to_string()),
            },
            FieldDescriptor::Embedded { shape } | FieldDescriptor::Inner { shape } => {
                walk(shape(), prefix, relations, out);
            }
            FieldDescriptor::Relation(rel) => {
                if relations.contains(&rel.name) {
                    // only top-level relations expand; nested walks see none
                    walk((rel.shape)(), Some(rel.name), &[], out);
                }
            }
        }
    }
}
