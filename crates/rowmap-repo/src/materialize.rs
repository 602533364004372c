//! Read-path row materialization.
//!
//! Builds the ordered scan-target layout for an entity shape and relation
//! set (the same walk the introspector uses for projections) and turns
//! result rows back into typed entities.
//!
//! Materialization is two-path. When no requested relation is nullable, a
//! row's values decode directly. When at least one is, the row passes
//! through a nullable shadow first: every leaf beneath a nullable relation
//! scans as a null-capable variant of its scalar kind, and after the scan
//! SQL NULL resolves to the kind's zero value. Nullability is infectious:
//! an outer join with no match leaves the entire joined row unset, so every
//! descendant slot routes through the shadow.

use rowmap_core::descriptor::{EntityDescriptor, FieldDescriptor, ScalarKind};
use rowmap_core::error::{Error, TypeError};
use rowmap_core::{Entity, Result, Row, RowReader, Value};

/// One scan target of a materialized row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Column reference, matching the projection at the same position.
    pub column: String,
    /// Underlying scalar kind; decides the zero value for absent rows.
    pub kind: ScalarKind,
    /// Whether the slot lies beneath a nullable relation.
    pub nullable: bool,
}

/// Derive the ordered scan-target layout for an entity shape and relation
/// set.
///
/// Mirrors [`crate::projection::columns`] exactly: same walk, same order,
/// same relation handling.
#[must_use]
pub fn slots(desc: &EntityDescriptor, relations: &[&str]) -> Vec<Slot> {
    let mut out = Vec::new();
    walk(desc, None, relations, false, &mut out);
    out
}

fn walk(
    desc: &EntityDescriptor,
    prefix: Option<&str>,
    relations: &[&str],
    nullable: bool,
    out: &mut Vec<Slot>,
) {
    for field in desc.fields {
        match field {
            FieldDescriptor::Column(col) => {
                let column = match prefix {
                    Some(p) => format!("{p}.{}", col.column),
                    None => col.column.to_string(),
                };
                out.push(Slot {
                    column,
                    kind: col.kind,
                    nullable,
                });
            }
            FieldDescriptor::Embedded { shape } | FieldDescriptor::Inner { shape } => {
                walk(shape(), prefix, relations, nullable, out);
            }
            FieldDescriptor::Relation(rel) => {
                if relations.contains(&rel.name) {
                    walk(
                        (rel.shape)(),
                        Some(rel.name),
                        &[],
                        nullable || rel.nullable,
                        out,
                    );
                }
            }
        }
    }
}

/// Resolve a scanned row against its slot layout.
///
/// The shadow pass: a NULL in a slot beneath a nullable relation becomes
/// the slot kind's zero value; everything else passes through unchanged.
#[allow(clippy::result_large_err)]
fn resolve(row: &Row, slots: &[Slot]) -> Result<Vec<Value>> {
    if row.len() != slots.len() {
        return Err(Error::Type(TypeError {
            expected: "row matching scan layout",
            actual: format!("{} values for {} scan targets", row.len(), slots.len()),
            column: None,
        }));
    }

    Ok(row
        .values()
        .zip(slots)
        .map(|(value, slot)| {
            if slot.nullable && value.is_null() {
                slot.kind.zero_value()
            } else {
                value.clone()
            }
        })
        .collect())
}

/// Materialize one row into an entity.
#[allow(clippy::result_large_err)]
pub fn materialize<E: Entity>(row: &Row, relations: &[&str]) -> Result<E> {
    let desc = E::descriptor();
    let layout = slots(desc, relations);

    let values = if desc.has_nullable_relation(relations) {
        resolve(row, &layout)?
    } else {
        if row.len() != layout.len() {
            return Err(Error::Type(TypeError {
                expected: "row matching scan layout",
                actual: format!("{} values for {} scan targets", row.len(), layout.len()),
                column: None,
            }));
        }
        row.values().cloned().collect()
    };

    let mut reader = RowReader::new(&values, relations);
    let entity = E::from_reader(&mut reader)?;
    if reader.remaining() != 0 {
        return Err(Error::Type(TypeError {
            expected: "fully consumed row",
            actual: format!("{} values left unread", reader.remaining()),
            column: None,
        }));
    }

    Ok(entity)
}

/// Materialize a result set, preserving row order.
#[allow(clippy::result_large_err)]
pub fn materialize_rows<E: Entity>(rows: &[Row], relations: &[&str]) -> Result<Vec<E>> {
    rows.iter().map(|row| materialize(row, relations)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection;
    use rowmap_core::descriptor::{ColumnDescriptor, RelationDescriptor};

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Photo {
        id: i64,
        url: String,
    }

    static PHOTO_FIELDS: [FieldDescriptor; 2] = [
        FieldDescriptor::Column(ColumnDescriptor::new("id", ScalarKind::Int).primary_key()),
        FieldDescriptor::column("url", ScalarKind::Text),
    ];
    static PHOTO: EntityDescriptor = EntityDescriptor::new(&PHOTO_FIELDS);

    impl Entity for Photo {
        const TABLE: &'static str = "room_photos";
        const ALIAS: &'static str = "photo";

        fn descriptor() -> &'static EntityDescriptor {
            &PHOTO
        }

        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("id", Value::BigInt(self.id)),
                ("url", Value::Text(self.url.clone())),
            ]
        }

        fn from_reader(reader: &mut RowReader<'_>) -> Result<Self> {
            Ok(Self {
                id: reader.column()?,
                url: reader.column()?,
            })
        }

        fn primary_key(&self) -> Value {
            Value::BigInt(self.id)
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Room {
        id: i64,
        name: String,
        photo_id: Option<i64>,
        photo: Photo,
    }

    static ROOM_FIELDS: [FieldDescriptor; 4] = [
        FieldDescriptor::Column(ColumnDescriptor::new("id", ScalarKind::Int).primary_key()),
        FieldDescriptor::column("name", ScalarKind::Text),
        FieldDescriptor::column("photo_id", ScalarKind::Int),
        FieldDescriptor::Relation(
            RelationDescriptor::new("photo", "room_photos", || &PHOTO).nullable(),
        ),
    ];
    static ROOM: EntityDescriptor = EntityDescriptor::new(&ROOM_FIELDS);

    impl Entity for Room {
        const TABLE: &'static str = "rooms";
        const ALIAS: &'static str = "r";

        fn descriptor() -> &'static EntityDescriptor {
            &ROOM
        }

        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("id", Value::BigInt(self.id)),
                ("name", Value::Text(self.name.clone())),
                ("photo_id", self.photo_id.into()),
            ]
        }

        fn from_reader(reader: &mut RowReader<'_>) -> Result<Self> {
            Ok(Self {
                id: reader.column()?,
                name: reader.column()?,
                photo_id: reader.column()?,
                photo: reader
                    .relation("photo", Photo::from_reader)?
                    .unwrap_or_default(),
            })
        }

        fn primary_key(&self) -> Value {
            Value::BigInt(self.id)
        }
    }

    #[test]
    fn slot_order_mirrors_projection_order() {
        for relations in [&[][..], &["photo"][..]] {
            let cols = projection::columns(&ROOM, relations);
            let layout = slots(&ROOM, relations);
            assert_eq!(cols.len(), layout.len());
            for (col, slot) in cols.iter().zip(&layout) {
                assert_eq!(col, &slot.column);
            }
        }
    }

    #[test]
    fn nullability_is_infectious_below_nullable_relations() {
        let layout = slots(&ROOM, &["photo"]);
        let by_column: Vec<_> = layout
            .iter()
            .map(|s| (s.column.as_str(), s.nullable))
            .collect();
        assert_eq!(
            by_column,
            vec![
                ("id", false),
                ("name", false),
                ("photo_id", false),
                ("photo.id", true),
                ("photo.url", true),
            ]
        );
    }

    #[test]
    fn direct_path_without_relations() {
        let row = Row::positional(vec![
            Value::BigInt(5),
            Value::Text("Suite".to_string()),
            Value::Null,
        ]);
        let room: Room = materialize(&row, &[]).unwrap();
        assert_eq!(room.id, 5);
        assert_eq!(room.name, "Suite");
        assert_eq!(room.photo_id, None);
        assert_eq!(room.photo, Photo::default());
    }

    #[test]
    fn absent_outer_joined_relation_becomes_zero_value() {
        let row = Row::positional(vec![
            Value::BigInt(5),
            Value::Text("Suite".to_string()),
            Value::Null,
            Value::Null,
            Value::Null,
        ]);
        let room: Room = materialize(&row, &["photo"]).unwrap();
        assert_eq!(room.id, 5);
        assert_eq!(room.photo, Photo::default());
    }

    #[test]
    fn present_outer_joined_relation_decodes_natively() {
        let row = Row::positional(vec![
            Value::BigInt(5),
            Value::Text("Suite".to_string()),
            Value::BigInt(9),
            Value::BigInt(9),
            Value::Text("a.jpg".to_string()),
        ]);
        let room: Room = materialize(&row, &["photo"]).unwrap();
        assert_eq!(room.photo_id, Some(9));
        assert_eq!(
            room.photo,
            Photo {
                id: 9,
                url: "a.jpg".to_string()
            }
        );
    }

    #[test]
    fn shadow_leaves_own_nullable_columns_alone() {
        // photo_id is outside the nullable span; NULL there stays NULL
        let row = Row::positional(vec![
            Value::BigInt(5),
            Value::Text("Suite".to_string()),
            Value::Null,
            Value::BigInt(9),
            Value::Text("a.jpg".to_string()),
        ]);
        let room: Room = materialize(&row, &["photo"]).unwrap();
        assert_eq!(room.photo_id, None);
        assert_eq!(room.photo.id, 9);
    }

    #[test]
    fn row_length_mismatch_is_type_error() {
        let row = Row::positional(vec![Value::BigInt(5)]);
        let err = materialize::<Room>(&row, &[]).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn round_trip_through_extracted_values() {
        let original = Room {
            id: 7,
            name: "Loft".to_string(),
            photo_id: Some(3),
            photo: Photo::default(),
        };

        // populate a row from the entity's own values in projection order
        let values: Vec<Value> = original.to_row().into_iter().map(|(_, v)| v).collect();
        let row = Row::positional(values);
        let rebuilt: Room = materialize(&row, &[]).unwrap();
        assert_eq!(rebuilt, original);
    }
}
