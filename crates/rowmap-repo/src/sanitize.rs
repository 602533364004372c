//! Write-path row sanitization.
//!
//! Turns an entity into an insert/update payload: the primary key is pulled
//! out separately, skip lists keep immutable columns out of updates, and
//! timestamp defaults stamp `created_at`/`updated_at` with the current time.

use rowmap_core::{Entity, Value};

/// An ordered column/value payload for a write statement.
///
/// Order is declaration order, so every row of a batch produces the same
/// column set in the same sequence.
#[derive(Debug, Clone, Default)]
pub struct RowValues {
    entries: Vec<(&'static str, Value)>,
}

impl RowValues {
    /// Create an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column value.
    pub fn push(&mut self, column: &'static str, value: Value) {
        self.entries.push((column, value));
    }

    /// Replace a column's value if present, otherwise append it.
    pub fn set(&mut self, column: &'static str, value: Value) {
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Whether the payload contains the column.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.entries.iter().any(|(c, _)| *c == column)
    }

    /// Get a column's value.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.entries.iter().map(|(c, _)| (*c).to_string()).collect()
    }

    /// Values in column order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Ordered `(column, value)` pairs with owned column names.
    #[must_use]
    pub fn assignments(&self) -> Vec<(String, Value)> {
        self.entries
            .iter()
            .map(|(c, v)| ((*c).to_string(), v.clone()))
            .collect()
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Options applied while extracting a write payload.
#[derive(Debug, Clone, Default)]
pub struct SanitizeOptions {
    skip: Vec<&'static str>,
    defaults: Vec<&'static str>,
}

impl SanitizeOptions {
    /// No skips, no defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the named columns from the payload entirely.
    #[must_use]
    pub fn skip_fields(mut self, fields: &[&'static str]) -> Self {
        self.skip.extend_from_slice(fields);
        self
    }

    /// Overwrite the named columns, when present, with the current time.
    #[must_use]
    pub fn default_timestamps(mut self, fields: &[&'static str]) -> Self {
        self.defaults.extend_from_slice(fields);
        self
    }

    /// Insert preset: stamp `created_at` and `updated_at`.
    #[must_use]
    pub fn for_insert() -> Self {
        Self::new().default_timestamps(&["created_at", "updated_at"])
    }

    /// Update preset: keep `created_at` immutable, stamp `updated_at`.
    #[must_use]
    pub fn for_update() -> Self {
        Self::new()
            .skip_fields(&["created_at"])
            .default_timestamps(&["updated_at"])
    }

    /// Batch-update preset: stamp `updated_at` only, keep `created_at` so
    /// every row of the batch carries a uniform column set.
    #[must_use]
    pub fn for_update_multiple() -> Self {
        Self::new().default_timestamps(&["updated_at"])
    }
}

/// Extract the primary key and write payload from an entity.
///
/// The primary-key column is excluded from the payload unless it is marked
/// not-serial, in which case the caller-supplied key is written. Inner
/// structs flatten into the same payload through `Entity::to_row`, and the
/// inner primary key propagates up through the descriptor.
pub fn extract_row<E: Entity>(entity: &E, options: &SanitizeOptions) -> (Value, RowValues) {
    let desc = E::descriptor();
    let pk = desc.primary_key();

    let mut key = Value::Null;
    let mut rows = RowValues::new();

    for (column, value) in entity.to_row() {
        if let Some(pk) = pk {
            if column == pk.column {
                key = value.clone();
                if !pk.not_serial {
                    continue;
                }
            }
        }

        if options.skip.contains(&column) {
            continue;
        }

        rows.push(column, value);
    }

    for &ts in &options.defaults {
        if rows.contains(ts) {
            rows.set(ts, Value::now());
        }
    }

    (key, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_core::descriptor::{
        ColumnDescriptor, EntityDescriptor, FieldDescriptor, ScalarKind,
    };
    use rowmap_core::{Result, RowReader};

    struct Room {
        id: i64,
        name: String,
        created_at: i64,
        updated_at: i64,
    }

    static ROOM_FIELDS: [FieldDescriptor; 4] = [
        FieldDescriptor::Column(ColumnDescriptor::new("id", ScalarKind::Int).primary_key()),
        FieldDescriptor::column("name", ScalarKind::Text),
        FieldDescriptor::column("created_at", ScalarKind::Timestamp),
        FieldDescriptor::column("updated_at", ScalarKind::Timestamp),
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
                ("created_at", Value::Timestamp(self.created_at)),
                ("updated_at", Value::Timestamp(self.updated_at)),
            ]
        }

        fn from_reader(reader: &mut RowReader<'_>) -> Result<Self> {
            Ok(Self {
                id: reader.column()?,
                name: reader.column()?,
                created_at: reader.column()?,
                updated_at: reader.column()?,
            })
        }

        fn primary_key(&self) -> Value {
            Value::BigInt(self.id)
        }
    }

    struct Tag {
        code: String,
        label: String,
    }

    static TAG_FIELDS: [FieldDescriptor; 2] = [
        FieldDescriptor::Column(
            ColumnDescriptor::new("code", ScalarKind::Text)
                .primary_key()
                .not_serial(),
        ),
        FieldDescriptor::column("label", ScalarKind::Text),
    ];
    static TAG: EntityDescriptor = EntityDescriptor::new(&TAG_FIELDS);

    impl Entity for Tag {
        const TABLE: &'static str = "tags";
        const ALIAS: &'static str = "t";

        fn descriptor() -> &'static EntityDescriptor {
            &TAG
        }

        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("code", Value::Text(self.code.clone())),
                ("label", Value::Text(self.label.clone())),
            ]
        }

        fn from_reader(reader: &mut RowReader<'_>) -> Result<Self> {
            Ok(Self {
                code: reader.column()?,
                label: reader.column()?,
            })
        }

        fn primary_key(&self) -> Value {
            Value::Text(self.code.clone())
        }
    }

    fn room() -> Room {
        Room {
            id: 1,
            name: "Suite".to_string(),
            created_at: 100,
            updated_at: 100,
        }
    }

    #[test]
    fn insert_excludes_serial_primary_key() {
        let (key, rows) = extract_row(&room(), &SanitizeOptions::for_insert());
        assert_eq!(key, Value::BigInt(1));
        assert!(!rows.contains("id"));
        assert_eq!(rows.columns(), vec!["name", "created_at", "updated_at"]);
    }

    #[test]
    fn insert_stamps_both_timestamps() {
        let (_, rows) = extract_row(&room(), &SanitizeOptions::for_insert());
        for column in ["created_at", "updated_at"] {
            match rows.get(column) {
                Some(Value::Timestamp(micros)) => assert!(*micros > 100),
                other => panic!("{column} not stamped: {other:?}"),
            }
        }
    }

    #[test]
    fn update_skips_created_at_and_stamps_updated_at() {
        let (key, rows) = extract_row(&room(), &SanitizeOptions::for_update());
        assert_eq!(key, Value::BigInt(1));
        assert!(!rows.contains("created_at"));
        match rows.get("updated_at") {
            Some(Value::Timestamp(micros)) => assert!(*micros > 100),
            other => panic!("updated_at not stamped: {other:?}"),
        }
    }

    #[test]
    fn update_multiple_keeps_created_at() {
        let (_, rows) = extract_row(&room(), &SanitizeOptions::for_update_multiple());
        assert_eq!(rows.get("created_at"), Some(&Value::Timestamp(100)));
        match rows.get("updated_at") {
            Some(Value::Timestamp(micros)) => assert!(*micros > 100),
            other => panic!("updated_at not stamped: {other:?}"),
        }
    }

    #[test]
    fn not_serial_key_stays_in_payload() {
        let tag = Tag {
            code: "sea-view".to_string(),
            label: "Sea view".to_string(),
        };
        let (key, rows) = extract_row(&tag, &SanitizeOptions::for_insert());
        assert_eq!(key, Value::Text("sea-view".to_string()));
        assert_eq!(rows.get("code"), Some(&Value::Text("sea-view".to_string())));
    }

    #[test]
    fn defaults_only_touch_present_columns() {
        let tag = Tag {
            code: "x".to_string(),
            label: "y".to_string(),
        };
        let (_, rows) = extract_row(&tag, &SanitizeOptions::for_insert());
        assert!(!rows.contains("created_at"));
        assert!(!rows.contains("updated_at"));
    }

    #[test]
    fn row_values_preserve_order_and_replace_in_place() {
        let mut rows = RowValues::new();
        rows.push("a", Value::BigInt(1));
        rows.push("b", Value::BigInt(2));
        rows.set("a", Value::BigInt(9));
        rows.set("c", Value::BigInt(3));
        assert_eq!(rows.columns(), vec!["a", "b", "c"]);
        assert_eq!(rows.get("a"), Some(&Value::BigInt(9)));
        assert_eq!(rows.len(), 3);
    }
}
