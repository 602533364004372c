//! Static entity descriptors.
//!
//! Descriptors are the declarative field metadata the whole mapping layer is
//! driven by: column projection, write-path sanitization and read-path
//! materialization all walk the same descriptor tree, which is what keeps
//! projection order and scan order in lockstep.
//!
//! Descriptors are declared explicitly per entity as `static` tables; there
//! is no runtime reflection.

use crate::value::Value;

/// The underlying kind of a leaf column.
///
/// Drives the nullable-shadow pass: an outer-joined column that scans as SQL
/// NULL is replaced by its kind's zero value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    Float,
    Bool,
    Text,
    Timestamp,
    Bytes,
    Json,
}

impl ScalarKind {
    /// The zero value an absent outer-joined column materializes to.
    #[must_use]
    pub fn zero_value(self) -> Value {
        match self {
            ScalarKind::Int => Value::BigInt(0),
            ScalarKind::Float => Value::Double(0.0),
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::Text => Value::Text(String::new()),
            ScalarKind::Timestamp => Value::Timestamp(0),
            ScalarKind::Bytes => Value::Bytes(Vec::new()),
            ScalarKind::Json => Value::Json(serde_json::Value::Null),
        }
    }
}

/// Metadata for a plain column field.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDescriptor {
    /// Database column name.
    pub column: &'static str,
    /// Underlying scalar kind.
    pub kind: ScalarKind,
    /// Whether this column is the entity's primary key.
    pub primary_key: bool,
    /// Primary key is supplied by the caller rather than generated by the
    /// store; kept in insert payloads.
    pub not_serial: bool,
    /// Alternate upsert conflict key (natural-key upsert).
    pub conflict_target: bool,
}

impl ColumnDescriptor {
    /// Create a new column descriptor.
    pub const fn new(column: &'static str, kind: ScalarKind) -> Self {
        Self {
            column,
            kind,
            primary_key: false,
            not_serial: false,
            conflict_target: false,
        }
    }

    /// Mark as primary key.
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark the primary key as caller-supplied.
    pub const fn not_serial(mut self) -> Self {
        self.not_serial = true;
        self
    }

    /// Mark as the upsert conflict target.
    pub const fn conflict_target(mut self) -> Self {
        self.conflict_target = true;
        self
    }
}

/// Metadata for a joinable relation field.
///
/// The relation name doubles as the join alias and the column prefix of the
/// relation's span in a projection. The substructure is itself a descriptor
/// tree, subject to the same projection/materialization rules.
#[derive(Debug, Clone, Copy)]
pub struct RelationDescriptor {
    /// Relation name; also the join alias and column prefix.
    pub name: &'static str,
    /// Target table.
    pub table: &'static str,
    /// Fetched via an outer join; absence materializes as the zero value.
    pub nullable: bool,
    /// The related entity's descriptor.
    ///
    /// A function pointer keeps descriptor trees `'static` without
    /// initialization-order problems between mutually referencing entities.
    pub shape: fn() -> &'static EntityDescriptor,
}

impl RelationDescriptor {
    /// Create a new relation descriptor.
    pub const fn new(
        name: &'static str,
        table: &'static str,
        shape: fn() -> &'static EntityDescriptor,
    ) -> Self {
        Self {
            name,
            table,
            nullable: false,
            shape,
        }
    }

    /// Mark the relation as nullable (outer join).
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// One declared entity field.
#[derive(Debug, Clone, Copy)]
pub enum FieldDescriptor {
    /// A plain column.
    Column(ColumnDescriptor),
    /// A named joinable substructure.
    Relation(RelationDescriptor),
    /// A flattened struct whose sub-fields contribute columns in place and
    /// which is otherwise invisible as a nesting level.
    Embedded { shape: fn() -> &'static EntityDescriptor },
    /// A nested value object whose own primary key becomes the outer
    /// entity's primary key.
    Inner { shape: fn() -> &'static EntityDescriptor },
}

impl FieldDescriptor {
    /// Shorthand for a plain column field.
    pub const fn column(column: &'static str, kind: ScalarKind) -> Self {
        FieldDescriptor::Column(ColumnDescriptor::new(column, kind))
    }
}

/// The declared shape of an entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    /// Fields in declaration order.
    pub fields: &'static [FieldDescriptor],
    /// Soft-delete timestamp column, when the entity opts into soft
    /// deletion. Explicit capability marker; nothing is inferred from
    /// field names.
    pub soft_delete: Option<&'static str>,
}

impl EntityDescriptor {
    /// Create a descriptor over the given fields.
    pub const fn new(fields: &'static [FieldDescriptor]) -> Self {
        Self {
            fields,
            soft_delete: None,
        }
    }

    /// Opt into soft deletion via the given timestamp column.
    pub const fn soft_delete(mut self, column: &'static str) -> Self {
        self.soft_delete = Some(column);
        self
    }

    /// Whether deletes should be soft for this entity.
    #[must_use]
    pub const fn is_soft_deletable(&self) -> bool {
        self.soft_delete.is_some()
    }

    /// The primary-key column, resolved through inner-struct chains.
    #[must_use]
    pub fn primary_key(&self) -> Option<&'static ColumnDescriptor> {
        for field in self.fields {
            match field {
                FieldDescriptor::Column(col) if col.primary_key => return Some(col),
                FieldDescriptor::Inner { shape } | FieldDescriptor::Embedded { shape } => {
                    if let Some(col) = shape().primary_key() {
                        return Some(col);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// The column marked as the upsert conflict target, if any.
    #[must_use]
    pub fn conflict_target(&self) -> Option<&'static ColumnDescriptor> {
        for field in self.fields {
            match field {
                FieldDescriptor::Column(col) if col.conflict_target => return Some(col),
                FieldDescriptor::Inner { shape } | FieldDescriptor::Embedded { shape } => {
                    if let Some(col) = shape().conflict_target() {
                        return Some(col);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Look up a relation by name.
    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&'static RelationDescriptor> {
        for field in self.fields {
            match field {
                FieldDescriptor::Relation(rel) if rel.name == name => return Some(rel),
                FieldDescriptor::Inner { shape } | FieldDescriptor::Embedded { shape } => {
                    if let Some(rel) = shape().relation(name) {
                        return Some(rel);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Whether any of the requested relations is nullable.
    #[must_use]
    pub fn has_nullable_relation(&self, relations: &[&str]) -> bool {
        if relations.is_empty() {
            return false;
        }
        relations
            .iter()
            .filter_map(|name| self.relation(name))
            .any(|rel| rel.nullable)
    }
}
