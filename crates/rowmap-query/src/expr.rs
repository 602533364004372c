//! SQL expressions for statement building.
//!
//! A small type-safe expression tree for WHERE predicates and join
//! conditions, rendered per dialect with positional placeholders.

use rowmap_core::Value;

/// SQL dialect for generating dialect-specific SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// PostgreSQL dialect (uses $1, $2 placeholders)
    #[default]
    Postgres,
    /// SQLite dialect (uses ?1, ?2 placeholders)
    Sqlite,
    /// MySQL dialect (uses ? placeholders)
    Mysql,
}

impl Dialect {
    /// Generate a placeholder for the given parameter index (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Mysql => "?".to_string(),
        }
    }
}

/// Execution options carried by every statement build.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Placeholder style.
    pub dialect: Dialect,
    /// When false, simple scalar parameters are rendered inline instead of
    /// bound. Timestamps, bytes and JSON always bind.
    pub prepared: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Postgres,
            prepared: true,
        }
    }
}

impl QueryOptions {
    /// Options with the given dialect, prepared statements on.
    #[must_use]
    pub fn dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            prepared: true,
        }
    }

    /// Toggle prepared-statement rendering.
    #[must_use]
    pub const fn prepared(mut self, value: bool) -> Self {
        self.prepared = value;
        self
    }
}

/// Render a bind value: placeholder in prepared mode, inline literal for
/// unambiguous scalars otherwise.
pub(crate) fn render_value(value: &Value, opts: &QueryOptions, params: &mut Vec<Value>) -> String {
    if !opts.prepared {
        match value {
            Value::Null => return "NULL".to_string(),
            Value::Bool(v) => return if *v { "TRUE" } else { "FALSE" }.to_string(),
            Value::Int(v) => return v.to_string(),
            Value::BigInt(v) => return v.to_string(),
            Value::Double(v) => return v.to_string(),
            Value::Text(s) => return format!("'{}'", s.replace('\'', "''")),
            _ => {}
        }
    }
    params.push(value.clone());
    opts.dialect.placeholder(params.len())
}

/// A SQL expression usable in WHERE and ON clauses.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Column reference with optional table qualifier
    Column {
        /// Optional table name or alias
        table: Option<String>,
        /// Column name
        name: String,
    },

    /// Literal value
    Literal(Value),

    /// Binary operation (e.g., a = b, a > b)
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// NOT expression
    Not(Box<Expr>),

    /// IN expression
    In {
        expr: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },

    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },

    /// Parenthesized expression
    Paren(Box<Expr>),

    /// Raw SQL fragment (escape hatch)
    Raw(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Logical AND
    And,
    /// Logical OR
    Or,
}

impl BinaryOp {
    /// Get the SQL representation of this operator.
    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }
}

impl Expr {
    /// Create a column reference expression.
    pub fn col(name: impl Into<String>) -> Self {
        Expr::Column {
            table: None,
            name: name.into(),
        }
    }

    /// Create a qualified column reference (table.column).
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Expr::Column {
            table: Some(table.into()),
            name: column.into(),
        }
    }

    /// Create a literal value expression.
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Create a raw SQL expression (escape hatch).
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    fn binary(self, op: BinaryOp, other: impl Into<Expr>) -> Self {
        Expr::Binary {
            left: Box::new(self),
            op,
            right: Box::new(other.into()),
        }
    }

    /// Equal to (=)
    pub fn eq(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Eq, other)
    }

    /// Not equal to (<>)
    pub fn ne(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ne, other)
    }

    /// Less than (<)
    pub fn lt(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Lt, other)
    }

    /// Less than or equal to (<=)
    pub fn le(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Le, other)
    }

    /// Greater than (>)
    pub fn gt(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Gt, other)
    }

    /// Greater than or equal to (>=)
    pub fn ge(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ge, other)
    }

    /// Logical AND
    pub fn and(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::And, other)
    }

    /// Logical OR
    pub fn or(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Or, other)
    }

    /// Logical NOT
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// IS NULL
    pub fn is_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// IS NOT NULL
    pub fn is_not_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// IN (values...)
    pub fn in_values(self, values: impl IntoIterator<Item = Value>) -> Self {
        Expr::In {
            expr: Box::new(self),
            values: values.into_iter().map(Expr::Literal).collect(),
            negated: false,
        }
    }

    /// Wrap in parentheses.
    pub fn paren(self) -> Self {
        Expr::Paren(Box::new(self))
    }

    /// Render this expression, appending bind values to `params`.
    pub fn render(&self, opts: &QueryOptions, params: &mut Vec<Value>) -> String {
        match self {
            Expr::Column { table, name } => {
                if let Some(t) = table {
                    format!("{t}.{name}")
                } else {
                    name.clone()
                }
            }

            Expr::Literal(value) => render_value(value, opts, params),

            Expr::Binary { left, op, right } => {
                let left_sql = left.render(opts, params);
                let right_sql = right.render(opts, params);
                format!("{left_sql} {} {right_sql}", op.as_str())
            }

            Expr::Not(expr) => {
                let expr_sql = expr.render(opts, params);
                format!("NOT {expr_sql}")
            }

            Expr::In {
                expr,
                values,
                negated,
            } => {
                let expr_sql = expr.render(opts, params);
                let value_sqls: Vec<_> = values.iter().map(|v| v.render(opts, params)).collect();
                let not_str = if *negated { "NOT " } else { "" };
                format!("{expr_sql} {not_str}IN ({})", value_sqls.join(", "))
            }

            Expr::IsNull { expr, negated } => {
                let expr_sql = expr.render(opts, params);
                let not_str = if *negated { " NOT" } else { "" };
                format!("{expr_sql} IS{not_str} NULL")
            }

            Expr::Paren(expr) => {
                let expr_sql = expr.render(opts, params);
                format!("({expr_sql})")
            }

            Expr::Raw(sql) => sql.clone(),
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::Literal(Value::Bool(value))
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Literal(Value::Int(value))
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Literal(Value::BigInt(value))
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Literal(Value::Double(value))
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Literal(Value::Text(value.to_string()))
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Literal(Value::Text(value))
    }
}
