//! Mapped column descriptors.

use std::fmt;

use super::expr::{Direction, Filter, Op, Order};
use super::value::{ColumnType, SqlValue, Value};

/// Generator for default and on-update column values.
pub type ValueFn = fn() -> Value;

/// A column of a mapped table.
///
/// A column remembers the table it belongs to, so conditions and orderings
/// built from it can be checked against the model they are used with.
#[derive(Debug, Clone)]
pub struct Column {
    table: String,
    name: String,
    ty: ColumnType,
    nullable: bool,
    primary_key: bool,
    autoincrement: bool,
    default: Option<ValueFn>,
    on_update: Option<ValueFn>,
}

impl Column {
    /// Create a non-nullable column of `table`.
    pub fn new(table: impl Into<String>, name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            ty,
            nullable: false,
            primary_key: false,
            autoincrement: false,
            default: None,
            on_update: None,
        }
    }

    /// Create a column whose type and nullability follow the Rust field type.
    pub fn of<T: SqlValue>(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(table, name, T::TYPE).nullable(T::NULLABLE)
    }

    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Mark the column as (part of) the primary key. Primary keys are never nullable.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Let the database assign the value on insert.
    #[must_use]
    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    #[must_use]
    pub fn default_with(mut self, generator: ValueFn) -> Self {
        self.default = Some(generator);
        self
    }

    #[must_use]
    pub fn on_update(mut self, generator: ValueFn) -> Self {
        self.on_update = Some(generator);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> ColumnType {
        self.ty
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_autoincrement(&self) -> bool {
        self.autoincrement
    }

    /// Value used on insert when the caller left the column empty.
    pub fn default_value(&self) -> Option<Value> {
        self.default.map(|generate| generate())
    }

    /// Value written on every update that does not assign the column.
    pub fn on_update_value(&self) -> Option<Value> {
        self.on_update.map(|generate| generate())
    }

    pub fn has_on_update(&self) -> bool {
        self.on_update.is_some()
    }

    /// `table.column`, as used in error messages.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }

    pub fn eq(&self, value: impl Into<Value>) -> Filter {
        Filter::new(self.clone(), Op::Eq, value.into())
    }

    pub fn ne(&self, value: impl Into<Value>) -> Filter {
        Filter::new(self.clone(), Op::Ne, value.into())
    }

    pub fn gt(&self, value: impl Into<Value>) -> Filter {
        Filter::new(self.clone(), Op::Gt, value.into())
    }

    pub fn ge(&self, value: impl Into<Value>) -> Filter {
        Filter::new(self.clone(), Op::Ge, value.into())
    }

    pub fn lt(&self, value: impl Into<Value>) -> Filter {
        Filter::new(self.clone(), Op::Lt, value.into())
    }

    pub fn le(&self, value: impl Into<Value>) -> Filter {
        Filter::new(self.clone(), Op::Le, value.into())
    }

    pub fn like(&self, pattern: impl Into<String>) -> Filter {
        Filter::new(self.clone(), Op::Like, Value::Text(pattern.into()))
    }

    pub fn is_null(&self) -> Filter {
        Filter::new(self.clone(), Op::IsNull, Value::Null)
    }

    pub fn is_not_null(&self) -> Filter {
        Filter::new(self.clone(), Op::IsNotNull, Value::Null)
    }

    pub fn asc(&self) -> Order {
        Order::new(self.clone(), Direction::Asc)
    }

    pub fn desc(&self) -> Order {
        Order::new(self.clone(), Direction::Desc)
    }

    /// Pair the column with a value, for `Database::update`.
    pub fn set(&self, value: impl Into<Value>) -> (Column, Value) {
        (self.clone(), value.into())
    }
}

// Generators are not compared; two columns are the same column when their
// shape matches.
impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
            && self.name == other.name
            && self.ty == other.ty
            && self.nullable == other.nullable
            && self.primary_key == other.primary_key
            && self.autoincrement == other.autoincrement
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn of_follows_field_type() {
        let column = Column::of::<Option<String>>("users", "nickname");
        assert_eq!(column.ty(), ColumnType::Text);
        assert!(column.is_nullable());

        let column = Column::of::<i64>("users", "age");
        assert_eq!(column.ty(), ColumnType::Integer);
        assert!(!column.is_nullable());
    }

    #[test]
    fn primary_key_is_not_nullable() {
        let column = Column::new("users", "id", ColumnType::Integer)
            .nullable(true)
            .primary_key();
        assert!(column.is_primary_key());
        assert!(!column.is_nullable());
    }

    #[test]
    fn conditions_keep_owning_column() {
        let age = Column::of::<i64>("users", "age");
        let filter = age.ge(18);
        assert_eq!(filter.column(), &age);
        assert_eq!(filter.op(), Op::Ge);
        assert_eq!(filter.value(), &Value::Integer(18));

        let order = age.desc();
        assert_eq!(order.direction(), Direction::Desc);
        assert_eq!(order.column().qualified_name(), "users.age");
    }

    #[test]
    fn equality_ignores_generators() {
        fn zero() -> Value {
            Value::Integer(0)
        }
        let plain = Column::new("t", "n", ColumnType::Integer);
        let defaulted = Column::new("t", "n", ColumnType::Integer).default_with(zero);
        assert_eq!(plain, defaulted);
        assert_eq!(defaulted.default_value(), Some(Value::Integer(0)));
    }
}
