//! Conditions and ordering clauses built from columns.

use super::column::Column;
use super::value::Value;

/// Comparison operator of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    IsNull,
    IsNotNull,
}

impl Op {
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Like => "LIKE",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    /// Whether the operator compares against a bound value.
    #[must_use]
    pub const fn takes_value(self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

/// A binary condition `column <op> value`. Conditions passed together are
/// combined with `AND`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    column: Column,
    op: Op,
    value: Value,
}

impl Filter {
    pub fn new(column: Column, op: Op, value: Value) -> Self {
        Self { column, op, value }
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An ordering clause over one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    column: Column,
    direction: Direction,
}

impl Order {
    pub fn new(column: Column, direction: Direction) -> Self {
        Self { column, direction }
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}
