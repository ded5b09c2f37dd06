//! Mapped models and the standard model mixin.
//!
//! A [`Model`] is a Rust type backed by a [`Table`]. Most models are declared
//! with [`standard_model!`](crate::standard_model), which prepends the
//! standard columns:
//!
//! | Column       | Type      | Notes                                   |
//! |--------------|-----------|-----------------------------------------|
//! | `id`         | integer   | primary key, assigned by the database   |
//! | `created_at` | timestamp | not null, defaults to UTC now           |
//! | `updated_at` | timestamp | not null, defaults to and refreshed with UTC now |

use chrono::{NaiveDateTime, Utc};

use super::column::Column;
use super::record::Record;
use super::table::Table;
use super::value::{ColumnType, Value};
use crate::error::Result;

/// A Rust type mapped to a table.
pub trait Model: Sized {
    /// The table this model is mapped to.
    fn table() -> &'static Table;

    /// Column values of this instance.
    fn to_record(&self) -> Record;

    /// Build an instance from a loaded row.
    fn from_record(record: Record) -> Result<Self>;
}

/// Current UTC timestamp.
pub fn utc_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn now_value() -> Value {
    Value::Timestamp(utc_now())
}

/// The standard `id` primary key column of `table`.
pub fn standard_id(table: &str) -> Column {
    Column::new(table, "id", ColumnType::Integer)
        .primary_key()
        .autoincrement()
}

/// The standard `created_at` column of `table`.
pub fn standard_created_at(table: &str) -> Column {
    Column::new(table, "created_at", ColumnType::Timestamp).default_with(now_value)
}

/// The standard `updated_at` column of `table`.
pub fn standard_updated_at(table: &str) -> Column {
    Column::new(table, "updated_at", ColumnType::Timestamp)
        .default_with(now_value)
        .on_update(now_value)
}

/// All standard columns of `table`, in declaration order.
pub fn standard_columns(table: &str) -> Vec<Column> {
    vec![
        standard_id(table),
        standard_created_at(table),
        standard_updated_at(table),
    ]
}

/// Names reserved by the standard columns.
pub const STANDARD_COLUMN_NAMES: [&str; 3] = ["id", "created_at", "updated_at"];

/// Declare a model carrying the standard columns.
///
/// The struct gets `id: Option<i64>`, `created_at` and `updated_at` fields
/// ahead of the declared ones, a `new` constructor taking the declared
/// fields, one associated function per column returning its [`Column`]
/// (`User::name()`), a [`Model`] impl and a `Display` impl listing the
/// instance's values.
///
/// ```
/// use ormkit::{standard_model, Model};
///
/// standard_model! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct User in "users" {
///         pub name: String,
///         pub age: Option<i64>,
///     }
/// }
///
/// let user = User::new("Ada".to_string(), Some(36));
/// assert_eq!(user.id, None);
/// assert_eq!(User::table().name(), "users");
/// assert_eq!(User::name().qualified_name(), "users.name");
/// ```
#[macro_export]
macro_rules! standard_model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident in $table:literal {
            $( $(#[$field_meta:meta])* $field_vis:vis $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            pub id: ::std::option::Option<i64>,
            pub created_at: $crate::NaiveDateTime,
            pub updated_at: $crate::NaiveDateTime,
            $( $(#[$field_meta])* $field_vis $field: $ty, )*
        }

        #[allow(dead_code)]
        impl $name {
            /// Build an instance that is not stored yet.
            #[allow(clippy::too_many_arguments)]
            pub fn new($($field: $ty),*) -> Self {
                let now = $crate::domain::model::utc_now();
                Self {
                    id: ::std::option::Option::None,
                    created_at: now,
                    updated_at: now,
                    $( $field, )*
                }
            }

            pub fn id() -> $crate::Column {
                $crate::domain::model::standard_id($table)
            }

            pub fn created_at() -> $crate::Column {
                $crate::domain::model::standard_created_at($table)
            }

            pub fn updated_at() -> $crate::Column {
                $crate::domain::model::standard_updated_at($table)
            }

            $(
                pub fn $field() -> $crate::Column {
                    $crate::Column::of::<$ty>($table, stringify!($field))
                }
            )*
        }

        impl $crate::Model for $name {
            fn table() -> &'static $crate::Table {
                static TABLE: ::std::sync::OnceLock<$crate::Table> = ::std::sync::OnceLock::new();
                TABLE.get_or_init(|| {
                    #[allow(unused_mut)]
                    let mut columns = $crate::domain::model::standard_columns($table);
                    $( columns.push(Self::$field()); )*
                    $crate::Table::new($table, columns)
                })
            }

            fn to_record(&self) -> $crate::Record {
                let mut record = $crate::Record::new();
                record.insert("id", $crate::SqlValue::into_value(self.id));
                record.insert("created_at", $crate::SqlValue::into_value(self.created_at));
                record.insert("updated_at", $crate::SqlValue::into_value(self.updated_at));
                $(
                    record.insert(
                        stringify!($field),
                        $crate::SqlValue::into_value(::std::clone::Clone::clone(&self.$field)),
                    );
                )*
                record
            }

            fn from_record(mut record: $crate::Record) -> $crate::Result<Self> {
                ::std::result::Result::Ok(Self {
                    id: record.decode("id")?,
                    created_at: record.decode("created_at")?,
                    updated_at: record.decode("updated_at")?,
                    $( $field: record.decode(stringify!($field))?, )*
                })
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(
                    f,
                    "{}({})",
                    stringify!($name),
                    <Self as $crate::Model>::to_record(self)
                )
            }
        }
    };
}
