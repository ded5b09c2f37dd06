//! The database facade: validated CRUD over registered models.
//!
//! Every operation checks its inputs with [`validate`](super::validate)
//! before a statement is rendered, then runs in its own session. A session
//! commits when the operation succeeds and rolls back otherwise.

use serde_json::{Map, Value as Json};
use tracing::{debug, info};

use super::validate;
use crate::adapter::outbound::database::{create_pool, ConnectionPool, DatabaseUrl, Session, DEFAULT_POOL_SIZE};
use crate::adapter::outbound::sql::{self, Dialect, Statement};
use crate::domain::{Column, Filter, Model, Order, Record, Registry, Table, Value};
use crate::error::{Result, ValidationError};

/// What a query reads: a whole model or some of its columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Model(Table),
    Columns(Vec<Column>),
}

impl Selection {
    /// Every column of model `M`.
    pub fn model<M: Model>() -> Self {
        Self::Model(M::table().clone())
    }

    /// The given columns, which must all come from one model.
    pub fn columns(columns: impl IntoIterator<Item = Column>) -> Self {
        Self::Columns(columns.into_iter().collect())
    }
}

/// Optional clauses of a read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetOptions {
    pub filter: Vec<Filter>,
    pub order_by: Vec<Order>,
    pub limit: Option<u64>,
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: impl IntoIterator<Item = Filter>) -> Self {
        self.filter.extend(filter);
        self
    }

    #[must_use]
    pub fn order_by(mut self, order_by: impl IntoIterator<Item = Order>) -> Self {
        self.order_by.extend(order_by);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A validated select over one table, open for further clauses.
///
/// Every clause is checked against the table when it is added, so a
/// `Query` always renders to a well-formed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: Table,
    columns: Vec<Column>,
    filters: Vec<Filter>,
    orders: Vec<Order>,
    limit: Option<u64>,
}

impl Query {
    fn new(table: Table, columns: Vec<Column>) -> Self {
        Self {
            table,
            columns,
            filters: Vec::new(),
            orders: Vec::new(),
            limit: None,
        }
    }

    /// Add conditions, combined with `AND`.
    pub fn filter(mut self, filters: impl IntoIterator<Item = Filter>) -> Result<Self> {
        let filters: Vec<Filter> = filters.into_iter().collect();
        validate::filter(&self.table, &filters)?;
        self.filters.extend(filters);
        Ok(self)
    }

    pub fn order_by(mut self, orders: impl IntoIterator<Item = Order>) -> Result<Self> {
        let orders: Vec<Order> = orders.into_iter().collect();
        validate::ordering(&self.table, &orders)?;
        self.orders.extend(orders);
        Ok(self)
    }

    pub fn limit(mut self, limit: u64) -> Result<Self> {
        validate::limit(limit)?;
        self.limit = Some(limit);
        Ok(self)
    }

    /// Apply every clause of `options`.
    pub fn apply(self, options: GetOptions) -> Result<Self> {
        let query = self.filter(options.filter)?.order_by(options.order_by)?;
        match options.limit {
            Some(limit) => query.limit(limit),
            None => Ok(query),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Projected columns, in table order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Render for `dialect`.
    pub fn statement(&self, dialect: Dialect) -> Result<Statement> {
        let columns: Vec<&Column> = self.columns.iter().collect();
        Ok(sql::select_rows(
            dialect,
            &self.table,
            &columns,
            &self.filters,
            &self.orders,
            self.limit,
        )?)
    }
}

/// A connection pool plus the registry of tables it manages.
#[derive(Debug)]
pub struct Database {
    url: DatabaseUrl,
    registry: Registry,
    pool: ConnectionPool,
    pool_size: u32,
}

impl Database {
    /// Connect and create every registered table that does not exist yet.
    ///
    /// # Errors
    /// Fails on a malformed URL, a backend that is not compiled in, or when
    /// the tables cannot be created.
    pub fn connect(url: &str, registry: Registry) -> Result<Self> {
        let database = Self::open(DatabaseUrl::parse(url)?, registry, DEFAULT_POOL_SIZE)?;
        database.create_all()?;
        Ok(database)
    }

    /// Connect without touching the schema.
    pub fn open(url: DatabaseUrl, registry: Registry, pool_size: u32) -> Result<Self> {
        let pool = create_pool(&url, pool_size)?;
        Ok(Self {
            url,
            registry,
            pool,
            pool_size,
        })
    }

    /// Replace the pool with fresh connections.
    pub fn reconnect(&mut self) -> Result<()> {
        self.pool = create_pool(&self.url, self.pool_size)?;
        debug!(url = %self.url, "Reconnected");
        Ok(())
    }

    pub fn url(&self) -> &DatabaseUrl {
        &self.url
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn dialect(&self) -> Dialect {
        self.pool.dialect()
    }

    /// Run `f` in a session: a transaction on one pooled connection,
    /// committed when `f` returns `Ok` and rolled back otherwise.
    pub fn with_session<T>(&self, f: impl FnOnce(&mut Session<'_>) -> Result<T>) -> Result<T> {
        self.pool.with_session(f)
    }

    /// Run `f` on a pooled connection without a transaction.
    pub fn with_connection<T>(&self, f: impl FnOnce(&mut Session<'_>) -> Result<T>) -> Result<T> {
        self.pool.with_connection(f)
    }

    /// Create every registered table that does not exist yet.
    pub fn create_all(&self) -> Result<()> {
        let dialect = self.dialect();
        let ddl = self
            .registry
            .tables()
            .iter()
            .map(|table| sql::create_table(dialect, table))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.with_session(|session| ddl.iter().try_for_each(|sql| session.batch_execute(sql)))?;
        info!(tables = self.registry.len(), "Created tables");
        Ok(())
    }

    /// Drop every registered table, last registered first.
    pub fn drop_all(&self) -> Result<()> {
        let dialect = self.dialect();
        let ddl = self
            .registry
            .tables()
            .iter()
            .rev()
            .map(|table| sql::drop_table(dialect, table))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.with_session(|session| ddl.iter().try_for_each(|sql| session.batch_execute(sql)))?;
        info!(tables = self.registry.len(), "Dropped tables");
        Ok(())
    }

    /// Validate a selection and start a query over it.
    ///
    /// A model must be registered. Columns must be non-empty and all belong
    /// to the registered table of the first column.
    pub fn select(&self, selection: Selection) -> Result<Query> {
        match selection {
            Selection::Model(table) => {
                validate::model(&self.registry, &table)?;
                let columns = table.columns().to_vec();
                Ok(Query::new(table, columns))
            }
            Selection::Columns(columns) => {
                validate::non_empty(columns.len(), "The columns to be selected")?;
                let table = self.owning_table(&columns[0])?;
                validate::columns_same_model(table, &columns, "")?;
                let columns = table
                    .columns()
                    .iter()
                    .filter(|c| columns.iter().any(|s| s.name() == c.name()))
                    .cloned()
                    .collect();
                Ok(Query::new(table.clone(), columns))
            }
        }
    }

    /// Run a query and return its rows.
    pub fn fetch(&self, query: &Query) -> Result<Vec<Record>> {
        let statement = query.statement(self.dialect())?;
        let columns: Vec<&Column> = query.columns().iter().collect();
        let records = self.with_session(|session| session.load_records(&statement, &columns))?;
        debug!(table = query.table().name(), rows = records.len(), "Fetched rows");
        Ok(records)
    }

    /// Insert new instances of `M` in one transaction.
    ///
    /// Instances must not carry primary key values. Empty columns with a
    /// default get it. Returns the number of rows inserted.
    pub fn add<M: Model>(&self, data: &[M]) -> Result<usize> {
        let table = M::table();
        validate::model(&self.registry, table)?;
        validate::non_empty(data.len(), "The data to be added")?;

        let mut records = Vec::with_capacity(data.len());
        for (i, instance) in data.iter().enumerate() {
            let record = instance.to_record();
            validate::primary_key_no_values(table, &record, &format!(" in the instance {i} to be added"))?;
            records.push(prepare_insert(table, record)?);
        }

        let dialect = self.dialect();
        let statements = records
            .iter()
            .map(|record| sql::insert(dialect, table, record))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let inserted = self.with_session(|session| {
            statements
                .iter()
                .try_fold(0, |total, statement| Ok(total + session.execute(statement)?))
        })?;
        info!(table = table.name(), rows = inserted, "Added rows");
        Ok(inserted)
    }

    /// Read whole instances of `M`.
    pub fn get<M: Model>(&self, options: GetOptions) -> Result<Vec<M>> {
        let query = self.select(Selection::model::<M>())?.apply(options)?;
        self.fetch(&query)?.into_iter().map(M::from_record).collect()
    }

    /// Read some columns of one model. The primary key columns are always
    /// read as well.
    pub fn get_columns(&self, columns: &[Column], options: GetOptions) -> Result<Vec<Record>> {
        validate::non_empty(columns.len(), "The columns to be selected")?;
        let table = self.owning_table(&columns[0])?;
        let mut selection = columns.to_vec();
        for pk in table.primary_key() {
            if !selection.iter().any(|c| c.name() == pk.name()) {
                selection.push(pk.clone());
            }
        }
        let query = self.select(Selection::Columns(selection))?.apply(options)?;
        self.fetch(&query)
    }

    /// Read whole instances of `M` as JSON objects.
    pub fn get_records<M: Model>(&self, options: GetOptions) -> Result<Vec<Map<String, Json>>> {
        let query = self.select(Selection::model::<M>())?.apply(options)?;
        Ok(self.fetch(&query)?.iter().map(Record::to_json).collect())
    }

    /// Count the rows of `table` matching `filters`.
    pub fn count(&self, table: &Table, filters: &[Filter]) -> Result<i64> {
        validate::model(&self.registry, table)?;
        validate::filter(table, filters)?;
        let statement = sql::count(self.dialect(), table, filters)?;
        self.with_session(|session| session.count(&statement))
    }

    /// Set columns of the rows matching `filters`; no filters means every
    /// row. Columns with an on-update generator that are not assigned are
    /// refreshed. Returns the number of rows updated.
    pub fn update(&self, assignments: &[(Column, Value)], filters: &[Filter]) -> Result<usize> {
        validate::non_empty(assignments.len(), "The data to be updated")?;
        let table = self.owning_table(&assignments[0].0)?;
        validate::columns_same_model(table, assignments.iter().map(|(c, _)| c), "")?;
        validate::columns_values_are_same_type(assignments.iter().map(|(c, v)| (c, v)), "")?;
        let assigned: Record = assignments
            .iter()
            .map(|(c, v)| (c.name().to_string(), v.clone()))
            .collect();
        validate::primary_key_no_values(table, &assigned, "")?;
        validate::filter(table, filters)?;

        let mut assignments = assignments.to_vec();
        for column in table.columns() {
            if let Some(value) = column.on_update_value() {
                if !assigned.contains(column.name()) {
                    assignments.push((column.clone(), value));
                }
            }
        }

        let statement = sql::update(self.dialect(), table, &assignments, filters)?;
        let updated = self.with_session(|session| session.execute(&statement))?;
        info!(table = table.name(), rows = updated, "Updated rows");
        Ok(updated)
    }

    /// Delete the rows of `table` matching `filters`; no filters means every
    /// row. Returns the number of rows deleted.
    pub fn delete(&self, table: &Table, filters: &[Filter]) -> Result<usize> {
        validate::model(&self.registry, table)?;
        validate::filter(table, filters)?;
        let statement = sql::delete(self.dialect(), table, filters)?;
        let deleted = self.with_session(|session| session.execute(&statement))?;
        info!(table = table.name(), rows = deleted, "Deleted rows");
        Ok(deleted)
    }

    /// The registered table a column claims to belong to.
    fn owning_table(&self, column: &Column) -> Result<&Table> {
        self.registry.table(column.table_name()).ok_or_else(|| {
            ValidationError::UnmappedModels {
                models: vec![format!("0 - ({})", column.table_name())],
            }
            .into()
        })
    }
}

/// Convert model instances to JSON objects keyed by column name.
pub fn results_to_dictionaries<M: Model>(results: &[M]) -> Vec<Map<String, Json>> {
    results.iter().map(|m| m.to_record().to_json()).collect()
}

/// Fill defaults and drop unset serial keys so the database assigns them,
/// then check every value against its column.
fn prepare_insert(table: &Table, mut record: Record) -> Result<Record> {
    for column in table.columns() {
        let unset = record.get(column.name()).map_or(true, Value::is_null);
        if !unset {
            continue;
        }
        if column.is_autoincrement() {
            record.take(column.name());
        } else if let Some(value) = column.default_value() {
            record.insert(column.name(), value);
        }
    }
    let pairs: Vec<(&Column, &Value)> = table
        .columns()
        .iter()
        .filter_map(|c| record.get(c.name()).map(|v| (c, v)))
        .collect();
    validate::columns_values_are_same_type(pairs, "")?;
    Ok(record)
}
