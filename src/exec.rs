//! Boundary with the database driver.
//!
//! The query model never opens a connection. An [`Executor`] takes finished
//! sql plus named parameters and returns rows, a scalar or an affected row
//! count; [`QueryRunner`] renders queries, logs them following its
//! [`LogPolicy`] and hands them over.

use indexmap::IndexMap;
use smol_str::{SmolStr, format_smolstr};
use tracing::{error, info};

use crate::{
    bind::{Bind, FromBind, IntoBind},
    builder::SearchQuery,
    error::{Error, Result},
    paginate::Paginator,
    row::RowBinder,
};

/// Ordered named parameters. Names always carry a leading `@`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params(IndexMap<SmolStr, Bind>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names each value by its position: `@0`, `@1`, ...
    pub fn positional<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoBind,
    {
        let params = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| (format_smolstr!("@{}", index), value.into_bind()))
            .collect();
        Self(params)
    }

    /// Sets a parameter, replacing any previous value under that name.
    pub fn insert<N, V>(&mut self, name: N, value: V) -> &mut Self
    where
        N: AsRef<str>,
        V: IntoBind,
    {
        self.0.insert(normalize(name.as_ref()), value.into_bind());
        self
    }

    pub fn with<N, V>(mut self, name: N, value: V) -> Self
    where
        N: AsRef<str>,
        V: IntoBind,
    {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Bind> {
        self.0.get(normalize(name).as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bind)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(SmolStr::as_str)
    }
}

fn normalize(name: &str) -> SmolStr {
    let name = name.trim();
    if name.starts_with('@') {
        SmolStr::new(name)
    } else {
        format_smolstr!("@{}", name)
    }
}

/// Tabular result: named columns over rows of values.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResultTable {
    columns: Vec<SmolStr>,
    rows: Vec<Vec<Bind>>,
}

impl ResultTable {
    pub fn new<I>(columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SmolStr>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row, padded with nulls or truncated to the column count.
    pub fn push_row(&mut self, mut values: Vec<Bind>) -> &mut Self {
        values.resize(self.columns.len(), Bind::Null);
        self.rows.push(values);
        self
    }

    pub fn columns(&self) -> &[SmolStr] {
        &self.columns
    }

    /// Position of `name`, ignoring ascii case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row { table: self, values })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row { table: self, values })
    }
}

/// One row of a [`ResultTable`].
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a ResultTable,
    values: &'a [Bind],
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Bind> {
        self.table
            .column_index(column)
            .and_then(|index| self.values.get(index))
    }

    pub fn try_get<T: FromBind>(&self, column: &str) -> Result<T> {
        let bind = self.get(column).ok_or_else(|| Error::MissingColumn(SmolStr::new(column)))?;
        T::from_bind(bind).ok_or_else(|| Error::TypeMismatch {
            column: SmolStr::new(column),
            expected: T::EXPECTED,
        })
    }

    pub fn values(&self) -> &'a [Bind] {
        self.values
    }
}

/// Runs finished sql against a database.
pub trait Executor {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs a query returning rows.
    fn fetch_table(&mut self, sql: &str, params: &Params) -> Result<ResultTable, Self::Error>;

    /// First column of the first row, `None` when there are no rows.
    fn fetch_scalar(&mut self, sql: &str, params: &Params) -> Result<Option<Bind>, Self::Error>;

    /// Runs a statement and returns the affected row count.
    fn execute(&mut self, sql: &str, params: &Params) -> Result<u64, Self::Error>;
}

/// Statement logging, fixed when the runner is built.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LogPolicy {
    pub enabled: bool,
    /// Log every statement, not just the failing ones.
    pub log_everything: bool,
}

impl LogPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn errors_only() -> Self {
        Self {
            enabled: true,
            log_everything: false,
        }
    }

    pub fn everything() -> Self {
        Self {
            enabled: true,
            log_everything: true,
        }
    }
}

/// A page of rows, with the total row count when it was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub rows: ResultTable,
    pub total: Option<i64>,
}

/// Renders queries and runs them through an [`Executor`].
#[derive(Debug)]
pub struct QueryRunner<E> {
    executor: E,
    policy: LogPolicy,
}

impl<E: Executor> QueryRunner<E> {
    pub fn new(executor: E, policy: LogPolicy) -> Self {
        Self { executor, policy }
    }

    pub fn policy(&self) -> LogPolicy {
        self.policy
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    pub fn fetch(&mut self, query: &SearchQuery, params: &Params) -> Result<ResultTable> {
        let sql = query.to_sql()?;
        self.fetch_sql(&sql, params)
    }

    /// Fetches one page; the total count, when the paginator asks for it,
    /// is run as a separate scalar query.
    pub fn fetch_page(&mut self, query: &SearchQuery, paginator: &Paginator, params: &Params) -> Result<Page> {
        let sql = query.paginate(&paginator.clone().with_total_count(false))?;
        let rows = self.fetch_sql(&sql, params)?;
        let total = if paginator.includes_total_count() {
            Some(self.count(query, params)?)
        } else {
            None
        };
        Ok(Page { rows, total })
    }

    pub fn count(&mut self, query: &SearchQuery, params: &Params) -> Result<i64> {
        let sql = query.count()?;
        let value = self.scalar(&sql, params)?;
        match value {
            None => Ok(0),
            Some(bind) => i64::from_bind(&bind).ok_or_else(|| Error::TypeMismatch {
                column: SmolStr::new_static("count"),
                expected: i64::EXPECTED,
            }),
        }
    }

    /// Fetches and binds every row.
    pub fn fetch_as<T: Default>(&mut self, query: &SearchQuery, params: &Params, binder: &RowBinder<T>) -> Result<Vec<T>> {
        let table = self.fetch(query, params)?;
        binder.bind_table(&table)
    }

    pub fn fetch_sql(&mut self, sql: &str, params: &Params) -> Result<ResultTable> {
        self.run(sql, params, |executor, sql, params| executor.fetch_table(sql, params))
    }

    pub fn scalar(&mut self, sql: &str, params: &Params) -> Result<Option<Bind>> {
        self.run(sql, params, |executor, sql, params| executor.fetch_scalar(sql, params))
    }

    pub fn execute(&mut self, sql: &str, params: &Params) -> Result<u64> {
        self.run(sql, params, |executor, sql, params| executor.execute(sql, params))
    }

    fn run<T, F>(&mut self, sql: &str, params: &Params, call: F) -> Result<T>
    where
        F: FnOnce(&mut E, &str, &Params) -> Result<T, E::Error>,
    {
        if self.policy.enabled && self.policy.log_everything {
            let names = params.names().collect::<Vec<_>>().join(", ");
            info!(sql, params = %names, "executing statement");
        }
        call(&mut self.executor, sql, params).map_err(|err| {
            if self.policy.enabled {
                error!(sql, error = %err, "statement failed");
            }
            Error::DataAccess(Box::new(err))
        })
    }
}
