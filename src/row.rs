use std::fmt;

use smol_str::SmolStr;

use crate::{
    bind::{Bind, FromBind},
    error::{Error, Result},
    exec::{ResultTable, Row},
};

type Setter<T> = Box<dyn Fn(&mut T, &Bind) -> Option<()> + Send + Sync>;

struct Binding<T> {
    column: SmolStr,
    expected: &'static str,
    set: Setter<T>,
}

/// Maps result columns onto a record, one `(column, setter)` entry per
/// field. Built once per record shape and reused for every row.
///
/// Columns are matched case insensitively. A column missing from the
/// result leaves the field untouched.
pub struct RowBinder<T> {
    bindings: Vec<Binding<T>>,
}

impl<T> Default for RowBinder<T> {
    fn default() -> Self {
        Self { bindings: Vec::new() }
    }
}

impl<T> fmt::Debug for RowBinder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.bindings.iter().map(|binding| &binding.column))
            .finish()
    }
}

impl<T> RowBinder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column<C, V, F>(mut self, column: C, setter: F) -> Self
    where
        C: Into<SmolStr>,
        V: FromBind,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let set = move |target: &mut T, bind: &Bind| {
            let value = V::from_bind(bind)?;
            setter(target, value);
            Some(())
        };
        self.bindings.push(Binding {
            column: column.into(),
            expected: V::EXPECTED,
            set: Box::new(set),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bind_into(&self, row: &Row<'_>, target: &mut T) -> Result<()> {
        for binding in &self.bindings {
            let Some(bind) = row.get(&binding.column) else {
                continue;
            };
            (binding.set)(target, bind).ok_or_else(|| Error::TypeMismatch {
                column: binding.column.clone(),
                expected: binding.expected,
            })?;
        }
        Ok(())
    }
}

impl<T: Default> RowBinder<T> {
    pub fn bind_row(&self, row: &Row<'_>) -> Result<T> {
        let mut target = T::default();
        self.bind_into(row, &mut target)?;
        Ok(target)
    }

    pub fn bind_table(&self, table: &ResultTable) -> Result<Vec<T>> {
        table.rows().map(|row| self.bind_row(&row)).collect()
    }
}
