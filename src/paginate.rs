use std::fmt::Write;

use smol_str::SmolStr;
use tracing::debug;

use crate::{
    builder::SearchQuery,
    error::{Error, Result},
    ident::{Field, IntoField},
    writer::{self, FormatContext, FormatWriter},
};

const DEFAULT_TEMP_TABLE: &str = "#paginationTempTable";

/// Page window of a paginated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    page_index: usize,
    with_total_count: bool,
    temp_table: SmolStr,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            page_size: 15,
            page_index: 0,
            with_total_count: false,
            temp_table: SmolStr::new_static(DEFAULT_TEMP_TABLE),
        }
    }
}

impl Paginator {
    pub fn new(page_size: usize, page_index: usize) -> Self {
        Self {
            page_size,
            page_index,
            ..Default::default()
        }
    }

    /// Appends the count query to the page batch.
    pub fn with_total_count(mut self, with_total_count: bool) -> Self {
        self.with_total_count = with_total_count;
        self
    }

    /// Temp table used to page grouped queries.
    pub fn temp_table<T: Into<SmolStr>>(mut self, temp_table: T) -> Self {
        self.temp_table = temp_table.into();
        self
    }

    pub fn set_page_index(&mut self, page_index: usize) {
        self.page_index = page_index;
    }

    pub fn next_page(&mut self) {
        self.page_index = self.page_index.saturating_add(1);
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn includes_total_count(&self) -> bool {
        self.with_total_count
    }

    /// Rows skipped before the page starts, `None` when it does not fit a `usize`.
    pub fn offset(&self) -> Option<usize> {
        self.page_index.checked_mul(self.page_size)
    }

    fn temp_table_name(&self) -> SmolStr {
        smol_str::format_smolstr!("#{}", self.temp_table.trim().trim_start_matches('#'))
    }
}

impl SearchQuery {
    /// `SELECT COUNT(*)` over the rows this query returns.
    pub fn count(&self) -> Result<String> {
        self.count_column("*")
    }

    pub fn count_column(&self, column: &str) -> Result<String> {
        writer::render(&Count { query: self, column }, false)
    }

    /// One page of the query.
    ///
    /// Ungrouped queries are numbered with `ROW_NUMBER()` in a derived table.
    /// Grouped queries are first materialized into the paginator's temp
    /// table, then numbered and paged from there, and the temp table is
    /// dropped; the statements are separated by `; ` and run as one batch.
    pub fn paginate(&self, paginator: &Paginator) -> Result<String> {
        debug!(
            page_size = paginator.page_size,
            page_index = paginator.page_index,
            grouped = !self.group_by_fields().is_empty(),
            "paginate"
        );
        if self.group_by_fields().is_empty() {
            writer::render(&WindowPage { query: self, paginator }, false)
        } else {
            writer::render(&TempTablePage { query: self, paginator }, false)
        }
    }

    /// Pages over the distinct values of `field` instead of over rows: every
    /// row whose `field` value falls in the page window is returned.
    pub fn paginate_grouped_by<F: IntoField>(&self, paginator: &Paginator, field: F) -> Result<String> {
        let field = field.into_field();
        debug!(
            page_size = paginator.page_size,
            page_index = paginator.page_index,
            field = %field.name,
            "paginate by grouping column"
        );
        writer::render(
            &GroupingColumnPage {
                query: self,
                paginator,
                field: &field,
            },
            false,
        )
    }

    /// Validates the query and the window, returning the row offset.
    fn check_pageable<W: Write>(
        &self,
        context: &mut FormatContext<'_, W>,
        paginator: &Paginator,
    ) -> std::result::Result<usize, std::fmt::Error> {
        if self.sort_fields().is_empty() {
            return context.fail(Error::OrderByRequired);
        }
        if paginator.page_size < 1 {
            return context.fail(Error::InvalidPageSize(paginator.page_size));
        }
        let Some(offset) = paginator.offset() else {
            return context.fail(Error::PageOutOfRange {
                page_index: paginator.page_index,
                page_size: paginator.page_size,
            });
        };
        self.check_renderable(context)?;
        Ok(offset)
    }

    /// `SELECT ROW_NUMBER() OVER (ORDER BY ..) AS RowNumber, <fields> FROM ..`
    fn write_numbered<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        context.writer.write_str("SELECT ROW_NUMBER() OVER (ORDER BY ")?;
        self.write_sorts(context, true)?;
        context.writer.write_str(") AS RowNumber, ")?;
        self.write_projection(context)?;
        self.write_sources(context)?;
        self.write_where(context, true)
    }
}

struct Count<'a> {
    query: &'a SearchQuery,
    column: &'a str,
}

impl FormatWriter for Count<'_> {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        let query = self.query;
        let column = match self.column.trim() {
            "" => "*",
            column => column,
        };

        if !query.group_by_fields().is_empty() {
            write!(context.writer, "SELECT COUNT({}) FROM (", column)?;
            query.statement(false).format_writer(context)?;
            return context.writer.write_str(") AS count");
        }

        if query.tables().is_empty() {
            return context.fail(Error::NoFromTables);
        }
        write!(context.writer, "SELECT COUNT({}) AS count", column)?;
        query.write_sources(context)?;
        query.write_where(context, true)
    }
}

struct WindowPage<'a> {
    query: &'a SearchQuery,
    paginator: &'a Paginator,
}

impl FormatWriter for WindowPage<'_> {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        let (query, paginator) = (self.query, self.paginator);
        let offset = query.check_pageable(context, paginator)?;

        write!(context.writer, "SELECT TOP {} * FROM (", paginator.page_size)?;
        query.write_numbered(context)?;
        write!(context.writer, ") AS a WHERE RowNumber > {}", offset)?;

        if paginator.with_total_count {
            context.writer.write_str("; ")?;
            Count { query, column: "*" }.format_writer(context)?;
        }
        Ok(())
    }
}

struct TempTablePage<'a> {
    query: &'a SearchQuery,
    paginator: &'a Paginator,
}

impl FormatWriter for TempTablePage<'_> {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        let (query, paginator) = (self.query, self.paginator);
        let offset = query.check_pageable(context, paginator)?;

        let temp_table = paginator.temp_table_name();
        query.statement(true).materialize_into(&temp_table).format_writer(context)?;

        // the temp table exposes bare column names
        write!(context.writer, "; SELECT TOP {} * FROM (", paginator.page_size)?;
        context.writer.write_str("SELECT ROW_NUMBER() OVER (ORDER BY ")?;
        query.write_sorts(context, false)?;
        write!(
            context.writer,
            ") AS RowNumber, * FROM {}) r WHERE RowNumber > {}; DROP TABLE {}",
            temp_table,
            offset,
            temp_table
        )?;

        if paginator.with_total_count {
            context.writer.write_str("; ")?;
            Count { query, column: "*" }.format_writer(context)?;
        }
        Ok(())
    }
}

struct GroupingColumnPage<'a> {
    query: &'a SearchQuery,
    paginator: &'a Paginator,
    field: &'a Field,
}

impl GroupingColumnPage<'_> {
    /// The page window of distinct `field` values.
    fn write_window<W: Write>(&self, context: &mut FormatContext<'_, W>, offset: usize) -> std::fmt::Result {
        let (query, paginator) = (self.query, self.paginator);

        context.writer.write_str("SELECT TOP ")?;
        write!(context.writer, "{} ", paginator.page_size)?;
        self.field.write_name(context, false)?;
        context.writer.write_str(" FROM (")?;

        if query.group_by_fields().is_empty() {
            query.write_numbered(context)?;
        } else {
            // grouped rows are numbered over the grouped result
            context.writer.write_str("SELECT ROW_NUMBER() OVER (ORDER BY ")?;
            query.write_sorts(context, false)?;
            context.writer.write_str(") AS RowNumber, * FROM (")?;
            query.statement(false).format_writer(context)?;
            context.writer.write_str(") AS g")?;
        }

        write!(context.writer, ") AS a WHERE RowNumber > {} GROUP BY ", offset)?;
        self.field.write_name(context, false)
    }
}

impl FormatWriter for GroupingColumnPage<'_> {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        let (query, paginator) = (self.query, self.paginator);
        let offset = query.check_pageable(context, paginator)?;

        context.writer.write_str("SELECT * FROM (")?;
        query.statement(false).format_writer(context)?;
        context.writer.write_str(") AS results WHERE ")?;
        self.field.write_name(context, false)?;
        context.writer.write_str(" IN (")?;
        self.write_window(context, offset)?;
        context.writer.write_str(") ORDER BY ")?;
        query.write_sorts(context, false)?;

        if paginator.with_total_count {
            // derived tables only expose bare names
            let with_table = query.group_by_fields().is_empty();
            let column = context.capture(&DistinctColumn(self.field, with_table))?;
            context.writer.write_str("; ")?;
            Count { query, column: &column }.format_writer(context)?;
        }
        Ok(())
    }
}

struct DistinctColumn<'a>(&'a Field, bool);

impl FormatWriter for DistinctColumn<'_> {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        context.writer.write_str("DISTINCT ")?;
        self.0.write_name(context, self.1)
    }
}
