use std::{fmt::Write, str::FromStr};

use smol_str::SmolStr;

use crate::{
    classify::classify,
    error::{Error, Result},
    expr::{Condition, Conjunction, Group, IntoCondition, IntoInList, IntoSortField, Membership, SortDirection, SortField},
    ident::{Field, IntoField, IntoFields, IntoTable, Selected, Table},
    join::{JoinKind, JoinTable},
    raw::Raw,
    writer::{self, FormatContext, FormatWriter},
};

/// A T-SQL `SELECT` statement as an editable object graph.
///
/// Built either by parsing text with [`SearchQuery::parse`] or by chaining
/// the builder methods, then rendered with [`SearchQuery::to_sql`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchQuery {
    select: Vec<Field>,
    is_select_all: bool,
    into: Option<SmolStr>,
    from: Vec<Table>,
    joins: Vec<JoinTable>,
    r#where: Option<Condition>,
    group_by: Vec<Field>,
    having: Option<Condition>,
    order_by: Vec<SortField>,
    top: Option<u32>,
    ignore_empty_condition_value: bool,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a select statement.
    ///
    /// `WHERE` and `HAVING` text is kept as a raw condition; use
    /// [`Condition::parse`] to get a structured leaf out of a fragment.
    pub fn parse(sql: &str) -> Result<Self> {
        let buffers = classify(sql)?;
        let mut query = Self::new();

        query.top = buffers.top;
        let select = buffers.select.trim();
        if select == "*" {
            query.is_select_all = true;
        } else {
            query.select = Field::parse_list(select);
        }

        let into = buffers.into.trim();
        if !into.is_empty() {
            query.into = Some(SmolStr::new(into));
        }

        query.from = Table::parse_list(&buffers.from);
        query.joins = JoinTable::parse_list(&buffers.join)?;
        query.r#where = raw_condition(&buffers.r#where);
        query.group_by = Field::parse_list(&buffers.group_by);
        query.having = raw_condition(&buffers.having);
        query.order_by = SortField::parse_list(&buffers.order_by);

        Ok(query)
    }

    /// Assembles a query out of clause fragments. Lists are comma separated
    /// and an empty `where_text` leaves the query unfiltered.
    pub fn build(select: &str, from: &str, where_text: &str, order_by: &str) -> Self {
        let mut query = Self::new();
        if select.trim() == "*" {
            query.is_select_all = true;
        } else {
            query.select = Field::parse_list(select);
        }
        query.from = Table::parse_list(from);
        query.r#where = raw_condition(where_text);
        query.order_by = SortField::parse_list(order_by);
        query
    }

    /// Has a projection and at least one source table.
    pub fn is_complete(&self) -> bool {
        (self.is_select_all || !self.select.is_empty()) && !self.from.is_empty()
    }

    // accessors

    pub fn fields(&self) -> &[Field] {
        &self.select
    }

    pub fn fields_mut(&mut self) -> &mut Vec<Field> {
        &mut self.select
    }

    pub fn is_select_all(&self) -> bool {
        self.is_select_all
    }

    pub fn tables(&self) -> &[Table] {
        &self.from
    }

    pub fn tables_mut(&mut self) -> &mut Vec<Table> {
        &mut self.from
    }

    pub fn joins(&self) -> &[JoinTable] {
        &self.joins
    }

    pub fn joins_mut(&mut self) -> &mut Vec<JoinTable> {
        &mut self.joins
    }

    pub fn where_condition(&self) -> Option<&Condition> {
        self.r#where.as_ref()
    }

    pub fn where_condition_mut(&mut self) -> &mut Option<Condition> {
        &mut self.r#where
    }

    pub fn group_by_fields(&self) -> &[Field] {
        &self.group_by
    }

    pub fn group_by_fields_mut(&mut self) -> &mut Vec<Field> {
        &mut self.group_by
    }

    pub fn having_condition(&self) -> Option<&Condition> {
        self.having.as_ref()
    }

    pub fn having_condition_mut(&mut self) -> &mut Option<Condition> {
        &mut self.having
    }

    pub fn sort_fields(&self) -> &[SortField] {
        &self.order_by
    }

    pub fn sort_fields_mut(&mut self) -> &mut Vec<SortField> {
        &mut self.order_by
    }

    pub fn top_rows(&self) -> Option<u32> {
        self.top
    }

    pub fn temp_table(&self) -> Option<&str> {
        self.into.as_deref()
    }

    pub fn ignores_empty_condition_value(&self) -> bool {
        self.ignore_empty_condition_value
    }

    // select stuff

    /// Replaces the projection.
    pub fn select<T: IntoFields>(&mut self, fields: T) -> &mut Self {
        self.select = fields.into_fields();
        self.is_select_all = false;
        self
    }

    pub fn add_select<T: IntoFields>(&mut self, fields: T) -> &mut Self {
        self.select.append(&mut fields.into_fields());
        self.is_select_all = false;
        self
    }

    pub fn select_all(&mut self) -> &mut Self {
        self.select.clear();
        self.is_select_all = true;
        self
    }

    pub fn top(&mut self, rows: u32) -> &mut Self {
        self.top = Some(rows);
        self
    }

    /// Adds `INTO #temp_table`, materializing the result.
    pub fn select_into<N: Into<SmolStr>>(&mut self, temp_table: N) -> &mut Self {
        self.into = Some(temp_table.into());
        self
    }

    // sources

    pub fn from<T: IntoTable>(&mut self, table: T) -> &mut Self {
        self.from.push(table.into_table());
        self
    }

    pub fn join(&mut self, join: JoinTable) -> &mut Self {
        self.joins.push(join);
        self
    }

    pub fn inner_join<T, L, F>(&mut self, table: T, local_field: L, foreign_field: F) -> &mut Self
    where
        T: IntoTable,
        L: IntoField,
        F: IntoField,
    {
        self.join(JoinTable::new(JoinKind::Inner, table, local_field, foreign_field))
    }

    pub fn left_join<T, L, F>(&mut self, table: T, local_field: L, foreign_field: F) -> &mut Self
    where
        T: IntoTable,
        L: IntoField,
        F: IntoField,
    {
        self.join(JoinTable::new(JoinKind::LeftOuter, table, local_field, foreign_field))
    }

    // where stuff

    pub fn set_where<C: IntoCondition>(&mut self, condition: C) -> &mut Self {
        self.r#where = Some(condition.into_condition());
        self
    }

    pub fn and_where<C: IntoCondition>(&mut self, condition: C) -> &mut Self {
        combine(&mut self.r#where, Conjunction::And, condition.into_condition());
        self
    }

    pub fn or_where<C: IntoCondition>(&mut self, condition: C) -> &mut Self {
        combine(&mut self.r#where, Conjunction::Or, condition.into_condition());
        self
    }

    pub fn where_in<F: IntoField, L: IntoInList>(&mut self, field: F, list: L) -> &mut Self {
        self.and_where(Membership::new(field, list))
    }

    pub fn where_not_in<F: IntoField, L: IntoInList>(&mut self, field: F, list: L) -> &mut Self {
        self.and_where(Membership::not_in(field, list))
    }

    /// Comparisons without a value are dropped from `WHERE`/`HAVING`
    /// instead of rendering as a null test.
    pub fn ignore_empty_condition_value(&mut self, ignore: bool) -> &mut Self {
        self.ignore_empty_condition_value = ignore;
        self
    }

    // grouping

    pub fn group_by<T: IntoFields>(&mut self, fields: T) -> &mut Self {
        self.group_by.append(&mut fields.into_fields());
        self
    }

    pub fn set_having<C: IntoCondition>(&mut self, condition: C) -> &mut Self {
        self.having = Some(condition.into_condition());
        self
    }

    pub fn and_having<C: IntoCondition>(&mut self, condition: C) -> &mut Self {
        combine(&mut self.having, Conjunction::And, condition.into_condition());
        self
    }

    pub fn or_having<C: IntoCondition>(&mut self, condition: C) -> &mut Self {
        combine(&mut self.having, Conjunction::Or, condition.into_condition());
        self
    }

    // ordering

    pub fn order_by<S: IntoSortField>(&mut self, sort: S) -> &mut Self {
        self.order_by.push(sort.into_sort_field());
        self
    }

    pub fn order_by_desc<F: IntoField>(&mut self, field: F) -> &mut Self {
        self.order_by.push(SortField::new(field, SortDirection::Descending));
        self
    }

    pub fn reset_order_by(&mut self) -> &mut Self {
        self.order_by.clear();
        self
    }

    // building the query

    pub(crate) fn statement(&self, include_order_by: bool) -> Statement<'_> {
        Statement {
            query: self,
            include_order_by,
            into: self.into.as_deref(),
        }
    }

    pub fn to_sql(&self) -> Result<String> {
        writer::render(&self.statement(true), false)
    }

    /// The statement without its `ORDER BY`, as nested in derived tables.
    pub fn to_sql_without_order_by(&self) -> Result<String> {
        writer::render(&self.statement(false), false)
    }

    pub(crate) fn check_renderable<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        if self.from.is_empty() {
            return context.fail(Error::NoFromTables);
        }
        if !self.is_select_all && self.select.is_empty() {
            return context.fail(Error::NoSelectFields);
        }
        Ok(())
    }

    /// `*` or the field list with aliases.
    pub(crate) fn write_projection<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        if self.is_select_all {
            return context.writer.write_char('*');
        }
        context.write_each(&self.select, ", ", |context, field| Selected(field).format_writer(context))
    }

    /// `FROM` tables followed by the joins.
    pub(crate) fn write_sources<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        context.writer.write_str(" FROM ")?;
        context.write_list(&self.from, ", ")?;
        if !self.joins.is_empty() {
            context.writer.write_char(' ')?;
            context.write_list(&self.joins, " ")?;
        }
        Ok(())
    }

    pub(crate) fn write_where<W: Write>(&self, context: &mut FormatContext<'_, W>, ignore_empty: bool) -> std::fmt::Result {
        write_condition(context, " WHERE ", self.r#where.as_ref(), ignore_empty)
    }

    pub(crate) fn write_sorts<W: Write>(&self, context: &mut FormatContext<'_, W>, with_table: bool) -> std::fmt::Result {
        context.write_each(&self.order_by, ", ", |context, sort| sort.write_sort(context, with_table))
    }
}

fn raw_condition(text: &str) -> Option<Condition> {
    let raw = Raw::new(text.trim());
    (!raw.is_empty()).then_some(Condition::Raw(raw))
}

/// Appends `condition` to the group held in `slot`, wrapping whatever is
/// there when its conjunction differs.
fn combine(slot: &mut Option<Condition>, conjunction: Conjunction, condition: Condition) {
    let combined = match slot.take() {
        None => condition,
        Some(Condition::Group(mut group)) if group.conjunction == conjunction => {
            group.conditions.push(condition);
            Condition::Group(group)
        }
        Some(existing) => Condition::Group(Group::new(conjunction).with(existing).with(condition)),
    };
    *slot = Some(combined);
}

fn write_condition<W: Write>(
    context: &mut FormatContext<'_, W>,
    keyword: &str,
    condition: Option<&Condition>,
    ignore_empty: bool,
) -> std::fmt::Result {
    let Some(condition) = condition else {
        return Ok(());
    };
    let sql = context.capture_with(ignore_empty, condition)?;
    if !sql.is_empty() {
        context.writer.write_str(keyword)?;
        context.writer.write_str(&sql)?;
    }
    Ok(())
}

impl FromStr for SearchQuery {
    type Err = Error;

    fn from_str(sql: &str) -> Result<Self> {
        Self::parse(sql)
    }
}

/// One rendering of a query: with or without `ORDER BY`, and with the
/// `INTO` target possibly overridden.
pub(crate) struct Statement<'a> {
    query: &'a SearchQuery,
    include_order_by: bool,
    into: Option<&'a str>,
}

impl<'a> Statement<'a> {
    pub(crate) fn materialize_into(mut self, temp_table: &'a str) -> Self {
        self.into = Some(temp_table);
        self
    }
}

impl FormatWriter for Statement<'_> {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        let query = self.query;
        query.check_renderable(context)?;

        context.writer.write_str("SELECT ")?;
        if let Some(top) = query.top {
            write!(context.writer, "TOP {} ", top)?;
        }
        query.write_projection(context)?;

        let into = self.into.map(|into| into.trim().trim_start_matches('#'));
        if let Some(into) = into.filter(|into| !into.is_empty()) {
            write!(context.writer, " INTO #{}", into)?;
        }

        query.write_sources(context)?;
        query.write_where(context, query.ignore_empty_condition_value)?;

        if !query.group_by.is_empty() {
            context.writer.write_str(" GROUP BY ")?;
            context.write_list(&query.group_by, ", ")?;
        }

        write_condition(context, " HAVING ", query.having.as_ref(), query.ignore_empty_condition_value)?;

        if self.include_order_by && !query.order_by.is_empty() {
            context.writer.write_str(" ORDER BY ")?;
            query.write_sorts(context, true)?;
        }

        Ok(())
    }
}

impl FormatWriter for SearchQuery {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        self.statement(true).format_writer(context)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Comparison, Operator, tests::format_writer};

    use super::*;

    #[test]
    fn test_parse_and_render() {
        let query = SearchQuery::parse("SELECT FirstName, LastName FROM Customer WHERE Age > 18 ORDER BY LastName").unwrap();
        assert_eq!(
            "SELECT FirstName, LastName FROM Customer WHERE Age > 18 ORDER BY LastName ASC",
            query.to_sql().unwrap()
        );
    }

    #[test]
    fn test_render_every_clause() {
        let sql = "SELECT TOP 3 c.Id, c.Name AS Customer, COUNT(o.Id) INTO #totals FROM Customer c \
                   INNER JOIN Orders o ON o.CustomerId = c.Id \
                   WHERE c.Active = 1 GROUP BY c.Id, c.Name HAVING COUNT(o.Id) > 2 ORDER BY c.Name DESC";
        let query = SearchQuery::parse(sql).unwrap();
        assert_eq!(Some(3), query.top_rows());
        assert_eq!(Some("#totals"), query.temp_table());
        assert_eq!(
            "SELECT TOP 3 c.Id, c.Name AS Customer, COUNT(o.Id) INTO #totals FROM Customer c \
             INNER JOIN Orders o ON o.CustomerId = c.Id WHERE c.Active = 1 GROUP BY c.Id, c.Name \
             HAVING COUNT(o.Id) > 2 ORDER BY c.Name DESC",
            query.to_sql().unwrap()
        );
        assert_eq!(
            "SELECT TOP 3 c.Id, c.Name AS Customer, COUNT(o.Id) INTO #totals FROM Customer c \
             INNER JOIN Orders o ON o.CustomerId = c.Id WHERE c.Active = 1 GROUP BY c.Id, c.Name \
             HAVING COUNT(o.Id) > 2",
            query.to_sql_without_order_by().unwrap()
        );
    }

    #[test]
    fn test_round_trip() {
        let mut query = SearchQuery::new();
        query
            .select("c.Id, c.FirstName AS Name, COUNT(o.Id)")
            .from("Customer c")
            .left_join("Orders o", "o.CustomerId", "c.Id")
            .and_where(Comparison::new("c.Age", Operator::Gte, 21))
            .order_by("c.FirstName")
            .order_by_desc("c.Id");

        let parsed = SearchQuery::parse(&query.to_sql().unwrap()).unwrap();
        assert_eq!(query.tables(), parsed.tables());
        assert_eq!(query.fields(), parsed.fields());
        assert_eq!(query.joins(), parsed.joins());
        assert_eq!(query.sort_fields(), parsed.sort_fields());
        assert_eq!(query.to_sql().unwrap(), parsed.to_sql().unwrap());
    }

    #[test]
    fn test_render_is_idempotent() {
        let query = SearchQuery::parse("select * from Orders o where o.Total > 10 order by o.Id").unwrap();
        let first = query.to_sql().unwrap();
        assert_eq!(first, query.to_sql().unwrap());
        assert_eq!(first, format_writer(&query, false));
    }

    #[test]
    fn test_select_all() {
        let query = SearchQuery::parse("SELECT * FROM Orders").unwrap();
        assert!(query.is_select_all());
        assert!(query.fields().is_empty());
        assert!(query.is_complete());
        assert_eq!("SELECT * FROM Orders", query.to_sql().unwrap());
    }

    #[test]
    fn test_preconditions() {
        let mut query = SearchQuery::new();
        query.select("Id");
        assert!(matches!(query.to_sql(), Err(Error::NoFromTables)));
        assert!(!query.is_complete());

        let mut query = SearchQuery::new();
        query.from("Customer");
        assert!(matches!(query.to_sql(), Err(Error::NoSelectFields)));
        query.select_all();
        assert_eq!("SELECT * FROM Customer", query.to_sql().unwrap());
    }

    #[test]
    fn test_where_combinators() {
        let mut query = SearchQuery::new();
        query
            .select("Id")
            .from("Customer")
            .and_where("Age > 18")
            .and_where(Comparison::new("City", Operator::Eq, "Paris"))
            .or_where(Comparison::new("Vip", Operator::Eq, true));
        assert_eq!(
            "SELECT Id FROM Customer WHERE (Age > 18 AND City = 'Paris') OR Vip = 1",
            query.to_sql().unwrap()
        );
    }

    #[test]
    fn test_where_in() {
        let mut inner = SearchQuery::new();
        inner.select("CustomerId").from("Orders").order_by("CustomerId");
        let mut query = SearchQuery::new();
        query.select("Name").from("Customer").where_in("Id", inner).where_not_in("Status", ["closed", "banned"]);
        assert_eq!(
            "SELECT Name FROM Customer WHERE Id IN (SELECT CustomerId FROM Orders) AND Status NOT IN ('closed','banned')",
            query.to_sql().unwrap()
        );
    }

    #[test]
    fn test_empty_where_is_omitted() {
        let mut query = SearchQuery::new();
        query
            .select("Id")
            .from("Customer")
            .ignore_empty_condition_value(true)
            .and_where(Comparison::new("Name", Operator::Like, ""))
            .and_where(Comparison::new("City", Operator::Eq, None::<String>));
        assert_eq!("SELECT Id FROM Customer", query.to_sql().unwrap());

        query.ignore_empty_condition_value(false);
        assert_eq!(
            "SELECT Id FROM Customer WHERE Name LIKE '%%' AND City IS NULL",
            query.to_sql().unwrap()
        );
    }

    #[test]
    fn test_build() {
        let query = SearchQuery::build("Id, Name", "Customer c", "", "Name DESC");
        assert_eq!("SELECT Id, Name FROM Customer c ORDER BY Name DESC", query.to_sql().unwrap());
        let query = SearchQuery::build("*", "Customer", "Age > 18", "");
        assert_eq!("SELECT * FROM Customer WHERE Age > 18", query.to_sql().unwrap());
    }

    #[test]
    fn test_into_strips_hash() {
        let mut query = SearchQuery::new();
        query.select_all().select_into("##scratch").from("Orders");
        assert_eq!("SELECT * INTO #scratch FROM Orders", query.to_sql().unwrap());
    }

    #[test]
    fn test_sub_query_field() {
        let query = SearchQuery::parse(
            "SELECT c.Id, Orders = (SELECT COUNT(*) FROM Orders o WHERE o.CustomerId = c.Id) FROM Customer c",
        )
        .unwrap();
        assert_eq!(2, query.fields().len());
        assert!(query.fields()[1].sub_query.is_some());
        assert_eq!(
            "SELECT c.Id, Orders = (SELECT COUNT(*) FROM Orders o WHERE o.CustomerId = c.Id) FROM Customer c",
            query.to_sql().unwrap()
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            SearchQuery::parse("SELECT * FROM a RIGHT JOIN b ON b.Id = a.Id"),
            Err(Error::UnknownJoinKind(_))
        ));
        assert!(matches!("SELECT TOP many * FROM a".parse::<SearchQuery>(), Err(Error::InvalidTop(_))));
    }
}
