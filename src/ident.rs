use std::fmt::Write;

use smol_str::SmolStr;

use crate::{
    builder::SearchQuery,
    error::Result,
    writer::{self, FormatContext, FormatWriter},
};

/// A selected, grouped or compared column, e.g. `c.FirstName AS Name`.
///
/// Text containing a function call is kept verbatim in `name` and never
/// qualified or aliased.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Field {
    pub name: SmolStr,
    pub table: Option<SmolStr>,
    pub alias: Option<SmolStr>,
    /// Nested query of a `name = (SELECT ...)` projection.
    pub sub_query: Option<Box<SearchQuery>>,
}

impl Field {
    pub fn new<T>(name: T) -> Self
    where
        T: Into<SmolStr>,
    {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn qualified<T, N>(table: T, name: N) -> Self
    where
        T: Into<SmolStr>,
        N: Into<SmolStr>,
    {
        Self {
            name: name.into(),
            table: Some(table.into()),
            ..Default::default()
        }
    }

    pub fn aliased<A: Into<SmolStr>>(mut self, alias: A) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.contains(" (") {
            return Self::parse_sub_query(text).unwrap_or_else(|| Self::new(text));
        }
        if text.contains('(') {
            return Self::new(text);
        }

        let (table, rest) = match text.split_once('.') {
            Some((table, rest)) => (Some(SmolStr::new(table.trim())), rest),
            None => (None, text),
        };
        let (name, alias) = split_alias(rest);
        Self {
            name: SmolStr::new(name.trim()),
            table,
            alias: alias.map(|alias| SmolStr::new(alias.trim())),
            sub_query: None,
        }
    }

    /// Parses a comma separated list, commas inside parentheses included.
    pub fn parse_list(text: &str) -> Vec<Self> {
        split_top_level(text, ',')
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Self::parse)
            .collect()
    }

    fn parse_sub_query(text: &str) -> Option<Self> {
        let parts = split_top_level(text, '=');
        let [name, query] = parts.as_slice() else {
            return None;
        };
        let query = query.trim().strip_prefix('(')?.strip_suffix(')')?;
        let sub_query = SearchQuery::parse(query).ok().filter(SearchQuery::is_complete)?;
        Some(Self {
            name: SmolStr::new(name.trim()),
            sub_query: Some(Box::new(sub_query)),
            ..Default::default()
        })
    }

    pub fn is_function(&self) -> bool {
        self.name.contains('(')
    }

    /// Writes `table.name` (or bare `name`), plus the sub query if any.
    pub(crate) fn write_name<W: Write>(&self, context: &mut FormatContext<'_, W>, with_table: bool) -> std::fmt::Result {
        match self.table {
            Some(ref table) if with_table && !table.is_empty() => {
                write!(context.writer, "{}.{}", table, self.name)?;
            }
            _ => context.writer.write_str(&self.name)?,
        }
        if let Some(ref sub_query) = self.sub_query {
            context.writer.write_str(" = (")?;
            let sql = context.capture(sub_query)?;
            context.writer.write_str(&sql)?;
            context.writer.write_char(')')?;
        }
        Ok(())
    }

    /// Projection form, with the alias.
    pub(crate) fn write_select<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        self.write_name(context, true)?;
        match self.alias {
            Some(ref alias) if !alias.is_empty() => write!(context.writer, " AS {}", alias),
            _ => Ok(()),
        }
    }

    pub fn to_sql(&self) -> Result<String> {
        writer::render(self, false)
    }

    pub fn to_select_sql(&self) -> Result<String> {
        writer::render(&Selected(self), false)
    }
}

impl FormatWriter for Field {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        self.write_name(context, true)
    }
}

pub(crate) struct Selected<'a>(pub(crate) &'a Field);

impl FormatWriter for Selected<'_> {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        self.0.write_select(context)
    }
}

/// A `FROM` or joined table, with an optional alias: `Customer c`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Table {
    pub name: SmolStr,
    pub alias: Option<SmolStr>,
}

impl Table {
    pub fn new<T>(name: T) -> Self
    where
        T: Into<SmolStr>,
    {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased<A: Into<SmolStr>>(mut self, alias: A) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn parse(text: &str) -> Self {
        let mut bits = text.split_whitespace();
        let name = bits.next().unwrap_or_default();
        let alias = match bits.next() {
            Some(word) if word.eq_ignore_ascii_case("as") => bits.next(),
            other => other,
        };
        Self {
            name: SmolStr::new(name),
            alias: alias.map(SmolStr::new),
        }
    }

    pub fn parse_list(text: &str) -> Vec<Self> {
        split_top_level(text, ',')
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Self::parse)
            .collect()
    }
}

impl FormatWriter for Table {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        context.writer.write_str(&self.name)?;
        match self.alias {
            Some(ref alias) if !alias.is_empty() => write!(context.writer, " {}", alias),
            _ => Ok(()),
        }
    }
}

pub trait IntoField {
    fn into_field(self) -> Field;
}

impl IntoField for Field {
    fn into_field(self) -> Field {
        self
    }
}

impl IntoField for &str {
    #[inline]
    fn into_field(self) -> Field {
        Field::parse(self)
    }
}

impl IntoField for &String {
    #[inline]
    fn into_field(self) -> Field {
        Field::parse(self)
    }
}

impl IntoField for String {
    #[inline]
    fn into_field(self) -> Field {
        Field::parse(&self)
    }
}

impl IntoField for SmolStr {
    #[inline]
    fn into_field(self) -> Field {
        Field::parse(&self)
    }
}

pub trait IntoFields {
    fn into_fields(self) -> Vec<Field>;
}

impl IntoFields for &str {
    fn into_fields(self) -> Vec<Field> {
        Field::parse_list(self)
    }
}

impl IntoFields for String {
    fn into_fields(self) -> Vec<Field> {
        Field::parse_list(&self)
    }
}

impl IntoFields for Field {
    fn into_fields(self) -> Vec<Field> {
        vec![self]
    }
}

impl<T: IntoField> IntoFields for Vec<T> {
    fn into_fields(self) -> Vec<Field> {
        self.into_iter().map(IntoField::into_field).collect()
    }
}

impl<T: IntoField, const N: usize> IntoFields for [T; N] {
    fn into_fields(self) -> Vec<Field> {
        self.into_iter().map(IntoField::into_field).collect()
    }
}

pub trait IntoTable {
    fn into_table(self) -> Table;
}

impl IntoTable for Table {
    fn into_table(self) -> Table {
        self
    }
}

impl IntoTable for &str {
    fn into_table(self) -> Table {
        Table::parse(self)
    }
}

impl IntoTable for String {
    fn into_table(self) -> Table {
        Table::parse(&self)
    }
}

pub(crate) fn split_alias(s: &str) -> (&str, Option<&str>) {
    if let Some(idx) = find_word(s, "as") {
        let left = &s[..idx];
        let right = &s[idx + 4..];
        (left, Some(right))
    } else {
        (s, None)
    }
}

/// Return the byte index of ` word ` in `h`, ascii case insensitive, with
/// no allocations.
pub(crate) fn find_word(h: &str, word: &str) -> Option<usize> {
    let h = h.as_bytes();
    let word = word.as_bytes();
    let len = word.len() + 2;
    if h.len() < len {
        return None;
    }
    h.windows(len).position(|w| {
        w[0] == b' ' && w[len - 1] == b' ' && w[1..len - 1].eq_ignore_ascii_case(word)
    })
}

/// Net parenthesis nesting change contributed by `text`.
pub(crate) fn paren_delta(text: &str) -> i32 {
    text.chars().fold(0, |depth, char| match char {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

/// Split on `sep`, ignoring separators nested in parentheses.
pub(crate) fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (index, char) in text.char_indices() {
        match char {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&text[start..index]);
                start = index + char.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use crate::tests::format_writer;

    use super::*;

    #[test]
    fn test_find_word() {
        let matches = "users as u";
        assert_eq!(find_word(matches, "as"), Some(5));
        assert_eq!(find_word("users", "as"), None);
        assert_eq!(find_word("users AS u as bob", "as"), Some(5));
        assert_eq!(find_word("a.Id = b.Id", "on"), None);
        assert_eq!(find_word("Orders o On o.Id = 1", "on"), Some(8));
    }

    #[test]
    fn test_parse_plain_field() {
        let field = Field::parse("FirstName");
        assert_eq!("FirstName", field.name);
        assert_eq!(None, field.table);
        assert_eq!(None, field.alias);
    }

    #[test]
    fn test_parse_qualified_alias() {
        let field = Field::parse(" c.FirstName As Given ");
        assert_eq!("FirstName", field.name);
        assert_eq!(Some(SmolStr::new("c")), field.table);
        assert_eq!(Some(SmolStr::new("Given")), field.alias);
        assert_eq!("c.FirstName AS Given", format_writer(Selected(&field), false));
        assert_eq!("c.FirstName", format_writer(&field, false));
    }

    #[test]
    fn test_parse_function_verbatim() {
        let field = Field::parse("COUNT(o.Id) AS Total");
        assert_eq!("COUNT(o.Id) AS Total", field.name);
        assert_eq!(None, field.table);
        assert_eq!(None, field.alias);
        assert!(field.is_function());
    }

    #[test]
    fn test_parse_sub_query_field() {
        let field = Field::parse("Total = (SELECT COUNT(*) FROM Orders o WHERE o.CustomerId = c.Id)");
        assert_eq!("Total", field.name);
        assert!(field.sub_query.is_some());
        assert_eq!(
            "Total = (SELECT COUNT(*) FROM Orders o WHERE o.CustomerId = c.Id)",
            format_writer(&field, false)
        );
    }

    #[test]
    fn test_parse_broken_sub_query_is_verbatim() {
        let field = Field::parse("COUNT (*)");
        assert_eq!("COUNT (*)", field.name);
        assert!(field.sub_query.is_none());
    }

    #[test]
    fn test_parse_list_keeps_function_args() {
        let fields = Field::parse_list("Id, COALESCE(Name, 'x'), c.Age");
        assert_eq!(3, fields.len());
        assert_eq!("COALESCE(Name, 'x')", fields[1].name);
        assert_eq!(Some(SmolStr::new("c")), fields[2].table);
    }

    #[test]
    fn test_table_parse() {
        assert_eq!(Table::new("Customer").aliased("c"), Table::parse("Customer c"));
        assert_eq!(Table::new("Customer").aliased("c"), Table::parse("Customer AS c"));
        assert_eq!(Table::new("Customer"), Table::parse(" Customer "));
        assert_eq!("Customer c", format_writer(Table::parse("Customer  c"), false));
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(vec!["a", " f(b, c)", " d"], split_top_level("a, f(b, c), d", ','));
        assert_eq!(vec!["x "], split_top_level("x ", ','));
    }

    #[test]
    fn test_split_alias() {
        assert_eq!(("c.Name", Some("Customer")), split_alias("c.Name AS Customer"));
        assert_eq!(("COUNT(*)", Some("total")), split_alias("COUNT(*) as total"));
        assert_eq!(("Alias", None), split_alias("Alias"));
    }
}
