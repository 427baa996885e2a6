use std::fmt;

use crate::{
    ident::{Field, IntoField},
    writer::{self, FormatWriter},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FormatWriter for SortDirection {
    fn format_writer<W: fmt::Write>(
        &self,
        context: &mut writer::FormatContext<'_, W>,
    ) -> std::fmt::Result {
        match self {
            SortDirection::Ascending => context.writer.write_str("ASC"),
            SortDirection::Descending => context.writer.write_str("DESC"),
        }
    }
}

/// An `ORDER BY` entry.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SortField {
    pub field: Field,
    pub direction: SortDirection,
}

impl SortField {
    pub fn new<F: IntoField>(field: F, direction: SortDirection) -> Self {
        Self {
            field: field.into_field(),
            direction,
        }
    }

    pub fn asc<F: IntoField>(field: F) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    pub fn desc<F: IntoField>(field: F) -> Self {
        Self::new(field, SortDirection::Descending)
    }

    /// Parses `[table.]name [ASC|DESC]`.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (text, direction) = match text.rsplit_once(char::is_whitespace) {
            Some((head, tail)) if tail.eq_ignore_ascii_case("desc") => (head, SortDirection::Descending),
            Some((head, tail)) if tail.eq_ignore_ascii_case("asc") => (head, SortDirection::Ascending),
            _ => (text, SortDirection::Ascending),
        };
        Self {
            field: Field::parse(text),
            direction,
        }
    }

    pub fn parse_list(text: &str) -> Vec<Self> {
        crate::ident::split_top_level(text, ',')
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Self::parse)
            .collect()
    }

    pub(crate) fn write_sort<W: fmt::Write>(
        &self,
        context: &mut writer::FormatContext<'_, W>,
        with_table: bool,
    ) -> fmt::Result {
        self.field.write_name(context, with_table)?;
        context.writer.write_char(' ')?;
        self.direction.format_writer(context)
    }
}

impl FormatWriter for SortField {
    fn format_writer<W: fmt::Write>(
        &self,
        context: &mut writer::FormatContext<'_, W>,
    ) -> fmt::Result {
        self.write_sort(context, true)
    }
}

pub trait IntoSortField {
    fn into_sort_field(self) -> SortField;
}

impl IntoSortField for SortField {
    fn into_sort_field(self) -> SortField {
        self
    }
}

impl IntoSortField for &str {
    fn into_sort_field(self) -> SortField {
        SortField::parse(self)
    }
}

impl IntoSortField for String {
    fn into_sort_field(self) -> SortField {
        SortField::parse(&self)
    }
}

impl<F: IntoField> IntoSortField for (F, SortDirection) {
    fn into_sort_field(self) -> SortField {
        SortField::new(self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::format_writer;

    use super::*;

    #[test]
    fn test_parse_default_ascending() {
        let sort = SortField::parse("LastName");
        assert_eq!(SortDirection::Ascending, sort.direction);
        assert_eq!("LastName ASC", format_writer(sort, false));
    }

    #[test]
    fn test_parse_desc_any_case() {
        let sort = SortField::parse("c.CreatedAt desc");
        assert_eq!(SortDirection::Descending, sort.direction);
        assert_eq!("CreatedAt", sort.field.name);
        assert_eq!("c.CreatedAt DESC", format_writer(&sort, false));
    }

    #[test]
    fn test_parse_explicit_asc() {
        let sort = SortField::parse("Id ASC");
        assert_eq!(SortDirection::Ascending, sort.direction);
        assert_eq!("Id", sort.field.name);
    }

    #[test]
    fn test_parse_function_direction() {
        let sort = SortField::parse("COUNT(*) DESC");
        assert_eq!(SortDirection::Descending, sort.direction);
        assert_eq!("COUNT(*) DESC", format_writer(sort, false));
    }

    #[test]
    fn test_parse_list() {
        let sorts = SortField::parse_list("LastName DESC, FirstName");
        assert_eq!(2, sorts.len());
        assert_eq!(SortDirection::Descending, sorts[0].direction);
        assert_eq!("FirstName ASC", format_writer(&sorts[1], false));
    }
}
