use crate::{
    bind::{Bind, Binds},
    builder::SearchQuery,
    error::{Error, Result},
    ident::{Field, IntoField, find_word},
    writer::FormatWriter,
};

use super::list::{InList, IntoInList};

/// `field [NOT] IN (...)` against a value list or a nested query.
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    pub field: Field,
    pub list: InList,
    pub is_negated: bool,
}

impl Membership {
    pub fn new<F, L>(field: F, list: L) -> Self
    where
        F: IntoField,
        L: IntoInList,
    {
        Self {
            field: field.into_field(),
            list: list.into_in_list(),
            is_negated: false,
        }
    }

    pub fn not_in<F, L>(field: F, list: L) -> Self
    where
        F: IntoField,
        L: IntoInList,
    {
        Self::new(field, list).negated(true)
    }

    pub fn negated(mut self, is_negated: bool) -> Self {
        self.is_negated = is_negated;
        self
    }

    /// Parses `field [NOT] IN (SELECT ...)` or `field [NOT] IN (1, 'a', ...)`.
    pub fn parse(text: &str) -> Result<Self> {
        let index = find_word(text, "in").ok_or_else(|| Error::BadInFormat(text.to_owned()))?;
        let (lhs, rhs) = (&text[..index], &text[index + 4..]);

        let lhs = lhs.trim();
        let (lhs, is_negated) = match lhs.len().checked_sub(4).and_then(|at| lhs.get(at..)) {
            Some(tail) if tail.eq_ignore_ascii_case(" not") => (&lhs[..lhs.len() - 4], true),
            _ => (lhs, false),
        };

        let rhs = rhs.trim();
        let inner = rhs
            .strip_prefix('(')
            .and_then(|rhs| rhs.strip_suffix(')'))
            .unwrap_or(rhs)
            .trim();
        let is_query = inner
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("select"));
        let list = if is_query {
            InList::Subquery(Box::new(SearchQuery::parse(inner)?))
        } else {
            InList::Binds(parse_values(inner).ok_or_else(|| Error::BadInFormat(text.to_owned()))?)
        };

        Ok(Self {
            field: Field::parse(lhs),
            list,
            is_negated,
        })
    }
}

fn parse_values(text: &str) -> Option<Binds> {
    let mut binds = Binds::None;
    for value in text.split(',').map(str::trim).filter(|value| !value.is_empty()) {
        let bind = if let Some(quoted) = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
            Bind::String(quoted.replace("''", "'"))
        } else if let Ok(int) = value.parse::<i64>() {
            Bind::I64(int)
        } else if let Ok(float) = value.parse::<f64>() {
            Bind::F64(float)
        } else if value.eq_ignore_ascii_case("null") {
            Bind::Null
        } else {
            return None;
        };
        binds.push(bind);
    }
    Some(binds)
}

impl FormatWriter for Membership {
    fn format_writer<W: std::fmt::Write>(
        &self,
        context: &mut crate::writer::FormatContext<'_, W>,
    ) -> std::fmt::Result {
        // an empty value list has nothing to test against
        if self.list.is_empty() {
            return Ok(());
        }
        self.field.format_writer(context)?;
        if self.is_negated {
            context.writer.write_str(" NOT IN (")?;
        } else {
            context.writer.write_str(" IN (")?;
        }
        self.list.format_writer(context)?;
        context.writer.write_char(')')?;
        Ok(())
    }
}
