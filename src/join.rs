use std::fmt::Write;

use crate::{
    error::{Error, Result},
    ident::{Field, IntoField, IntoTable, Table, find_word, paren_delta},
    writer::{self, FormatContext, FormatWriter},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    #[default]
    Inner,
    LeftOuter,
}

impl JoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
        }
    }
}

impl FormatWriter for JoinKind {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        context.writer.write_str(self.as_str())
    }
}

/// One joined table and its equality predicate:
/// `INNER JOIN Orders o ON o.CustomerId = c.Id`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTable {
    pub table: Table,
    pub kind: JoinKind,
    pub local_field: Field,
    pub foreign_field: Field,
}

impl JoinTable {
    pub fn new<T, L, F>(kind: JoinKind, table: T, local_field: L, foreign_field: F) -> Self
    where
        T: IntoTable,
        L: IntoField,
        F: IntoField,
    {
        Self {
            table: table.into_table(),
            kind,
            local_field: local_field.into_field(),
            foreign_field: foreign_field.into_field(),
        }
    }

    pub fn inner<T, L, F>(table: T, local_field: L, foreign_field: F) -> Self
    where
        T: IntoTable,
        L: IntoField,
        F: IntoField,
    {
        Self::new(JoinKind::Inner, table, local_field, foreign_field)
    }

    pub fn left<T, L, F>(table: T, local_field: L, foreign_field: F) -> Self
    where
        T: IntoTable,
        L: IntoField,
        F: IntoField,
    {
        Self::new(JoinKind::LeftOuter, table, local_field, foreign_field)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let (front, back) = match find_word(text, "on") {
            Some(index) => (&text[..index], &text[index + 4..]),
            None => return Err(Error::InvalidJoinPredicate(text.to_owned())),
        };

        let (kind, table) = strip_join_kind(front).ok_or_else(|| Error::UnknownJoinKind(front.trim().to_owned()))?;

        let mut sides = vec![String::new()];
        let mut depth = 0;
        for word in back.split_whitespace() {
            depth += paren_delta(word);
            if depth == 0 && word == "=" {
                sides.push(String::new());
                continue;
            }
            let side = sides.last_mut().ok_or_else(|| Error::InvalidJoinPredicate(back.to_owned()))?;
            if !side.is_empty() {
                side.push(' ');
            }
            side.push_str(word);
        }

        let [local, foreign] = sides.as_slice() else {
            return Err(Error::InvalidJoinPredicate(back.trim().to_owned()));
        };
        if local.is_empty() || foreign.is_empty() {
            return Err(Error::InvalidJoinPredicate(back.trim().to_owned()));
        }

        Ok(Self {
            table: Table::parse(&table),
            kind,
            local_field: Field::parse(local),
            foreign_field: Field::parse(foreign),
        })
    }

    /// Splits a run of joins at each top level `INNER` / `LEFT` keyword and
    /// parses every piece.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        let mut pieces: Vec<String> = Vec::new();
        let mut depth = 0;
        for word in text.split_whitespace() {
            let starts_join = depth == 0
                && (word.eq_ignore_ascii_case("inner") || word.eq_ignore_ascii_case("left"));
            depth += paren_delta(word);
            match pieces.last_mut() {
                Some(piece) if !starts_join => {
                    piece.push(' ');
                    piece.push_str(word);
                }
                _ => pieces.push(word.to_owned()),
            }
        }
        pieces.iter().map(|piece| Self::parse(piece)).collect()
    }

    pub fn to_sql(&self) -> Result<String> {
        writer::render(self, false)
    }
}

/// Longest match first: `LEFT OUTER JOIN` before `INNER JOIN`.
fn strip_join_kind(front: &str) -> Option<(JoinKind, String)> {
    const KINDS: [(JoinKind, &str); 2] = [
        (JoinKind::LeftOuter, "left outer join"),
        (JoinKind::Inner, "inner join"),
    ];
    for (kind, keyword) in KINDS {
        let found = front
            .as_bytes()
            .windows(keyword.len())
            .position(|window| window.eq_ignore_ascii_case(keyword.as_bytes()));
        if let Some(index) = found {
            let mut rest = String::with_capacity(front.len());
            rest.push_str(&front[..index]);
            rest.push_str(&front[index + keyword.len()..]);
            return Some((kind, rest.trim().to_owned()));
        }
    }
    None
}

impl FormatWriter for JoinTable {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        self.kind.format_writer(context)?;
        context.writer.write_char(' ')?;
        self.table.format_writer(context)?;
        context.writer.write_str(" ON ")?;
        self.local_field.format_writer(context)?;
        context.writer.write_str(" = ")?;
        self.foreign_field.format_writer(context)
    }
}

#[cfg(test)]
mod tests {
    use smol_str::SmolStr;

    use crate::tests::format_writer;

    use super::*;

    #[test]
    fn test_parse_inner_join() {
        let join = JoinTable::parse("INNER JOIN Orders o ON o.CustomerId = c.Id").unwrap();
        assert_eq!(JoinKind::Inner, join.kind);
        assert_eq!(Table::new("Orders").aliased("o"), join.table);
        assert_eq!(Some(SmolStr::new("o")), join.local_field.table);
        assert_eq!("CustomerId", join.local_field.name);
        assert_eq!("Id", join.foreign_field.name);
        assert_eq!("INNER JOIN Orders o ON o.CustomerId = c.Id", format_writer(join, false));
    }

    #[test]
    fn test_parse_left_outer_any_case() {
        let join = JoinTable::parse("left outer join Address a on a.Id = c.AddressId").unwrap();
        assert_eq!(JoinKind::LeftOuter, join.kind);
        assert_eq!("LEFT OUTER JOIN Address a ON a.Id = c.AddressId", join.to_sql().unwrap());
    }

    #[test]
    fn test_parse_nested_predicate() {
        let join = JoinTable::parse("INNER JOIN Rates r ON r.Code = ISNULL(c.Code, 'x = y')").unwrap();
        assert_eq!("ISNULL(c.Code, 'x = y')", join.foreign_field.name);
    }

    #[test]
    fn test_unknown_join_kind() {
        let err = JoinTable::parse("RIGHT JOIN Orders o ON o.Id = c.Id").unwrap_err();
        assert!(matches!(err, Error::UnknownJoinKind(_)));
    }

    #[test]
    fn test_invalid_predicate() {
        let err = JoinTable::parse("INNER JOIN Orders o ON o.Id = c.Id = x.Id").unwrap_err();
        assert!(matches!(err, Error::InvalidJoinPredicate(_)));
        let err = JoinTable::parse("INNER JOIN Orders o ON o.Id").unwrap_err();
        assert!(matches!(err, Error::InvalidJoinPredicate(_)));
        let err = JoinTable::parse("INNER JOIN Orders o ON = c.Id").unwrap_err();
        assert!(matches!(err, Error::InvalidJoinPredicate(_)));
    }

    #[test]
    fn test_parse_list() {
        let joins = JoinTable::parse_list(
            "INNER JOIN Orders o ON o.CustomerId = c.Id LEFT OUTER JOIN Address a ON a.Id = c.AddressId",
        )
        .unwrap();
        assert_eq!(2, joins.len());
        assert_eq!(JoinKind::LeftOuter, joins[1].kind);
        assert!(JoinTable::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_build_join() {
        let join = JoinTable::left("Orders o", "o.CustomerId", "c.Id");
        assert_eq!("LEFT OUTER JOIN Orders o ON o.CustomerId = c.Id", format_writer(join, false));
    }
}
