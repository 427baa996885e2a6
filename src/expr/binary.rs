use std::fmt::Write;

use smol_str::SmolStr;

use crate::{
    bind::IntoBind,
    ident::{Field, IntoField},
    operator::Operator,
    writer::{FormatContext, FormatWriter},
};

/// Leaf condition: `field operator value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: Field,
    /// `None` when the parsed operator token was not recognized; the
    /// condition then renders without one.
    pub operator: Option<Operator>,
    pub value: Option<SmolStr>,
    /// Quote the value when rendering.
    pub is_string_type: bool,
    /// The value is a bound placeholder such as `@id`, written as is.
    pub is_parameter: bool,
}

impl Comparison {
    pub fn new<F, V>(field: F, operator: Operator, value: V) -> Self
    where
        F: IntoField,
        V: IntoBind,
    {
        let (value, is_string_type) = match value.into_bind().comparison_value() {
            Some((value, is_string_type)) => (Some(value), is_string_type),
            None => (None, false),
        };
        Self {
            field: field.into_field(),
            operator: Some(operator),
            value,
            is_string_type,
            is_parameter: false,
        }
    }

    /// Compares against a bound parameter, `@` is prepended when missing.
    pub fn parameter<F, N>(field: F, operator: Operator, name: N) -> Self
    where
        F: IntoField,
        N: AsRef<str>,
    {
        let name = name.as_ref();
        let value = if name.starts_with('@') {
            SmolStr::new(name)
        } else {
            smol_str::format_smolstr!("@{}", name)
        };
        Self {
            field: field.into_field(),
            operator: Some(operator),
            value: Some(value),
            is_string_type: false,
            is_parameter: true,
        }
    }

    pub fn string_type(mut self, is_string_type: bool) -> Self {
        self.is_string_type = is_string_type;
        self
    }

    /// Parses a three token `field op value` fragment.
    ///
    /// Values starting with `@` are parameters. Otherwise a quote marks the
    /// value as string typed, `true`/`false` become `1`/`0` and all quotes
    /// are stripped; they are escaped again when rendering.
    pub fn parse(text: &str) -> Option<Self> {
        let bits: Vec<&str> = text.split_whitespace().collect();
        let [field, operator, value] = bits.as_slice() else {
            return None;
        };

        let mut comparison = Self {
            field: Field::parse(field),
            // unknown tokens are kept lenient, the operator is dropped
            operator: Operator::from_token(operator),
            value: None,
            is_string_type: false,
            is_parameter: false,
        };

        if value.starts_with('@') {
            comparison.is_parameter = true;
            comparison.value = Some(SmolStr::new(value));
            return Some(comparison);
        }

        comparison.is_string_type = value.contains('\'');
        let value = if value.eq_ignore_ascii_case("true") {
            SmolStr::new_static("1")
        } else if value.eq_ignore_ascii_case("false") {
            SmolStr::new_static("0")
        } else {
            SmolStr::new(value.replace('\'', ""))
        };
        comparison.value = Some(value);
        Some(comparison)
    }

    fn has_value(&self) -> bool {
        self.value.as_deref().is_some_and(|value| !value.is_empty())
    }
}

impl FormatWriter for Comparison {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        let has_value = self.has_value();
        if context.ignore_empty && !has_value {
            return Ok(());
        }

        self.field.format_writer(context)?;

        // a missing value is a sql null
        if !has_value && !self.is_string_type {
            return match self.operator {
                Some(Operator::Eq) => context.writer.write_str(" IS NULL"),
                Some(Operator::NotEq) => context.writer.write_str(" IS NOT NULL"),
                Some(operator) => write!(context.writer, " {} NULL", operator.as_str()),
                None => context.writer.write_str(" NULL"),
            };
        }

        if let Some(operator) = self.operator {
            context.writer.write_char(' ')?;
            operator.format_writer(context)?;
        }
        context.writer.write_char(' ')?;

        let value = self.value.as_deref().unwrap_or_default();
        if self.is_parameter {
            return context.writer.write_str(value);
        }

        match self.operator {
            Some(Operator::Like) if value.contains('%') => context.write_literal(value),
            Some(Operator::Like) => {
                let wrapped = smol_str::format_smolstr!("%{}%", value);
                context.write_literal(&wrapped)
            }
            _ if self.is_string_type => context.write_literal(value),
            _ => context.writer.write_str(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::format_writer;

    use super::*;

    #[test]
    fn test_like_wraps_wildcards() {
        let cond = Comparison::new("Name", Operator::Like, "John");
        assert_eq!("Name LIKE '%John%'", format_writer(cond, false));
        let cond = Comparison::new("Name", Operator::Like, "Jo%");
        assert_eq!("Name LIKE 'Jo%'", format_writer(cond, false));
    }

    #[test]
    fn test_quotes_are_doubled() {
        let cond = Comparison::new("LastName", Operator::Eq, "O'Brien");
        assert_eq!("LastName = 'O''Brien'", format_writer(cond, false));
        let cond = Comparison::new("Note", Operator::Eq, "'a''b'");
        assert_eq!("Note = '''a''''b'''", format_writer(cond, false));
    }

    #[test]
    fn test_numbers_and_bools_unquoted() {
        let cond = Comparison::new("c.Age", Operator::Gte, 21);
        assert_eq!("c.Age >= 21", format_writer(cond, false));
        let cond = Comparison::new("Active", Operator::Eq, false);
        assert_eq!("Active = 0", format_writer(cond, false));
    }

    #[test]
    fn test_parameter_verbatim() {
        let cond = Comparison::parameter("Id", Operator::Eq, "id");
        assert_eq!("Id = @id", format_writer(cond, false));
        let cond = Comparison::parameter("Name", Operator::Like, "@name");
        assert_eq!("Name LIKE @name", format_writer(cond, false));
    }

    #[test]
    fn test_ignore_empty_value() {
        let cond = Comparison::new("Name", Operator::Eq, "");
        assert_eq!("", format_writer(&cond, true));
        assert_eq!("Name = ''", format_writer(&cond, false));
        let cond = Comparison::new("Name", Operator::Eq, None::<String>);
        assert_eq!("", format_writer(&cond, true));
        assert_eq!("Name IS NULL", format_writer(&cond, false));
    }

    #[test]
    fn test_parse_comparison() {
        let cond = Comparison::parse("Age > 18").unwrap();
        assert_eq!(Some(Operator::Gt), cond.operator);
        assert!(!cond.is_string_type);
        assert_eq!("Age > 18", format_writer(&cond, false));

        let cond = Comparison::parse("c.Name like 'Jo'").unwrap();
        assert!(cond.is_string_type);
        assert_eq!(Some(SmolStr::new("Jo")), cond.value);
        assert_eq!("c.Name LIKE '%Jo%'", format_writer(&cond, false));

        let cond = Comparison::parse("Active = TRUE").unwrap();
        assert_eq!("Active = 1", format_writer(&cond, false));

        let cond = Comparison::parse("Id = @id").unwrap();
        assert!(cond.is_parameter);
        assert_eq!("Id = @id", format_writer(&cond, false));
    }

    #[test]
    fn test_parse_unknown_operator_is_dropped() {
        let cond = Comparison::parse("Age != 18").unwrap();
        assert_eq!(None, cond.operator);
        assert_eq!("Age 18", format_writer(&cond, false));
    }

    #[test]
    fn test_parse_requires_three_tokens() {
        assert!(Comparison::parse("Age > 18 AND x = 1").is_none());
        assert!(Comparison::parse("Age").is_none());
    }
}
