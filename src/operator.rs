use quarry_derive::ComparisonOperator;

use crate::writer::FormatWriter;

/// Comparison operator of a leaf condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ComparisonOperator)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    NotEq,
    Like,
}

impl Operator {
    /// Maps an operator token, `like` in any case.
    pub fn from_token(token: &str) -> Option<Self> {
        let operator = match token {
            "=" => Operator::Eq,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "<>" => Operator::NotEq,
            like if like.eq_ignore_ascii_case("like") => Operator::Like,
            _ => return None,
        };
        Some(operator)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::NotEq => "<>",
            Operator::Like => "LIKE",
        }
    }
}

impl FormatWriter for Operator {
    fn format_writer<W: std::fmt::Write>(&self, context: &mut crate::writer::FormatContext<'_, W>) -> std::fmt::Result {
        context.writer.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use crate::{SearchQuery, tests::format_writer};

    use super::*;

    #[test]
    fn test_from_token() {
        assert_eq!(Some(Operator::Gte), Operator::from_token(">="));
        assert_eq!(Some(Operator::Like), Operator::from_token("LiKe"));
        assert_eq!(Some(Operator::NotEq), Operator::from_token("<>"));
        assert_eq!(None, Operator::from_token("!="));
        assert_eq!(None, Operator::from_token("between"));
    }

    #[test]
    fn test_format_operator() {
        assert_eq!("LIKE", format_writer(Operator::Like, false));
        assert_eq!("<=", format_writer(Operator::Lte, false));
    }

    #[test]
    fn test_generated_shortcuts() {
        let mut query = SearchQuery::new();
        query
            .select("Id")
            .from("Customer")
            .where_gt("Age", 18)
            .where_like("Name", "jo")
            .or_where_eq("Vip", true);
        assert_eq!(
            "SELECT Id FROM Customer WHERE (Age > 18 AND Name LIKE '%jo%') OR Vip = 1",
            query.to_sql().unwrap()
        );
    }

    #[test]
    fn test_generated_having() {
        let mut query = SearchQuery::new();
        query
            .select("CustomerId, COUNT(*) AS Orders")
            .from("Orders")
            .group_by("CustomerId")
            .having_gte("COUNT(*)", 5);
        assert_eq!(
            "SELECT CustomerId, COUNT(*) AS Orders FROM Orders GROUP BY CustomerId HAVING COUNT(*) >= 5",
            query.to_sql().unwrap()
        );
    }
}
