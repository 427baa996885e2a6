use crate::{
    error::Result,
    raw::Raw,
    writer::{self, FormatContext, FormatWriter},
};

pub mod binary;
pub mod cond;
pub mod group;
pub mod r#in;
pub mod list;
pub mod order;

pub use binary::Comparison;
pub use cond::Conjunction;
pub use group::Group;
pub use r#in::Membership;
pub use list::{InList, IntoInList};
pub use order::{IntoSortField, SortDirection, SortField};

/// A `WHERE`/`HAVING` predicate tree.
///
/// Every variant renders either a non empty fragment or nothing at all;
/// groups skip members that rendered nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Comparison(Comparison),
    Raw(Raw),
    Membership(Membership),
    Group(Group),
}

impl Condition {
    /// A three token `field op value` fragment becomes a comparison,
    /// anything else is kept as raw sql.
    pub fn parse(text: &str) -> Self {
        match Comparison::parse(text) {
            Some(comparison) => Condition::Comparison(comparison),
            None => Condition::Raw(Raw::new(text.trim())),
        }
    }

    pub fn to_sql(&self) -> Result<String> {
        writer::render(self, false)
    }

    /// Same as `to_sql` but comparisons without a value are dropped.
    pub fn to_sql_ignoring_empty(&self) -> Result<String> {
        writer::render(self, true)
    }
}

impl FormatWriter for Condition {
    fn format_writer<W: std::fmt::Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        match self {
            Condition::Comparison(comparison) => comparison.format_writer(context),
            Condition::Raw(raw) => raw.format_writer(context),
            Condition::Membership(membership) => membership.format_writer(context),
            Condition::Group(group) => group.format_writer(context),
        }
    }
}

pub trait IntoCondition {
    fn into_condition(self) -> Condition;
}

impl IntoCondition for Condition {
    fn into_condition(self) -> Condition {
        self
    }
}

impl IntoCondition for Comparison {
    fn into_condition(self) -> Condition {
        Condition::Comparison(self)
    }
}

impl IntoCondition for Raw {
    fn into_condition(self) -> Condition {
        Condition::Raw(self)
    }
}

impl IntoCondition for Membership {
    fn into_condition(self) -> Condition {
        Condition::Membership(self)
    }
}

impl IntoCondition for Group {
    fn into_condition(self) -> Condition {
        Condition::Group(self)
    }
}

impl IntoCondition for &str {
    fn into_condition(self) -> Condition {
        Condition::parse(self)
    }
}

impl IntoCondition for String {
    fn into_condition(self) -> Condition {
        Condition::parse(&self)
    }
}

#[cfg(test)]
mod tests {
    use crate::Operator;

    use super::*;

    #[test]
    fn test_parse_comparison_or_raw() {
        assert!(matches!(Condition::parse("Age >= 21"), Condition::Comparison(_)));
        let raw = Condition::parse("Age >= 21 AND Age < 65");
        assert!(matches!(raw, Condition::Raw(_)));
        assert_eq!("Age >= 21 AND Age < 65", raw.to_sql().unwrap());
    }

    #[test]
    fn test_to_sql_ignoring_empty() {
        let cond = Group::and()
            .with(Comparison::new("Name", Operator::Like, ""))
            .with(Comparison::new("City", Operator::Eq, "Paris"))
            .into_condition();
        assert_eq!("City = 'Paris'", cond.to_sql_ignoring_empty().unwrap());
        assert_eq!("Name LIKE '%%' AND City = 'Paris'", cond.to_sql().unwrap());
    }

    #[test]
    fn test_nested_membership_in_group() {
        let cond = Group::or()
            .with(Membership::new("Id", [1, 2]))
            .with(Group::and().with("a = 1").with("b = 2"))
            .into_condition();
        assert_eq!("Id IN (1,2) OR (a = 1 AND b = 2)", cond.to_sql().unwrap());
    }
}
