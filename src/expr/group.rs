use std::fmt::Write;

use crate::writer::{FormatContext, FormatWriter};

use super::{Condition, IntoCondition, cond::Conjunction};

/// Conditions joined by one operand, nestable.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Group {
    pub conjunction: Conjunction,
    pub conditions: Vec<Condition>,
}

impl Group {
    pub fn new(conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            conditions: Vec::new(),
        }
    }

    pub fn and() -> Self {
        Self::new(Conjunction::And)
    }

    pub fn or() -> Self {
        Self::new(Conjunction::Or)
    }

    pub fn push<C: IntoCondition>(&mut self, condition: C) -> &mut Self {
        self.conditions.push(condition.into_condition());
        self
    }

    pub fn with<C: IntoCondition>(mut self, condition: C) -> Self {
        self.push(condition);
        self
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl FormatWriter for Group {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        let mut written = false;
        for condition in &self.conditions {
            let nested = matches!(condition, Condition::Group(group) if group.len() > 1);
            let sql = context.capture(condition)?;
            if sql.is_empty() {
                continue;
            }
            if written {
                context.writer.write_char(' ')?;
                self.conjunction.format_writer(context)?;
                context.writer.write_char(' ')?;
            }
            if nested {
                write!(context.writer, "({})", sql)?;
            } else {
                context.writer.write_str(&sql)?;
            }
            written = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Comparison, Operator, Raw, tests::format_writer};

    use super::*;

    #[test]
    fn test_group_joins_members() {
        let group = Group::and()
            .with(Comparison::new("FirstName", Operator::Eq, "John"))
            .with(Comparison::new("LastName", Operator::Eq, "Smith"));
        assert_eq!("FirstName = 'John' AND LastName = 'Smith'", format_writer(group, false));
    }

    #[test]
    fn test_nested_groups_are_wrapped() {
        let inner = Group::or()
            .with(Comparison::new("Age", Operator::Lt, 18))
            .with(Comparison::new("Age", Operator::Gt, 65));
        let group = Group::and()
            .with(Comparison::new("Active", Operator::Eq, true))
            .with(inner);
        assert_eq!("Active = 1 AND (Age < 18 OR Age > 65)", format_writer(group, false));
    }

    #[test]
    fn test_single_member_group_is_not_wrapped() {
        let inner = Group::or().with(Comparison::new("Age", Operator::Lt, 18));
        let group = Group::and()
            .with(Raw::new("x = 1"))
            .with(inner);
        assert_eq!("x = 1 AND Age < 18", format_writer(group, false));
    }

    #[test]
    fn test_empty_members_are_elided() {
        let group = Group::and()
            .with(Comparison::new("Name", Operator::Eq, ""))
            .with(Comparison::new("Age", Operator::Gt, 18));
        assert_eq!("Age > 18", format_writer(&group, true));

        let group = Group::or()
            .with(Comparison::new("Age", Operator::Gt, 18))
            .with(Raw::new(" "))
            .with(Group::and());
        assert_eq!("Age > 18", format_writer(&group, false));
    }

    #[test]
    fn test_empty_group_renders_empty() {
        let group = Group::and().with(Comparison::new("Name", Operator::Eq, None::<i32>));
        assert_eq!("", format_writer(&group, true));
        assert_eq!("", format_writer(Group::or(), false));
    }
}
