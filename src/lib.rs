mod bind;
mod builder;
mod classify;
mod error;
mod exec;
mod expr;
mod ident;
mod join;
mod operator;
mod paginate;
mod raw;
mod row;
mod writer;

pub use bind::Array;
pub use bind::Bind;
pub use bind::Binds;
pub use bind::FromBind;
pub use bind::IntoBind;
pub use bind::IntoBinds;

pub use ident::Field;
pub use ident::IntoField;
pub use ident::IntoFields;
pub use ident::IntoTable;
pub use ident::Table;
pub use raw::Raw;

pub use expr::Comparison;
pub use expr::Condition;
pub use expr::Conjunction;
pub use expr::Group;
pub use expr::InList;
pub use expr::IntoCondition;
pub use expr::IntoInList;
pub use expr::IntoSortField;
pub use expr::Membership;
pub use expr::SortDirection;
pub use expr::SortField;
pub use operator::Operator;

pub use join::JoinKind;
pub use join::JoinTable;

pub use builder::SearchQuery;
pub use paginate::Paginator;

pub use error::Error;
pub use error::Result;

pub use exec::Executor;
pub use exec::LogPolicy;
pub use exec::Page;
pub use exec::Params;
pub use exec::QueryRunner;
pub use exec::ResultTable;
pub use exec::Row;
pub use row::RowBinder;

pub fn field(value: &str) -> Field {
    Field::parse(value)
}

pub fn table(value: &str) -> Table {
    Table::parse(value)
}

pub fn raw_static(value: &'static str) -> Raw {
    Raw::new_static(value)
}

pub fn raw(value: &str) -> Raw {
    Raw::new(value)
}

/// Builds an AND group: `and![cond, ...]`.
#[macro_export]
macro_rules! and {
    ( $($cond:expr),* $(,)? ) => {
        $crate::Group::and()$(.with($cond))*
    };
}

/// Builds an OR group: `or![cond, ...]`.
#[macro_export]
macro_rules! or {
    ( $($cond:expr),* $(,)? ) => {
        $crate::Group::or()$(.with($cond))*
    };
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::writer;

    pub(crate) fn format_writer<W: writer::FormatWriter>(writer: W, ignore_empty: bool) -> String {
        let mut str = String::new();
        let mut context = writer::FormatContext::new(&mut str, ignore_empty);
        writer.format_writer(&mut context).unwrap();
        str
    }

    #[test]
    fn test_group_macros() {
        let cond = crate::or![
            crate::and!["a = 1", crate::Comparison::new("b", crate::Operator::Gt, 2)],
            crate::raw("c IS NULL"),
        ];
        assert_eq!("(a = 1 AND b > 2) OR c IS NULL", format_writer(cond, false));
    }
}
