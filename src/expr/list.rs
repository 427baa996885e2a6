use crate::{Binds, IntoBinds, builder::SearchQuery, writer::FormatWriter};

/// Right hand side of an `IN` condition.
#[derive(Debug, Clone, PartialEq)]
pub enum InList {
    Binds(Binds),
    Subquery(Box<SearchQuery>),
}

impl InList {
    pub fn is_empty(&self) -> bool {
        match self {
            InList::Binds(array) => array.is_empty(),
            InList::Subquery(_) => false,
        }
    }
}

pub trait IntoInList {
    fn into_in_list(self) -> InList;
}

impl IntoInList for SearchQuery {
    fn into_in_list(self) -> InList {
        InList::Subquery(Box::new(self))
    }
}

impl IntoInList for InList {
    fn into_in_list(self) -> InList {
        self
    }
}

impl<T> IntoInList for T
where
    T: IntoBinds,
{
    fn into_in_list(self) -> InList {
        InList::Binds(self.into_binds())
    }
}

impl FormatWriter for InList {
    fn format_writer<W: std::fmt::Write>(
        &self,
        context: &mut crate::writer::FormatContext<'_, W>,
    ) -> std::fmt::Result {
        match self {
            InList::Binds(array) => array.format_writer(context),
            // nested queries never carry an order by
            InList::Subquery(builder) => builder.statement(false).format_writer(context),
        }
    }
}
