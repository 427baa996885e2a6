use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    ident::paren_delta,
};

/// Top level section of a select statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Clause {
    Select,
    Into,
    From,
    Join,
    Where,
    GroupBy,
    Having,
    OrderBy,
}

/// Raw text of each clause, keywords removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ClauseBuffers {
    pub(crate) top: Option<u32>,
    pub(crate) select: String,
    pub(crate) into: String,
    pub(crate) from: String,
    pub(crate) join: String,
    pub(crate) r#where: String,
    pub(crate) group_by: String,
    pub(crate) having: String,
    pub(crate) order_by: String,
}

impl ClauseBuffers {
    fn buffer_mut(&mut self, clause: Clause) -> &mut String {
        match clause {
            Clause::Select => &mut self.select,
            Clause::Into => &mut self.into,
            Clause::From => &mut self.from,
            Clause::Join => &mut self.join,
            Clause::Where => &mut self.r#where,
            Clause::GroupBy => &mut self.group_by,
            Clause::Having => &mut self.having,
            Clause::OrderBy => &mut self.order_by,
        }
    }

    fn push(&mut self, clause: Clause, word: &str) {
        let buffer = self.buffer_mut(clause);
        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(word);
    }
}

/// Drops `--` line comments, whole line or trailing.
pub(crate) fn strip_comments(sql: &str) -> String {
    let mut text = String::with_capacity(sql.len());
    for line in sql.lines() {
        if line.trim_start().starts_with("--") {
            continue;
        }
        let line = match line.find("--") {
            Some(index) => &line[..index],
            None => line,
        };
        text.push_str(line);
        text.push(' ');
    }
    text
}

/// Mode switch for a word seen at nesting depth zero. `previous` is the
/// keyword consumed right before it, if any.
fn clause_for(word: &str, previous: Option<Clause>) -> Option<Clause> {
    let clause = match word.to_ascii_lowercase().as_str() {
        "select" => Clause::Select,
        "from" => Clause::From,
        "where" => Clause::Where,
        "into" => Clause::Into,
        "group" => Clause::GroupBy,
        "having" => Clause::Having,
        "inner" | "left" | "outer" | "join" => Clause::Join,
        "order" => Clause::OrderBy,
        // `by` keeps `GROUP BY` grouped, anything else is an order by
        "by" if previous == Some(Clause::GroupBy) => Clause::GroupBy,
        "by" => Clause::OrderBy,
        _ => return None,
    };
    Some(clause)
}

/// Splits a statement into clause buffers.
///
/// Keywords only switch clause when the running parenthesis depth is zero,
/// so sub selects and function calls stay inside the clause that holds
/// them. Matching is per word: an unparenthesized identifier spelled like
/// a keyword switches clause too.
pub(crate) fn classify(sql: &str) -> Result<ClauseBuffers> {
    let text = strip_comments(sql);
    let mut buffers = ClauseBuffers::default();
    let mut mode = Clause::Select;
    let mut previous = None;
    let mut depth = 0;

    for word in text.split_whitespace() {
        depth += paren_delta(word);

        let switch = if depth == 0 { clause_for(word, previous) } else { None };
        match switch {
            Some(clause) => {
                trace!(word, ?clause, "clause switch");
                mode = clause;
                previous = Some(clause);
                // join keywords are consumed, the join kind is written back
                if word.eq_ignore_ascii_case("inner") {
                    buffers.push(Clause::Join, "INNER JOIN");
                } else if word.eq_ignore_ascii_case("left") {
                    buffers.push(Clause::Join, "LEFT OUTER JOIN");
                }
            }
            None => {
                previous = None;
                buffers.push(mode, word);
            }
        }
    }

    buffers.top = extract_top(&mut buffers.select)?;

    debug!(
        select = %buffers.select,
        from = %buffers.from,
        join = %buffers.join,
        where_clause = %buffers.r#where,
        group_by = %buffers.group_by,
        having = %buffers.having,
        order_by = %buffers.order_by,
        top = ?buffers.top,
        "classified statement"
    );

    Ok(buffers)
}

/// Removes a leading `TOP n` from the select buffer and returns `n`.
fn extract_top(select: &mut String) -> Result<Option<u32>> {
    let trimmed = select.trim_start();
    let mut words = trimmed.splitn(3, ' ');
    match words.next() {
        Some(word) if word.eq_ignore_ascii_case("top") => {}
        _ => return Ok(None),
    }

    let value = words.next().unwrap_or_default();
    let top = value
        .trim_start_matches('(')
        .trim_end_matches(')')
        .parse::<u32>()
        .ok()
        .filter(|top| *top > 0)
        .ok_or_else(|| Error::InvalidTop(value.to_owned()))?;

    let rest = words.next().unwrap_or_default().to_owned();
    *select = rest;
    Ok(Some(top))
}
