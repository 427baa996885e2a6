use std::{fmt::Write, ops::Deref};

use crate::error::{Error, Result};

pub(crate) trait FormatWriter {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result;
}

pub(crate) struct FormatContext<'a, W: Write> {
    pub(crate) writer: &'a mut W,
    /// Comparisons without a value render as nothing.
    pub(crate) ignore_empty: bool,
    /// Structural failure raised while streaming, surfaced by `render`.
    pub(crate) error: Option<Error>,
}

impl<'a, W: Write> FormatContext<'a, W> {
    pub fn new(writer: &'a mut W, ignore_empty: bool) -> Self {
        Self {
            writer,
            ignore_empty,
            error: None,
        }
    }

    /// Records a structural error and aborts the current write.
    pub(crate) fn fail<T>(&mut self, error: Error) -> std::result::Result<T, std::fmt::Error> {
        self.error = Some(error);
        Err(std::fmt::Error)
    }

    /// Writes a single quoted literal, doubling any embedded quote.
    pub(crate) fn write_literal(&mut self, value: &str) -> std::fmt::Result {
        self.writer.write_char('\'')?;
        let mut last = 0;
        for (index, char) in value.char_indices() {
            if char == '\'' {
                if index != last {
                    self.writer.write_str(&value[last..index])?;
                }
                self.writer.write_str("''")?;
                last = index + char.len_utf8();
            }
        }

        // write trailing slice
        if last < value.len() {
            self.writer.write_str(&value[last..])?;
        }

        self.writer.write_char('\'')
    }

    pub(crate) fn write_list<T: FormatWriter>(&mut self, items: &[T], sep: &str) -> std::fmt::Result {
        self.write_each(items, sep, |context, item| item.format_writer(context))
    }

    pub(crate) fn write_each<T, F>(&mut self, items: &[T], sep: &str, mut write: F) -> std::fmt::Result
    where
        F: FnMut(&mut Self, &T) -> std::fmt::Result,
    {
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.writer.write_str(sep)?;
            }
            write(self, item)?;
        }
        Ok(())
    }

    /// Renders `value` into its own buffer so callers can inspect the
    /// output before committing it, used to elide empty conditions.
    pub(crate) fn capture<T: FormatWriter + ?Sized>(&mut self, value: &T) -> std::result::Result<String, std::fmt::Error> {
        self.capture_with(self.ignore_empty, value)
    }

    pub(crate) fn capture_with<T: FormatWriter + ?Sized>(
        &mut self,
        ignore_empty: bool,
        value: &T,
    ) -> std::result::Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        let mut inner = FormatContext::new(&mut buffer, ignore_empty);
        let result = value.format_writer(&mut inner);
        if let Some(error) = inner.error.take() {
            self.error = Some(error);
        }
        result.map(|_| buffer)
    }
}

impl<D> FormatWriter for D
where
    D: Deref,
    D::Target: FormatWriter,
{
    fn format_writer<W: std::fmt::Write>(
        &self,
        ctx: &mut FormatContext<'_, W>,
    ) -> std::fmt::Result {
        self.deref().format_writer(ctx)
    }
}

/// Renders any writer into a fresh string, surfacing structural errors.
pub(crate) fn render<T: FormatWriter + ?Sized>(value: &T, ignore_empty: bool) -> Result<String> {
    let size_hint = 64;
    let mut sql = String::with_capacity(size_hint);
    let mut context = FormatContext::new(&mut sql, ignore_empty);
    let result = value.format_writer(&mut context);
    if let Some(error) = context.error.take() {
        return Err(error);
    }
    result?;
    Ok(sql)
}
