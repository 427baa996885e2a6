use smol_str::SmolStr;

use crate::writer::FormatWriter;

/// Verbatim sql fragment, never parsed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Raw(pub(crate) SmolStr);

impl Raw {
    pub fn new<T>(value: T) -> Self
    where
        T: Into<SmolStr>
    {
        Self(value.into())
    }

    pub fn new_static(value: &'static str) -> Self {
        Self(SmolStr::new_static(value))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl FormatWriter for Raw {
    fn format_writer<W: std::fmt::Write>(
        &self,
        context: &mut crate::writer::FormatContext<'_, W>,
    ) -> std::fmt::Result {
        // whitespace only fragments render as nothing
        context.writer.write_str(self.0.trim())
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::format_writer;

    use super::*;

    #[test]
    fn test_raw_verbatim() {
        let value = Raw::new_static("Age > 18 AND Name = 'te''st'");
        let raw = format_writer(value, false);
        assert_eq!("Age > 18 AND Name = 'te''st'", raw);
    }

    #[test]
    fn test_raw_whitespace_is_empty() {
        let value = Raw::new("   ");
        assert!(value.is_empty());
        assert_eq!("", format_writer(value, false));
    }

    #[test]
    fn test_raw_trimmed() {
        let value = Raw::new(" x = 1 ");
        assert_eq!("x = 1", format_writer(value, false));
    }
}
