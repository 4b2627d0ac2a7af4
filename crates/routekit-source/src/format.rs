use crate::error::Result;

/// Post-processing hook for a finished document, typically an external
/// code formatter. Blocks are located by patterns that tolerate the usual
/// reformatting, so formatted output can be patched later.
pub trait Formatter {
    fn format(&self, text: &str) -> Result<String>;
}

/// Leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn format(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

impl<F: Formatter + ?Sized> Formatter for &F {
    fn format(&self, text: &str) -> Result<String> {
        (**self).format(text)
    }
}

impl<F: Formatter + ?Sized> Formatter for Box<F> {
    fn format(&self, text: &str) -> Result<String> {
        (**self).format(text)
    }
}
