use routekit_source::{Formatter, NoopFormatter};
use std::io::Write;
use std::process::Command;

/// Runs an external formatter over a temp copy of the document.
///
/// Formatting is best effort: any failure is logged and the text is
/// returned unformatted.
pub struct CommandFormatter {
    argv: Vec<String>,
}

impl CommandFormatter {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    fn try_format(&self, text: &str) -> std::io::Result<Option<String>> {
        let Some((program, args)) = self.argv.split_first() else {
            return Ok(None);
        };
        let mut tmp = tempfile::Builder::new()
            .prefix("routekit-")
            .suffix(".php")
            .tempfile()?;
        tmp.write_all(text.as_bytes())?;
        tmp.flush()?;

        let status = Command::new(program).args(args).arg(tmp.path()).status()?;
        if !status.success() {
            log::warn!("formatter `{program}` exited with {status}");
            return Ok(None);
        }
        std::fs::read_to_string(tmp.path()).map(Some)
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, text: &str) -> routekit_source::Result<String> {
        match self.try_format(text) {
            Ok(Some(formatted)) => Ok(formatted),
            Ok(None) => Ok(text.to_string()),
            Err(e) => {
                log::warn!("formatter failed, keeping unformatted output: {e}");
                Ok(text.to_string())
            }
        }
    }
}

/// The configured formatter, or a no-op when none is set.
pub fn from_config(argv: &[String]) -> Box<dyn Formatter> {
    if argv.is_empty() {
        Box::new(NoopFormatter)
    } else {
        Box::new(CommandFormatter::new(argv.to_vec()))
    }
}
