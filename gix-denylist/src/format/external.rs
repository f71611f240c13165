//! Annotation formatting via an external program.

use super::Formatter;
use crate::Error;
use std::process::Stdio;

/// Runs `program <annotation>` and uses its standard output as formatted annotation.
///
/// The program is spawned directly, not through a shell.
#[derive(Debug, Clone)]
pub struct ExternalFormatter {
    program: String,
}

impl ExternalFormatter {
    /// Format annotations with `program`, looked up in `PATH` if it isn't a path.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn failed(&self, message: impl Into<String>) -> Error {
        Error::Formatter {
            program: self.program.clone(),
            message: message.into(),
        }
    }
}

impl Formatter for ExternalFormatter {
    fn format(&mut self, annotation: &str) -> Result<String, Error> {
        let child = gix_command::prepare(self.program.as_str())
            .arg(annotation)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| self.failed(err.to_string()))?;
        let output = child.wait_with_output().map_err(|err| self.failed(err.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failed(format!("{}: {}", output.status, stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn stdout_becomes_the_formatted_annotation() {
        let mut formatter = ExternalFormatter::new("echo");
        assert_eq!(formatter.format("rolled back").unwrap(), "rolled back\n");
    }

    #[test]
    fn missing_programs_are_errors() {
        let mut formatter = ExternalFormatter::new("gix-denylist-formatter-does-not-exist");
        assert!(matches!(
            formatter.format("x"),
            Err(Error::Formatter { program, .. }) if program == "gix-denylist-formatter-does-not-exist"
        ));
    }

    #[test]
    fn non_zero_exit_is_an_error() {
        let mut formatter = ExternalFormatter::new("false");
        assert!(formatter.format("x").is_err());
    }
}
