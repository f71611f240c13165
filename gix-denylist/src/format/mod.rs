//! Rendering of rejection messages.
//!
//! Annotations are authored by administrators but end up as an argument to an external
//! program, so they are always passed through [`sanitize()`] first, whichever [`Formatter`]
//! is in use.

use crate::Error;

mod external;
pub mod template;

pub use external::ExternalFormatter;
pub use template::Template;

/// Characters removed from annotations before they are handed to a formatter.
pub const SHELL_METACHARACTERS: &[char] = &['<', '>', '&', ';', '|', '$', '*', '?', '!'];

/// Remove [`SHELL_METACHARACTERS`] from `annotation`.
///
/// This is a best-effort filter, not an escaping mechanism.
pub fn sanitize(annotation: &str) -> String {
    annotation.chars().filter(|c| !SHELL_METACHARACTERS.contains(c)).collect()
}

/// A capability turning a raw annotation into its display form.
pub trait Formatter {
    /// Format the already sanitized `annotation`.
    fn format(&mut self, annotation: &str) -> Result<String, Error>;
}

/// A formatter which returns annotations unchanged.
#[derive(Debug, Clone, Default)]
pub struct NoopFormatter {
    _private: (),
}

impl NoopFormatter {
    /// Create a new NoopFormatter instance.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Formatter for NoopFormatter {
    fn format(&mut self, annotation: &str) -> Result<String, Error> {
        Ok(annotation.to_owned())
    }
}

/// Sanitize `annotation` and format it with `formatter`, falling back to the sanitized text
/// if the formatter fails or produces nothing.
pub fn render_annotation(formatter: &mut dyn Formatter, annotation: &str) -> String {
    let sanitized = sanitize(annotation);
    match formatter.format(&sanitized) {
        Ok(formatted) if !formatted.trim().is_empty() => formatted.trim_end().to_owned(),
        Ok(_) => sanitized,
        Err(err) => {
            tracing::warn!("using unformatted annotation: {err}");
            sanitized
        }
    }
}
