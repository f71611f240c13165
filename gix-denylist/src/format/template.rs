//! The error-message template shown to the pusher on rejection.

use std::path::Path;

/// The token replaced with the rejection reason.
pub const PLACEHOLDER: &str = "_ERROR_";

/// Used when no template is configured or the configured one is unusable.
pub const DEFAULT_TEMPLATE: &str = "*** push rejected: _ERROR_";

/// A free-text message containing [`PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_owned(),
        }
    }
}

impl Template {
    /// Use `text` as template, or the default if it is blank.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            Self::default()
        } else {
            Self { text }
        }
    }

    /// Read the template at `path`, degrading to the default if there is none or it can't be read.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_text(text),
            Err(err) => {
                tracing::warn!(template = %path.display(), "using default error template: {err}");
                Self::default()
            }
        }
    }

    /// Substitute every [`PLACEHOLDER`] with `error`.
    pub fn render(&self, error: &str) -> String {
        self.text.replace(PLACEHOLDER, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_placeholder_is_replaced() {
        let template = Template::from_text("_ERROR_\n-- _ERROR_");
        assert_eq!(template.render("nope"), "nope\n-- nope");
    }

    #[test]
    fn blank_templates_use_the_default() {
        assert_eq!(Template::from_text(" \n"), Template::default());
        assert_eq!(Template::default().render("x"), "*** push rejected: x");
    }

    #[test]
    fn unreadable_templates_use_the_default() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(Template::load(Some(&dir.path().join("missing"))), Template::default());
        assert_eq!(Template::load(None), Template::default());

        let path = dir.path().join("template");
        std::fs::write(&path, "STOP: _ERROR_\n")?;
        assert_eq!(Template::load(Some(&path)).render("x"), "STOP: x\n");
        Ok(())
    }
}
