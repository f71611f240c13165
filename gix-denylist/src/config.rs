//! Hook options read from git configuration.

use crate::Error;
use bstr::ByteSlice;
use gix_config::File;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// The policy file used when nothing else is configured.
pub const DEFAULT_POLICY_FILE: &str = "denylist";

/// Where the hook finds its inputs.
///
/// Relative paths are resolved against the working directory of the hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// The source policy file (`denylist.file`).
    pub policy_file: PathBuf,
    /// The lookup cache (`denylist.cache`), derived from `policy_file` if unset.
    pub cache_file: Option<PathBuf>,
    /// The error-message template (`denylist.template`).
    pub template: Option<PathBuf>,
    /// The annotation formatter command (`denylist.formatter`).
    pub formatter: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            policy_file: DEFAULT_POLICY_FILE.into(),
            cache_file: None,
            template: None,
            formatter: None,
        }
    }
}

impl Options {
    /// Read options from `config`, using defaults for everything not set.
    ///
    /// Recognized keys:
    /// - `denylist.file`
    /// - `denylist.cache`
    /// - `denylist.template`
    /// - `denylist.formatter`
    pub fn from_config(config: &File<'static>) -> Result<Self, Error> {
        let mut options = Self::default();
        if let Some(path) = string(config, "denylist.file")? {
            options.policy_file = path.into();
        }
        options.cache_file = string(config, "denylist.cache")?.map(PathBuf::from);
        options.template = string(config, "denylist.template")?.map(PathBuf::from);
        options.formatter = string(config, "denylist.formatter")?;
        Ok(options)
    }

    /// Read options from the configuration of the repository at `git_dir`.
    ///
    /// A repository without a `config` file yields the defaults. Includes are not followed.
    pub fn load(git_dir: &Path) -> Result<Self, Error> {
        let path = git_dir.join("config");
        if !path.is_file() {
            tracing::debug!(config = %path.display(), "no repository configuration, using defaults");
            return Ok(Self::default());
        }
        let config = File::from_path_no_includes(path.clone(), gix_config::Source::Local).map_err(|err| {
            Error::Config {
                key: path.display().to_string(),
                message: err.to_string(),
            }
        })?;
        Self::from_config(&config)
    }

    /// The lookup cache path, either configured or the policy file path with `.cache` appended.
    pub fn cache_file(&self) -> PathBuf {
        match &self.cache_file {
            Some(path) => path.clone(),
            None => {
                let mut name = OsString::from(self.policy_file.as_os_str());
                name.push(".cache");
                name.into()
            }
        }
    }
}

fn string(config: &File<'static>, key: &str) -> Result<Option<String>, Error> {
    let Some(value) = config.string(key) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|err| Error::Config {
        key: key.to_owned(),
        message: format!("not valid UTF-8: {err}"),
    })?;
    Ok(Some(value.to_owned()))
}
