use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Heading level a header command formats blocks into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingTag {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingTag {
    /// Lower-case element tag name (`"h1"` .. `"h6"`).
    pub fn as_str(self) -> &'static str {
        match self {
            HeadingTag::H1 => "h1",
            HeadingTag::H2 => "h2",
            HeadingTag::H3 => "h3",
            HeadingTag::H4 => "h4",
            HeadingTag::H5 => "h5",
            HeadingTag::H6 => "h6",
        }
    }
}

impl fmt::Display for HeadingTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_PLACEHOLDER: &str = "Start writing here!";

/// Editor settings, fixed once an editor is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    pub header1: HeadingTag,
    pub header2: HeadingTag,
    pub placeholder: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            header1: HeadingTag::H1,
            header2: HeadingTag::H2,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// Caller-supplied settings. Only the fields that are present replace the
/// corresponding field of the base config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header1: Option<HeadingTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header2: Option<HeadingTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl ConfigOverrides {
    pub fn header1(mut self, tag: HeadingTag) -> Self {
        self.header1 = Some(tag);
        self
    }

    pub fn header2(mut self, tag: HeadingTag) -> Self {
        self.header2 = Some(tag);
        self
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    /// Merges these overrides over `base`, field by field.
    pub fn apply_to(self, base: EditorConfig) -> EditorConfig {
        EditorConfig {
            header1: self.header1.unwrap_or(base.header1),
            header2: self.header2.unwrap_or(base.header2),
            placeholder: self.placeholder.unwrap_or(base.placeholder),
        }
    }
}

impl From<ConfigOverrides> for EditorConfig {
    fn from(overrides: ConfigOverrides) -> Self {
        overrides.apply_to(EditorConfig::default())
    }
}

impl EditorConfig {
    /// Loads overrides from a TOML file and merges them over the defaults.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let overrides: ConfigOverrides =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(overrides.into()))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/writer");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Expands `~` and environment variables in a user supplied path.
    pub fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
