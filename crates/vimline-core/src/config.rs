//! User configuration, read from `config.toml` in the platform config dir.
//!
//! ```toml
//! timeoutlen = 500
//! enable_shell_commands = false
//!
//! [[mappings]]
//! mode = "insert"
//! lhs = "jk"
//! rhs = "<Esc>"
//! noremap = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::keys::parse_keys;
use crate::mode::ModeSet;
use crate::remap::{Mapping, RemapTable};
use crate::session::{Capabilities, HostIntegration, Options};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Milliseconds to wait for the rest of an ambiguous mapping.
    pub timeoutlen: u64,
    pub enable_shell_commands: bool,
    /// Program and leading arguments that `:read !cmd` runs `cmd` with.
    pub shell: Vec<String>,
    pub undo_levels: usize,
    pub scroll: usize,
    pub shiftwidth: usize,
    pub max_remap_depth: usize,
    pub mappings: Vec<MappingConfig>,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        let options = Options::default();
        Self {
            timeoutlen: 1000,
            enable_shell_commands: true,
            shell: vec!["sh".to_string(), "-c".to_string()],
            undo_levels: options.undo_levels,
            scroll: options.scroll,
            shiftwidth: options.shiftwidth,
            max_remap_depth: 1000,
            mappings: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MappingConfig {
    /// `normal`, `visual`, `operator`, `insert`, `command` or `all`.
    #[serde(default = "default_mapping_mode")]
    pub mode: String,
    pub lhs: String,
    pub rhs: String,
    #[serde(default)]
    pub noremap: bool,
}

fn default_mapping_mode() -> String {
    "all".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file; logging is off without one.
    pub file: Option<PathBuf>,
    /// An `EnvFilter` directive such as `debug` or `vimline_core=trace`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

/// Location: `~/.config/vimline/config.toml` (XDG-compliant)
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "vimline").map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Config {
    /// Load the user's config file, falling back to defaults when there is
    /// none.
    pub fn load() -> Result<Self, ConfigError> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        info!(path = %path.display(), mappings = config.mappings.len(), "config loaded");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn remap_timeout(&self) -> Duration {
        Duration::from_millis(self.timeoutlen)
    }

    pub fn options(&self) -> Options {
        Options {
            scroll: self.scroll,
            shiftwidth: self.shiftwidth,
            undo_levels: self.undo_levels,
        }
    }

    pub fn capabilities(&self, host: HostIntegration) -> Capabilities {
        Capabilities {
            shell_commands: self.enable_shell_commands,
            host,
        }
    }

    /// Add the configured mappings to `table`.
    pub fn install_mappings(&self, table: &mut RemapTable) -> Result<(), ConfigError> {
        for entry in &self.mappings {
            let invalid = |reason: &str| ConfigError::InvalidMapping {
                lhs: entry.lhs.clone(),
                reason: reason.to_string(),
            };
            let modes = mode_set(&entry.mode).ok_or_else(|| invalid("unknown mode"))?;
            let mapping = Mapping::new(parse_keys(&entry.lhs), parse_keys(&entry.rhs), entry.noremap);
            table
                .insert(modes, mapping)
                .map_err(|e| invalid(&e.to_string()))?;
        }
        Ok(())
    }
}

fn mode_set(name: &str) -> Option<ModeSet> {
    match name {
        "normal" => Some(ModeSet::NORMAL),
        "visual" => Some(ModeSet::VISUAL),
        "operator" => Some(ModeSet::OPERATOR_PENDING),
        "insert" => Some(ModeSet::INSERT),
        "command" => Some(ModeSet::COMMAND_LINE),
        "all" => Some(ModeSet::MAP),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use crate::remap::RemapLookup;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml(
            r#"
            timeoutlen = 250
            enable_shell_commands = false

            [logging]
            file = "/tmp/vimline.log"

            [[mappings]]
            mode = "insert"
            lhs = "jk"
            rhs = "<Esc>"
            noremap = true

            [[mappings]]
            lhs = "Q"
            rhs = "dd"
            "#,
        )
        .unwrap();
        assert_eq!(config.remap_timeout(), Duration::from_millis(250));
        assert!(!config.capabilities(HostIntegration::Full).shell_commands);
        assert_eq!(config.scroll, 10);
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/vimline.log")));
        assert_eq!(config.logging.level, "info");

        let mut table = RemapTable::new();
        config.install_mappings(&mut table).unwrap();
        assert!(matches!(
            table.lookup(Mode::Insert, &parse_keys("jk")),
            RemapLookup::Full(m) if m.noremap
        ));
        assert!(matches!(
            table.lookup(Mode::OperatorPending, &parse_keys("Q")),
            RemapLookup::Full(_)
        ));
        assert_eq!(table.lookup(Mode::Insert, &parse_keys("Q")), RemapLookup::NoMatch);
    }

    #[test]
    fn test_bad_mapping_mode() {
        let config = Config::from_toml(
            r#"
            [[mappings]]
            mode = "sideways"
            lhs = "x"
            rhs = "y"
            "#,
        )
        .unwrap();
        let err = config.install_mappings(&mut RemapTable::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid mapping `x`: unknown mode"
        );
    }

    #[test]
    fn test_type_errors_are_reported() {
        assert!(matches!(
            Config::from_toml("timeoutlen = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scroll = 5\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().scroll, 5);
        assert!(matches!(
            Config::load_from(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
