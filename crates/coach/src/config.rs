//! Configuration file support for interview-coach.
//!
//! Settings come from CLI flags, `coach.toml` in the working directory and
//! `config.toml` in the user's config directory, in that order of priority.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use coach_gateway::ReplyProtocol;
use coach_model::{API_KEY_ENV_VARS, DEFAULT_MODEL};
use coach_types::Difficulty;

/// The project config file name
pub const CONFIG_FILE_NAME: &str = "coach.toml";

/// Directory under the user's config dir holding the global config
pub const GLOBAL_CONFIG_DIR: &str = "interview-coach";

/// The global config file name
pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

/// Settings that may appear in either config file
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Model identifier
    pub model: Option<String>,
    /// Default job role to practice for
    pub role: Option<String>,
    /// Default difficulty (easy, medium, hard)
    pub difficulty: Option<String>,
    /// Directory holding the history slot
    pub history_dir: Option<PathBuf>,
    /// `sentinel` or `tagged`
    pub reply_protocol: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Extra environment variable checked first for the API key
    pub api_key_env: Option<String>,
}

impl FileConfig {
    /// Load a config file.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(config))
    }

    /// Load `coach.toml` from the working directory
    pub fn load_project(working_dir: &Path) -> Result<Option<Self>> {
        Self::load_from(&working_dir.join(CONFIG_FILE_NAME))
    }

    /// Load the global config, if a config directory exists
    pub fn load_global() -> Result<Option<Self>> {
        match global_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }
}

pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_FILE))
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub role: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub history_dir: Option<PathBuf>,
    pub reply_protocol: Option<ReplyProtocol>,
}

/// Effective settings after applying precedence
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: String,
    pub role: Option<String>,
    pub difficulty: Difficulty,
    pub history_dir: Option<PathBuf>,
    pub reply_protocol: ReplyProtocol,
    pub timeout: Option<Duration>,
    pub api_key_env: Option<String>,
}

impl Settings {
    /// Load both config files and resolve against the CLI values
    pub fn load(cli: CliOverrides, working_dir: &Path) -> Result<Self> {
        let global = FileConfig::load_global().context("Failed to load global configuration")?;
        let project = FileConfig::load_project(working_dir)
            .context("Failed to load project configuration")?;
        Self::resolve(cli, project.as_ref(), global.as_ref())
    }

    /// Precedence: CLI flags > project config > global config > default
    pub fn resolve(
        cli: CliOverrides,
        project: Option<&FileConfig>,
        global: Option<&FileConfig>,
    ) -> Result<Self> {
        let layers: Vec<&FileConfig> = project.into_iter().chain(global).collect();
        let pick = |get: fn(&FileConfig) -> Option<&String>| -> Option<String> {
            layers.iter().find_map(|c| get(c)).cloned()
        };

        let difficulty = match cli.difficulty {
            Some(d) => d,
            None => pick(|c| c.difficulty.as_ref())
                .map(|s| s.parse::<Difficulty>())
                .transpose()
                .map_err(|e| anyhow::anyhow!("Invalid difficulty in config: {}", e))?
                .unwrap_or_default(),
        };

        let reply_protocol = match cli.reply_protocol {
            Some(p) => p,
            None => pick(|c| c.reply_protocol.as_ref())
                .map(|s| s.parse::<ReplyProtocol>())
                .transpose()
                .map_err(|e| anyhow::anyhow!("Invalid reply_protocol in config: {}", e))?
                .unwrap_or_default(),
        };

        let history_dir = cli
            .history_dir
            .or_else(|| layers.iter().find_map(|c| c.history_dir.clone()));

        let timeout = layers
            .iter()
            .find_map(|c| c.timeout_secs)
            .map(Duration::from_secs);

        Ok(Self {
            model: cli
                .model
                .or_else(|| pick(|c| c.model.as_ref()))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            role: cli.role.or_else(|| pick(|c| c.role.as_ref())),
            difficulty,
            history_dir,
            reply_protocol,
            timeout,
            api_key_env: pick(|c| c.api_key_env.as_ref()),
        })
    }

    /// Environment variables to check for the API key, in order
    pub fn api_key_vars(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = self.api_key_env.as_deref().into_iter().collect();
        vars.extend(API_KEY_ENV_VARS);
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file(content: &str) -> FileConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(FileConfig::load_project(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_project_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "model = \"gemini-2.5-pro\"\ndifficulty = \"hard\"\ntimeout_secs = 30\n",
        )
        .unwrap();

        let config = FileConfig::load_project(dir.path()).unwrap().unwrap();
        assert_eq!(config.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(config.timeout_secs, Some(30));
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "agent = \"claude\"\n").unwrap();
        assert!(FileConfig::load_project(dir.path()).is_err());
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(CliOverrides::default(), None, None).unwrap();
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.difficulty, Difficulty::Medium);
        assert_eq!(settings.reply_protocol, ReplyProtocol::Sentinel);
        assert!(settings.role.is_none());
        assert!(settings.timeout.is_none());
        assert_eq!(settings.api_key_vars(), vec!["GEMINI_API_KEY", "API_KEY"]);
    }

    #[test]
    fn test_precedence() {
        let project = file("model = \"project-model\"\nrole = \"Data Scientist\"\n");
        let global = file(
            "model = \"global-model\"\nrole = \"SRE\"\ndifficulty = \"easy\"\nreply_protocol = \"tagged\"\napi_key_env = \"MY_KEY\"\n",
        );

        let settings = Settings::resolve(CliOverrides::default(), Some(&project), Some(&global))
            .unwrap();
        assert_eq!(settings.model, "project-model");
        assert_eq!(settings.role.as_deref(), Some("Data Scientist"));
        assert_eq!(settings.difficulty, Difficulty::Easy);
        assert_eq!(settings.reply_protocol, ReplyProtocol::Tagged);
        assert_eq!(settings.api_key_vars(), vec!["MY_KEY", "GEMINI_API_KEY", "API_KEY"]);

        let cli = CliOverrides {
            model: Some("cli-model".to_string()),
            difficulty: Some(Difficulty::Hard),
            ..Default::default()
        };
        let settings = Settings::resolve(cli, Some(&project), Some(&global)).unwrap();
        assert_eq!(settings.model, "cli-model");
        assert_eq!(settings.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_invalid_difficulty_in_config() {
        let project = file("difficulty = \"extreme\"\n");
        assert!(Settings::resolve(CliOverrides::default(), Some(&project), None).is_err());
    }
}
