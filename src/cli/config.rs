//! Configuration file support.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the notes root.
pub const ROOT_ENV: &str = "ZET_ROOT";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "ZET_CONFIG";

/// Application configuration loaded from config file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Notes root holding fleet/ and permanent/
    pub root: Option<PathBuf>,

    /// Index database file
    pub database: Option<PathBuf>,

    /// Editor command for opening notes
    pub editor: Option<String>,
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))
    }

    /// Returns the path to the config file.
    ///
    /// `$ZET_CONFIG` if set, otherwise `~/.config/zet/config.toml`.
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zet")
            .join("config.toml")
    }

    /// Resolve the notes root.
    ///
    /// Precedence order:
    /// 1. CLI `--root` argument
    /// 2. `$ZET_ROOT`
    /// 3. Config file `root` setting
    /// 4. `~/zet`
    pub fn root(&self, cli_root: Option<&Path>) -> PathBuf {
        let env_root = std::env::var_os(ROOT_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        self.resolve_root(cli_root, env_root)
    }

    fn resolve_root(&self, cli_root: Option<&Path>, env_root: Option<PathBuf>) -> PathBuf {
        cli_root
            .map(Path::to_path_buf)
            .or(env_root)
            .or_else(|| self.root.clone())
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("zet")
            })
    }

    /// Resolve the index database path.
    ///
    /// Precedence order:
    /// 1. CLI `--database` argument
    /// 2. Config file `database` setting
    /// 3. `<root>/.index/zettel.db`
    pub fn database(&self, cli_database: Option<&Path>, root: &Path) -> PathBuf {
        cli_database
            .map(Path::to_path_buf)
            .or_else(|| self.database.clone())
            .unwrap_or_else(|| root.join(".index").join("zettel.db"))
    }

    /// Resolve the editor command.
    ///
    /// Precedence order:
    /// 1. Config file `editor` setting
    /// 2. $EDITOR environment variable
    /// 3. $VISUAL environment variable
    /// 4. "vi" as fallback
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_no_root() {
        let config = Config::default();
        assert!(config.root.is_none());
        assert!(config.database.is_none());
    }

    #[test]
    fn root_prefers_cli_arg() {
        let config = Config {
            root: Some(PathBuf::from("/config/zet")),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_root(Some(Path::new("/cli/zet")), Some(PathBuf::from("/env/zet"))),
            PathBuf::from("/cli/zet")
        );
    }

    #[test]
    fn root_prefers_env_over_config() {
        let config = Config {
            root: Some(PathBuf::from("/config/zet")),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_root(None, Some(PathBuf::from("/env/zet"))),
            PathBuf::from("/env/zet")
        );
    }

    #[test]
    fn root_falls_back_to_config() {
        let config = Config {
            root: Some(PathBuf::from("/config/zet")),
            ..Config::default()
        };
        assert_eq!(config.resolve_root(None, None), PathBuf::from("/config/zet"));
    }

    #[test]
    fn root_defaults_to_home() {
        let config = Config::default();
        assert!(config.resolve_root(None, None).ends_with("zet"));
    }

    #[test]
    fn database_precedence() {
        let root = Path::new("/notes");
        let config = Config {
            database: Some(PathBuf::from("/config/zettel.db")),
            ..Config::default()
        };

        assert_eq!(
            config.database(Some(Path::new("/cli/zettel.db")), root),
            PathBuf::from("/cli/zettel.db")
        );
        assert_eq!(config.database(None, root), PathBuf::from("/config/zettel.db"));
        assert_eq!(
            Config::default().database(None, root),
            PathBuf::from("/notes/.index/zettel.db")
        );
    }

    #[test]
    fn configured_editor_wins() {
        let config = Config {
            editor: Some("nano".into()),
            ..Config::default()
        };
        assert_eq!(config.editor(), "nano");
    }

    #[test]
    fn load_from_parses_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "root = \"/srv/zet\"\neditor = \"hx\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.root, Some(PathBuf::from("/srv/zet")));
        assert_eq!(config.editor.as_deref(), Some("hx"));
        assert!(config.database.is_none());
    }

    #[test]
    fn load_from_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.root.is_none());
    }

    #[test]
    fn load_from_rejects_bad_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "root = [").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
