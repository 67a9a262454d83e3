use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::Config;

const LOCAL_CONFIG: &str = "monika.json";

/// `~/.monika`, where the per-user config lives.
pub fn config_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".monika"))
}

/// Path `monika init` writes to when no `--config` is given.
pub fn default_config_path() -> PathBuf {
    config_home()
        .map(|dir| dir.join("config.json"))
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG))
}

/// Config files to try, most specific first.
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(LOCAL_CONFIG)];
    candidates.extend(config_home().map(|dir| dir.join("config.json")));
    candidates
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    let rest = match raw.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => return PathBuf::from(raw),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

pub fn read_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse config '{}'", path.display()))
}

pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory '{}'", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write config '{}'", path.display()))
}

/// A config together with the file it was read from.
///
/// Relative paths inside a config file are taken relative to that file's
/// directory, so `~/.monika/config.json` with `"folder": "knowledge"` keeps
/// facts in `~/.monika/knowledge`. Without a file they stay relative to the
/// working directory.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: Option<PathBuf>,
}

impl LoadedConfig {
    /// Read `explicit` if given (it must exist), otherwise the first existing
    /// candidate, otherwise fall back to defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let source = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => config_candidates().into_iter().find(|p| p.is_file()),
        };
        match source {
            Some(path) => Ok(Self {
                config: read_config(&path)?,
                source: Some(path),
            }),
            None => Ok(Self::default()),
        }
    }

    pub fn fact_folder(&self) -> PathBuf {
        self.resolve(&self.config.memory.folder)
    }

    pub fn history_file(&self) -> Option<PathBuf> {
        self.config
            .cli
            .history_file
            .as_deref()
            .map(|raw| self.resolve(raw))
    }

    fn resolve(&self, raw: &str) -> PathBuf {
        let path = expand_home(raw);
        let base = self
            .source
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty());
        match base {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }
}
