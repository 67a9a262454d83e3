use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub memory: MemoryConfig,
    pub cli: CliConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryConfig {
    /// Folder holding one `<key>.txt` file per fact. Relative paths resolve
    /// against the working directory.
    pub folder: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            folder: "knowledge".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CliConfig {
    pub prompt: String,
    /// Where to persist line-editor history. Unset = no history file.
    pub history_file: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".into(),
            history_file: None,
        }
    }
}
