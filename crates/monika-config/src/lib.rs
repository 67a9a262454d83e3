pub mod loader;
pub mod schema;

pub use loader::{
    config_candidates, default_config_path, expand_home, read_config, write_config, LoadedConfig,
};
pub use schema::{CliConfig, Config, MemoryConfig};
