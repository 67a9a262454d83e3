pub mod dispatcher;
pub mod memory;

// Re-export key types
pub use dispatcher::{parse_command, Command, Dispatcher, Keyword, ParseError};
pub use memory::{sanitize_filename, FactStore, Facts, NOT_REMEMBERED};
