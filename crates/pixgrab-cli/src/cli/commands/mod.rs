//! CLI command handlers.

mod config;
mod keyword;

pub use config::show_config;
pub use keyword::{run_keyword, KeywordArgs};
