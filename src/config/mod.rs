mod env_overrides;
mod loader;
pub mod schema;
#[cfg(test)]
mod scoped_env;

pub use schema::{Config, ExecutionConfig, LoggingConfig, ReplanConfig};
