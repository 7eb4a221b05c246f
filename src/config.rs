use config::builder::DefaultState;
use config::{Config as ConfigLoader, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_NAME: &str = "service";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServiceConfig {
    // General
    pub log_level: String,

    // Identity
    pub name: String,

    // Throttling: permits per second, 0 disables
    pub rate_limit: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            name: DEFAULT_NAME.to_string(),
            rate_limit: 0,
        }
    }
}

impl ServiceConfig {
    /// Defaults, then an optional `service.{toml,yaml,json}` in the working
    /// directory, then `SERVICE_*` environment variables (a `.env` file is read
    /// first if present).
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("service").required(false))
            .add_source(Environment::with_prefix("SERVICE").try_parsing(true));

        Self::from_builder(builder)
    }

    /// Apply defaults underneath whatever sources `builder` already carries.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings = builder
            .set_default("log_level", DEFAULT_LOG_LEVEL)?
            .set_default("name", DEFAULT_NAME)?
            .set_default("rate_limit", 0)?
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
