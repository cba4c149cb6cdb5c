use config::{Config, ConfigError, Environment};
use dotenv::dotenv;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    Postgres,
    /// Process-local store; nothing survives a restart.
    Memory,
}

#[derive(Clone, Debug, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub presign_ttl_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_pool_size: u32,
    pub repository: RepositoryKind,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub max_page_size: i64,
    pub s3: S3Config,
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment. Nested keys
    /// use `__`, e.g. `S3__BUCKET`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_env(Environment::default().separator("__").try_parsing(true))
    }

    pub fn from_env(source: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("database_url", "")?
            .set_default("database_pool_size", 10)?
            .set_default("repository", "postgres")?
            .set_default("host", "127.0.0.1")?
            .set_default("port", 3000)?
            .set_default("max_page_size", 100)?
            .set_default("s3.bucket", "")?
            .set_default("s3.region", "us-east-1")?
            .set_default("s3.presign_ttl_secs", 300)?
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
