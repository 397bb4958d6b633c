use anyhow::{bail, Result};
use config::{Config as ConfigLoader, Environment, File, FileFormat};
use dexa_api::observability::LogConfig;
use dexa_api::ApiSettings;
use dexa_core::domain::{ChatConfig, LlmConfig, UploadConfig};
use dexa_storage::S3Config;
use serde::Deserialize;
use validator::Validate;

/// Where uploaded files are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services such as MinIO
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let s3 = S3Config::default();
        Self {
            backend: StorageBackend::default(),
            bucket: s3.bucket,
            region: s3.region,
            endpoint: s3.endpoint,
            access_key: s3.access_key,
            secret_key: s3.secret_key,
        }
    }
}

impl StorageConfig {
    pub fn s3(&self) -> S3Config {
        S3Config {
            endpoint: self.endpoint.clone(),
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    /// Postgres URL; metadata stays in memory when unset
    pub database_url: Option<String>,
    pub storage: StorageConfig,
    #[validate(nested)]
    pub llm: LlmConfig,
    #[validate(nested)]
    pub upload: UploadConfig,
    #[validate(nested)]
    pub chat: ChatConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: None,
            storage: StorageConfig::default(),
            llm: LlmConfig::default(),
            upload: UploadConfig::default(),
            chat: ChatConfig::default(),
            auth: AuthConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, then `config/default`, then `config/local`, then
    /// `DEXA__*` environment variables (`__` separates nested keys).
    pub fn load() -> Result<Self> {
        let loader = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("DEXA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(loader)
    }

    /// Parses a TOML document layered over the defaults.
    pub fn from_toml(source: &str) -> Result<Self> {
        let loader = ConfigLoader::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;

        Self::finish(loader)
    }

    fn finish(loader: ConfigLoader) -> Result<Self> {
        let config: Self = loader.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        self.validate()?;
        if self.auth.jwt_secret.trim().is_empty() {
            bail!("auth.jwt_secret must be set (DEXA__AUTH__JWT_SECRET)");
        }
        if self.database_url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            bail!("database_url must not be empty when set");
        }
        Ok(())
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            jwt_secret: self.auth.jwt_secret.clone(),
            llm: self.llm.clone(),
            upload: self.upload.clone(),
            chat: self.chat.clone(),
        }
    }
}
