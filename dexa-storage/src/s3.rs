use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{config::Credentials, Client};
use dexa_core::{BlobStore, CoreError, Result};
use serde::{Deserialize, Serialize};

/// Object storage settings. `endpoint` points at S3-compatible services
/// such as MinIO or LocalStack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct S3Config {
    pub endpoint: Option<String>,
    pub bucket: String,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            bucket: "dexa-datasets".to_string(),
            region: "us-east-1".to_string(),
            access_key: None,
            secret_key: None,
        }
    }
}

pub async fn create_client(config: &S3Config) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()));

    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        let credentials = Credentials::new(access_key, secret_key, None, None, "dexa-config");
        loader = loader.credentials_provider(credentials);
    }

    let shared = loader.load().await;
    let mut builder = aws_sdk_s3::config::Builder::from(&shared);

    if let Some(endpoint) = &config.endpoint {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }

    tracing::info!(bucket = %config.bucket, region = %config.region, "S3 client created");
    Client::from_conf(builder.build())
}

/// Raw dataset files in one S3 bucket.
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub async fn from_config(config: &S3Config) -> Self {
        Self::new(create_client(config).await, config.bucket.clone())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn upstream(action: &str, key: &str, err: impl std::fmt::Display) -> CoreError {
    CoreError::Upstream(format!("Blob {} failed for '{}': {}", action, key, err))
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<()> {
        let size = data.len();
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(data.into());

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.map_err(|e| upstream("upload", key, e))?;

        tracing::info!(key, size, "Uploaded object to S3");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| upstream("download", key, e))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| upstream("download", key, e))?
            .into_bytes()
            .to_vec();

        tracing::debug!(key, size = data.len(), "Downloaded object from S3");
        Ok(data)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| upstream("delete", key, e))?;

        tracing::info!(key, "Deleted object from S3");
        Ok(())
    }
}
