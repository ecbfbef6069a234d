/// Object store backends for downloaded audio
use crate::config::{ObjectStoreBackend, ObjectStoreSettings};
use crate::error::{Result, ServerError};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use bytes::Bytes;
use mixtape_core::objects::virtual_hosted_url;
use mixtape_core::{MixtapeError, ObjectStore};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Build the backend selected in configuration
pub async fn build(settings: &ObjectStoreSettings) -> Result<Arc<dyn ObjectStore>> {
    match settings.backend {
        ObjectStoreBackend::S3 => {
            let (Some(domain), Some(access_key_id), Some(secret_access_key)) = (
                settings.domain.as_deref(),
                settings.access_key_id.as_deref(),
                settings.secret_access_key.as_deref(),
            ) else {
                return Err(ServerError::Config(
                    "s3 backend needs domain, access_key_id and secret_access_key".to_string(),
                ));
            };

            tracing::info!(domain, region = %settings.region, "Using S3 object store");
            Ok(Arc::new(S3ObjectStore::new(
                domain,
                &settings.region,
                access_key_id,
                secret_access_key,
            )))
        }
        ObjectStoreBackend::Filesystem => {
            let store = FileObjectStore::new(settings.root.clone(), settings.public_base_url.clone());
            store.initialize().await?;
            tracing::info!(root = %settings.root.display(), "Using filesystem object store");
            Ok(Arc::new(store))
        }
    }
}

/// S3-compatible bucket storage with public-read objects
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    domain: String,
}

impl S3ObjectStore {
    pub fn new(domain: &str, region: &str, access_key_id: &str, secret_access_key: &str) -> Self {
        let credentials =
            Credentials::new(access_key_id, secret_access_key, None, None, "mixtape-config");

        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(format!("https://{domain}"))
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(config),
            domain: domain.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> mixtape_core::Result<()> {
        let content_type = if content_type.is_empty() {
            mime_guess::from_path(key)
                .first_raw()
                .unwrap_or("application/octet-stream")
        } else {
            content_type
        };

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                MixtapeError::store(format!(
                    "failed to put {bucket}/{key}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        virtual_hosted_url(bucket, &self.domain, key)
    }
}

/// Local directory laid out as `{root}/{bucket}/{key}`
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl FileObjectStore {
    pub fn new(root: PathBuf, public_base_url: Option<String>) -> Self {
        let public_base_url = public_base_url
            .unwrap_or_else(|| format!("file://{}", root.display()))
            .trim_end_matches('/')
            .to_string();

        Self {
            root,
            public_base_url,
        }
    }

    /// Create the root directory
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Where an object lives on disk
    pub fn object_path(&self, bucket: &str, key: &str) -> mixtape_core::Result<PathBuf> {
        for part in [bucket, key] {
            if !is_plain_name(part) {
                return Err(MixtapeError::store(format!(
                    "invalid object name '{part}'"
                )));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> mixtape_core::Result<()> {
        let path = self.object_path(bucket, key)?;
        let dir = self.root.join(bucket);
        let temp = dir.join(format!(".{key}.{}.partial", uuid::Uuid::new_v4().simple()));

        let write = async {
            fs::create_dir_all(&dir).await?;
            fs::write(&temp, &bytes).await?;
            fs::rename(&temp, &path).await
        };

        if let Err(e) = write.await {
            let _ = fs::remove_file(&temp).await;
            return Err(MixtapeError::store(format!(
                "failed to write {}: {e}",
                path.display()
            )));
        }

        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{bucket}/{key}", self.public_base_url)
    }
}

/// A single normal path component (no separators, no `..`)
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
