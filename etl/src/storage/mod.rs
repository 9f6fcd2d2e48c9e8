use crate::utils::paths::s3_bucket;
use common::config::StorageConfig;
use common::Result;
use datafusion::execution::context::SessionContext;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Builds and caches one S3 object store per bucket and registers it with DataFusion.
#[derive(Clone)]
pub struct StorageManager {
    config: Option<StorageConfig>,
    object_store_cache: Arc<dashmap::DashMap<String, Arc<AmazonS3>>>,
}

impl StorageManager {
    pub fn new(config: Option<StorageConfig>) -> Self {
        Self {
            config,
            object_store_cache: Arc::new(dashmap::DashMap::new()),
        }
    }

    pub fn get_object_store(&self, bucket: &str) -> Result<Arc<AmazonS3>> {
        if let Some(store) = self.object_store_cache.get(bucket) {
            return Ok(store.clone());
        }

        // Without explicit credentials the builder falls back to AWS_* environment variables.
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(config) = &self.config {
            builder = builder
                .with_region(&config.region)
                .with_access_key_id(&config.access_key)
                .with_secret_access_key(&config.secret_key)
                .with_allow_http(config.allow_http);
            if let Some(endpoint) = &config.endpoint {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = Arc::new(builder.build()?);
        self.object_store_cache
            .insert(bucket.to_string(), store.clone());
        Ok(store)
    }

    pub fn register_object_store(&self, ctx: &SessionContext, bucket: &str) -> Result<()> {
        let store = self.get_object_store(bucket)?;
        let url = Url::parse(&format!("s3://{}", bucket))?;
        ctx.runtime_env().register_object_store(&url, store);
        info!(bucket, "Registered S3 object store");
        Ok(())
    }

    /// Registers a store for every `s3://` location; local paths need nothing.
    pub fn register_locations(&self, ctx: &SessionContext, locations: &[&str]) -> Result<()> {
        for location in locations {
            if let Some(bucket) = s3_bucket(location)? {
                self.register_object_store(ctx, &bucket)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_locations_register_nothing() {
        let ctx = SessionContext::new();
        let manager = StorageManager::new(None);
        manager
            .register_locations(&ctx, &["/tmp/in", "/tmp/out"])
            .unwrap();
        assert!(manager.object_store_cache.is_empty());
    }

    #[test]
    fn test_s3_store_is_cached_per_bucket() {
        let ctx = SessionContext::new();
        let manager = StorageManager::new(Some(StorageConfig {
            endpoint: Some("http://localhost:9000".to_string()),
            region: "us-east-1".to_string(),
            access_key: "minio".to_string(),
            secret_key: "minio123".to_string(),
            allow_http: true,
        }));
        manager
            .register_locations(&ctx, &["s3a://source/", "s3://lake/out", "s3://lake/other"])
            .unwrap();
        assert_eq!(manager.object_store_cache.len(), 2);

        let url = Url::parse("s3://lake").unwrap();
        assert!(ctx
            .runtime_env()
            .object_store(datafusion::execution::object_store::ObjectStoreUrl::parse(url.as_str()).unwrap())
            .is_ok());
    }
}
