//! Object storage for uploaded resumes (S3 or MinIO).

use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::errors::AppError;

const RESUME_PREFIX: &str = "resumes";

#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
}

impl ObjectStore {
    /// Static credentials when both keys are configured, otherwise the default
    /// AWS credential chain. A custom endpoint switches to path-style addressing.
    pub async fn connect(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key_id,
                secret,
                None,
                None,
                "hr-assistant-static",
            ));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        info!("Object storage initialized (bucket: {})", config.bucket);
        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }

    pub async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("put_object {key}: {e}")))?;
        Ok(())
    }

    /// Stores an uploaded resume and returns its object key.
    pub async fn put_resume(
        &self,
        file_name: Option<&str>,
        body: Bytes,
        content_type: &str,
    ) -> Result<String, AppError> {
        let key = resume_key(Uuid::new_v4(), file_name);
        self.put(&key, body, content_type).await?;
        info!("Stored resume upload at s3://{}/{key}", self.bucket);
        Ok(key)
    }
}

/// `resumes/<upload id>/<file name>`, with the file name reduced to a safe
/// character set.
pub fn resume_key(upload_id: Uuid, file_name: Option<&str>) -> String {
    let name: String = file_name
        .unwrap_or("resume")
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("resume")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let name = if name.trim_matches(['.', '_']).is_empty() {
        "resume".to_string()
    } else {
        name
    };
    format!("{RESUME_PREFIX}/{upload_id}/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_key_sanitises_file_name() {
        let id = Uuid::nil();
        assert_eq!(
            resume_key(id, Some("../../etc/Jane Doe CV.pdf")),
            "resumes/00000000-0000-0000-0000-000000000000/Jane_Doe_CV.pdf"
        );
        assert_eq!(
            resume_key(id, Some(r"C:\Users\jane\cv.txt")),
            "resumes/00000000-0000-0000-0000-000000000000/cv.txt"
        );
    }

    #[test]
    fn test_resume_key_defaults_name() {
        let id = Uuid::nil();
        assert!(resume_key(id, None).ends_with("/resume"));
        assert!(resume_key(id, Some("..")).ends_with("/resume"));
    }
}
