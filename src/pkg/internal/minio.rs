use std::time::Duration;

use aws_sdk_s3::{
    config::{BehaviorVersion, Credentials, Region},
    presigning::PresigningConfig,
    primitives::ByteStream,
    Client,
};
use standard_error::{Interpolate, StandardError};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::{conf::settings, prelude::Result};

pub fn client() -> Client {
    let credentials = Credentials::new(
        &settings.s3_access_key,
        &settings.s3_secret_key,
        None,
        None,
        "cvscreen",
    );
    let conf = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(settings.s3_region.clone()))
        .endpoint_url(&settings.s3_endpoint)
        .credentials_provider(credentials)
        .force_path_style(true)
        .build();
    Client::from_conf(conf)
}

pub async fn ensure_bucket(
    client: &Client,
    bucket_name: &str,
) -> Result<Option<aws_sdk_s3::operation::create_bucket::CreateBucketOutput>> {
    let constraint =
        aws_sdk_s3::types::BucketLocationConstraint::from(settings.s3_region.to_string().as_str());
    let cfg = aws_sdk_s3::types::CreateBucketConfiguration::builder()
        .location_constraint(constraint)
        .build();
    let create = client
        .create_bucket()
        .create_bucket_configuration(cfg)
        .bucket(bucket_name)
        .send()
        .await;
    create.map(Some).or_else(|err| {
        if err
            .as_service_error()
            .map(|se| se.is_bucket_already_exists() || se.is_bucket_already_owned_by_you())
            == Some(true)
        {
            Ok(None)
        } else {
            Err(StandardError::new("ERR-S3-001"))
        }
    })
}

#[async_trait::async_trait]
pub trait S3Ops {
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;
    async fn retrieve_object(&self, bucket: &str, key: &str) -> Result<(Vec<u8>, String)>;
    async fn presigned_get_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String>;
}

#[async_trait::async_trait]
impl S3Ops for Client {
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StandardError::new("ERR-S3-002").interpolate_err(e.to_string()))?;
        Ok(())
    }

    async fn retrieve_object(&self, bucket: &str, key: &str) -> Result<(Vec<u8>, String)> {
        let object = self
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StandardError::new("ERR-S3-003").interpolate_err(e.to_string()))?;
        let content_type = object
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = object
            .body
            .collect()
            .await
            .map_err(|e| StandardError::new("ERR-S3-003").interpolate_err(e.to_string()))?
            .into_bytes()
            .to_vec();
        Ok((data, content_type))
    }

    /// Short-lived read access for the extraction service; no permanent
    /// credentials ever leave this process.
    async fn presigned_get_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| StandardError::new("ERR-S3-004").interpolate_err(e.to_string()))?;
        let request = self
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StandardError::new("ERR-S3-004").interpolate_err(e.to_string()))?;
        Ok(request.uri().to_string())
    }
}

/// One-way sanitizer for storage keys: strips diacritics, collapses
/// anything unsafe to `_`, lowercases. Applies to the key only — the
/// original filename stays on the record for display, and CV text content
/// never passes through here.
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let replaced: String = stripped
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut collapsed = String::with_capacity(replaced.len());
    let mut previous: Option<char> = None;
    for c in replaced.chars() {
        if (c == '_' || c == '.') && previous == Some(c) {
            continue;
        }
        collapsed.push(c);
        previous = Some(c);
    }
    collapsed
        .trim_matches(|c| c == '_' || c == '.')
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accents_are_stripped_from_keys_only() {
        assert_eq!(sanitize_filename("José Pérez CV.pdf"), "jose_perez_cv.pdf");
        assert_eq!(sanitize_filename("résumé.pdf"), "resume.pdf");
    }

    #[test]
    fn unsafe_characters_collapse_to_single_underscores() {
        assert_eq!(sanitize_filename("my  cv (final).pdf"), "my_cv_final_.pdf");
        assert_eq!(sanitize_filename("a///b.pdf"), "a_b.pdf");
    }

    #[test]
    fn dots_and_edges_are_tidied() {
        assert_eq!(sanitize_filename("..cv..pdf."), "cv.pdf");
        assert_eq!(sanitize_filename("_cv_.pdf"), "cv_.pdf");
    }

    #[test]
    fn hyphens_and_case_are_normalized() {
        assert_eq!(sanitize_filename("CV-2025-Final.PDF"), "cv-2025-final.pdf");
    }
}
