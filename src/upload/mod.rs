//! # Upload URL
//!
//! Issues time-limited, signed write URLs for new image objects. Each
//! URL names a fresh object key `<millis>.jpg` and pins the content
//! type and cache-control the object will be stored with.

mod errors;

pub use errors::{UploadError, UploadResult};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::middleware::TransportResponse;
use crate::observability::Logger;

pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";
/// 360 days
pub const IMAGE_CACHE_CONTROL: &str = "max-age=31104000";
pub const IMAGE_EXTENSION: &str = "jpg";

/// Signs upload URLs for one bucket
#[derive(Debug, Clone)]
pub struct UploadUrlGenerator {
    bucket: String,
    base_url: String,
    secret: Vec<u8>,
    expiry: Duration,
}

impl UploadUrlGenerator {
    pub fn new(
        bucket: impl Into<String>,
        base_url: impl Into<String>,
        secret: &[u8],
        expiry: Duration,
    ) -> UploadResult<Self> {
        let bucket = bucket.into();
        if bucket.is_empty() {
            return Err(UploadError::InvalidSettings("bucket must not be empty".into()));
        }
        if secret.is_empty() {
            return Err(UploadError::InvalidSettings("signing secret must not be empty".into()));
        }
        if expiry <= Duration::zero() {
            return Err(UploadError::InvalidSettings("expiry must be positive".into()));
        }

        Ok(Self {
            bucket,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.to_vec(),
            expiry,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Sign a URL for a new object key derived from the current time
    pub fn issue(&self) -> SignedUpload {
        self.issue_at(Utc::now())
    }

    /// Sign a URL for the object key derived from `now`
    pub fn issue_at(&self, now: DateTime<Utc>) -> SignedUpload {
        let key = format!("{}.{}", now.timestamp_millis(), IMAGE_EXTENSION);
        let expires_at = now + self.expiry;
        let signature = self.sign(&key, IMAGE_CONTENT_TYPE, expires_at.timestamp());

        Logger::trace("UPLOAD_URL_SIGNED", &[("bucket", &self.bucket), ("key", &key)]);

        SignedUpload {
            bucket: self.bucket.clone(),
            key,
            content_type: IMAGE_CONTENT_TYPE.to_string(),
            cache_control: IMAGE_CACHE_CONTROL.to_string(),
            expires_at,
            signature,
        }
    }

    /// Check the signature and expiry of an issued URL
    pub fn verify(&self, upload: &SignedUpload) -> UploadResult<()> {
        self.verify_at(upload, Utc::now())
    }

    pub fn verify_at(&self, upload: &SignedUpload, now: DateTime<Utc>) -> UploadResult<()> {
        if now > upload.expires_at {
            return Err(UploadError::UrlExpired);
        }

        let expected = self.sign(&upload.key, &upload.content_type, upload.expires_at.timestamp());
        if upload.bucket != self.bucket || upload.signature != expected {
            return Err(UploadError::InvalidSignature);
        }
        Ok(())
    }

    /// Full URL the client writes the object to
    pub fn url_for(&self, upload: &SignedUpload) -> String {
        format!(
            "{}/{}/{}?content-type={}&cache-control={}&expires={}&signature={}",
            self.base_url,
            upload.bucket,
            upload.key,
            upload.content_type.replace('/', "%2F"),
            upload.cache_control.replace('=', "%3D"),
            upload.expires_at.timestamp(),
            upload.signature
        )
    }

    fn sign(&self, key: &str, content_type: &str, expires: i64) -> String {
        let message = format!("{}/{}/{}/{}", self.bucket, key, content_type, expires);
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(message.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

/// A signed write grant for one object
#[derive(Debug, Clone, PartialEq)]
pub struct SignedUpload {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub cache_control: String,
    pub expires_at: DateTime<Utc>,
    pub signature: String,
}

/// What the client receives: where to write and the object key
#[derive(Debug, Clone, PartialEq)]
pub struct UploadTicket {
    pub upload_url: String,
    pub photo_filename: String,
}

/// Issue a URL and wrap it in a transport response
pub fn upload_image(generator: &UploadUrlGenerator) -> TransportResponse {
    let upload = generator.issue();
    let ticket = UploadTicket {
        upload_url: generator.url_for(&upload),
        photo_filename: upload.key.clone(),
    };

    Logger::info(
        "UPLOAD_URL_ISSUED",
        &[("bucket", generator.bucket()), ("key", &ticket.photo_filename)],
    );

    TransportResponse::json(
        200,
        &json!({
            "uploadURL": ticket.upload_url,
            "photoFilename": ticket.photo_filename,
        }),
    )
    .with_header("Access-Control-Allow-Origin", "*")
}
