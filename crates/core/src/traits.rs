//! ObjectStore trait definition
//!
//! This trait defines the bucket and object operations shared by the local
//! emulation store and the remote API client. The CLI picks one
//! implementation per invocation and only talks to it through this trait.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::{BucketRef, ObjectPath};

/// Optional HTTP metadata stored alongside an object body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,

    /// Expiration time, passed through as given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

impl ObjectMetadata {
    /// Header names paired with the fields that map onto them
    pub const HEADER_NAMES: [&'static str; 6] = [
        "content-type",
        "content-encoding",
        "content-language",
        "content-disposition",
        "cache-control",
        "expires",
    ];

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self.headers().is_empty()
    }

    /// The set fields as (header name, value) pairs
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        Self::HEADER_NAMES
            .iter()
            .zip(self.fields())
            .filter_map(|(name, value)| value.map(|v| (*name, v)))
            .collect()
    }

    /// Build metadata from (header name, value) pairs, ignoring unknown headers
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut metadata = Self::default();
        for (name, value) in headers {
            let slot = match name.to_ascii_lowercase().as_str() {
                "content-type" => &mut metadata.content_type,
                "content-encoding" => &mut metadata.content_encoding,
                "content-language" => &mut metadata.content_language,
                "content-disposition" => &mut metadata.content_disposition,
                "cache-control" => &mut metadata.cache_control,
                "expires" => &mut metadata.expires,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        metadata
    }

    fn fields(&self) -> [Option<&str>; 6] {
        [
            self.content_type.as_deref(),
            self.content_encoding.as_deref(),
            self.content_language.as_deref(),
            self.content_disposition.as_deref(),
            self.cache_control.as_deref(),
            self.expires.as_deref(),
        ]
    }
}

/// Information about a stored object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,

    /// Size in bytes
    pub size_bytes: u64,

    /// Human-readable size
    pub size_human: String,

    /// Upload timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// Hex SHA-256 of the body (local store) or ETag (remote)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object of the given size
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size_bytes: size,
            size_human: humansize::format_size(size, humansize::BINARY),
            last_modified: None,
            checksum: None,
        }
    }
}

/// A bucket as reported by a list operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketInfo {
    pub name: String,

    /// Creation date as reported by the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

/// Object body together with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub metadata: ObjectMetadata,
    pub info: ObjectInfo,
}

/// Trait for bucket and object storage operations
///
/// Implemented by the local emulation store and the remote API client,
/// and mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create a bucket
    async fn create_bucket(&self, bucket: &BucketRef) -> Result<()>;

    /// List buckets, in the order the backend reports them
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>>;

    /// Delete a bucket
    async fn delete_bucket(&self, bucket: &BucketRef) -> Result<()>;

    /// Store an object, replacing any previous object at the same path
    async fn put_object(
        &self,
        path: &ObjectPath,
        body: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<ObjectInfo>;

    /// Fetch an object body and metadata
    async fn get_object(&self, path: &ObjectPath) -> Result<StoredObject>;

    /// Delete an object
    async fn delete_object(&self, path: &ObjectPath) -> Result<()>;
}
