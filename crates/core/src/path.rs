//! Object path parsing and name validation
//!
//! Object paths have the format: bucket/key
//! The key is everything after the first slash and may itself contain slashes.

use crate::error::{Error, Result};

/// A parsed object path pointing to a key inside a bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath {
    /// Bucket name
    pub bucket: String,
    /// Object key, treated as one opaque string
    pub key: String,
}

impl ObjectPath {
    /// Create a new ObjectPath without validation
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Get the full path as a string (bucket/key)
    pub fn to_full_path(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }

    /// Final path component of the key, used as a display/file name
    pub fn file_name(&self) -> &str {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.key)
    }
}

impl std::fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_full_path())
    }
}

impl std::str::FromStr for ObjectPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_object_path(s)
    }
}

/// A bucket name with an optional jurisdiction tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRef {
    pub name: String,
    pub jurisdiction: Option<String>,
}

impl BucketRef {
    /// Validate the name and build a BucketRef
    pub fn new(name: impl Into<String>, jurisdiction: Option<String>) -> Result<Self> {
        let name = name.into();
        validate_bucket_name(&name)?;
        Ok(Self { name, jurisdiction })
    }
}

impl std::fmt::Display for BucketRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.jurisdiction {
            Some(j) => write!(f, "{} ({j})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Parse a `bucket/key` string into an ObjectPath
pub fn parse_object_path(path: &str) -> Result<ObjectPath> {
    if path.is_empty() {
        return Err(Error::Validation("Object path cannot be empty".into()));
    }

    let Some((bucket, key)) = path.split_once('/') else {
        return Err(Error::Validation(format!(
            "Invalid object path '{path}'. Expected: bucket/key"
        )));
    };

    validate_bucket_name(bucket)?;

    if key.is_empty() {
        return Err(Error::Validation("Object key cannot be empty".into()));
    }

    Ok(ObjectPath::new(bucket, key))
}

/// Check that a bucket name can be used both remotely and as a local directory
pub fn validate_bucket_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("Bucket name cannot be empty".into()));
    }

    if name.chars().any(char::is_whitespace) {
        return Err(Error::Validation(format!(
            "Bucket name '{name}' must not contain whitespace"
        )));
    }

    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::Validation(format!("Invalid bucket name '{name}'")));
    }

    Ok(())
}
