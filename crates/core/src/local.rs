//! Local emulation of the object storage API
//!
//! Buckets live under `<root>/r2/<bucket>/`. Each object is a JSON record in
//! `objects/<sha256(key)>.json` that points at a body file in `blobs/`.
//! Writes stage into `.tmp/` and are renamed into place; renaming the record
//! is the commit point, so a reader sees either the old object or the new
//! one in full.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::path::{BucketRef, ObjectPath, validate_bucket_name};
use crate::persist::PersistenceRoot;
use crate::traits::{BucketInfo, ObjectInfo, ObjectMetadata, ObjectStore, StoredObject};

const OBJECTS_DIR: &str = "objects";
const BLOBS_DIR: &str = "blobs";
const STAGING_DIR: &str = ".tmp";

/// On-disk record describing one object
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ObjectRecord {
    key: String,
    blob: String,
    size: u64,
    sha256: String,
    uploaded: Timestamp,
    #[serde(default)]
    http_metadata: ObjectMetadata,
}

impl ObjectRecord {
    fn info(&self) -> ObjectInfo {
        let mut info = ObjectInfo::new(&self.key, self.size);
        info.last_modified = Some(self.uploaded);
        info.checksum = Some(self.sha256.clone());
        info
    }
}

/// Object store persisted under a [`PersistenceRoot`]
#[derive(Debug, Clone)]
pub struct LocalStore {
    buckets_dir: PathBuf,
}

impl LocalStore {
    /// Open the store rooted at `root`
    pub fn open(root: &PersistenceRoot) -> Self {
        Self {
            buckets_dir: root.buckets_dir(),
        }
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        validate_bucket_name(bucket)?;
        Ok(self.buckets_dir.join(bucket))
    }

    fn record_path(bucket_dir: &Path, key: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        bucket_dir.join(OBJECTS_DIR).join(format!("{digest}.json"))
    }

    fn ensure_bucket_layout(bucket_dir: &Path) -> Result<()> {
        for sub in [OBJECTS_DIR, BLOBS_DIR, STAGING_DIR] {
            std::fs::create_dir_all(bucket_dir.join(sub))?;
        }
        Ok(())
    }

    /// Write `data` to `target` via a staged temp file and an atomic rename
    fn write_atomic(bucket_dir: &Path, target: &Path, data: &[u8]) -> Result<()> {
        let mut staged = tempfile::NamedTempFile::new_in(bucket_dir.join(STAGING_DIR))?;
        staged.write_all(data)?;
        staged.as_file().sync_all()?;
        staged.persist(target).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn read_record(record_path: &Path) -> Result<Option<ObjectRecord>> {
        match std::fs::read(record_path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove_if_present(path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn has_objects(bucket_dir: &Path) -> Result<bool> {
        match std::fs::read_dir(bucket_dir.join(OBJECTS_DIR)) {
            Ok(mut entries) => Ok(entries.next().is_some()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Store an object body and metadata
    pub fn put(
        &self,
        path: &ObjectPath,
        body: &[u8],
        metadata: &ObjectMetadata,
    ) -> Result<ObjectInfo> {
        let bucket_dir = self.bucket_dir(&path.bucket)?;
        Self::ensure_bucket_layout(&bucket_dir)?;

        let record_path = Self::record_path(&bucket_dir, &path.key);
        let previous = Self::read_record(&record_path)?;

        let record = ObjectRecord {
            key: path.key.clone(),
            blob: uuid::Uuid::new_v4().simple().to_string(),
            size: body.len() as u64,
            sha256: hex::encode(Sha256::digest(body)),
            uploaded: Timestamp::now(),
            http_metadata: metadata.clone(),
        };

        Self::write_atomic(
            &bucket_dir,
            &bucket_dir.join(BLOBS_DIR).join(&record.blob),
            body,
        )?;
        Self::write_atomic(&bucket_dir, &record_path, &serde_json::to_vec_pretty(&record)?)?;

        if let Some(old) = previous {
            if let Err(e) = Self::remove_if_present(&bucket_dir.join(BLOBS_DIR).join(&old.blob)) {
                tracing::warn!(blob = %old.blob, error = %e, "Failed to remove replaced blob");
            }
        }

        tracing::debug!(bucket = %path.bucket, key = %path.key, size = record.size, "Stored object");
        Ok(record.info())
    }

    /// Fetch an object body and metadata
    pub fn get(&self, path: &ObjectPath) -> Result<StoredObject> {
        let bucket_dir = self.bucket_dir(&path.bucket)?;
        let record_path = Self::record_path(&bucket_dir, &path.key);
        let mut record = Self::read_record(&record_path)?.ok_or_else(Error::no_such_key)?;

        // A concurrent put may remove the blob between reading the record and
        // reading the body; follow the record for as long as it keeps moving.
        let body = loop {
            match std::fs::read(bucket_dir.join(BLOBS_DIR).join(&record.blob)) {
                Ok(body) => break body,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    match Self::read_record(&record_path)? {
                        Some(current) if current.blob != record.blob => record = current,
                        _ => return Err(Error::no_such_key()),
                    }
                }
                Err(e) => return Err(e.into()),
            }
        };

        if hex::encode(Sha256::digest(&body)) != record.sha256 {
            return Err(Error::General(format!(
                "Stored body of '{path}' is corrupt (checksum mismatch)"
            )));
        }

        tracing::debug!(bucket = %path.bucket, key = %path.key, size = body.len(), "Read object");
        Ok(StoredObject {
            info: record.info(),
            metadata: record.http_metadata,
            body,
        })
    }

    /// Delete an object; deleting a missing object is not an error
    pub fn delete(&self, path: &ObjectPath) -> Result<()> {
        let bucket_dir = self.bucket_dir(&path.bucket)?;
        let record_path = Self::record_path(&bucket_dir, &path.key);

        let Some(record) = Self::read_record(&record_path)? else {
            tracing::debug!(bucket = %path.bucket, key = %path.key, "Delete of missing object");
            return Ok(());
        };

        Self::remove_if_present(&record_path)?;
        Self::remove_if_present(&bucket_dir.join(BLOBS_DIR).join(&record.blob))?;

        tracing::debug!(bucket = %path.bucket, key = %path.key, "Deleted object");
        Ok(())
    }

    /// Create an empty bucket
    pub fn create_bucket(&self, bucket: &BucketRef) -> Result<()> {
        let bucket_dir = self.bucket_dir(&bucket.name)?;
        if bucket_dir.exists() {
            return Err(Error::Conflict(format!(
                "The bucket you tried to create already exists: {}",
                bucket.name
            )));
        }
        if let Some(jurisdiction) = &bucket.jurisdiction {
            tracing::debug!(%jurisdiction, "Jurisdiction has no effect in local mode");
        }
        Self::ensure_bucket_layout(&bucket_dir)?;
        tracing::debug!(bucket = %bucket.name, "Created bucket");
        Ok(())
    }

    /// List buckets sorted by name
    pub fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let entries = match std::fs::read_dir(&self.buckets_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut buckets = Vec::new();
        for entry in entries {
            let entry = entry?;
            let meta = entry.metadata()?;
            if !meta.is_dir() {
                continue;
            }
            let creation_date = meta
                .created()
                .or_else(|_| meta.modified())
                .ok()
                .and_then(|t| Timestamp::try_from(t).ok())
                .map(|t| t.to_string());
            buckets.push(BucketInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                creation_date,
            });
        }

        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buckets)
    }

    /// Delete an empty bucket
    pub fn delete_bucket(&self, bucket: &BucketRef) -> Result<()> {
        let bucket_dir = self.bucket_dir(&bucket.name)?;
        if !bucket_dir.is_dir() {
            return Err(Error::no_such_bucket(&bucket.name));
        }
        if Self::has_objects(&bucket_dir)? {
            return Err(Error::Conflict(format!(
                "The bucket you tried to delete is not empty: {}",
                bucket.name
            )));
        }
        std::fs::remove_dir_all(&bucket_dir)?;
        tracing::debug!(bucket = %bucket.name, "Deleted bucket");
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn create_bucket(&self, bucket: &BucketRef) -> Result<()> {
        LocalStore::create_bucket(self, bucket)
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        LocalStore::list_buckets(self)
    }

    async fn delete_bucket(&self, bucket: &BucketRef) -> Result<()> {
        LocalStore::delete_bucket(self, bucket)
    }

    async fn put_object(
        &self,
        path: &ObjectPath,
        body: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<ObjectInfo> {
        self.put(path, &body, metadata)
    }

    async fn get_object(&self, path: &ObjectPath) -> Result<StoredObject> {
        self.get(path)
    }

    async fn delete_object(&self, path: &ObjectPath) -> Result<()> {
        self.delete(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::resolve_root_in;
    use tempfile::TempDir;

    fn temp_store() -> (LocalStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let root = resolve_root_in(temp_dir.path(), None).unwrap();
        (LocalStore::open(&root), temp_dir)
    }

    fn full_metadata() -> ObjectMetadata {
        ObjectMetadata {
            content_type: Some("image/png".into()),
            content_encoding: Some("gzip".into()),
            content_language: Some("en-GB".into()),
            content_disposition: Some("attachment; filename=\"w.png\"".into()),
            cache_control: Some("max-age=3600".into()),
            expires: Some("Wed, 21 Oct 2026 07:28:00 GMT".into()),
        }
    }

    #[test]
    fn test_get_missing_object() {
        let (store, _temp_dir) = temp_store();
        let path = ObjectPath::new("bucketName-object-test", "wormhole-img.png");
        let err = store.get(&path).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "The specified key does not exist.");
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let (store, _temp_dir) = temp_store();
        let path = ObjectPath::new("bucketName-object-test", "wormhole-img.png");
        let metadata = full_metadata();

        let info = store.put(&path, b"passageway", &metadata).unwrap();
        assert_eq!(info.size_bytes, 10);
        assert!(info.last_modified.is_some());

        let object = store.get(&path).unwrap();
        assert_eq!(object.body, b"passageway");
        assert_eq!(object.metadata, metadata);
        assert_eq!(object.info.checksum, info.checksum);
    }

    #[test]
    fn test_binary_body_round_trip() {
        let (store, _temp_dir) = temp_store();
        let path = ObjectPath::new("bucket", "blob.bin");
        let body: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

        store.put(&path, &body, &ObjectMetadata::default()).unwrap();
        let object = store.get(&path).unwrap();

        assert_eq!(object.body, body);
        assert!(object.metadata.is_empty());
    }

    #[test]
    fn test_overwrite_replaces_body_and_metadata() {
        let (store, temp_dir) = temp_store();
        let path = ObjectPath::new("bucket", "key");

        store.put(&path, b"first", &full_metadata()).unwrap();
        store.put(&path, b"second", &ObjectMetadata::default()).unwrap();

        let object = store.get(&path).unwrap();
        assert_eq!(object.body, b"second");
        assert!(object.metadata.is_empty());

        // The replaced body is not left behind
        let blobs = temp_dir.path().join(".r2/state/r2/bucket/blobs");
        assert_eq!(std::fs::read_dir(blobs).unwrap().count(), 1);
    }

    #[test]
    fn test_get_during_concurrent_overwrite() {
        let (writer, temp_dir) = temp_store();
        let reader = LocalStore::open(&resolve_root_in(temp_dir.path(), None).unwrap());
        let path = ObjectPath::new("bucket", "hot-key");
        writer.put(&path, b"v0", &ObjectMetadata::default()).unwrap();

        let done = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let writer_done = done.clone();
        let writer_path = path.clone();
        let handle = std::thread::spawn(move || {
            let mut i = 1u64;
            while !writer_done.load(std::sync::atomic::Ordering::Relaxed) {
                let body = format!("v{i}");
                writer
                    .put(&writer_path, body.as_bytes(), &ObjectMetadata::default())
                    .unwrap();
                i += 1;
            }
        });

        let mut failures = 0;
        for _ in 0..2_000 {
            match reader.get(&path) {
                Ok(object) => assert!(object.body.starts_with(b"v")),
                Err(_) => failures += 1,
            }
        }
        done.store(true, std::sync::atomic::Ordering::Relaxed);
        handle.join().unwrap();

        assert_eq!(failures, 0);
    }

    #[test]
    fn test_delete_then_get_not_found() {
        let (store, _temp_dir) = temp_store();
        let path = ObjectPath::new("bucket", "key");

        store.put(&path, b"passageway", &ObjectMetadata::default()).unwrap();
        assert!(store.get(&path).is_ok());

        store.delete(&path).unwrap();
        assert!(matches!(store.get(&path), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let (store, _temp_dir) = temp_store();
        let path = ObjectPath::new("never-written", "key");

        store.delete(&path).unwrap();
        store.delete(&path).unwrap();
        assert!(matches!(store.get(&path), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_slash_keys_are_opaque() {
        let (store, _temp_dir) = temp_store();
        let nested = ObjectPath::new("bucket", "a/b");
        let flat = ObjectPath::new("bucket", "ab");
        let deeper = ObjectPath::new("bucket", "a/b/c");

        store.put(&nested, b"nested", &ObjectMetadata::default()).unwrap();
        store.put(&flat, b"flat", &ObjectMetadata::default()).unwrap();
        store.put(&deeper, b"deeper", &ObjectMetadata::default()).unwrap();

        assert_eq!(store.get(&nested).unwrap().body, b"nested");
        assert_eq!(store.get(&flat).unwrap().body, b"flat");
        assert_eq!(store.get(&deeper).unwrap().body, b"deeper");

        store.delete(&nested).unwrap();
        assert!(store.get(&nested).is_err());
        assert_eq!(store.get(&deeper).unwrap().body, b"deeper");
    }

    #[test]
    fn test_buckets_are_isolated() {
        let (store, _temp_dir) = temp_store();
        store
            .put(&ObjectPath::new("one", "key"), b"1", &ObjectMetadata::default())
            .unwrap();

        assert!(store.get(&ObjectPath::new("two", "key")).is_err());
    }

    #[test]
    fn test_roots_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let default_root = resolve_root_in(temp_dir.path(), None).unwrap();
        let other_root =
            resolve_root_in(temp_dir.path(), Some(Path::new("./different-dir"))).unwrap();
        let default_store = LocalStore::open(&default_root);
        let other_store = LocalStore::open(&other_root);

        let file_one = ObjectPath::new("bucketName-object-test", "file-one");
        let file_two = ObjectPath::new("bucketName-object-test", "file-two");
        default_store
            .put(&file_one, b"passageway", &ObjectMetadata::default())
            .unwrap();
        other_store
            .put(&file_two, b"passageway", &ObjectMetadata::default())
            .unwrap();

        assert!(matches!(other_store.get(&file_one), Err(Error::NotFound(_))));
        assert!(matches!(default_store.get(&file_two), Err(Error::NotFound(_))));
        assert_eq!(other_store.get(&file_two).unwrap().body, b"passageway");
    }

    #[test]
    fn test_state_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = ObjectPath::new("bucket", "key");
        {
            let root = resolve_root_in(temp_dir.path(), None).unwrap();
            LocalStore::open(&root)
                .put(&path, b"persisted", &full_metadata())
                .unwrap();
        }
        let root = resolve_root_in(temp_dir.path(), None).unwrap();
        let object = LocalStore::open(&root).get(&path).unwrap();
        assert_eq!(object.body, b"persisted");
        assert_eq!(object.metadata, full_metadata());
    }

    #[test]
    fn test_corrupt_blob_detected() {
        let (store, temp_dir) = temp_store();
        let path = ObjectPath::new("bucket", "key");
        store.put(&path, b"passageway", &ObjectMetadata::default()).unwrap();

        let blobs = temp_dir.path().join(".r2/state/r2/bucket/blobs");
        let blob = std::fs::read_dir(blobs).unwrap().next().unwrap().unwrap();
        std::fs::write(blob.path(), b"tampered").unwrap();

        assert!(matches!(store.get(&path), Err(Error::General(_))));
    }

    #[test]
    fn test_invalid_bucket_name_rejected() {
        let (store, _temp_dir) = temp_store();
        let path = ObjectPath::new("..", "key");
        assert!(matches!(
            store.put(&path, b"x", &ObjectMetadata::default()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_bucket_lifecycle() {
        let (store, _temp_dir) = temp_store();
        assert!(store.list_buckets().unwrap().is_empty());

        let bucket = BucketRef::new("bucket-b", Some("eu".into())).unwrap();
        store.create_bucket(&bucket).unwrap();
        assert!(matches!(
            store.create_bucket(&bucket),
            Err(Error::Conflict(_))
        ));

        store
            .put(&ObjectPath::new("bucket-a", "key"), b"x", &ObjectMetadata::default())
            .unwrap();

        let names: Vec<String> = store
            .list_buckets()
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["bucket-a", "bucket-b"]);

        let non_empty = BucketRef::new("bucket-a", None).unwrap();
        assert!(matches!(
            store.delete_bucket(&non_empty),
            Err(Error::Conflict(_))
        ));

        store.delete_bucket(&bucket).unwrap();
        assert!(matches!(
            store.delete_bucket(&bucket),
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let (store, _temp_dir) = temp_store();
        let store: Box<dyn ObjectStore> = Box::new(store);
        let path = ObjectPath::new("bucket", "dir/file-one");

        store
            .put_object(&path, b"passageway".to_vec(), &full_metadata())
            .await
            .unwrap();
        let object = store.get_object(&path).await.unwrap();
        assert_eq!(object.body, b"passageway");

        store.delete_object(&path).await.unwrap();
        assert!(store.get_object(&path).await.is_err());
    }
}
