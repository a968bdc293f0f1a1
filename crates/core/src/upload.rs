//! Upload size limits
//!
//! The size guard runs before any backend is touched, so a rejected upload
//! never leaves partial state behind, locally or remotely.

use crate::error::{Error, Result};
use crate::path::ObjectPath;
use crate::traits::{ObjectInfo, ObjectMetadata, ObjectStore};

/// Largest object body accepted by `object put` (300 MiB)
pub const MAX_UPLOAD_SIZE: u64 = 300 * 1024 * 1024;

/// Reject bodies larger than [`MAX_UPLOAD_SIZE`]
///
/// `name` identifies the upload in the error message (usually the source
/// file name).
pub fn check_upload_size(name: &str, size: u64) -> Result<()> {
    if size > MAX_UPLOAD_SIZE {
        return Err(Error::TooLarge {
            name: name.to_string(),
            size,
            max: MAX_UPLOAD_SIZE,
        });
    }
    Ok(())
}

/// Check the size limit, then store the object through `store`
pub async fn upload(
    store: &dyn ObjectStore,
    path: &ObjectPath,
    body: Vec<u8>,
    metadata: &ObjectMetadata,
) -> Result<ObjectInfo> {
    check_upload_size(path.file_name(), body.len() as u64)?;
    store.put_object(path, body, metadata).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockObjectStore;

    #[test]
    fn test_size_at_limit_accepted() {
        assert!(check_upload_size("a.bin", MAX_UPLOAD_SIZE).is_ok());
        assert!(check_upload_size("a.bin", 0).is_ok());
    }

    #[test]
    fn test_size_over_limit_rejected() {
        let err = check_upload_size("wormhole-img.png", MAX_UPLOAD_SIZE + 1).unwrap_err();
        match &err {
            Error::TooLarge { name, size, max } => {
                assert_eq!(name, "wormhole-img.png");
                assert_eq!(*size, MAX_UPLOAD_SIZE + 1);
                assert_eq!(*max, MAX_UPLOAD_SIZE);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("300 MiB"));
        assert!(message.contains(&MAX_UPLOAD_SIZE.to_string()));
        assert!(message.contains(&(MAX_UPLOAD_SIZE + 1).to_string()));
    }

    #[tokio::test]
    async fn test_upload_rejects_before_store() {
        let mut store = MockObjectStore::new();
        store.expect_put_object().never();

        let path = ObjectPath::new("bucket", "big.bin");
        let body = vec![0u8; (MAX_UPLOAD_SIZE + 1) as usize];
        let result = upload(&store, &path, body, &ObjectMetadata::default()).await;

        assert!(matches!(result, Err(Error::TooLarge { .. })));
    }

    #[tokio::test]
    async fn test_upload_passes_through() {
        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .times(1)
            .withf(|path, body, metadata| {
                path.key == "small.txt"
                    && body == b"passageway"
                    && metadata.content_type.as_deref() == Some("text/plain")
            })
            .returning(|path, body, _| Ok(ObjectInfo::new(path.key.clone(), body.len() as u64)));

        let path = ObjectPath::new("bucket", "small.txt");
        let metadata = ObjectMetadata {
            content_type: Some("text/plain".into()),
            ..Default::default()
        };
        let info = upload(&store, &path, b"passageway".to_vec(), &metadata)
            .await
            .unwrap();

        assert_eq!(info.size_bytes, 10);
    }
}
