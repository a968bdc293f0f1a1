//! r2-core: Core library for the r2 CLI
//!
//! This crate provides the core functionality for the r2 CLI, including:
//! - Configuration management
//! - Object path parsing and bucket name validation
//! - The ObjectStore trait shared by the local and remote backends
//! - Persistence root resolution and the local emulation store
//! - Upload size limits
//!
//! This crate does not depend on any HTTP client; the remote backend lives
//! in r2-api.

pub mod config;
pub mod error;
pub mod local;
pub mod path;
pub mod persist;
pub mod traits;
pub mod upload;

pub use config::{Config, ConfigManager};
pub use error::{Error, Result};
pub use local::LocalStore;
pub use path::{BucketRef, ObjectPath, parse_object_path, validate_bucket_name};
pub use persist::{DEFAULT_PERSIST_DIR, PersistenceRoot, resolve_root, resolve_root_in};
pub use traits::{BucketInfo, ObjectInfo, ObjectMetadata, ObjectStore, StoredObject};
pub use upload::{MAX_UPLOAD_SIZE, check_upload_size, upload};
