//! Services module
//!
//! External collaborators the handlers depend on. Currently only the cloud
//! photo storage client.

pub mod photo_storage;

pub use photo_storage::{CloudMediaClient, DeletionResult, PhotoStorage, UploadResult};
