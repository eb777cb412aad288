use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Name-addressed image storage.
///
/// Every image lives under a flat name chosen by the caller. Writing to an
/// existing name replaces its content.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store bytes under `name` and return the number of bytes written.
    async fn put(&self, name: &str, data: &[u8]) -> Result<u64, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(name, reader).await
    }

    /// Store data from an async reader under `name` and return the number of bytes written.
    async fn put_stream(&self, name: &str, reader: BoxReader) -> Result<u64, StorageError>;

    /// Retrieve all bytes of an image.
    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(name).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve an image as a streaming async reader.
    async fn get_stream(&self, name: &str) -> Result<BoxReader, StorageError>;

    /// Check whether an image exists.
    async fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Delete an image.
    ///
    /// Returns `true` if the image was deleted, `false` if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;

    /// Get the size of an image in bytes.
    async fn size(&self, name: &str) -> Result<u64, StorageError>;
}
