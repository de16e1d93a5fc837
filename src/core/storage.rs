//! Unsigned transfers against pre-signed storage URLs

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::multipart::Form;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::core::client::file_part;
use crate::core::errors::{LaraError, Result};

/// Body of a downloaded object
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Moves document bytes to and from storage
///
/// Authorization is embedded in the URLs, so nothing here is signed.
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: reqwest::Client,
}

impl StorageClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// POST `fields` then the file (as `file`) to a pre-signed upload URL
    pub async fn upload(
        &self,
        url: &str,
        fields: &BTreeMap<String, String>,
        file_path: &Path,
    ) -> Result<()> {
        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name.clone(), value.clone());
        }
        form = form.part("file", file_part(file_path).await?);

        debug!(file = %file_path.display(), "Uploading to storage");
        let response = self.http.post(url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(LaraError::StorageTransferError {
                status_code: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// GET a pre-signed download URL as a byte stream
    pub async fn download(&self, url: &str) -> Result<ByteStream> {
        debug!("Downloading from storage");
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(LaraError::StorageTransferError {
                status_code: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes_stream().map_err(LaraError::from).boxed())
    }
}

/// Drain a byte stream into memory
pub async fn collect_bytes(mut stream: ByteStream) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer)
}

/// Write a byte stream to a file, returning the number of bytes written
pub async fn write_to_file(mut stream: ByteStream, path: &Path) -> Result<u64> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| LaraError::FileError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}
