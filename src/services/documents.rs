//! Document translation through pre-signed storage

use reqwest::Method;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::client::{file_name, LaraClient, RequestDescriptor};
use crate::core::errors::{LaraError, Result};
use crate::core::models::{
    Document, DocumentDownloadOptions, DocumentStatus, DocumentTranslateOptions,
    DocumentUploadOptions, DownloadUrl, UploadUrl,
};
use crate::core::poller::{poll_until_done, PollOptions, DEFAULT_DOCUMENT_MAX_WAIT};
use crate::core::storage::{ByteStream, StorageClient};
use crate::services::translator::NO_TRACE_HEADER;

/// Document service
#[derive(Debug, Clone)]
pub struct Documents {
    client: LaraClient,
    storage: StorageClient,
}

impl Documents {
    pub fn new(client: LaraClient) -> Self {
        let storage = StorageClient::new(client.http().clone());
        Self { client, storage }
    }

    /// Upload a file and create a translation job for it
    pub async fn upload(
        &self,
        file_path: &Path,
        source: Option<&str>,
        target: &str,
        options: Option<&DocumentUploadOptions>,
    ) -> Result<Document> {
        let filename = file_name(file_path);

        let request = RequestDescriptor::new(Method::GET, "/documents/upload-url")
            .param("filename", filename.as_str());
        let upload_url: UploadUrl = self.client.send(request).await?.as_single()?;
        if upload_url.url.is_empty() {
            return Err(LaraError::api(500, "InvalidResponse", "Storage upload URL is empty"));
        }

        self.storage
            .upload(&upload_url.url, &upload_url.fields, file_path)
            .await?;

        let mut request = RequestDescriptor::new(Method::POST, "/documents")
            .param("s3key", upload_url.key())
            .param("target", target)
            .param("source", source.map(Value::from).unwrap_or(Value::Null));

        if let Some(options) = options {
            request = request
                .param("adapt_to", non_empty(&options.adapt_to))
                .param("glossaries", non_empty(&options.glossaries))
                .param("style", json!(options.style))
                .param("password", json!(options.password))
                .param("extraction_params", json!(options.extraction_params));
            if options.no_trace {
                request = request.header(NO_TRACE_HEADER, "true");
            }
        }

        let document: Document = self.client.send(request).await?.as_single()?;
        info!(
            document_id = %document.id,
            filename = %filename,
            target_language = target,
            "Document uploaded"
        );
        Ok(document)
    }

    pub async fn status(&self, id: &str) -> Result<Document> {
        self.client
            .get(&format!("/documents/{}", id), None)
            .await?
            .as_single()
    }

    /// Stream a translated document from storage
    pub async fn download(
        &self,
        id: &str,
        options: Option<&DocumentDownloadOptions>,
    ) -> Result<ByteStream> {
        let output_format = options.and_then(|o| o.output_format.as_deref());
        let request = RequestDescriptor::new(Method::GET, format!("/documents/{}/download-url", id))
            .param("output_format", output_format.map(Value::from).unwrap_or(Value::Null));

        let download_url: DownloadUrl = self.client.send(request).await?.as_single()?;
        if download_url.url.is_empty() {
            return Err(LaraError::api(500, "InvalidResponse", "Storage download URL is empty"));
        }

        self.storage.download(&download_url.url).await
    }

    /// Poll a document until it is translated or failed
    ///
    /// `max_wait` defaults to [`DEFAULT_DOCUMENT_MAX_WAIT`].
    pub async fn wait_for_translation<U>(
        &self,
        document: Document,
        on_update: Option<U>,
        max_wait: Option<Duration>,
    ) -> Result<Document>
    where
        U: FnMut(&Document),
    {
        let options = PollOptions::new(self.client.polling_interval())
            .with_max_wait(Some(max_wait.unwrap_or(DEFAULT_DOCUMENT_MAX_WAIT)));
        let this = self;
        poll_until_done(
            document,
            move |id: String| async move { this.status(&id).await },
            on_update,
            options,
        )
        .await
    }

    /// Upload, wait for the translation and stream back the result
    pub async fn translate(
        &self,
        file_path: &Path,
        source: Option<&str>,
        target: &str,
        options: Option<&DocumentTranslateOptions>,
    ) -> Result<ByteStream> {
        let defaults = DocumentTranslateOptions::default();
        let options = options.unwrap_or(&defaults);

        let document = self
            .upload(file_path, source, target, Some(&options.upload_options()))
            .await?;
        let document = self
            .wait_for_translation(document, None::<fn(&Document)>, options.max_wait)
            .await?;

        if document.status == DocumentStatus::Error {
            let reason = document
                .error_reason
                .unwrap_or_else(|| "Translation failed".to_string());
            warn!(document_id = %document.id, reason = %reason, "Document translation failed");
            return Err(LaraError::api(500, "DocumentError", reason));
        }

        self.download(&document.id, Some(&options.download_options())).await
    }
}

/// Empty lists are left out of the request
fn non_empty(values: &Option<Vec<String>>) -> Value {
    match values {
        Some(values) if !values.is_empty() => json!(values),
        _ => Value::Null,
    }
}
