//! Glossary management

use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::core::client::{LaraClient, RequestDescriptor};
use crate::core::errors::{LaraError, Result};
use crate::core::models::{Glossary, GlossaryCounts, GlossaryImport};
use crate::core::poller::{poll_until_done, PollOptions};
use crate::services::memories::compression;

/// Glossary service
#[derive(Debug, Clone)]
pub struct Glossaries {
    client: LaraClient,
}

impl Glossaries {
    pub fn new(client: LaraClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Glossary>> {
        self.client.get("/glossaries", None).await?.as_wrapped_list()
    }

    pub async fn create(&self, name: &str) -> Result<Glossary> {
        let request = RequestDescriptor::new(Method::POST, "/glossaries").param("name", name);
        self.client.send(request).await?.as_single()
    }

    /// `None` when the glossary does not exist
    pub async fn get(&self, id: &str) -> Result<Option<Glossary>> {
        match self.client.get(&format!("/glossaries/{}", id), None).await {
            Ok(response) => response.as_single().map(Some),
            Err(LaraError::ApiError { status_code: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, id: &str) -> Result<Glossary> {
        self.client
            .delete(&format!("/glossaries/{}", id), None)
            .await?
            .as_single()
    }

    pub async fn update(&self, id: &str, name: &str) -> Result<Glossary> {
        let request =
            RequestDescriptor::new(Method::PUT, format!("/glossaries/{}", id)).param("name", name);
        self.client.send(request).await?.as_single()
    }

    /// Start importing a CSV file of terms
    pub async fn import_csv(
        &self,
        id: &str,
        csv_path: &Path,
        gzip: Option<bool>,
    ) -> Result<GlossaryImport> {
        let request = RequestDescriptor::new(Method::POST, format!("/glossaries/{}/import", id))
            .param("compression", compression(csv_path, gzip))
            .file("csv", csv_path);

        let import: GlossaryImport = self.client.send(request).await?.as_single()?;
        info!(glossary_id = id, import_id = %import.id, "CSV import started");
        Ok(import)
    }

    pub async fn get_import_status(&self, id: &str) -> Result<GlossaryImport> {
        self.client
            .get(&format!("/glossaries/imports/{}", id), None)
            .await?
            .as_single()
    }

    /// Poll an import until its progress reaches 1.0
    pub async fn wait_for_import<U>(
        &self,
        import: GlossaryImport,
        on_update: Option<U>,
        max_wait: Option<Duration>,
    ) -> Result<GlossaryImport>
    where
        U: FnMut(&GlossaryImport),
    {
        let options = PollOptions::new(self.client.polling_interval()).with_max_wait(max_wait);
        let this = self;
        poll_until_done(
            import,
            move |id: String| async move { this.get_import_status(&id).await },
            on_update,
            options,
        )
        .await
    }

    /// Term counts per language
    pub async fn counts(&self, id: &str) -> Result<GlossaryCounts> {
        self.client
            .get(&format!("/glossaries/{}/counts", id), None)
            .await?
            .as_single()
    }

    /// Export glossary terms, returned exactly as the server sends them
    pub async fn export(
        &self,
        id: &str,
        content_type: &str,
        source: Option<&str>,
    ) -> Result<Bytes> {
        let request = RequestDescriptor::new(Method::GET, format!("/glossaries/{}/export", id))
            .param("content_type", content_type)
            .param("source", source.map(Value::from).unwrap_or(Value::Null));

        let response = self.client.send(request).await?;
        Ok(response.into_raw_bytes())
    }
}
