//! Translation memory management

use reqwest::Method;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::core::client::{LaraClient, RequestDescriptor};
use crate::core::errors::{LaraError, Result};
use crate::core::models::{Memory, MemoryImport, TranslationUnit};
use crate::core::poller::{poll_until_done, PollOptions};

/// Memory service
#[derive(Debug, Clone)]
pub struct Memories {
    client: LaraClient,
}

impl Memories {
    pub fn new(client: LaraClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Memory>> {
        self.client.get("/memories", None).await?.as_wrapped_list()
    }

    pub async fn create(&self, name: &str, external_id: Option<&str>) -> Result<Memory> {
        let request = RequestDescriptor::new(Method::POST, "/memories")
            .param("name", name)
            .param("external_id", external_id.map(Value::from).unwrap_or(Value::Null));
        self.client.send(request).await?.as_single()
    }

    /// `None` when the memory does not exist
    pub async fn get(&self, id: &str) -> Result<Option<Memory>> {
        match self.client.get(&format!("/memories/{}", id), None).await {
            Ok(response) => response.as_single().map(Some),
            Err(LaraError::ApiError { status_code: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, id: &str) -> Result<Memory> {
        self.client
            .delete(&format!("/memories/{}", id), None)
            .await?
            .as_single()
    }

    pub async fn update(&self, id: &str, name: &str) -> Result<Memory> {
        let request =
            RequestDescriptor::new(Method::PUT, format!("/memories/{}", id)).param("name", name);
        self.client.send(request).await?.as_single()
    }

    /// Connect shared memories to this account
    pub async fn connect(&self, ids: &[&str]) -> Result<Vec<Memory>> {
        let request =
            RequestDescriptor::new(Method::POST, "/memories/connect").param("ids", json!(ids));
        self.client.send(request).await?.as_list()
    }

    /// Connect a single shared memory; `None` when the server connected nothing
    pub async fn connect_one(&self, id: &str) -> Result<Option<Memory>> {
        Ok(self.connect(&[id]).await?.into_iter().next())
    }

    /// Start importing a TMX file; gzip is inferred from a `.gz` extension
    pub async fn import_tmx(
        &self,
        id: &str,
        tmx_path: &Path,
        gzip: Option<bool>,
    ) -> Result<MemoryImport> {
        let request = RequestDescriptor::new(Method::POST, format!("/memories/{}/import", id))
            .param("compression", compression(tmx_path, gzip))
            .file("tmx", tmx_path);

        let import: MemoryImport = self.client.send(request).await?.as_single()?;
        info!(memory_id = id, import_id = %import.id, "TMX import started");
        Ok(import)
    }

    pub async fn get_import_status(&self, id: &str) -> Result<MemoryImport> {
        self.client
            .get(&format!("/memories/imports/{}", id), None)
            .await?
            .as_single()
    }

    /// Poll an import until its progress reaches 1.0
    pub async fn wait_for_import<U>(
        &self,
        import: MemoryImport,
        on_update: Option<U>,
        max_wait: Option<Duration>,
    ) -> Result<MemoryImport>
    where
        U: FnMut(&MemoryImport),
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

    /// Add a translation unit to one or more memories
    pub async fn add_translation(
        &self,
        ids: &[&str],
        unit: &TranslationUnit,
        headers: Option<BTreeMap<String, String>>,
    ) -> Result<MemoryImport> {
        let mut request = content_request(Method::PUT, ids, unit)?;
        if let Some(headers) = headers {
            request = request.headers(headers);
        }
        self.client.send(request).await?.as_single()
    }

    /// Remove a translation unit from one or more memories
    pub async fn delete_translation(
        &self,
        ids: &[&str],
        unit: &TranslationUnit,
    ) -> Result<MemoryImport> {
        let request = content_request(Method::DELETE, ids, unit)?;
        self.client.send(request).await?.as_single()
    }
}

/// Single memories use their own content path, several share one
fn content_request(
    method: Method,
    ids: &[&str],
    unit: &TranslationUnit,
) -> Result<RequestDescriptor> {
    let params = match serde_json::to_value(unit) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => return Err(LaraError::transport(format!("Invalid translation unit: {}", e))),
    };

    let request = match ids {
        [id] => RequestDescriptor::new(method, format!("/memories/{}/content", id)),
        _ => RequestDescriptor::new(method, "/memories/content").param("ids", json!(ids)),
    };
    Ok(request.params(params))
}

/// `gzip` compression parameter for an uploaded file
pub(crate) fn compression(path: &Path, gzip: Option<bool>) -> Value {
    let gzipped = gzip.unwrap_or_else(|| {
        path.extension()
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false)
    });
    if gzipped {
        Value::from("gzip")
    } else {
        Value::Null
    }
}
