//! Entry point for the Lara API

use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::core::client::{LaraClient, RequestDescriptor};
use crate::core::config::{ClientOptions, Credentials, LaraSettings};
use crate::core::errors::Result;
use crate::core::models::{RawTextResult, TextResult, TranslateInput, TranslateOptions};
use crate::services::documents::Documents;
use crate::services::glossaries::Glossaries;
use crate::services::memories::Memories;

/// Header asking the service not to keep traces of a request
pub const NO_TRACE_HEADER: &str = "X-No-Trace";

/// Lara client with access to every service
#[derive(Debug, Clone)]
pub struct Translator {
    client: LaraClient,
    pub memories: Memories,
    pub glossaries: Glossaries,
    pub documents: Documents,
}

impl Translator {
    /// Create a new translator
    pub fn new(credentials: &Credentials, options: &ClientOptions) -> Result<Self> {
        let client = LaraClient::new(credentials, options)?;
        info!(server_url = client.base_url(), "Lara translator created");

        Ok(Self {
            memories: Memories::new(client.clone()),
            glossaries: Glossaries::new(client.clone()),
            documents: Documents::new(client.clone()),
            client,
        })
    }

    /// Create from `LARA_*` environment variables
    pub fn from_env() -> Result<Self> {
        let settings = LaraSettings::load(None)?;
        Self::new(&settings.credentials()?, &settings.client_options())
    }

    pub fn client(&self) -> &LaraClient {
        &self.client
    }

    /// Supported language codes
    pub async fn languages(&self) -> Result<Vec<String>> {
        let response = self.client.get("/languages", None).await?;
        response.as_wrapped_list()
    }

    /// Translate text, a list of texts or text blocks
    ///
    /// With no `source` the service detects the language. The returned
    /// [`crate::core::models::Translation`] has the same shape as `input`.
    pub async fn translate(
        &self,
        input: impl Into<TranslateInput>,
        source: Option<&str>,
        target: &str,
        options: Option<&TranslateOptions>,
    ) -> Result<TextResult> {
        let input = input.into();

        let mut request = RequestDescriptor::new(Method::POST, "/translate")
            .param("source", source.map(Value::from).unwrap_or(Value::Null))
            .param("target", target)
            .param("q", input.to_value());

        if let Some(options) = options {
            request = request.params(options.to_params());
            request = request.headers(options.headers.clone());
            if options.no_trace == Some(true) {
                request = request.header(NO_TRACE_HEADER, "true");
            }
        }

        let response = self.client.send(request).await?;
        let raw: RawTextResult = response.as_single()?;
        raw.into_result(&input)
    }
}
