//! Signed HTTP transport for the Lara API

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, DATE};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::core::config::{ClientOptions, Credentials};
use crate::core::errors::{LaraError, Result};
use crate::core::response::{ClientResponse, JSON_MEDIA_TYPE};
use crate::core::signer::{
    content_md5, normalize_content_type, RequestSigner, MULTIPART_CONTENT_TYPE,
};

/// Header carrying the intended verb; every request goes out as POST
pub const METHOD_OVERRIDE_HEADER: &str = "x-http-method-override";
pub const SDK_NAME_HEADER: &str = "x-lara-sdk-name";
pub const SDK_VERSION_HEADER: &str = "x-lara-sdk-version";
const CONTENT_MD5_HEADER: &str = "content-md5";

pub const SDK_NAME: &str = "lara-rust";
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One API call before encoding
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub parameters: Option<Map<String, Value>>,
    pub files: Option<BTreeMap<String, Option<PathBuf>>>,
    pub headers: Option<BTreeMap<String, String>>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            parameters: None,
            files: None,
            headers: None,
        }
    }

    /// Set one body parameter; `null` values are pruned before sending
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.parameters.get_or_insert_with(Map::new).extend(params);
        self
    }

    /// Attach a file, sent as a multipart part named `field`
    pub fn file(mut self, field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.files
            .get_or_insert_with(BTreeMap::new)
            .insert(field.into(), Some(path.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers.get_or_insert_with(BTreeMap::new).extend(headers);
        self
    }
}

/// Prepend `/` when missing
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Drop null parameters; an emptied map counts as absent
pub fn prune_parameters(parameters: Option<Map<String, Value>>) -> Option<Map<String, Value>> {
    let pruned: Map<String, Value> = parameters?
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();
    (!pruned.is_empty()).then_some(pruned)
}

/// Drop absent files; an emptied map counts as absent
pub fn prune_files(
    files: Option<BTreeMap<String, Option<PathBuf>>>,
) -> Option<BTreeMap<String, PathBuf>> {
    let pruned: BTreeMap<String, PathBuf> = files?
        .into_iter()
        .filter_map(|(field, path)| path.map(|p| (field, p)))
        .collect();
    (!pruned.is_empty()).then_some(pruned)
}

/// Current time as an IMF-fixdate (`Tue, 15 Nov 1994 08:12:31 GMT`)
pub fn http_date() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Map a non-2xx body to an [`LaraError::ApiError`]
pub fn decode_error(status_code: u16, body: &str) -> LaraError {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => match value.get("error") {
            Some(Value::Object(error)) => {
                let error_type = error
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("UnknownError");
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("An unknown error occurred");
                LaraError::api(status_code, error_type, message)
            }
            _ => LaraError::api(status_code, "UnknownError", body),
        },
        Err(_) => LaraError::api(status_code, "ParseError", body),
    }
}

/// Multipart text value of a parameter
fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// File name sent with a multipart part
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Streamed multipart part for a file on disk
pub(crate) async fn file_part(path: &Path) -> Result<Part> {
    let file_error = |e: std::io::Error| LaraError::FileError {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let file = tokio::fs::File::open(path).await.map_err(file_error)?;
    let length = file.metadata().await.map_err(file_error)?.len();

    Ok(Part::stream_with_length(Body::from(file), length).file_name(file_name(path)))
}

/// Encoded request body
enum EncodedBody {
    Empty,
    Json(Vec<u8>),
    Multipart(Form),
}

/// HMAC-authenticated client for the Lara API
#[derive(Debug, Clone)]
pub struct LaraClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    signer: RequestSigner,
    extra_headers: Arc<BTreeMap<String, String>>,
    polling_interval: Duration,
}

impl LaraClient {
    /// Create a new client
    pub fn new(credentials: &Credentials, options: &ClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10);

        if let Some(timeout) = options.connection_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = options.read_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: Arc::from(options.server_url()),
            signer: RequestSigner::new(
                credentials.access_key_id(),
                credentials.access_key_secret().as_bytes(),
            ),
            extra_headers: Arc::new(options.extra_headers().clone()),
            polling_interval: options.polling_interval(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    /// Underlying connection pool, shared with unsigned storage transfers
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub async fn get(
        &self,
        path: &str,
        parameters: Option<Map<String, Value>>,
    ) -> Result<ClientResponse> {
        let mut request = RequestDescriptor::new(Method::GET, path);
        request.parameters = parameters;
        self.send(request).await
    }

    pub async fn delete(
        &self,
        path: &str,
        parameters: Option<Map<String, Value>>,
    ) -> Result<ClientResponse> {
        let mut request = RequestDescriptor::new(Method::DELETE, path);
        request.parameters = parameters;
        self.send(request).await
    }

    pub async fn post(
        &self,
        path: &str,
        parameters: Option<Map<String, Value>>,
    ) -> Result<ClientResponse> {
        let mut request = RequestDescriptor::new(Method::POST, path);
        request.parameters = parameters;
        self.send(request).await
    }

    pub async fn put(
        &self,
        path: &str,
        parameters: Option<Map<String, Value>>,
    ) -> Result<ClientResponse> {
        let mut request = RequestDescriptor::new(Method::PUT, path);
        request.parameters = parameters;
        self.send(request).await
    }

    /// Sign, send and decode one request
    pub async fn send(&self, request: RequestDescriptor) -> Result<ClientResponse> {
        let method = request.method.as_str().to_string();
        let path = normalize_path(&request.path);
        let parameters = prune_parameters(request.parameters);
        let files = prune_files(request.files);

        let body = match (files, parameters) {
            (Some(files), parameters) => {
                let mut form = Form::new();
                for (key, value) in parameters.into_iter().flatten() {
                    form = form.text(key, form_value(&value));
                }
                for (field, file_path) in files {
                    form = form.part(field, file_part(&file_path).await?);
                }
                EncodedBody::Multipart(form)
            }
            (None, Some(parameters)) => {
                let json = serde_json::to_vec(&parameters).map_err(|e| {
                    LaraError::transport(format!("Failed to encode request body: {}", e))
                })?;
                EncodedBody::Json(json)
            }
            (None, None) => EncodedBody::Empty,
        };

        let date = http_date();
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, METHOD_OVERRIDE_HEADER, &method)?;
        insert_header(&mut headers, DATE.as_str(), &date)?;
        insert_header(&mut headers, SDK_NAME_HEADER, SDK_NAME)?;
        insert_header(&mut headers, SDK_VERSION_HEADER, SDK_VERSION)?;

        let md5 = match &body {
            EncodedBody::Json(json) => {
                let md5 = content_md5(json);
                insert_header(&mut headers, CONTENT_MD5_HEADER, &md5)?;
                insert_header(&mut headers, CONTENT_TYPE.as_str(), JSON_MEDIA_TYPE)?;
                md5
            }
            EncodedBody::Multipart(form) => {
                let content_type =
                    format!("{}; boundary={}", MULTIPART_CONTENT_TYPE, form.boundary());
                insert_header(&mut headers, CONTENT_TYPE.as_str(), &content_type)?;
                String::new()
            }
            EncodedBody::Empty => String::new(),
        };

        for (name, value) in self.extra_headers.iter() {
            insert_header(&mut headers, name, value)?;
        }
        for (name, value) in request.headers.iter().flatten() {
            insert_header(&mut headers, name, value)?;
        }

        // The server verifies multipart bodies against the bare media type
        let signed_content_type = match &body {
            EncodedBody::Multipart(_) => MULTIPART_CONTENT_TYPE.to_string(),
            _ => headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string(),
        };
        let authorization =
            self.signer
                .authorization(&method, &path, &md5, &signed_content_type, &date);
        insert_header(&mut headers, AUTHORIZATION.as_str(), &authorization)?;

        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, path = %path, "Sending Lara request");

        let builder = self.http.post(&url);
        let builder = match body {
            EncodedBody::Json(json) => builder.body(json),
            EncodedBody::Multipart(form) => builder.multipart(form),
            EncodedBody::Empty => builder,
        };

        let response = builder.headers(headers).send().await?;
        let status = response.status();
        debug!(method = %method, path = %path, status = status.as_u16(), "Lara response received");

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| normalize_content_type(v).to_ascii_lowercase());

        if !status.is_success() {
            let body = response.text().await?;
            return Err(decode_error(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        if media_type.as_deref() == Some(JSON_MEDIA_TYPE) {
            let content: Value = serde_json::from_slice(&bytes).map_err(|e| {
                LaraError::transport(format!("Invalid JSON response: {}", e))
            })?;
            Ok(ClientResponse::json(status.as_u16(), content))
        } else {
            Ok(ClientResponse::raw(status.as_u16(), media_type, bytes))
        }
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| LaraError::transport(format!("Invalid header name '{}': {}", name, e)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| LaraError::transport(format!("Invalid value for header '{}': {}", name, e)))?;
    headers.insert(name, value);
    Ok(())
}
