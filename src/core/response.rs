//! Response envelope unwrapping
//!
//! Every JSON success body from the API looks like `{"status": 200, "content": ...}`.
//! Binary bodies (exports, CSV) are kept as raw bytes.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::errors::{LaraError, Result};

/// Media type of every JSON body
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Decoded body of a successful response
#[derive(Debug, Clone)]
pub enum ResponseBody {
    Json(Value),
    Raw(Bytes),
}

/// Successful API response
#[derive(Debug, Clone)]
pub struct ClientResponse {
    status_code: u16,
    media_type: Option<String>,
    body: ResponseBody,
}

impl ClientResponse {
    pub(crate) fn json(status_code: u16, content: Value) -> Self {
        Self {
            status_code,
            media_type: Some(JSON_MEDIA_TYPE.to_string()),
            body: ResponseBody::Json(content),
        }
    }

    pub(crate) fn raw(status_code: u16, media_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            status_code,
            media_type,
            body: ResponseBody::Raw(bytes),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Parsed JSON body, if the response was JSON
    pub fn json_content(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Raw(_) => None,
        }
    }

    /// Exact bytes of a non-JSON body
    pub fn raw_bytes(&self) -> Option<&Bytes> {
        match &self.body {
            ResponseBody::Raw(bytes) => Some(bytes),
            ResponseBody::Json(_) => None,
        }
    }

    /// Take the raw bytes, empty for JSON responses
    pub fn into_raw_bytes(self) -> Bytes {
        match self.body {
            ResponseBody::Raw(bytes) => bytes,
            ResponseBody::Json(_) => Bytes::new(),
        }
    }

    fn require_json(&self) -> Result<&Value> {
        self.json_content().ok_or_else(|| {
            LaraError::transport(format!(
                "Response is not JSON ({}); cannot deserialize",
                self.media_type.as_deref().unwrap_or("unknown media type")
            ))
        })
    }

    /// Decode the envelope `content` as `T`
    pub fn as_single<T: DeserializeOwned>(&self) -> Result<T> {
        let body = self.require_json()?;
        let content = body.get("content").cloned().unwrap_or(Value::Null);
        decode(content)
    }

    /// Decode a top-level array body as `Vec<T>`
    ///
    /// An enveloped body falls back to its `content` array.
    pub fn as_list<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let body = self.require_json()?;
        match body {
            Value::Object(obj) if obj.contains_key("content") => {
                decode(obj.get("content").cloned().unwrap_or(Value::Null))
            }
            other => decode(other.clone()),
        }
    }

    /// Decode the envelope `content` as `Vec<T>`, empty when absent or null
    pub fn as_wrapped_list<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let body = self.require_json()?;
        match body.get("content") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(content) => decode(content.clone()),
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| LaraError::transport(format!("Failed to decode response content: {}", e)))
}
