//! HMAC request signing

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Content type signed for every multipart body, whatever boundary goes on the wire
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// Signs requests with an access key pair
#[derive(Clone)]
pub struct RequestSigner {
    access_key_id: String,
    secret: Vec<u8>,
}

impl RequestSigner {
    /// Create a signer from a key id and its secret
    pub fn new(access_key_id: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret: secret.into(),
        }
    }

    /// Access key id used in the `Authorization` header
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Compute the base64 HMAC-SHA256 signature of one request
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        content_md5: &str,
        content_type: &str,
        date: &str,
    ) -> String {
        let challenge = canonical_string(method, path, content_md5, content_type, date);

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(challenge.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Full `Authorization` header value
    pub fn authorization(
        &self,
        method: &str,
        path: &str,
        content_md5: &str,
        content_type: &str,
        date: &str,
    ) -> String {
        let signature = self.sign(method, path, content_md5, content_type, date);
        format!("Lara {}:{}", self.access_key_id, signature)
    }
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("access_key_id", &self.access_key_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Newline-joined string that gets signed
pub fn canonical_string(
    method: &str,
    path: &str,
    content_md5: &str,
    content_type: &str,
    date: &str,
) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}",
        method,
        path,
        content_md5,
        normalize_content_type(content_type),
        date
    )
}

/// Drop media type parameters (`charset`, `boundary`, ...)
pub fn normalize_content_type(content_type: &str) -> &str {
    match content_type.find(';') {
        Some(idx) => content_type[..idx].trim(),
        None => content_type.trim(),
    }
}

/// Uppercase hex MD5 of a request body
pub fn content_md5(body: &[u8]) -> String {
    hex::encode_upper(Md5::digest(body))
}
