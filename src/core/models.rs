//! Core data models for the Lara API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::core::errors::{LaraError, Result};

/// Translation memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub shared_at: Option<DateTime<Utc>>,
    pub name: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub collaborators_count: u32,
}

impl PartialEq for Memory {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Memory{{id='{}', name='{}'}}", self.id, self.name)
    }
}

/// Progress of a TMX import into a memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryImport {
    pub id: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for MemoryImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryImport{{id='{}', progress={:.2}}}", self.id, self.progress)
    }
}

/// Glossary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Glossary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    #[serde(default)]
    pub owner_id: String,
}

impl PartialEq for Glossary {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Glossary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Glossary{{id='{}', name='{}'}}", self.id, self.name)
    }
}

/// Progress of a CSV import into a glossary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryImport {
    pub id: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for GlossaryImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlossaryImport{{id='{}', progress={:.2}}}", self.id, self.progress)
    }
}

/// Glossary term counts per language pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlossaryCounts {
    #[serde(default)]
    pub unidirectional: BTreeMap<String, u64>,
    #[serde(default)]
    pub multidirectional: u64,
}

/// Lifecycle of a document translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Just created
    Initialized,
    /// Language detection and character count
    Analyzing,
    /// Waiting for confirmation after analysis
    Paused,
    Ready,
    Translating,
    Translated,
    Error,
}

impl DocumentStatus {
    /// No further transitions happen from this status
    pub fn is_final(self) -> bool {
        matches!(self, DocumentStatus::Translated | DocumentStatus::Error)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentStatus::Initialized => "initialized",
            DocumentStatus::Analyzing => "analyzing",
            DocumentStatus::Paused => "paused",
            DocumentStatus::Ready => "ready",
            DocumentStatus::Translating => "translating",
            DocumentStatus::Translated => "translated",
            DocumentStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Translation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStyle {
    Faithful,
    Fluid,
    Creative,
}

/// Options a document was created with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentOptions {
    #[serde(default)]
    pub adapt_to: Option<Vec<String>>,
    #[serde(default)]
    pub style: Option<TranslationStyle>,
}

/// Document translation job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub status: DocumentStatus,
    #[serde(default)]
    pub translated_chars: u64,
    #[serde(default)]
    pub total_chars: u64,
    pub filename: String,
    #[serde(default)]
    pub source: Option<String>,
    pub target: String,
    #[serde(default)]
    pub options: Option<DocumentOptions>,
    #[serde(default)]
    pub error_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Format-specific extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractionParams {
    Docx {
        #[serde(skip_serializing_if = "Option::is_none")]
        extract_comments: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        accept_revisions: Option<bool>,
    },
}

/// Options for uploading a document
#[derive(Debug, Clone, Default)]
pub struct DocumentUploadOptions {
    pub adapt_to: Option<Vec<String>>,
    pub glossaries: Option<Vec<String>>,
    pub style: Option<TranslationStyle>,
    /// Password of a protected PDF
    pub password: Option<String>,
    pub extraction_params: Option<ExtractionParams>,
    pub no_trace: bool,
}

/// Options for downloading a translated document
#[derive(Debug, Clone, Default)]
pub struct DocumentDownloadOptions {
    pub output_format: Option<String>,
}

/// Options for the upload, wait and download round trip
#[derive(Debug, Clone, Default)]
pub struct DocumentTranslateOptions {
    pub adapt_to: Option<Vec<String>>,
    pub glossaries: Option<Vec<String>>,
    pub style: Option<TranslationStyle>,
    pub password: Option<String>,
    pub extraction_params: Option<ExtractionParams>,
    pub output_format: Option<String>,
    pub no_trace: bool,
    /// Bound on the translation wait, 15 minutes when unset
    pub max_wait: Option<Duration>,
}

impl DocumentTranslateOptions {
    pub fn upload_options(&self) -> DocumentUploadOptions {
        DocumentUploadOptions {
            adapt_to: self.adapt_to.clone(),
            glossaries: self.glossaries.clone(),
            style: self.style,
            password: self.password.clone(),
            extraction_params: self.extraction_params.clone(),
            no_trace: self.no_trace,
        }
    }

    pub fn download_options(&self) -> DocumentDownloadOptions {
        DocumentDownloadOptions {
            output_format: self.output_format.clone(),
        }
    }
}

/// Pre-signed storage upload target
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadUrl {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl UploadUrl {
    /// Storage key of the uploaded object
    pub fn key(&self) -> &str {
        self.fields.get("key").map(String::as_str).unwrap_or_default()
    }
}

/// Pre-signed storage download target
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadUrl {
    #[serde(default)]
    pub url: String,
}

/// Text segment with a translatability flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    #[serde(default = "default_translatable")]
    pub translatable: bool,
}

fn default_translatable() -> bool {
    true
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translatable: true,
        }
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translatable: false,
        }
    }
}

/// What the caller asks to translate
#[derive(Debug, Clone, PartialEq)]
pub enum TranslateInput {
    Single(String),
    Multiple(Vec<String>),
    Blocks(Vec<TextBlock>),
}

impl TranslateInput {
    /// JSON value sent as the `q` parameter
    pub fn to_value(&self) -> Value {
        match self {
            TranslateInput::Single(text) => Value::String(text.clone()),
            TranslateInput::Multiple(texts) => {
                Value::Array(texts.iter().cloned().map(Value::String).collect())
            }
            TranslateInput::Blocks(blocks) => serde_json::to_value(blocks).unwrap_or(Value::Null),
        }
    }
}

impl From<&str> for TranslateInput {
    fn from(text: &str) -> Self {
        TranslateInput::Single(text.to_string())
    }
}

impl From<String> for TranslateInput {
    fn from(text: String) -> Self {
        TranslateInput::Single(text)
    }
}

impl From<Vec<String>> for TranslateInput {
    fn from(texts: Vec<String>) -> Self {
        TranslateInput::Multiple(texts)
    }
}

impl From<Vec<&str>> for TranslateInput {
    fn from(texts: Vec<&str>) -> Self {
        TranslateInput::Multiple(texts.into_iter().map(String::from).collect())
    }
}

impl From<Vec<TextBlock>> for TranslateInput {
    fn from(blocks: Vec<TextBlock>) -> Self {
        TranslateInput::Blocks(blocks)
    }
}

/// Translated content, same shape as the input
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    Single(String),
    Multiple(Vec<String>),
    Blocks(Vec<TextBlock>),
}

impl Translation {
    /// Decode the `translation` field for the given input shape
    pub fn decode(input: &TranslateInput, value: Value) -> Result<Self> {
        let mismatch = |expected: &str| {
            LaraError::transport(format!("Expected {} translation in response", expected))
        };

        match input {
            TranslateInput::Single(_) => match value {
                Value::String(text) => Ok(Translation::Single(text)),
                _ => Err(mismatch("a single")),
            },
            TranslateInput::Multiple(_) => {
                let items = match value {
                    Value::Array(items) => items,
                    _ => return Err(mismatch("a list of")),
                };
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(text) => Ok(text),
                        // Some endpoints answer with blocks even for plain lists
                        Value::Object(mut obj) => match obj.remove("text") {
                            Some(Value::String(text)) => Ok(text),
                            _ => Err(mismatch("a list of")),
                        },
                        _ => Err(mismatch("a list of")),
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Translation::Multiple)
            }
            TranslateInput::Blocks(_) => serde_json::from_value(value)
                .map(Translation::Blocks)
                .map_err(|e| LaraError::transport(format!("Invalid text blocks: {}", e))),
        }
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            Translation::Single(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_multiple(&self) -> Option<&[String]> {
        match self {
            Translation::Multiple(texts) => Some(texts),
            _ => None,
        }
    }

    pub fn as_blocks(&self) -> Option<&[TextBlock]> {
        match self {
            Translation::Blocks(blocks) => Some(blocks),
            _ => None,
        }
    }
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Translation::Single(text) => write!(f, "{}", text),
            Translation::Multiple(texts) => write!(f, "{}", texts.join(", ")),
            Translation::Blocks(blocks) => {
                let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
                write!(f, "{}", texts.join(""))
            }
        }
    }
}

/// `/translate` payload before the translation field is decoded
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawTextResult {
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub source_language: String,
    #[serde(default)]
    pub adapted_to: Option<Vec<String>>,
    #[serde(default)]
    pub glossaries: Option<Vec<String>>,
    #[serde(default)]
    pub adapted_to_matches: Option<Value>,
    #[serde(default)]
    pub glossaries_matches: Option<Value>,
    #[serde(default)]
    pub translation: Value,
}

impl RawTextResult {
    pub(crate) fn into_result(self, input: &TranslateInput) -> Result<TextResult> {
        Ok(TextResult {
            translation: Translation::decode(input, self.translation)?,
            content_type: self.content_type,
            source_language: self.source_language,
            adapted_to: self.adapted_to,
            glossaries: self.glossaries,
            adapted_to_matches: self.adapted_to_matches,
            glossaries_matches: self.glossaries_matches,
        })
    }
}

/// Result of a text translation
#[derive(Debug, Clone)]
pub struct TextResult {
    pub content_type: String,
    pub source_language: String,
    pub adapted_to: Option<Vec<String>>,
    pub glossaries: Option<Vec<String>>,
    pub adapted_to_matches: Option<Value>,
    pub glossaries_matches: Option<Value>,
    pub translation: Translation,
}

/// Scheduling priority of a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslatePriority {
    Normal,
    Background,
}

/// Server-side cache usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseCache {
    Yes,
    No,
    Overwrite,
}

impl Serialize for UseCache {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match self {
            UseCache::Yes => serializer.serialize_bool(true),
            UseCache::No => serializer.serialize_bool(false),
            UseCache::Overwrite => serializer.serialize_str("overwrite"),
        }
    }
}

/// Options for text translation
#[derive(Debug, Clone, Default, Serialize)]
pub struct TranslateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapt_to: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glossaries: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiline: Option<bool>,
    /// Milliseconds
    #[serde(rename = "timeout", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TranslatePriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_cache: Option<UseCache>,
    #[serde(rename = "cache_ttl", skip_serializing_if = "Option::is_none")]
    pub cache_ttl_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_trace: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<TranslationStyle>,
    /// Extra headers for this request only
    #[serde(skip)]
    pub headers: BTreeMap<String, String>,
}

impl TranslateOptions {
    /// Request parameters for these options
    pub fn to_params(&self) -> serde_json::Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// One translation unit added to or removed from memories
#[derive(Debug, Clone, Default, Serialize)]
pub struct TranslationUnit {
    pub source: String,
    pub target: String,
    pub sentence: String,
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence_after: Option<String>,
}

impl TranslationUnit {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        sentence: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            sentence: sentence.into(),
            translation: translation.into(),
            ..Default::default()
        }
    }

    pub fn with_tuid(mut self, tuid: impl Into<String>) -> Self {
        self.tuid = Some(tuid.into());
        self
    }

    pub fn with_context(
        mut self,
        sentence_before: impl Into<String>,
        sentence_after: impl Into<String>,
    ) -> Self {
        self.sentence_before = Some(sentence_before.into());
        self.sentence_after = Some(sentence_after.into());
        self
    }
}
