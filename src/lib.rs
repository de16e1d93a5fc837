//! Lara - Rust client for the Lara translation API
//!
//! Every call is an HMAC-signed request against the Lara API. Text
//! translation is synchronous; memory and glossary imports and document
//! translations are server-side jobs polled until they finish.

#![forbid(unsafe_code)]

pub mod cli;
pub mod core;
pub mod services;

// Re-export key types for convenience
pub use self::core::{
    client::{LaraClient, RequestDescriptor},
    config::{ClientOptions, Credentials, LaraSettings},
    errors::{LaraError, Result},
    models::{
        Document, DocumentStatus, Glossary, GlossaryImport, Memory, MemoryImport, TextBlock,
        TextResult, TranslateInput, TranslateOptions, Translation, TranslationUnit,
    },
    poller::{Job, PollOptions, Pollable},
    response::ClientResponse,
    signer::RequestSigner,
    storage::{ByteStream, StorageClient},
};

pub use self::services::{
    documents::Documents, glossaries::Glossaries, memories::Memories, translator::Translator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
