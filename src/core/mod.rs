//! Signed transport, wire models and job polling

pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod poller;
pub mod response;
pub mod signer;
pub mod storage;
