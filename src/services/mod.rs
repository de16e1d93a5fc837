//! Resource services built on the signed transport

pub mod documents;
pub mod glossaries;
pub mod memories;
pub mod translator;
