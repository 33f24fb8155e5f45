//! Alexandria Core Library
//!
//! This library provides the core functionality for the alexandria tool,
//! which finds digital books on a catalog mirror, downloads them, and keeps
//! them shelved in a local library directory.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Bibliographic records and query construction
//! - [`scrape`] - Results-table scraping into candidate records
//! - [`search`] - Catalog search client (fetch + scrape)
//! - [`matcher`] - Candidate filtering, retry policy and the per-record guard
//! - [`mirror`] - Mirror page resolution into direct file URLs
//! - [`download`] - Streaming transfer engine with progress events
//! - [`library`] - On-disk library index
//! - [`config`] - Storage root, catalog host and timeout configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod download;
mod http;
pub mod library;
pub mod matcher;
pub mod mirror;
pub mod scrape;
pub mod search;
mod user_agent;

// Re-export commonly used types
pub use catalog::CatalogRecord;
pub use config::{AppConfig, ConfigError};
pub use download::{
    CompletionEvent, DownloadEngine, DownloadEvent, DownloadHandle, DownloadJob, DownloadStatus,
    ProgressEvent, TransferError, TransferOutcome,
};
pub use http::HttpTimeouts;
pub use library::{LibraryError, LocalBookEntry, LocalLibrary, open_local_book};
pub use matcher::{CandidateMatcher, MatchOutcome, MatchPolicy, MatchRegistry, MatchState};
pub use mirror::{MirrorError, MirrorLayout, MirrorResolver, MirrorSlot};
pub use scrape::{ScrapedCandidate, scrape_results};
pub use search::{CandidateSearch, SearchClient, SearchSetupError};
