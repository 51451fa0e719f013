//! Doclink Core Library
//!
//! Resolves bibliographic records to document URLs through a catalogue of
//! publisher URL templates, optionally verifying each candidate with a
//! single bounded network check. Every resolution ends in either a URL or a
//! classified failure carrying the URL that was attempted.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`record`] - Input record model
//! - [`failure`] - Closed failure taxonomy and resolution results
//! - [`registry`] - Journal → publisher → template catalogue
//! - [`strategy`] - Per-publisher URL construction
//! - [`verifier`] - Single-request candidate verification
//! - [`dispatcher`] - Orchestration and strategy caching

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dispatcher;
pub mod failure;
pub mod record;
pub mod registry;
pub mod strategy;
pub(crate) mod user_agent;
mod utils;
pub mod verifier;

// Re-export commonly used types
pub use dispatcher::{DEFAULT_CONCURRENCY, HandlerDispatcher, ResolveOptions};
pub use failure::{FailureDescriptor, FailureKind, NO_ATTEMPTED_URL, Resolution, ResolutionFailure};
pub use record::{ArticleRecord, RecordField};
pub use registry::{
    CatalogueError, ConfigurationError, DeliveryMode, PublisherProfile, Registry, RegistryEntry,
    RegistryError, TemplateRole, UrlTemplate,
};
pub use strategy::{Candidate, CandidateSet, ConstructionResult, ConstructionStrategy};
pub use verifier::{
    ContentClassifier, FetchError, FetchResponse, Fetcher, VerificationOutcome, Verifier,
};
