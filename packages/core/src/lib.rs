//! Core logic of the nanopublication submission service.
//!
//! This crate is free of I/O: it works on TriG text that the service layer
//! has already read from disk or received over HTTP. It is the foundation for
//! the `nanopub-submitter-node` service and the `npsub` CLI.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`bundle`] | `@prefix this:` scanning: [`split_bundle`], [`extract_uri`] |
//! | [`rewrite`] | The `OLD|NEW` literal substitution applied to reported URIs: [`UriRewrite`] |
//! | [`rdf`] | TriG parsing and syntax validation via [`parse_trig`] |
//! | [`query`] | SPARQL update synthesis: [`QueryPlan`], [`QueryStrategy`], [`build_query`] |
//! | [`result`] | The outcome of one submission: [`SubmissionResult`], [`TripleStoreOutcome`] |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use nanopub_submitter::{build_query, extract_uri, split_bundle, QueryOptions};
//!
//! let trig = std::fs::read_to_string("np.trusty.trig")?;
//! let uri = extract_uri(&trig).expect("stamped nanopub declares this:");
//! for unit in split_bundle(&trig) {
//!     // publish each unit separately
//! }
//! let update = build_query(&trig, &QueryOptions::default())?;
//! ```

pub mod bundle;
pub mod query;
pub mod rdf;
pub mod result;
pub mod rewrite;

pub use bundle::{extract_uri, is_this_declaration, split_bundle};
pub use query::{build_plan, build_query, QueryError, QueryOptions, QueryPlan, QueryStrategy};
pub use rdf::{parse_trig, RdfError};
pub use result::{SubmissionResult, TripleStoreOutcome};
pub use rewrite::UriRewrite;

/// Default character encoding for nanopublication documents.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Media type of a TriG document.
pub const TRIG_MEDIA_TYPE: &str = "application/trig";
