//! Public surface for the `nanopub-submitter-node` crate.
//!
//! Exposes the pipeline, router builder and config types so that external
//! crates (e.g. the conformance test suite) can spin up an in-process service
//! without spawning a subprocess.

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifier;
pub mod publisher;
pub mod router;
pub mod stamper;
pub mod submission;
pub mod triple_store;

pub use config::SubmitterConfig;
pub use handlers::AppState;
pub use notifier::{LogNotifier, Notifier};
pub use publisher::Publisher;
pub use router::build_router;
pub use stamper::{IdentityStamper, NpClient, StampError};
pub use submission::{SubmitError, SubmitOverrides, Submitter};
