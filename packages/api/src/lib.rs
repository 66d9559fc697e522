//! Request and response types for the nanopublication submission API.
//!
//! Shared by the `nanopub-submitter-node` service and the `npsub` CLI so that
//! both sides agree on the wire format.
//!
//! # Endpoints covered
//!
//! | Method | Path | Type |
//! |--------|------|------|
//! | GET | `/` | → [`ServiceInfo`] |
//! | POST | `/submit` | [`SubmitQuery`] + TriG body → `201` text summary, `Location` header |
//!
//! Every error response carries an [`ErrorResponse`] body.

pub mod error;
pub mod info;
pub mod submit;

pub use error::ErrorResponse;
pub use info::ServiceInfo;
pub use submit::SubmitQuery;
