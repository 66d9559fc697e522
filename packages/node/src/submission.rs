//! The submission pipeline.
//!
//! One submission runs these steps strictly in sequence:
//!
//! 1. Parse the document as TriG (client error if invalid).
//! 2. Write it to `<workdir>/<id>.trig`.
//! 3. Stamp it with a trusty URI, or sign it ([`IdentityStamper`]).
//! 4. Read the stamped document and extract its `this:` URI (client error if
//!    missing), applying the rewrite rule.
//! 5. Publish it to the target servers ([`Publisher`]); zero accepting
//!    servers fails the submission.
//! 6. Optionally mirror it into the triple store; failure there only marks
//!    the result.
//! 7. Fire the notifier in the background.
//!
//! Transient files are removed when the [`SubmissionContext`] is dropped,
//! whichever way the pipeline exits.

use std::sync::Arc;

use axum::http::StatusCode;
use nanopub_submitter::{
    extract_uri, parse_trig, SubmissionResult, TripleStoreOutcome, UriRewrite,
};
use nanopub_submitter_api::error::codes;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::SubmitterConfig;
use crate::context::SubmissionContext;
use crate::notifier::Notifier;
use crate::publisher::{Publisher, USER_AGENT};
use crate::stamper::{IdentityStamper, NpClient, StampError};
use crate::triple_store::TripleStore;

// ---------------------------------------------------------------------------
// SubmitError
// ---------------------------------------------------------------------------

/// A failed submission.
///
/// Display strings are safe to show to the caller; underlying causes are
/// kept as sources for logging only.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Unsupported content-type: {0}\nNanopublication must be in TriG format")]
    UnsupportedContentType(String),

    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    #[error("Nanopublication is not valid {0} text")]
    InvalidEncoding(String),

    #[error("Invalid RDF:\n{0}")]
    InvalidRdf(String),

    #[error("Failed to get nanopub URI")]
    UriNotFound,

    #[error("Failed to store nanopub locally")]
    StoreInput(#[source] std::io::Error),

    #[error("Failed to make TrustyURI for nanopub.")]
    Stamp(#[source] StampError),

    #[error("Failed to read nanopub locally")]
    ReadStamped(#[source] std::io::Error),

    #[error("Could not publish nanopublication to any nanopub server.")]
    NoServerAccepted,

    #[error("Submission was interrupted")]
    Interrupted(#[source] tokio::task::JoinError),
}

impl SubmitError {
    /// 400 for problems with the submitted document, 500 for processing
    /// failures.
    pub fn status(&self) -> StatusCode {
        match self {
            SubmitError::UnsupportedContentType(_)
            | SubmitError::UnsupportedCharset(_)
            | SubmitError::InvalidEncoding(_)
            | SubmitError::InvalidRdf(_)
            | SubmitError::UriNotFound => StatusCode::BAD_REQUEST,
            SubmitError::StoreInput(_)
            | SubmitError::Stamp(_)
            | SubmitError::ReadStamped(_)
            | SubmitError::NoServerAccepted
            | SubmitError::Interrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            SubmitError::UnsupportedContentType(_) => codes::UNSUPPORTED_CONTENT_TYPE,
            SubmitError::UnsupportedCharset(_) => codes::UNSUPPORTED_CHARSET,
            SubmitError::InvalidEncoding(_) | SubmitError::InvalidRdf(_) => codes::INVALID_RDF,
            SubmitError::UriNotFound => codes::URI_NOT_FOUND,
            SubmitError::Stamp(_) => codes::STAMPING_FAILED,
            SubmitError::NoServerAccepted => codes::PUBLISH_FAILED,
            SubmitError::StoreInput(_)
            | SubmitError::ReadStamped(_)
            | SubmitError::Interrupted(_) => codes::INTERNAL_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

// ---------------------------------------------------------------------------
// SubmitOverrides
// ---------------------------------------------------------------------------

/// Per-request settings that replace configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOverrides {
    /// Target servers; empty means "use the configured servers".
    pub servers: Vec<String>,

    /// `OLD|NEW` rule; ignored unless it contains `|`.
    pub uri_replace: Option<String>,
}

// ---------------------------------------------------------------------------
// Submitter
// ---------------------------------------------------------------------------

/// Runs submissions against a fixed configuration and set of collaborators.
///
/// Cheap to clone; concurrent submissions share nothing but read-only state.
#[derive(Clone)]
pub struct Submitter {
    config: Arc<SubmitterConfig>,
    stamper: Arc<dyn IdentityStamper>,
    publisher: Publisher,
    triple_store: Option<TripleStore>,
    notifier: Arc<dyn Notifier>,
}

impl Submitter {
    pub fn new(
        config: SubmitterConfig,
        stamper: Arc<dyn IdentityStamper>,
        publisher: Publisher,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, reqwest::Error> {
        let triple_store = if config.triple_store.enabled {
            let client = reqwest::Client::builder()
                .timeout(config.nanopub.publish_timeout)
                .user_agent(USER_AGENT)
                .build()?;
            Some(TripleStore::new(client, &config.triple_store))
        } else {
            None
        };
        Ok(Self {
            config: Arc::new(config),
            stamper,
            publisher,
            triple_store,
            notifier,
        })
    }

    /// Wire up the production collaborators: the `np` tool and a publisher
    /// honouring the configured timeout.
    pub fn from_config(
        config: SubmitterConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, reqwest::Error> {
        let stamper = Arc::new(NpClient::from_config(&config.nanopub));
        let publisher = Publisher::with_timeout(config.nanopub.publish_timeout)?;
        Self::new(config, stamper, publisher, notifier)
    }

    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    /// Create the context for a new submission, resolving overrides.
    pub fn context(&self, overrides: SubmitOverrides) -> SubmissionContext {
        let servers = if overrides.servers.is_empty() {
            self.config.nanopub.target_servers()
        } else {
            overrides.servers
        };
        let rewrite = UriRewrite::resolve(
            overrides.uri_replace.as_deref(),
            self.config.uri_replace.as_deref(),
        );
        SubmissionContext::new(&self.config.nanopub.workdir, servers, rewrite)
    }

    /// Process one TriG document end to end.
    ///
    /// The pipeline runs on its own task: once started it completes even if
    /// the caller stops waiting for it.
    pub async fn submit(
        &self,
        data: &str,
        overrides: SubmitOverrides,
    ) -> Result<SubmissionResult, SubmitError> {
        let submitter = self.clone();
        let data = data.to_owned();
        let ctx = self.context(overrides);
        let span = info_span!("submission", id = %ctx.id());
        let task =
            tokio::spawn(async move { submitter.process(&ctx, &data).await }.instrument(span));
        task.await.map_err(|e| {
            error!("submission: pipeline task failed: {e}");
            SubmitError::Interrupted(e)
        })?
    }

    async fn process(
        &self,
        ctx: &SubmissionContext,
        data: &str,
    ) -> Result<SubmissionResult, SubmitError> {
        debug!("submission: preprocessing nanopublication as RDF");
        parse_trig(data).map_err(|e| {
            warn!("submission: failed to preprocess nanopub: {e}");
            SubmitError::InvalidRdf(e.to_string())
        })?;

        debug!("submission: storing nanopub as file locally");
        store_input(ctx, data).await.map_err(|e| {
            error!("submission: failed to store nanopub: {e}");
            SubmitError::StoreInput(e)
        })?;

        if self.config.nanopub.sign_nanopub {
            debug!("submission: signing nanopub with private key");
        } else {
            debug!("submission: generating trusty URI (signing disabled by config)");
        }
        let stamped_path = self.stamper.stamp(ctx).await.map_err(|e| {
            error!("submission: stamping failed: {e}");
            SubmitError::Stamp(e)
        })?;

        debug!("submission: reading final nanopub");
        let nanopub = tokio::fs::read_to_string(&stamped_path).await.map_err(|e| {
            error!("submission: failed to read nanopub: {e}");
            SubmitError::ReadStamped(e)
        })?;
        let uri = extract_uri(&nanopub)
            .map(|uri| ctx.reported_uri(&uri))
            .ok_or_else(|| {
                error!("submission: failed to extract nanopub URI");
                SubmitError::UriNotFound
            })?;
        info!("submission: nanopub URI is {uri}");

        debug!("submission: submitting nanopub to {} server(s)", ctx.servers().len());
        let servers = self.publisher.publish(&nanopub, ctx.servers()).await;
        if servers.is_empty() {
            error!("submission: failed to publish nanopub");
            return Err(SubmitError::NoServerAccepted);
        }

        let triple_store = match &self.triple_store {
            None => TripleStoreOutcome::NotAttempted,
            Some(store) => {
                debug!("submission: sending nanopub to {}", store.endpoint());
                match store.store(&nanopub).await {
                    Ok(()) => TripleStoreOutcome::Stored,
                    Err(e) => {
                        warn!("submission: failed to store nanopub in triple store: {e}");
                        TripleStoreOutcome::Failed
                    }
                }
            }
        };

        let notifier = Arc::clone(&self.notifier);
        let notice_uri = uri.clone();
        tokio::spawn(async move { notifier.notice(&notice_uri).await });

        debug!("submission: processing finished");
        Ok(SubmissionResult::new(uri, servers, triple_store))
    }
}

async fn store_input(ctx: &SubmissionContext, data: &str) -> std::io::Result<()> {
    tokio::fs::create_dir_all(ctx.workdir()).await?;
    tokio::fs::write(ctx.input_path(), data).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
