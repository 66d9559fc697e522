//! Notification side channel for successful submissions.
//!
//! The pipeline calls [`Notifier::notice`] once per published nanopublication
//! in a detached task; a slow or failing notifier never delays or fails a
//! submission.

use async_trait::async_trait;

/// Receives the final URI of every successfully published nanopublication.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notice(&self, nanopub_uri: &str);
}

/// Notifier that records notices in the service log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notice(&self, nanopub_uri: &str) {
        tracing::info!("notifier: new nanopublication submitted: {nanopub_uri}");
    }
}
