//! Mirroring nanopublications into a SPARQL triple store.
//!
//! The stamped document is converted into one SPARQL 1.1 Update (see
//! [`nanopub_submitter::query`]) and `POST`ed to the configured endpoint as
//! an `update` form parameter. Any failure here is reported to the caller as
//! an error; the pipeline treats it as non-fatal.

use nanopub_submitter::{build_query, QueryError, QueryOptions};
use reqwest::{header, Client};
use tracing::debug;

use crate::config::{AuthMethod, TripleStoreConfig};

/// Accept header asking for SPARQL JSON results.
const SPARQL_JSON: &str = "application/sparql-results+json";

#[derive(Debug, thiserror::Error)]
pub enum TripleStoreError {
    #[error("failed to build SPARQL update: {0}")]
    Query(#[from] QueryError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SPARQL endpoint returned status {status}: {body}")]
    BadStatus { status: u16, body: String },
}

/// Client for one SPARQL Update endpoint.
#[derive(Debug, Clone)]
pub struct TripleStore {
    client: Client,
    endpoint: String,
    auth: AuthMethod,
    options: QueryOptions,
}

impl TripleStore {
    pub fn new(client: Client, cfg: &TripleStoreConfig) -> Self {
        Self {
            client,
            endpoint: cfg.sparql_endpoint.clone(),
            auth: cfg.auth.clone(),
            options: cfg.query_options(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Synthesize the update for `nanopub` and send it to the endpoint.
    pub async fn store(&self, nanopub: &str) -> Result<(), TripleStoreError> {
        let query = build_query(nanopub, &self.options)?;
        debug!(
            "triple_store: sending {} update ({} bytes) to {}",
            self.options.strategy,
            query.len(),
            self.endpoint
        );

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(header::ACCEPT, SPARQL_JSON)
            .form(&[("update", query.as_str())]);
        if let AuthMethod::Basic { username, password } = &self.auth {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TripleStoreError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
        Form, Router,
    };
    use nanopub_submitter::QueryStrategy;
    use tokio::net::TcpListener;

    use crate::config::SubmitterConfig;

    #[derive(Clone, Default)]
    struct Recorded {
        updates: Arc<Mutex<Vec<String>>>,
        authorization: Arc<Mutex<Option<String>>>,
    }

    async fn update_handler(
        State(rec): State<Recorded>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> StatusCode {
        *rec.authorization.lock().unwrap() = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        match form.get("update") {
            Some(update) => {
                rec.updates.lock().unwrap().push(update.clone());
                StatusCode::OK
            }
            None => StatusCode::BAD_REQUEST,
        }
    }

    async fn spawn_endpoint(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/update")
    }

    fn config(endpoint: String) -> TripleStoreConfig {
        let mut cfg = SubmitterConfig::default().triple_store;
        cfg.enabled = true;
        cfg.sparql_endpoint = endpoint;
        cfg
    }

    const NANOPUB: &str = "<http://e/G> { <http://e/s> <http://e/p> <http://e/o> . }\n";

    #[tokio::test]
    async fn posts_update_form() {
        let rec = Recorded::default();
        let app = Router::new()
            .route("/update", post(update_handler))
            .with_state(rec.clone());
        let endpoint = spawn_endpoint(app).await;

        let store = TripleStore::new(Client::new(), &config(endpoint));
        store.store(NANOPUB).await.unwrap();

        let updates = rec.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].contains("<http://e/s> <http://e/p> <http://e/o> ."));
        assert!(rec.authorization.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn basic_auth_and_multi_graph() {
        let rec = Recorded::default();
        let app = Router::new()
            .route("/update", post(update_handler))
            .with_state(rec.clone());
        let mut cfg = config(spawn_endpoint(app).await);
        cfg.auth = AuthMethod::Basic {
            username: "user".into(),
            password: "pass".into(),
        };
        cfg.strategy = QueryStrategy::MultiGraph;

        TripleStore::new(Client::new(), &cfg).store(NANOPUB).await.unwrap();

        // base64("user:pass")
        assert_eq!(
            rec.authorization.lock().unwrap().as_deref(),
            Some("Basic dXNlcjpwYXNz")
        );
        assert!(rec.updates.lock().unwrap()[0].contains("GRAPH <http://e/G> {"));
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let app = Router::new().route(
            "/update",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let store = TripleStore::new(Client::new(), &config(spawn_endpoint(app).await));
        let err = store.store(NANOPUB).await.unwrap_err();
        assert!(matches!(err, TripleStoreError::BadStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn unresolved_graph_node_is_not_sent() {
        let rec = Recorded::default();
        let app = Router::new()
            .route("/update", post(update_handler))
            .with_state(rec.clone());
        let mut cfg = config(spawn_endpoint(app).await);
        cfg.graph_named = true;
        cfg.graph_type = "http://e/Missing".into();

        let err = TripleStore::new(Client::new(), &cfg).store(NANOPUB).await.unwrap_err();
        assert!(matches!(
            err,
            TripleStoreError::Query(QueryError::GraphNodeNotFound(_))
        ));
        assert!(rec.updates.lock().unwrap().is_empty());
    }
}
