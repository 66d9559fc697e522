//! Shared helpers for the submission service conformance suite.
//!
//! Everything runs in-process over real loopback TCP:
//!
//! - [`spawn_submitter`] serves the full router on an ephemeral port.
//! - [`spawn_target`] is a nanopub server that records every unit it receives
//!   and can be told to reject one of them.
//! - [`spawn_sparql_endpoint`] records SPARQL updates.
//! - [`install_fake_np`] writes a shell script standing in for the `np` tool,
//!   so the production [`NpClient`](nanopub_submitter_node::NpClient) path
//!   (process spawn, arguments, output file) is exercised for real.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Form, Router,
};
use nanopub_submitter_node::{build_router, AppState, LogNotifier, Submitter, SubmitterConfig};

/// Prefix of URIs in unstamped test documents.
pub const TEMP_PREFIX: &str = "http://example.org/np/";

/// What [`install_fake_np`] turns [`TEMP_PREFIX`] into.
pub const TRUSTY_PREFIX: &str = "http://purl.org/np/RA";

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("conformance server error");
    });
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Submission service
// ---------------------------------------------------------------------------

/// Start an ephemeral in-process submission service and return its base URL,
/// e.g. `http://127.0.0.1:51234`.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound or the HTTP client cannot be
/// built.
pub async fn spawn_submitter(config: SubmitterConfig) -> String {
    let submitter =
        Submitter::from_config(config, Arc::new(LogNotifier)).expect("build submitter");
    serve(build_router(AppState::new(submitter))).await
}

/// A config that stamps with `np_exec`, works in `workdir` and publishes to
/// `servers`.
pub fn test_config(np_exec: &Path, workdir: &Path, servers: Vec<String>) -> SubmitterConfig {
    let mut config = SubmitterConfig::default();
    config.bind_addr = "127.0.0.1:0".parse().expect("valid socket address");
    config.nanopub.client_exec = np_exec.display().to_string();
    config.nanopub.workdir = workdir.to_path_buf();
    config.nanopub.servers = servers;
    config
}

/// Write an executable `np` stand-in into `dir` and return its path.
///
/// `mktrusty -o OUT IN` and `sign -a TYPE -k KEY -o OUT IN` both copy IN to OUT
/// with [`TEMP_PREFIX`] replaced by [`TRUSTY_PREFIX`]. `sign` additionally
/// appends a `# signed-with: TYPE` comment. A document containing the word
/// `FAIL` makes the tool exit non-zero.
#[cfg(unix)]
pub fn install_fake_np(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r##"#!/bin/sh
cmd="$1"
shift
case "$cmd" in
  mktrusty) out="$2"; in="$3"; kt="" ;;
  sign) kt="$2"; out="$6"; in="$7" ;;
  *) echo "unknown command: $cmd" >&2; exit 2 ;;
esac
if grep -q FAIL "$in"; then
  echo "cannot process $in" >&2
  exit 1
fi
sed 's#{TEMP_PREFIX}#{TRUSTY_PREFIX}#g' "$in" > "$out"
if [ -n "$kt" ]; then
  echo "# signed-with: $kt" >> "$out"
fi
"##
    );
    let path = dir.join("np");
    std::fs::write(&path, script).expect("write fake np");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("make fake np executable");
    path
}

// ---------------------------------------------------------------------------
// Nanopub servers
// ---------------------------------------------------------------------------

/// A running mock nanopub server.
#[derive(Clone)]
pub struct MockTarget {
    pub url: String,
    received: Arc<Mutex<Vec<String>>>,
}

impl MockTarget {
    /// Bodies received so far, in arrival order.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().expect("lock received units").clone()
    }
}

#[derive(Clone)]
struct TargetState {
    received: Arc<Mutex<Vec<String>>>,
    reject_at: Option<usize>,
}

async fn receive_unit(
    State(state): State<TargetState>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("application/trig") {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE;
    }
    let mut received = state.received.lock().expect("lock received units");
    received.push(body);
    if Some(received.len()) == state.reject_at {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::CREATED
    }
}

/// Start a nanopub server. `reject_at` is the 1-based request number it
/// answers with a 500.
pub async fn spawn_target(reject_at: Option<usize>) -> MockTarget {
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = TargetState {
        received: Arc::clone(&received),
        reject_at,
    };
    let router = Router::new().route("/", post(receive_unit)).with_state(state);
    let url = format!("{}/", serve(router).await);
    MockTarget { url, received }
}

// ---------------------------------------------------------------------------
// SPARQL endpoint
// ---------------------------------------------------------------------------

/// A running mock SPARQL Update endpoint.
#[derive(Clone)]
pub struct MockSparql {
    pub url: String,
    updates: Arc<Mutex<Vec<String>>>,
}

impl MockSparql {
    pub fn updates(&self) -> Vec<String> {
        self.updates.lock().expect("lock updates").clone()
    }
}

async fn receive_update(
    State(updates): State<Arc<Mutex<Vec<String>>>>,
    Form(form): Form<HashMap<String, String>>,
) -> StatusCode {
    match form.get("update") {
        Some(update) => {
            updates.lock().expect("lock updates").push(update.clone());
            StatusCode::OK
        }
        None => StatusCode::BAD_REQUEST,
    }
}

pub async fn spawn_sparql_endpoint() -> MockSparql {
    let updates = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/update", post(receive_update))
        .with_state(Arc::clone(&updates));
    let url = format!("{}/update", serve(router).await);
    MockSparql { url, updates }
}
