//! Service configuration, populated from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use nanopub_submitter::{QueryOptions, QueryStrategy};
use rand::seq::SliceRandom;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("TRIPLE_STORE_SPARQL_ENDPOINT must be set when the triple store is enabled")]
    MissingSparqlEndpoint,
}

// ---------------------------------------------------------------------------
// SubmitterConfig
// ---------------------------------------------------------------------------

/// Runtime configuration for the submission service.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `SUBMITTER_BIND` | `0.0.0.0:8080` | TCP socket address to listen on |
/// | `SUBMITTER_TOKENS` | (empty = open) | Comma-separated bearer tokens |
/// | `SUBMITTER_URI_REPLACE` | (absent) | Default `OLD|NEW` URI rewrite rule |
///
/// See [`NanopubConfig`] and [`TripleStoreConfig`] for the remaining variables.
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// Socket address the server binds to.
    pub bind_addr: SocketAddr,

    pub nanopub: NanopubConfig,

    pub triple_store: TripleStoreConfig,

    /// Accepted bearer tokens. Empty disables the token check.
    pub tokens: Vec<String>,

    /// Rewrite rule used when a request does not bring its own.
    pub uri_replace: Option<String>,
}

/// How the default target list is turned into the servers of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStrategy {
    /// Publish to every configured server.
    All,
    /// Publish to this many distinct servers picked at random.
    Random(usize),
}

/// Settings for stamping and publishing.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `SUBMITTER_SERVERS` | `http://nanopub-server:8080` | Comma-separated target servers |
/// | `SUBMITTER_TARGET_STRATEGY` | `all` | `all` or `random` |
/// | `SUBMITTER_TARGET_COUNT` | `1` | Servers picked by `random` |
/// | `SUBMITTER_CLIENT_EXEC` | `np` | Identifier tool executable |
/// | `SUBMITTER_CLIENT_TIMEOUT_SECS` | `10` | Identifier tool timeout |
/// | `SUBMITTER_PUBLISH_TIMEOUT_SECS` | `30` | Per-request publish timeout |
/// | `SUBMITTER_SIGN` | `false` | Sign instead of plain trusty stamping |
/// | `SUBMITTER_SIGN_KEY_TYPE` | `DSA` | Key type passed to the tool |
/// | `SUBMITTER_SIGN_PRIVATE_KEY` | (empty) | Private key path passed to the tool |
/// | `SUBMITTER_WORKDIR` | `/app/workdir` | Directory for transient files |
#[derive(Debug, Clone)]
pub struct NanopubConfig {
    pub servers: Vec<String>,
    pub target_strategy: TargetStrategy,
    pub client_exec: String,
    pub client_timeout: Duration,
    pub publish_timeout: Duration,
    pub sign_nanopub: bool,
    pub sign_key_type: String,
    pub sign_private_key: String,
    pub workdir: PathBuf,
}

impl NanopubConfig {
    /// The configured servers after applying the target strategy.
    pub fn target_servers(&self) -> Vec<String> {
        match self.target_strategy {
            TargetStrategy::All => self.servers.clone(),
            TargetStrategy::Random(count) => {
                let mut rng = rand::thread_rng();
                let picked: Vec<&String> = self.servers.choose_multiple(&mut rng, count).collect();
                // Keep configured order among the picked servers.
                self.servers
                    .iter()
                    .filter(|s| picked.contains(s))
                    .cloned()
                    .collect()
            }
        }
    }
}

/// Triple-store authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    None,
    Basic { username: String, password: String },
}

/// Settings for mirroring nanopublications into a SPARQL triple store.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `TRIPLE_STORE_ENABLED` | `false` | Mirror submissions |
/// | `TRIPLE_STORE_SPARQL_ENDPOINT` | (empty) | SPARQL Update endpoint |
/// | `TRIPLE_STORE_AUTH_METHOD` | `NONE` | `NONE` or `BASIC` |
/// | `TRIPLE_STORE_AUTH_USERNAME` | (empty) | Basic-auth user |
/// | `TRIPLE_STORE_AUTH_PASSWORD` | (empty) | Basic-auth password |
/// | `TRIPLE_STORE_GRAPH_NAMED` | `false` | Insert into a typed named graph |
/// | `TRIPLE_STORE_GRAPH_TYPE` | (empty) | Class IRI of the graph node |
/// | `TRIPLE_STORE_EXTRA_QUERIES` | `false` | Honour `#> pre-query:` / `#> post-query:` |
/// | `TRIPLE_STORE_STRATEGY` | `basic` | `basic` or `multi-graph` |
#[derive(Debug, Clone)]
pub struct TripleStoreConfig {
    pub enabled: bool,
    pub sparql_endpoint: String,
    pub auth: AuthMethod,
    pub graph_named: bool,
    pub graph_type: String,
    pub extra_queries: bool,
    pub strategy: QueryStrategy,
}

impl TripleStoreConfig {
    /// Options handed to the query synthesizer.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            strategy: self.strategy,
            extra_queries: self.extra_queries,
            graph_type: (self.graph_named && !self.graph_type.is_empty())
                .then(|| self.graph_type.clone()),
        }
    }
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            nanopub: NanopubConfig {
                servers: vec!["http://nanopub-server:8080".into()],
                target_strategy: TargetStrategy::All,
                client_exec: "np".into(),
                client_timeout: Duration::from_secs(10),
                publish_timeout: Duration::from_secs(30),
                sign_nanopub: false,
                sign_key_type: "DSA".into(),
                sign_private_key: String::new(),
                workdir: PathBuf::from("/app/workdir"),
            },
            triple_store: TripleStoreConfig {
                enabled: false,
                sparql_endpoint: String::new(),
                auth: AuthMethod::None,
                graph_named: false,
                graph_type: String::new(),
                extra_queries: false,
                strategy: QueryStrategy::Basic,
            },
            tokens: vec![],
            uri_replace: None,
        }
    }
}

impl SubmitterConfig {
    /// Populate config from the process environment, applying defaults where absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Populate config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = Self::default();

        let servers = env
            .list("SUBMITTER_SERVERS")
            .unwrap_or(defaults.nanopub.servers);

        let target_strategy = match env.string("SUBMITTER_TARGET_STRATEGY") {
            None => TargetStrategy::All,
            Some(s) if s.eq_ignore_ascii_case("all") => TargetStrategy::All,
            Some(s) if s.to_ascii_lowercase().starts_with("random") => {
                let count: usize = env
                    .parse("SUBMITTER_TARGET_COUNT", "a positive integer")?
                    .unwrap_or(1);
                if count == 0 {
                    return Err(ConfigError::Invalid {
                        var: "SUBMITTER_TARGET_COUNT",
                        expected: "a positive integer",
                        value: count.to_string(),
                    });
                }
                TargetStrategy::Random(count)
            }
            Some(value) => {
                return Err(ConfigError::Invalid {
                    var: "SUBMITTER_TARGET_STRATEGY",
                    expected: "all or random",
                    value,
                })
            }
        };

        let nanopub = NanopubConfig {
            servers,
            target_strategy,
            client_exec: env
                .string("SUBMITTER_CLIENT_EXEC")
                .unwrap_or(defaults.nanopub.client_exec),
            client_timeout: env
                .parse("SUBMITTER_CLIENT_TIMEOUT_SECS", "a number of seconds")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.nanopub.client_timeout),
            publish_timeout: env
                .parse("SUBMITTER_PUBLISH_TIMEOUT_SECS", "a number of seconds")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.nanopub.publish_timeout),
            sign_nanopub: env.flag("SUBMITTER_SIGN")?.unwrap_or(false),
            sign_key_type: env
                .string("SUBMITTER_SIGN_KEY_TYPE")
                .unwrap_or(defaults.nanopub.sign_key_type),
            sign_private_key: env.string("SUBMITTER_SIGN_PRIVATE_KEY").unwrap_or_default(),
            workdir: env
                .string("SUBMITTER_WORKDIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.nanopub.workdir),
        };

        let auth = match env.string("TRIPLE_STORE_AUTH_METHOD") {
            None => AuthMethod::None,
            Some(m) if m.eq_ignore_ascii_case("none") => AuthMethod::None,
            Some(m) if m.eq_ignore_ascii_case("basic") => AuthMethod::Basic {
                username: env.string("TRIPLE_STORE_AUTH_USERNAME").unwrap_or_default(),
                password: env.string("TRIPLE_STORE_AUTH_PASSWORD").unwrap_or_default(),
            },
            Some(value) => {
                return Err(ConfigError::Invalid {
                    var: "TRIPLE_STORE_AUTH_METHOD",
                    expected: "NONE or BASIC",
                    value,
                })
            }
        };

        let triple_store = TripleStoreConfig {
            enabled: env.flag("TRIPLE_STORE_ENABLED")?.unwrap_or(false),
            sparql_endpoint: env.string("TRIPLE_STORE_SPARQL_ENDPOINT").unwrap_or_default(),
            auth,
            graph_named: env.flag("TRIPLE_STORE_GRAPH_NAMED")?.unwrap_or(false),
            graph_type: env.string("TRIPLE_STORE_GRAPH_TYPE").unwrap_or_default(),
            extra_queries: env.flag("TRIPLE_STORE_EXTRA_QUERIES")?.unwrap_or(false),
            strategy: env
                .string("TRIPLE_STORE_STRATEGY")
                .map(|s| QueryStrategy::from_name(&s))
                .unwrap_or_default(),
        };
        if triple_store.enabled && triple_store.sparql_endpoint.is_empty() {
            return Err(ConfigError::MissingSparqlEndpoint);
        }

        Ok(Self {
            bind_addr: env
                .parse("SUBMITTER_BIND", "a socket address (e.g. 0.0.0.0:8080)")?
                .unwrap_or(defaults.bind_addr),
            nanopub,
            triple_store,
            tokens: env.list("SUBMITTER_TOKENS").unwrap_or_default(),
            uri_replace: env.string("SUBMITTER_URI_REPLACE"),
        })
    }
}

// ---------------------------------------------------------------------------
// Env lookup helpers
// ---------------------------------------------------------------------------

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// A non-blank variable, trimmed.
    fn string(&self, var: &str) -> Option<String> {
        (self.0)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn list(&self, var: &str) -> Option<Vec<String>> {
        self.string(var).map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    fn parse<T: FromStr>(
        &self,
        var: &'static str,
        expected: &'static str,
    ) -> Result<Option<T>, ConfigError> {
        self.string(var)
            .map(|value| {
                value
                    .parse::<T>()
                    .map_err(|_| ConfigError::Invalid { var, expected, value })
            })
            .transpose()
    }

    fn flag(&self, var: &'static str) -> Result<Option<bool>, ConfigError> {
        self.string(var)
            .map(|value| match value.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(ConfigError::Invalid {
                    var,
                    expected: "a boolean",
                    value,
                }),
            })
            .transpose()
    }
}
