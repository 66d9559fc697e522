//! `npsub` — nanopublication submitter command-line interface.
//!
//! Offline helpers around the submission pipeline plus a client for a running
//! service:
//!
//! - **`split`** — print the units of a bundle.
//! - **`uri`** — print the canonical URI of a (stamped) bundle.
//! - **`query`** — print the SPARQL update that would mirror a document.
//! - **`submit`** — post a document to a running submission service.
//!
//! All subcommands read TriG from a file path or from stdin (`-`).

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use nanopub_submitter::{
    build_query, extract_uri, split_bundle, QueryOptions, QueryStrategy, UriRewrite,
    DEFAULT_ENCODING, TRIG_MEDIA_TYPE,
};
use reqwest::{blocking::Client, header};

/// npsub — nanopublication submitter CLI
#[derive(Parser)]
#[command(name = "npsub", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split a bundle into its nanopublications.
    ///
    /// Each unit is printed after a `# --- unit N ---` separator line.
    ///
    /// Pass `-` as FILE to read from stdin.
    Split {
        /// Path to a TriG file, or `-` for stdin.
        file: PathBuf,
    },

    /// Print the canonical URI of a bundle (its last `this:` declaration).
    ///
    /// Exits 1 if the document declares no URI.
    Uri {
        /// Path to a TriG file, or `-` for stdin.
        file: PathBuf,

        /// Rewrite rule applied to the URI: OLD|NEW
        #[arg(long, value_name = "OLD|NEW")]
        rewrite: Option<String>,
    },

    /// Print the SPARQL update that mirrors a document into a triple store.
    Query {
        /// Path to a TriG file, or `-` for stdin.
        file: PathBuf,

        /// Graph layout: basic | multi-graph
        #[arg(long, default_value = "basic")]
        strategy: QueryStrategy,

        /// Honour `#> pre-query:` and `#> post-query:` lines.
        #[arg(long)]
        extra_queries: bool,

        /// Insert into the named graph typed with this class IRI (basic only).
        #[arg(long, value_name = "IRI")]
        graph_type: Option<String>,
    },

    /// Submit a document to a running submission service.
    ///
    /// Examples:
    ///   npsub submit np.trig --url http://localhost:8080
    ///   cat bundle.trig | npsub submit - --url http://localhost:8080 --token s3cret
    Submit {
        /// Path to a TriG file, or `-` for stdin.
        file: PathBuf,

        /// Base URL of the submission service.
        #[arg(long, env = "NPSUB_URL", default_value = "http://localhost:8080")]
        url: String,

        /// Bearer token, if the service requires one.
        #[arg(long, env = "NPSUB_TOKEN")]
        token: Option<String>,

        /// Comma-separated target servers replacing the service defaults.
        #[arg(long, value_name = "URL,URL")]
        servers: Option<String>,

        /// Rewrite rule for the reported URI: OLD|NEW
        #[arg(long, value_name = "OLD|NEW")]
        uri_replace: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Split { file } => {
            let bundle = read_input(&file);
            for (i, unit) in split_bundle(&bundle).iter().enumerate() {
                println!("# --- unit {} ---", i + 1);
                print!("{unit}");
            }
        }

        Command::Uri { file, rewrite } => {
            let bundle = read_input(&file);
            let Some(uri) = extract_uri(&bundle) else {
                eprintln!("npsub: no `@prefix this:` declaration found");
                process::exit(1);
            };
            let uri = match rewrite.as_deref().and_then(UriRewrite::parse) {
                Some(rule) => rule.apply(&uri),
                None => uri,
            };
            println!("{uri}");
        }

        Command::Query {
            file,
            strategy,
            extra_queries,
            graph_type,
        } => {
            let data = read_input(&file);
            let options = QueryOptions {
                strategy,
                extra_queries,
                graph_type,
            };
            match build_query(&data, &options) {
                Ok(query) => println!("{query}"),
                Err(e) => fatal(&format!("failed to build query: {e}")),
            }
        }

        Command::Submit {
            file,
            url,
            token,
            servers,
            uri_replace,
        } => {
            let data = read_input(&file);
            submit(&url, token.as_deref(), servers, uri_replace, data);
        }
    }
}

fn submit(
    url: &str,
    token: Option<&str>,
    servers: Option<String>,
    uri_replace: Option<String>,
    data: String,
) {
    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(servers) = servers {
        query.push(("servers", servers));
    }
    if let Some(rule) = uri_replace {
        query.push(("uri_replace", rule));
    }

    let endpoint = format!("{}/submit", url.trim_end_matches('/'));
    let mut request = Client::new()
        .post(&endpoint)
        .query(&query)
        .header(
            header::CONTENT_TYPE,
            format!("{TRIG_MEDIA_TYPE}; charset={DEFAULT_ENCODING}"),
        )
        .body(data);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .unwrap_or_else(|e| fatal(&format!("failed to reach {endpoint}: {e}")));
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response
        .text()
        .unwrap_or_else(|e| fatal(&format!("failed to read response: {e}")));

    if !status.is_success() {
        eprintln!("npsub: submission failed ({status}): {body}");
        process::exit(1);
    }
    println!("{body}");
    if let Some(location) = location {
        eprintln!("Location: {location}");
    }
}

/// Read the full contents of a file, or stdin when the path is `"-"`.
fn read_input(path: &PathBuf) -> String {
    if path.to_str() == Some("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {}", e)));
        buf
    } else {
        fs::read_to_string(path).unwrap_or_else(|e| {
            fatal(&format!("failed to read {}: {}", path.display(), e))
        })
    }
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("npsub: {}", msg);
    process::exit(2);
}
