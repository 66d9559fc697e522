//! SPARQL update synthesis.
//!
//! Converts a TriG document into a single SPARQL 1.1 Update string. Two graph
//! layouts are supported:
//!
//! - [`QueryStrategy::Basic`] flattens every graph into one triple set and
//!   inserts it into the default graph, or, in named-graph mode, into the
//!   graph whose node carries a configured `rdf:type`.
//! - [`QueryStrategy::MultiGraph`] keeps the named-graph structure and emits
//!   one `GRAPH` block per graph inside a single `INSERT DATA`.
//!
//! Documents may embed extra statements in comment lines:
//!
//! ```text
//! #> pre-query: DELETE WHERE { GRAPH <http://example.org/g> { ?s ?p ?o } } ;
//! #> post-query: CLEAR GRAPH <http://example.org/tmp> ;
//! ```
//!
//! When extra queries are enabled these are emitted verbatim before and after
//! the generated statements.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use oxrdf::vocab::rdf;
use oxrdf::{GraphName, Quad, Subject, Term};
use thiserror::Error;
use tracing::warn;

use crate::rdf::{parse_trig, RdfError};

/// Comment prefix of a statement emitted before the generated ones.
pub const PRE_QUERY_PREFIX: &str = "#> pre-query:";

/// Comment prefix of a statement emitted after the generated ones.
pub const POST_QUERY_PREFIX: &str = "#> post-query:";

/// Errors raised while synthesizing an update.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error(transparent)]
    Rdf(#[from] RdfError),

    /// Named-graph mode found no subject typed with the configured class.
    #[error("no graph node of type <{0}> found in nanopublication")]
    GraphNodeNotFound(String),
}

// ---------------------------------------------------------------------------
// QueryStrategy
// ---------------------------------------------------------------------------

/// Graph layout used when mirroring a nanopublication into a triple store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryStrategy {
    #[default]
    Basic,
    MultiGraph,
}

impl QueryStrategy {
    /// Resolve a configured strategy name. Unknown names fall back to
    /// [`QueryStrategy::Basic`].
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!("query: unknown strategy {name:?}, using basic");
            QueryStrategy::Basic
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStrategy::Basic => "basic",
            QueryStrategy::MultiGraph => "multi-graph",
        }
    }
}

impl FromStr for QueryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(QueryStrategy::Basic),
            "multi-graph" => Ok(QueryStrategy::MultiGraph),
            other => Err(format!(
                "unknown query strategy {other:?}; expected basic or multi-graph"
            )),
        }
    }
}

impl fmt::Display for QueryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// QueryOptions
// ---------------------------------------------------------------------------

/// Knobs for [`build_query`], normally taken from the triple-store config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub strategy: QueryStrategy,

    /// Honour `#> pre-query:` and `#> post-query:` comment lines.
    pub extra_queries: bool,

    /// Named-graph mode of the basic strategy: the IRI of the class whose
    /// instance names the target graph. `None` inserts into the default graph.
    pub graph_type: Option<String>,
}

// ---------------------------------------------------------------------------
// QueryPlan
// ---------------------------------------------------------------------------

/// An update under construction: extracted pre-statements, generated
/// statements, extracted post-statements, rendered in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    pub pre: Vec<String>,
    pub core: Vec<String>,
    pub post: Vec<String>,
}

impl QueryPlan {
    /// Start a plan for `data`, collecting extra statements only when
    /// `extra_queries` is set.
    pub fn prepare(data: &str, extra_queries: bool) -> Self {
        let mut plan = QueryPlan::default();
        if extra_queries {
            plan.extract_extra_queries(data);
        }
        plan
    }

    fn extract_extra_queries(&mut self, data: &str) {
        for line in data.lines() {
            if let Some(query) = line.strip_prefix(PRE_QUERY_PREFIX) {
                self.pre.push(query.trim().to_string());
            } else if let Some(query) = line.strip_prefix(POST_QUERY_PREFIX) {
                self.post.push(query.trim().to_string());
            }
        }
    }

    fn push(&mut self, part: impl Into<String>) {
        self.core.push(part.into());
    }

    fn drop_graph(&mut self, graph: &str) {
        self.push(format!("DROP SILENT GRAPH {graph} ;"));
    }

    fn create_graph(&mut self, graph: &str) {
        self.push(format!("CREATE GRAPH {graph} ;"));
    }

    fn insert_data(&mut self, triples: Vec<String>, graph: Option<&str>) {
        match graph {
            None => {
                self.push("INSERT DATA {");
                self.core.extend(triples);
                self.push("} ;");
            }
            Some(graph) => {
                self.push(format!("INSERT DATA {{ GRAPH {graph} {{"));
                self.core.extend(triples);
                self.push("} } ;");
            }
        }
    }

    fn graph_block(&mut self, graph: &str, triples: Vec<String>) {
        self.push(format!("GRAPH {graph} {{"));
        self.core.extend(triples);
        self.push("}");
    }

    /// The update text: every fragment on its own line.
    pub fn render(&self) -> String {
        self.pre
            .iter()
            .chain(&self.core)
            .chain(&self.post)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Synthesize the SPARQL update for `data` under `options`.
pub fn build_query(data: &str, options: &QueryOptions) -> Result<String, QueryError> {
    build_plan(data, options).map(|plan| plan.render())
}

/// Like [`build_query`] but returns the unrendered [`QueryPlan`].
pub fn build_plan(data: &str, options: &QueryOptions) -> Result<QueryPlan, QueryError> {
    let quads = parse_trig(data)?;
    let mut plan = QueryPlan::prepare(data, options.extra_queries);
    match options.strategy {
        QueryStrategy::Basic => basic(&mut plan, &quads, options.graph_type.as_deref())?,
        QueryStrategy::MultiGraph => multi_graph(&mut plan, &quads),
    }
    Ok(plan)
}

fn basic(
    plan: &mut QueryPlan,
    quads: &[Quad],
    graph_type: Option<&str>,
) -> Result<(), QueryError> {
    let mut seen = HashSet::new();
    let triples: Vec<String> = quads
        .iter()
        .map(triple_line)
        .filter(|line| seen.insert(line.clone()))
        .collect();

    match graph_type.filter(|t| !t.is_empty()) {
        None => plan.insert_data(triples, None),
        Some(graph_type) => {
            let graph = find_graph_node(quads, graph_type).ok_or_else(|| {
                warn!("query: graph URI not found (type: <{graph_type}>)");
                QueryError::GraphNodeNotFound(graph_type.to_string())
            })?;
            plan.drop_graph(&graph);
            plan.create_graph(&graph);
            plan.insert_data(triples, Some(&graph));
        }
    }
    Ok(())
}

fn multi_graph(plan: &mut QueryPlan, quads: &[Quad]) {
    let mut order: Vec<&GraphName> = Vec::new();
    let mut graphs: HashMap<&GraphName, Vec<String>> = HashMap::new();
    let mut skipped = Vec::new();
    for quad in quads {
        match &quad.graph_name {
            GraphName::DefaultGraph => continue,
            GraphName::BlankNode(node) => {
                if !skipped.contains(&node) {
                    warn!("query: skipping blank-node graph {node}, it cannot be named in SPARQL");
                    skipped.push(node);
                }
                continue;
            }
            GraphName::NamedNode(_) => {}
        }
        graphs
            .entry(&quad.graph_name)
            .or_insert_with(|| {
                order.push(&quad.graph_name);
                Vec::new()
            })
            .push(triple_line(quad));
    }

    if order.is_empty() {
        warn!("query: no named graphs found in given RDF");
    }

    plan.push("INSERT DATA {");
    for graph in order {
        let triples = graphs.remove(graph).unwrap_or_default();
        plan.graph_block(&graph.to_string(), triples);
    }
    plan.push("} ;");
}

/// The subject of the last `?s rdf:type <graph_type>` statement.
///
/// Only IRIs qualify; a blank node cannot name a graph in SPARQL.
fn find_graph_node(quads: &[Quad], graph_type: &str) -> Option<String> {
    let mut found = graph_nodes(quads, graph_type);
    if found.len() > 1 {
        warn!(
            "query: {} graph nodes of type <{graph_type}>, using the last one",
            found.len()
        );
    }
    found.pop()
}

/// Distinct IRI subjects typed `graph_type`, ordered by their last typing
/// statement.
fn graph_nodes(quads: &[Quad], graph_type: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut nodes: Vec<String> = quads
        .iter()
        .rev()
        .filter(|q| q.predicate.as_ref() == rdf::TYPE)
        .filter(|q| matches!(&q.object, Term::NamedNode(class) if class.as_str() == graph_type))
        .filter_map(|q| match &q.subject {
            Subject::NamedNode(node) => Some(node.to_string()),
            _ => None,
        })
        .filter(|node| seen.insert(node.clone()))
        .collect();
    nodes.reverse();
    nodes
}

fn triple_line(quad: &Quad) -> String {
    format!("{} {} {} .", quad.subject, quad.predicate, quad.object)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TRIPLES: &str = "<http://e/s1> <http://e/p1> <http://e/o1> .
<http://e/s2> <http://e/p2> <http://e/o2> .
";

    const TWO_GRAPHS: &str = "@prefix ex: <http://e/> .
ex:G1 { ex:s1 ex:p1 ex:o1 . }
ex:G2 { ex:s2 ex:p2 \"two\" . }
";

    const TYPED_GRAPH: &str = "@prefix ex: <http://e/> .
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
ex:Head { ex:np rdf:type ex:Nanopublication . }
ex:Assertion { ex:s ex:p ex:o . }
";

    fn basic_options() -> QueryOptions {
        QueryOptions::default()
    }

    #[test]
    fn basic_inserts_all_triples_into_default_graph() {
        let query = build_query(TWO_TRIPLES, &basic_options()).unwrap();
        assert_eq!(
            query,
            "INSERT DATA {\n\
             <http://e/s1> <http://e/p1> <http://e/o1> .\n\
             <http://e/s2> <http://e/p2> <http://e/o2> .\n\
             } ;"
        );
    }

    #[test]
    fn basic_flattens_named_graphs() {
        let query = build_query(TWO_GRAPHS, &basic_options()).unwrap();
        assert_eq!(query.matches("INSERT DATA").count(), 1);
        assert!(!query.contains("GRAPH"));
        assert!(query.contains("<http://e/s1> <http://e/p1> <http://e/o1> ."));
        assert!(query.contains("<http://e/s2> <http://e/p2> \"two\" ."));
    }

    #[test]
    fn basic_drops_duplicate_triples_across_graphs() {
        let data = "<http://e/G1> { <http://e/s> <http://e/p> <http://e/o> . }
<http://e/G2> { <http://e/s> <http://e/p> <http://e/o> . }
";
        let plan = build_plan(data, &basic_options()).unwrap();
        assert_eq!(plan.core.len(), 3);
    }

    #[test]
    fn literals_keep_language_and_datatype() {
        let data = "<http://e/s> <http://e/p> \"hallo\"@de .
<http://e/s> <http://e/q> \"5\"^^<http://www.w3.org/2001/XMLSchema#integer> .
";
        let query = build_query(data, &basic_options()).unwrap();
        assert!(query.contains("<http://e/s> <http://e/p> \"hallo\"@de ."));
        assert!(query.contains(
            "<http://e/s> <http://e/q> \"5\"^^<http://www.w3.org/2001/XMLSchema#integer> ."
        ));
    }

    #[test]
    fn named_graph_mode_replaces_the_typed_graph() {
        let options = QueryOptions {
            graph_type: Some("http://e/Nanopublication".into()),
            ..basic_options()
        };
        let plan = build_plan(TYPED_GRAPH, &options).unwrap();
        assert_eq!(plan.core[0], "DROP SILENT GRAPH <http://e/np> ;");
        assert_eq!(plan.core[1], "CREATE GRAPH <http://e/np> ;");
        assert_eq!(plan.core[2], "INSERT DATA { GRAPH <http://e/np> {");
        assert_eq!(plan.core.last().unwrap(), "} } ;");
        assert_eq!(plan.core.len(), 6);
    }

    #[test]
    fn named_graph_mode_without_graph_node_fails() {
        let options = QueryOptions {
            graph_type: Some("http://e/Missing".into()),
            ..basic_options()
        };
        let err = build_query(TYPED_GRAPH, &options).unwrap_err();
        assert_eq!(err, QueryError::GraphNodeNotFound("http://e/Missing".into()));
    }

    #[test]
    fn graph_nodes_are_distinct_and_last_typing_wins() {
        let data = "@prefix ex: <http://e/> .
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
ex:Head {
  ex:a rdf:type ex:Np .
  ex:b rdf:type ex:Np .
  ex:a rdf:type ex:Np .
  _:x rdf:type ex:Np .
}
";
        let quads = parse_trig(data).unwrap();
        assert_eq!(graph_nodes(&quads, "http://e/Np"), vec!["<http://e/b>", "<http://e/a>"]);
        assert_eq!(find_graph_node(&quads, "http://e/Np").as_deref(), Some("<http://e/a>"));
    }

    #[test]
    fn empty_graph_type_means_default_graph() {
        let options = QueryOptions {
            graph_type: Some(String::new()),
            ..basic_options()
        };
        let query = build_query(TWO_TRIPLES, &options).unwrap();
        assert!(query.starts_with("INSERT DATA {\n"));
    }

    #[test]
    fn multi_graph_emits_one_block_per_graph() {
        let options = QueryOptions {
            strategy: QueryStrategy::MultiGraph,
            ..basic_options()
        };
        let query = build_query(TWO_GRAPHS, &options).unwrap();
        assert_eq!(
            query,
            "INSERT DATA {\n\
             GRAPH <http://e/G1> {\n\
             <http://e/s1> <http://e/p1> <http://e/o1> .\n\
             }\n\
             GRAPH <http://e/G2> {\n\
             <http://e/s2> <http://e/p2> \"two\" .\n\
             }\n\
             } ;"
        );
    }

    #[test]
    fn multi_graph_groups_interleaved_statements() {
        let data = "<http://e/G1> { <http://e/a> <http://e/p> <http://e/b> . }
<http://e/G2> { <http://e/c> <http://e/p> <http://e/d> . }
<http://e/G1> { <http://e/e> <http://e/p> <http://e/f> . }
";
        let options = QueryOptions {
            strategy: QueryStrategy::MultiGraph,
            ..basic_options()
        };
        let plan = build_plan(data, &options).unwrap();
        assert_eq!(plan.core.iter().filter(|l| l.starts_with("GRAPH")).count(), 2);
        assert_eq!(plan.core[1], "GRAPH <http://e/G1> {");
        assert_eq!(plan.core[2], "<http://e/a> <http://e/p> <http://e/b> .");
        assert_eq!(plan.core[3], "<http://e/e> <http://e/p> <http://e/f> .");
    }

    #[test]
    fn multi_graph_skips_blank_node_graphs() {
        let data = "_:g { <http://e/a> <http://e/p> <http://e/b> . }
<http://e/G1> { <http://e/c> <http://e/p> <http://e/d> . }
";
        let options = QueryOptions {
            strategy: QueryStrategy::MultiGraph,
            ..basic_options()
        };
        let query = build_query(data, &options).unwrap();
        assert!(!query.contains("_:"));
        assert!(!query.contains("<http://e/a>"));
        assert!(query.contains("GRAPH <http://e/G1> {"));
    }

    #[test]
    fn multi_graph_without_named_graphs_is_an_empty_insert() {
        let options = QueryOptions {
            strategy: QueryStrategy::MultiGraph,
            ..basic_options()
        };
        let query = build_query(TWO_TRIPLES, &options).unwrap();
        assert_eq!(query, "INSERT DATA {\n} ;");
    }

    #[test]
    fn extra_queries_wrap_the_generated_statements() {
        let data = format!(
            "#> pre-query: DELETE WHERE {{ ?s ?p ?o }} ;\n\
             #> post-query: CLEAR GRAPH <http://e/tmp> ;\n{TWO_TRIPLES}"
        );
        let options = QueryOptions {
            extra_queries: true,
            ..basic_options()
        };
        let query = build_query(&data, &options).unwrap();
        let lines: Vec<&str> = query.lines().collect();
        assert_eq!(lines.first(), Some(&"DELETE WHERE { ?s ?p ?o } ;"));
        assert_eq!(lines[1], "INSERT DATA {");
        assert_eq!(lines.last(), Some(&"CLEAR GRAPH <http://e/tmp> ;"));
    }

    #[test]
    fn extra_queries_are_ignored_when_disabled() {
        let data = format!("#> pre-query: DROP ALL ;\n{TWO_TRIPLES}");
        let plan = build_plan(&data, &basic_options()).unwrap();
        assert!(plan.pre.is_empty());
        assert!(plan.post.is_empty());
        assert!(!plan.render().contains("DROP ALL"));
    }

    #[test]
    fn extra_queries_keep_document_order() {
        let data = "#> pre-query: A\n#> post-query: C\n#> pre-query: B\n#> post-query: D\n";
        let plan = QueryPlan::prepare(data, true);
        assert_eq!(plan.pre, vec!["A", "B"]);
        assert_eq!(plan.post, vec!["C", "D"]);
    }

    #[test]
    fn unknown_strategy_falls_back_to_basic() {
        assert_eq!(QueryStrategy::from_name("fancy"), QueryStrategy::Basic);
        assert_eq!(QueryStrategy::from_name("Multi-Graph"), QueryStrategy::MultiGraph);
    }

    #[test]
    fn invalid_rdf_is_an_error() {
        let err = build_query("<http://e/s> <http://e/p> .", &basic_options()).unwrap_err();
        assert!(matches!(err, QueryError::Rdf(_)));
    }
}
