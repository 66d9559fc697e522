//! Line-oriented scanning of nanopublication bundles.
//!
//! A bundle is a TriG document holding one or more nanopublications. Each
//! nanopublication declares its own local `this:` prefix, and that
//! declaration is the only structure this module relies on. No attempt is
//! made to understand the rest of the TriG grammar.

/// Text that marks a local "this" prefix declaration.
pub const THIS_PREFIX_MARKER: &str = "@prefix this:";

/// Returns `true` when `line` declares the local `this:` prefix.
pub fn is_this_declaration(line: &str) -> bool {
    line.contains(THIS_PREFIX_MARKER)
}

/// Split a bundle into its nanopublications, in document order.
///
/// A new unit starts at every `this:` declaration except the first one seen,
/// which opens the first unit. Lines before the first declaration (if any)
/// belong to the first unit. Every returned unit ends with `\n`, so
/// concatenating the units yields the original line sequence.
///
/// A document without any declaration is returned as a single unit; an empty
/// document yields no units.
pub fn split_bundle(bundle: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut current = String::new();
    let mut current_has_declaration = false;

    for line in bundle.lines() {
        if is_this_declaration(line) {
            if current_has_declaration {
                units.push(std::mem::take(&mut current));
            }
            current_has_declaration = true;
        }
        current.push_str(line);
        current.push('\n');
    }

    if !current.is_empty() {
        units.push(current);
    }
    units
}

/// Recover the canonical URI of a stamped bundle.
///
/// Scans every `this:` declaration and returns the IRI between `<` and `>` of
/// the **last** one, i.e. the trailing nanopublication of a bundle. Lines
/// that carry the marker but no bracketed IRI are skipped.
pub fn extract_uri(bundle: &str) -> Option<String> {
    bundle
        .lines()
        .filter(|line| is_this_declaration(line))
        .filter_map(bracketed_iri)
        .last()
        .map(str::to_string)
}

fn bracketed_iri(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once('<')?;
    let (iri, _) = rest.split_once('>')?;
    Some(iri)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NP1: &str = "@prefix this: <http://example.org/np1> .
@prefix sub: <http://example.org/np1#> .
sub:Head {
  this: a <http://www.nanopub.org/nschema#Nanopublication> .
}
";

    const NP2: &str = "@prefix this: <http://example.org/np2> .
@prefix sub: <http://example.org/np2#> .
sub:Head {
  this: a <http://www.nanopub.org/nschema#Nanopublication> .
}
";

    #[test]
    fn single_nanopub_is_one_unit() {
        let units = split_bundle(NP1);
        assert_eq!(units, vec![NP1.to_string()]);
    }

    #[test]
    fn bundle_splits_at_each_declaration() {
        let bundle = format!("{NP1}{NP2}{NP1}");
        let units = split_bundle(&bundle);
        assert_eq!(units.len(), 3);
        assert_eq!(units[0], NP1);
        assert_eq!(units[1], NP2);
        assert_eq!(units[2], NP1);
    }

    #[test]
    fn concatenated_units_reproduce_the_document() {
        let bundle = format!("{NP1}\n{NP2}");
        let units = split_bundle(&bundle);
        assert_eq!(units.len(), 2);
        assert_eq!(units.concat(), bundle);
    }

    #[test]
    fn missing_trailing_newline_is_restored() {
        let bundle = NP1.trim_end();
        let units = split_bundle(bundle);
        assert_eq!(units.concat(), NP1);
    }

    #[test]
    fn leading_lines_join_the_first_unit() {
        let bundle = format!("# generated\n{NP1}{NP2}");
        let units = split_bundle(&bundle);
        assert_eq!(units.len(), 2);
        assert!(units[0].starts_with("# generated\n@prefix this:"));
    }

    #[test]
    fn empty_document_has_no_units() {
        assert!(split_bundle("").is_empty());
    }

    #[test]
    fn uri_of_single_nanopub() {
        assert_eq!(extract_uri(NP1).as_deref(), Some("http://example.org/np1"));
    }

    #[test]
    fn last_declaration_wins() {
        let bundle = format!("{NP1}{NP2}");
        assert_eq!(extract_uri(&bundle).as_deref(), Some("http://example.org/np2"));
    }

    #[test]
    fn malformed_declaration_is_skipped() {
        let bundle = format!("{NP1}@prefix this: broken\n");
        assert_eq!(extract_uri(&bundle).as_deref(), Some("http://example.org/np1"));
    }

    #[test]
    fn no_declaration_means_no_uri() {
        assert_eq!(extract_uri("@prefix ex: <http://example.org/> .\n"), None);
    }
}
