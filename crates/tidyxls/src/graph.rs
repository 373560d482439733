//! Dependency extraction and dependency ordering.
//!
//! [`dependencies`] collects the references a formula reads.
//! [`topological_layers`] orders a collection of named formulas so that every
//! name comes after the names it depends on.

use std::{collections::BTreeSet, fmt};

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use tidyxls_parser::Token;

/// Ordered, deduplicated values of the range operands in `tokens`.
///
/// Accepts any token iterator, so both a normalized stream and a syntax
/// tree traversal work:
///
/// ```
/// # use tidyxls::graph::dependencies;
/// let tokens = tidyxls_parser::tokenize("=B1+A1*B1");
/// let deps = dependencies(&tokens);
/// assert_eq!(deps.iter().collect::<Vec<_>>(), ["B1", "A1"]);
///
/// let root = tidyxls_parser::parse("=B1+A1*B1").unwrap();
/// assert_eq!(dependencies(root.iter().map(|node| node.token())), deps);
/// ```
pub fn dependencies<'a, I>(tokens: I) -> IndexSet<String>
where
    I: IntoIterator<Item = &'a Token>,
{
    tokens
        .into_iter()
        .filter(|token| token.is_range())
        .map(|token| token.value().to_string())
        .collect()
}

/// Dependency layers of `graph`, each sorted by name.
pub type Layers = Vec<BTreeSet<String>>;

/// No further layer can be produced: the remaining names depend on each
/// other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    unresolved: IndexMap<String, BTreeSet<String>>,
}

impl CycleError {
    /// Names left unresolved, sorted, with their remaining dependencies.
    pub fn unresolved(&self) -> &IndexMap<String, BTreeSet<String>> {
        &self.unresolved
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cyclic dependency among: ")?;
        for (index, (name, deps)) in self.unresolved.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
            write!(f, "{name} -> {{{}}}", deps.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for CycleError {}

/// Order `graph` (name to the names it depends on) into layers.
///
/// Each layer holds the names whose dependencies all lie in earlier layers.
/// Self-dependencies are ignored, and names that only appear as
/// dependencies join the first layer.
///
/// # Errors
///
/// Returns a [`CycleError`] naming the unresolved subset when names remain
/// but none of them is free of dependencies.
pub fn topological_layers(graph: &IndexMap<String, IndexSet<String>>) -> Result<Layers, CycleError> {
    let mut remaining: IndexMap<&str, BTreeSet<&str>> = IndexMap::new();

    for (name, deps) in graph {
        let deps = deps
            .iter()
            .map(String::as_str)
            .filter(|dep| *dep != name.as_str())
            .collect();
        remaining.insert(name.as_str(), deps);
    }
    for dep in graph.values().flatten() {
        remaining.entry(dep.as_str()).or_default();
    }
    trace!(nodes = remaining.len(); "Sorting dependency graph");

    let mut layers = Vec::new();
    while !remaining.is_empty() {
        let ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(name, _)| *name)
            .collect();

        if ready.is_empty() {
            remaining.sort_keys();
            let unresolved = remaining
                .into_iter()
                .map(|(name, deps)| {
                    let deps = deps.into_iter().map(str::to_string).collect();
                    (name.to_string(), deps)
                })
                .collect();
            return Err(CycleError { unresolved });
        }

        remaining.retain(|name, _| !ready.contains(name));
        for deps in remaining.values_mut() {
            deps.retain(|dep| !ready.contains(dep));
        }
        layers.push(ready.into_iter().map(str::to_string).collect());
    }

    debug!(layers = layers.len(); "Dependency graph sorted");
    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tidyxls_parser::tokenize;

    fn graph(entries: &[(&str, &[&str])]) -> IndexMap<String, IndexSet<String>> {
        entries
            .iter()
            .map(|(name, deps)| {
                let deps = deps.iter().map(|dep| dep.to_string()).collect();
                (name.to_string(), deps)
            })
            .collect()
    }

    fn layer(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_dependencies_ordered_and_unique() {
        let deps = dependencies(&tokenize("=SUM(B1,A1)+B1+'S 1'!C2*2"));
        let deps: Vec<_> = deps.iter().map(String::as_str).collect();
        assert_eq!(deps, ["B1", "A1", "'S 1'!C2"]);
    }

    #[test]
    fn test_dependencies_skip_literals() {
        let deps = dependencies(&tokenize("=IF(TRUE,\"A1\",#N/A)+1"));
        assert!(deps.is_empty());
    }

    #[test]
    fn test_chain_layers() {
        let layers = topological_layers(&graph(&[("X", &["Y"]), ("Y", &["Z"]), ("Z", &[])])).unwrap();
        assert_eq!(layers, vec![layer(&["Z"]), layer(&["Y"]), layer(&["X"])]);
    }

    #[test]
    fn test_undefined_names_and_self_dependency() {
        let layers = topological_layers(&graph(&[("B", &["B", "A"]), ("C", &["A", "B"])])).unwrap();
        assert_eq!(layers, vec![layer(&["A"]), layer(&["B"]), layer(&["C"])]);
    }

    #[test]
    fn test_layers_are_sorted() {
        let layers = topological_layers(&graph(&[("b", &[]), ("a", &[]), ("c", &["b", "a"])])).unwrap();
        assert_eq!(layers[0].iter().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn test_cycle_is_error() {
        let err = topological_layers(&graph(&[("X", &["Y"]), ("Y", &["X"])])).unwrap_err();
        let names: Vec<_> = err.unresolved().keys().map(String::as_str).collect();
        assert_eq!(names, ["X", "Y"]);
        assert_eq!(err.to_string(), "cyclic dependency among: X -> {Y}, Y -> {X}");
    }

    #[test]
    fn test_cycle_reports_only_unresolved_subset() {
        let err = topological_layers(&graph(&[("A", &[]), ("B", &["A", "C"]), ("C", &["B"])]))
            .unwrap_err();
        let names: Vec<_> = err.unresolved().keys().map(String::as_str).collect();
        assert_eq!(names, ["B", "C"]);
    }

    #[test]
    fn test_empty_graph() {
        assert!(topological_layers(&IndexMap::new()).unwrap().is_empty());
    }

    fn references_strategy() -> impl Strategy<Value = String> {
        let reference = prop::sample::select(vec![
            "A1", "B2", "C3:D4", "[@Net]", "Sheet2!A1", "1", "\"A1\"",
        ]);
        let operator = prop::sample::select(vec!["+", "*", ","]);
        prop::collection::vec((reference, operator), 1..12).prop_map(|parts| {
            let body: String = parts.iter().map(|(r, op)| format!("{r}{op}")).collect();
            format!("=SUM({body}0)")
        })
    }

    fn check_dependencies_keep_first_occurrence(formula: &str) -> Result<(), TestCaseError> {
        let tokens = tokenize(formula);
        let deps = dependencies(&tokens);

        let mut expected: Vec<&str> = Vec::new();
        for token in tokens.iter().filter(|t| t.is_range()) {
            if !expected.contains(&token.value()) {
                expected.push(token.value());
            }
        }
        let actual: Vec<&str> = deps.iter().map(String::as_str).collect();
        prop_assert_eq!(actual, expected);
        Ok(())
    }

    proptest! {
        #[test]
        fn dependencies_are_unique_and_ordered(formula in references_strategy()) {
            check_dependencies_keep_first_occurrence(&formula)?;
        }
    }
}
