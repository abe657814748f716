// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! DOT export for resource LTSs and tuple-state topology/controller graphs.
//! Node ids are assigned over states sorted by key so the output is
//! deterministic for a given graph.

use crate::error::{Error, Result};
use crate::lts::Lts;
use crate::topology::{IndexedAction, TupleState};
use dot_writer::{Attributes, Color, DotWriter};
use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Renders a topology graph. Edges also present in `highlight` (the
/// controller) are drawn in red; with `only_highlighted` everything else is
/// omitted.
pub fn tuple_dot(
    graph: &Lts<TupleState, IndexedAction>,
    highlight: Option<&Lts<TupleState, IndexedAction>>,
    only_highlighted: bool,
) -> String {
    dot_impl(
        graph,
        highlight,
        only_highlighted,
        |tuple: &TupleState| format!("({})", tuple.join(", ")),
        |action: &IndexedAction| action.to_string(),
    )
}

/// Renders a single resource LTS.
pub fn resource_dot(lts: &Lts) -> String {
    dot_impl(
        lts,
        None,
        false,
        |state: &String| state.clone(),
        |label: &String| label.clone(),
    )
}

fn dot_impl<K, T>(
    graph: &Lts<K, T>,
    highlight: Option<&Lts<K, T>>,
    only_highlighted: bool,
    node_label: impl Fn(&K) -> String,
    edge_label: impl Fn(&T) -> String,
) -> String
where
    K: Eq + Hash + Clone + Debug + Ord,
    T: PartialEq,
{
    let is_highlighted = |src: &K, label: &T, dst: &K| {
        highlight
            .and_then(|h| h.state(src))
            .is_some_and(|s| s.has_transition(label, dst))
    };
    let keep_state =
        |key: &K| !only_highlighted || highlight.is_some_and(|h| h.has_state(key));

    let mut keys: Vec<&K> = graph.states().map(|(k, _)| k).collect();
    keys.sort();

    DotWriter::write_string(|writer| {
        writer.set_pretty_print(false);
        let mut digraph = writer.digraph();
        let mut ids = FxHashMap::default();
        for &key in keys.iter().filter(|&&k| keep_state(k)) {
            let mut node = digraph.node_auto();
            node.set_label(&node_label(key));
            ids.insert(key.clone(), node.id());
        }
        for &key in keys.iter().filter(|&&k| keep_state(k)) {
            for (label, target) in graph[key].transitions() {
                let highlighted = is_highlighted(key, label, target);
                if only_highlighted && !highlighted {
                    continue;
                }
                let (Some(src), Some(dst)) = (ids.get(key), ids.get(target)) else {
                    continue;
                };
                let mut attributes = digraph.edge(src, dst).attributes();
                attributes.set_label(&edge_label(label));
                if highlighted {
                    attributes.set_color(Color::Red);
                }
            }
        }
    })
}

/// Pipes a DOT string through the `dot` executable, e.g. `format = "png"`.
pub fn render(dot: &str, path: impl AsRef<Path>, format: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(Error::io(path))?;
        }
    }
    let run = || -> std::io::Result<()> {
        let mut child = Command::new("dot")
            .arg(format!("-T{format}"))
            .arg("-o")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()?;
        child
            .stdin
            .as_mut()
            .expect("stdin was piped")
            .write_all(dot.as_bytes())?;
        let status = child.wait()?;
        if !status.success() {
            return Err(std::io::Error::other(format!(
                "dot exited with {status}"
            )));
        }
        Ok(())
    };
    run().map_err(Error::io(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state_topology() -> Lts<TupleState, IndexedAction> {
        let mut graph = Lts::with_initial(vec!["s0".to_string()]);
        graph
            .add_transition(
                vec!["s0".to_string()],
                IndexedAction::new(0, "a"),
                vec!["s1".to_string()],
                true,
            )
            .unwrap();
        graph
            .add_transition(
                vec!["s0".to_string()],
                IndexedAction::new(0, "b"),
                vec!["s2".to_string()],
                true,
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_dot_is_deterministic() {
        let graph = two_state_topology();
        assert_eq!(
            tuple_dot(&graph, None, false),
            tuple_dot(&graph, None, false)
        );
        assert!(tuple_dot(&graph, None, false).contains("0:a"));
    }

    #[test]
    fn test_highlight_marks_controller_edges() {
        let graph = two_state_topology();
        let mut chosen = Lts::with_initial(vec!["s0".to_string()]);
        chosen
            .add_transition(
                vec!["s0".to_string()],
                IndexedAction::new(0, "a"),
                vec!["s1".to_string()],
                true,
            )
            .unwrap();
        let dot = tuple_dot(&graph, Some(&chosen), false);
        assert!(dot.contains("red"));
        assert!(dot.contains("0:b"));

        let only = tuple_dot(&graph, Some(&chosen), true);
        assert!(!only.contains("0:b"));
    }
}
