// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! # Topology
//! The asynchronous parallel composition of all resource LTSs. States are
//! tuples of resource states, one coordinate per resource; transitions record
//! the index of the resource that moved. Available complete (everything
//! expanded up front) or incremental (states expanded on demand).

mod complete;
mod incremental;

pub use complete::CompleteTopology;
pub use incremental::IncrementalTopology;

use crate::error::Result;
use crate::lts::{unknown_state, Lts};
use std::collections::VecDeque;
use std::fmt;

/// A topology or controller state: one resource state per coordinate,
/// ordered by resource index.
pub type TupleState = Vec<String>;

/// A topology transition label: which resource moved, and how.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexedAction {
    pub resource: usize,
    pub action: String,
}

impl IndexedAction {
    pub fn new(resource: usize, action: impl Into<String>) -> Self {
        IndexedAction {
            resource,
            action: action.into(),
        }
    }
}

impl fmt::Display for IndexedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

/// Read access to a (possibly lazily materialised) topology.
///
/// `transitions_from` takes `&mut self` because the incremental
/// implementation materialises out-edges on first contact; the graph is
/// never mutated in any observable way beyond that.
pub trait Topology {
    fn initial_state(&self) -> &TupleState;

    /// Out-edges of `state` in `(resource index, insertion order)` order.
    fn transitions_from(&mut self, state: &TupleState) -> Result<Vec<(IndexedAction, TupleState)>>;

    /// The materialised part of the product graph.
    fn graph(&self) -> &Lts<TupleState, IndexedAction>;
}

fn initial_tuple(resources: &[Lts]) -> Result<TupleState> {
    resources
        .iter()
        .enumerate()
        .map(|(i, resource)| {
            resource
                .initial_state()
                .cloned()
                .ok_or_else(|| unknown_state(&format!("initial state of resource {i}")))
        })
        .collect()
}

/// Expands every enabled move of `tuple`; `on_new_state` fires for each
/// successor tuple materialised for the first time.
fn expand_tuple(
    resources: &[Lts],
    graph: &mut Lts<TupleState, IndexedAction>,
    tuple: &TupleState,
    mut on_new_state: impl FnMut(TupleState),
) -> Result<()> {
    for (i, resource) in resources.iter().enumerate() {
        let Some(local) = resource.state(&tuple[i]) else {
            continue;
        };
        for (action, target) in local.transitions() {
            let mut successor = tuple.clone();
            successor[i] = target.clone();
            let is_new = !graph.has_state(&successor);
            graph.add_transition(
                tuple.clone(),
                IndexedAction::new(i, action.clone()),
                successor.clone(),
                true,
            )?;
            if is_new {
                on_new_state(successor);
            }
        }
    }
    Ok(())
}

/// The standard asynchronous parallel composition without synchronisation:
/// breadth-first product construction over all reachable tuples.
pub fn combine(resources: &[Lts]) -> Result<Lts<TupleState, IndexedAction>> {
    let initial = initial_tuple(resources)?;
    let mut graph = Lts::with_initial(initial.clone());
    // every tuple is enqueued exactly once, when it is first materialised
    let mut queue = VecDeque::from([initial]);
    while let Some(tuple) = queue.pop_front() {
        expand_tuple(resources, &mut graph, &tuple, |successor| {
            queue.push_back(successor)
        })?;
    }
    tracing::debug!(
        states = graph.num_states(),
        transitions = graph.num_transitions(),
        "combined {} resources",
        resources.len()
    );
    Ok(graph)
}
