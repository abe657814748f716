// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use super::{expand_tuple, initial_tuple, IndexedAction, Topology, TupleState};
use crate::error::Result;
use crate::lts::{unknown_state, Lts};
use rustc_hash::FxHashSet;

/// A lazily materialised product graph.
///
/// Successor states are registered when one of their predecessors is
/// expanded; their own out-edges only exist once `expand` has been called on
/// them. States the controller search never visits stay unexpanded.
#[derive(Debug, Clone)]
pub struct IncrementalTopology {
    resources: Vec<Lts>,
    initial: TupleState,
    graph: Lts<TupleState, IndexedAction>,
    expanded: FxHashSet<TupleState>,
}

impl IncrementalTopology {
    pub fn new(resources: &[Lts]) -> Result<Self> {
        let initial = initial_tuple(resources)?;
        let graph = Lts::with_initial(initial.clone());
        Ok(IncrementalTopology {
            resources: resources.to_vec(),
            initial,
            graph,
            expanded: FxHashSet::default(),
        })
    }

    /// Materialises the out-edges of `state`. Idempotent.
    pub fn expand(&mut self, state: &TupleState) -> Result<()> {
        if self.expanded.contains(state) {
            return Ok(());
        }
        if !self.graph.has_state(state) {
            return Err(unknown_state(state));
        }
        expand_tuple(&self.resources, &mut self.graph, state, |_| {})?;
        self.expanded.insert(state.clone());
        Ok(())
    }

    pub fn is_expanded(&self, state: &TupleState) -> bool {
        self.expanded.contains(state)
    }

    pub fn num_expanded(&self) -> usize {
        self.expanded.len()
    }
}

impl Topology for IncrementalTopology {
    fn initial_state(&self) -> &TupleState {
        &self.initial
    }

    fn transitions_from(&mut self, state: &TupleState) -> Result<Vec<(IndexedAction, TupleState)>> {
        self.expand(state)?;
        let state = self.graph.state(state).ok_or_else(|| unknown_state(state))?;
        Ok(state.transitions().to_vec())
    }

    fn graph(&self) -> &Lts<TupleState, IndexedAction> {
        &self.graph
    }
}
