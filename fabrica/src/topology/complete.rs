// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use super::{combine, IndexedAction, Topology, TupleState};
use crate::error::Result;
use crate::lts::{unknown_state, Lts};

/// A fully materialised product graph.
#[derive(Debug, Clone)]
pub struct CompleteTopology {
    initial: TupleState,
    graph: Lts<TupleState, IndexedAction>,
}

impl CompleteTopology {
    pub fn new(resources: &[Lts]) -> Result<Self> {
        let graph = combine(resources)?;
        let initial = graph
            .initial_state()
            .cloned()
            .ok_or_else(|| unknown_state(&"initial topology state"))?;
        Ok(CompleteTopology { initial, graph })
    }
}

impl Topology for CompleteTopology {
    fn initial_state(&self) -> &TupleState {
        &self.initial
    }

    fn transitions_from(&mut self, state: &TupleState) -> Result<Vec<(IndexedAction, TupleState)>> {
        let state = self.graph.state(state).ok_or_else(|| unknown_state(state))?;
        Ok(state.transitions().to_vec())
    }

    fn graph(&self) -> &Lts<TupleState, IndexedAction> {
        &self.graph
    }
}
