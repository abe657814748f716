// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! # Environment
//! The single long-lived container: owns the resources, the topology built
//! from them, the recipe and the synthesised controller.

use crate::controller::{Controller, SynthesisOptions};
use crate::error::{Error, Result};
use crate::lts::{self, Lts};
use crate::recipe::Recipe;
use crate::topology::{
    CompleteTopology, IncrementalTopology, IndexedAction, Topology, TupleState,
};
use std::path::Path;

#[derive(Default)]
pub struct Environment {
    resources: Vec<Lts>,
    topology: Option<Box<dyn Topology>>,
    recipe: Option<Recipe>,
    controller: Option<Lts<TupleState, IndexedAction>>,
    /// Bumped on every resource mutation; a topology built from an older
    /// generation is stale and must be rebuilt before it can be read.
    generation: u64,
    topology_generation: u64,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a resource file and appends it. An existing topology becomes
    /// stale and is recomputed by the next `complete()`/`incremental()` call.
    pub fn add_resource(&mut self, path: impl AsRef<Path>, is_json: bool) -> Result<()> {
        let path = path.as_ref();
        let resource = if is_json {
            lts::parse_json_file(path)?
        } else {
            lts::parse_file(path)?
        };
        tracing::info!(
            path = %path.display(),
            states = resource.num_states(),
            transitions = resource.num_transitions(),
            "loaded resource"
        );
        self.add_resource_lts(resource);
        Ok(())
    }

    pub fn add_resource_lts(&mut self, resource: Lts) {
        self.resources.push(resource);
        self.generation += 1;
    }

    pub fn resources(&self) -> &[Lts] {
        &self.resources
    }

    pub fn num_resources(&self) -> usize {
        self.resources.len()
    }

    /// Builds the fully materialised topology.
    pub fn complete(&mut self) -> Result<()> {
        self.topology = Some(Box::new(CompleteTopology::new(&self.resources)?));
        self.topology_generation = self.generation;
        Ok(())
    }

    /// Builds the lazily materialised topology.
    pub fn incremental(&mut self) -> Result<()> {
        self.topology = Some(Box::new(IncrementalTopology::new(&self.resources)?));
        self.topology_generation = self.generation;
        Ok(())
    }

    /// The materialised part of the current topology graph.
    pub fn topology_graph(&self) -> Result<&Lts<TupleState, IndexedAction>> {
        match &self.topology {
            Some(topology) if self.topology_generation == self.generation => Ok(topology.graph()),
            _ => Err(Error::TopologyInvalidated),
        }
    }

    pub fn num_topology_states(&self) -> usize {
        self.topology
            .as_ref()
            .map_or(0, |topology| topology.graph().num_states())
    }

    pub fn set_recipe(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let recipe = Recipe::from_file(path)?;
        tracing::info!(transitions = recipe.num_transitions(), "loaded recipe");
        self.recipe = Some(recipe);
        Ok(())
    }

    pub fn recipe(&self) -> Option<&Recipe> {
        self.recipe.as_ref()
    }

    pub fn controller(&self) -> Option<&Lts<TupleState, IndexedAction>> {
        self.controller.as_ref()
    }

    /// Runs controller synthesis against the current topology and recipe.
    /// Without a recipe the controller is trivial: just the initial state.
    pub fn synthesise(
        &mut self,
        opts: SynthesisOptions,
    ) -> Result<&Lts<TupleState, IndexedAction>> {
        if self.topology_generation != self.generation {
            return Err(Error::TopologyInvalidated);
        }
        let Some(topology) = self.topology.as_deref_mut() else {
            return Err(Error::TopologyInvalidated);
        };
        let empty = Recipe::default();
        let recipe = self.recipe.as_ref().unwrap_or(&empty);
        let controller = Controller::with_options(topology, recipe, opts).generate()?;
        tracing::info!(
            states = controller.num_states(),
            transitions = controller.num_transitions(),
            "synthesised controller"
        );
        Ok(self.controller.insert(controller))
    }
}
