// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! # Controller Synthesis
//! For every recipe transition, finds a topology trace whose actions realise
//! the composite operation (guard, parallel multiset, sequential order,
//! handle data-flow) and stitches the traces into a controller LTS.

use crate::error::{Error, Result};
use crate::lts::Lts;
use crate::operation::{CompositeOperation, Direction, Handle, Observable, Operation};
use crate::recipe::Recipe;
use crate::topology::{IndexedAction, Topology, TupleState};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Depth slack per resource on top of the number of required observables.
const DEPTH_FACTOR: usize = 2;

/// Cooperative cancellation flag, checked at every search-node expansion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How a topology transition contributes to the composite operation under
/// realisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Matches the next required sequential observable.
    Sequential,
    /// Matches a still-unmet parallel observable.
    Parallel { index: usize },
    /// A `nop` or coherent transfer step.
    Padding,
}

/// Orders candidate steps during the search; lower ranks are explored first.
/// Candidates of equal rank keep topology enumeration order.
pub trait SearchPolicy {
    fn rank(&self, kind: &StepKind) -> u8;
}

/// The default policy: advance the sequential index, then reduce the
/// parallel multiset, then pad.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySequentialFirst;

impl SearchPolicy for GreedySequentialFirst {
    fn rank(&self, kind: &StepKind) -> u8 {
        match kind {
            StepKind::Sequential => 0,
            StepKind::Parallel { .. } => 1,
            StepKind::Padding => 2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SynthesisOptions {
    /// Per-edge depth bound; defaults to
    /// `|sequential| + |parallel| + 2 * n_resources`.
    pub max_depth: Option<usize>,
    pub cancel: Option<CancelToken>,
}

/// Available handle counts. Ordered so it can key the visited set.
type HandleMap = BTreeMap<Handle, u32>;

type Trace = Vec<(TupleState, IndexedAction, TupleState)>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SearchNode {
    state: TupleState,
    seq_idx: usize,
    parallel_met: Vec<bool>,
    handles: HandleMap,
}

impl SearchNode {
    fn is_complete(&self) -> bool {
        self.parallel_met.iter().all(|&met| met)
    }
}

pub struct Controller<'a, T: Topology + ?Sized, P: SearchPolicy = GreedySequentialFirst> {
    topology: &'a mut T,
    recipe: &'a Recipe,
    policy: P,
    opts: SynthesisOptions,
}

impl<'a, T: Topology + ?Sized> Controller<'a, T> {
    pub fn new(topology: &'a mut T, recipe: &'a Recipe) -> Self {
        Self::with_options(topology, recipe, SynthesisOptions::default())
    }

    pub fn with_options(topology: &'a mut T, recipe: &'a Recipe, opts: SynthesisOptions) -> Self {
        Controller {
            topology,
            recipe,
            policy: GreedySequentialFirst,
            opts,
        }
    }
}

impl<'a, T: Topology + ?Sized, P: SearchPolicy> Controller<'a, T, P> {
    pub fn with_policy<Q: SearchPolicy>(self, policy: Q) -> Controller<'a, T, Q> {
        Controller {
            topology: self.topology,
            recipe: self.recipe,
            policy,
            opts: self.opts,
        }
    }

    /// Runs the synthesis. Returns the controller LTS, or the first recipe
    /// transition that cannot be realised.
    pub fn generate(mut self) -> Result<Lts<TupleState, IndexedAction>> {
        let initial = self.topology.initial_state().clone();
        let mut controller = Lts::with_initial(initial.clone());

        let recipe = self.recipe.lts();
        let Some(recipe_initial) = recipe.initial_state().cloned() else {
            return Ok(controller);
        };

        // Breadth-first over the recipe. Each recipe state is remembered with
        // the topology state and handle map produced by realising its first
        // incoming edge.
        let mut snapshots: FxHashMap<String, (TupleState, HandleMap)> = FxHashMap::default();
        snapshots.insert(recipe_initial.clone(), (initial, HandleMap::new()));
        let mut queue = VecDeque::from([recipe_initial]);

        while let Some(recipe_state) = queue.pop_front() {
            let Some(state) = recipe.state(&recipe_state) else {
                continue;
            };
            let (topo_state, handles) = snapshots[&recipe_state].clone();
            for (co, recipe_target) in state.transitions() {
                let (trace, end_state, end_handles) =
                    self.realise_edge(co, topo_state.clone(), handles.clone(), &recipe_state, recipe_target)?;
                tracing::debug!(
                    from = %recipe_state,
                    to = %recipe_target,
                    steps = trace.len(),
                    "realised recipe transition {co}"
                );
                for (src, action, dst) in trace {
                    if !controller
                        .state(&src)
                        .is_some_and(|s| s.has_transition(&action, &dst))
                    {
                        controller.add_transition(src, action, dst, true)?;
                    }
                }
                if !snapshots.contains_key(recipe_target) {
                    snapshots.insert(recipe_target.clone(), (end_state, end_handles));
                    queue.push_back(recipe_target.clone());
                }
            }
        }
        Ok(controller)
    }

    /// Realises one recipe edge: the guard first, on its own, then the
    /// composite operation from wherever the guard trace ends.
    fn realise_edge(
        &mut self,
        co: &CompositeOperation,
        from: TupleState,
        handles: HandleMap,
        recipe_from: &str,
        recipe_to: &str,
    ) -> Result<(Trace, TupleState, HandleMap)> {
        let unrealisable = |state: &TupleState| Error::Unrealisable {
            from: recipe_from.to_string(),
            to: recipe_to.to_string(),
            state: state.clone(),
        };

        let mut trace = Trace::new();
        let mut current = from;
        let mut handles = handles;

        if let Some(guard) = &co.guard {
            let check = CompositeOperation {
                guard: None,
                parallel: Vec::new(),
                sequential: vec![Observable {
                    name: guard.name.clone(),
                    input: guard.input.clone(),
                    output: Vec::new(),
                }],
            };
            let Some((guard_trace, end, end_handles)) =
                self.search(&check, current.clone(), handles)?
            else {
                return Err(unrealisable(&current));
            };
            trace.extend(guard_trace);
            current = end;
            handles = end_handles;
        }

        let Some((op_trace, end, end_handles)) = self.search(co, current.clone(), handles)? else {
            return Err(unrealisable(&current));
        };
        trace.extend(op_trace);
        Ok((trace, end, end_handles))
    }

    fn max_depth(&self, co: &CompositeOperation) -> usize {
        self.opts.max_depth.unwrap_or_else(|| {
            co.sequential.len()
                + co.parallel.len()
                + DEPTH_FACTOR * self.topology.initial_state().len()
        })
    }

    /// Depth-first search for a trace matching `co` (ignoring its guard).
    fn search(
        &mut self,
        co: &CompositeOperation,
        from: TupleState,
        handles: HandleMap,
    ) -> Result<Option<(Trace, TupleState, HandleMap)>> {
        let root = SearchNode {
            state: from,
            seq_idx: 0,
            parallel_met: vec![false; co.parallel.len()],
            handles,
        };
        let mut visited = FxHashSet::default();
        let mut trace = Trace::new();
        let max_depth = self.max_depth(co);
        let end = self.dfs(co, root, max_depth, &mut visited, &mut trace)?;
        Ok(end.map(|(state, handles)| (trace, state, handles)))
    }

    fn dfs(
        &mut self,
        co: &CompositeOperation,
        node: SearchNode,
        depth_left: usize,
        visited: &mut FxHashSet<SearchNode>,
        trace: &mut Trace,
    ) -> Result<Option<(TupleState, HandleMap)>> {
        if self
            .opts
            .cancel
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
        {
            return Err(Error::Cancelled);
        }
        if node.seq_idx == co.sequential.len() && node.is_complete() {
            return Ok(Some((node.state, node.handles)));
        }
        if depth_left == 0 {
            return Ok(None);
        }
        if !visited.insert(node.clone()) {
            return Ok(None);
        }

        let edges = self.topology.transitions_from(&node.state)?;
        let mut candidates: Vec<(u8, usize, StepKind)> = Vec::with_capacity(edges.len());
        for (edge_idx, (action, _)) in edges.iter().enumerate() {
            if let Some(kind) = classify(co, &node, &action.action) {
                candidates.push((self.policy.rank(&kind), edge_idx, kind));
            }
        }
        candidates.sort_by_key(|&(rank, edge_idx, _)| (rank, edge_idx));

        for (_, edge_idx, kind) in candidates {
            let (action, target) = &edges[edge_idx];
            let successor = apply(co, &node, kind, &action.action, target.clone());
            trace.push((node.state.clone(), action.clone(), target.clone()));
            if let Some(end) = self.dfs(co, successor, depth_left - 1, visited, trace)? {
                return Ok(Some(end));
            }
            trace.pop();
        }

        visited.remove(&node);
        Ok(None)
    }
}

fn inputs_available(handles: &HandleMap, input: &[Handle]) -> bool {
    let mut needed: BTreeMap<Handle, u32> = BTreeMap::new();
    for &handle in input {
        *needed.entry(handle).or_default() += 1;
    }
    needed
        .iter()
        .all(|(handle, count)| handles.get(handle).copied().unwrap_or(0) >= *count)
}

/// Decides how `action` can contribute at `node`, preferring a sequential
/// match over a parallel one over padding; `None` means the transition is not
/// usable here.
fn classify(co: &CompositeOperation, node: &SearchNode, action: &str) -> Option<StepKind> {
    if let Some(next) = co.sequential.get(node.seq_idx) {
        if next.name == action && inputs_available(&node.handles, &next.input) {
            return Some(StepKind::Sequential);
        }
    }
    for (index, observable) in co.parallel.iter().enumerate() {
        if !node.parallel_met[index]
            && observable.name == action
            && inputs_available(&node.handles, &observable.input)
        {
            return Some(StepKind::Parallel { index });
        }
    }
    match Operation::from_label(action) {
        Ok(Operation::Nop) => Some(StepKind::Padding),
        Ok(Operation::Transfer(transfer)) => match transfer.direction {
            Direction::Out => Some(StepKind::Padding),
            // a part can only move into a resource once it exists; the
            // observable that declared it as input remains its consumer
            Direction::In => {
                (node.handles.get(&transfer.handle).copied().unwrap_or(0) > 0)
                    .then_some(StepKind::Padding)
            }
        },
        _ => None,
    }
}

fn apply(
    co: &CompositeOperation,
    node: &SearchNode,
    kind: StepKind,
    action: &str,
    target: TupleState,
) -> SearchNode {
    let mut successor = SearchNode {
        state: target,
        seq_idx: node.seq_idx,
        parallel_met: node.parallel_met.clone(),
        handles: node.handles.clone(),
    };
    match kind {
        StepKind::Sequential => {
            let observable = &co.sequential[node.seq_idx];
            consume(&mut successor.handles, &observable.input);
            credit(&mut successor.handles, &observable.output);
            successor.seq_idx += 1;
        }
        StepKind::Parallel { index } => {
            let observable = &co.parallel[index];
            consume(&mut successor.handles, &observable.input);
            credit(&mut successor.handles, &observable.output);
            successor.parallel_met[index] = true;
        }
        StepKind::Padding => {
            // an outbound transfer makes its handle available; `nop` and
            // inbound transfers leave the handle map untouched
            if let Ok(Operation::Transfer(transfer)) = Operation::from_label(action) {
                if transfer.direction == Direction::Out {
                    credit(&mut successor.handles, &[transfer.handle]);
                }
            }
        }
    }
    successor
}

fn consume(handles: &mut HandleMap, input: &[Handle]) {
    for handle in input {
        if let Some(count) = handles.get_mut(handle) {
            *count -= 1;
            if *count == 0 {
                handles.remove(handle);
            }
        }
    }
}

fn credit(handles: &mut HandleMap, output: &[Handle]) {
    for &handle in output {
        *handles.entry(handle).or_default() += 1;
    }
}
