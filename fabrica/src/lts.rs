// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! # Labelled Transition System
//! A directed multigraph of states and labelled transitions with a
//! distinguished initial state. Generic over the state key (`String` for
//! resources and recipes, `Vec<String>` for topologies and controllers), the
//! transition label and the hasher.

pub mod graphviz;
mod parse;
mod serialize;

pub use parse::{parse_file, parse_json_file, parse_json_str, parse_str};
pub use serialize::{serialize, serialize_json, serialize_to_json_str, serialize_to_str};

use crate::error::{Error, Result};
use rustc_hash::FxBuildHasher;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::{BuildHasher, Hash};
use std::ops::Index;

/// A state and its outgoing transitions, in insertion order.
#[derive(Debug, Clone)]
pub struct State<K, T> {
    transitions: Vec<(T, K)>,
}

impl<K, T> Default for State<K, T> {
    fn default() -> Self {
        State {
            transitions: Vec::new(),
        }
    }
}

impl<K, T> State<K, T> {
    pub fn transitions(&self) -> &[(T, K)] {
        &self.transitions
    }

    pub fn add_transition(&mut self, label: T, target: K) {
        self.transitions.push((label, target));
    }
}

impl<K: PartialEq, T: PartialEq> State<K, T> {
    pub fn has_transition(&self, label: &T, target: &K) -> bool {
        self.transitions
            .iter()
            .any(|(l, k)| l == label && k == target)
    }
}

impl<K: PartialEq, T: PartialEq> PartialEq for State<K, T> {
    /// Transition order is irrelevant, multiplicity is not.
    fn eq(&self, other: &Self) -> bool {
        if self.transitions.len() != other.transitions.len() {
            return false;
        }
        let mut used = vec![false; other.transitions.len()];
        'outer: for edge in &self.transitions {
            for (i, other_edge) in other.transitions.iter().enumerate() {
                if !used[i] && edge == other_edge {
                    used[i] = true;
                    continue 'outer;
                }
            }
            return false;
        }
        true
    }
}

impl<K: Eq, T: Eq> Eq for State<K, T> {}

#[derive(Clone)]
pub struct Lts<K = String, T = String, S = FxBuildHasher> {
    states: HashMap<K, State<K, T>, S>,
    initial: Option<K>,
}

impl<K: Debug, T: Debug, S> Debug for Lts<K, T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lts")
            .field("states", &self.states)
            .field("initial", &self.initial)
            .finish()
    }
}

impl<K, T, S: Default> Default for Lts<K, T, S> {
    fn default() -> Self {
        Lts {
            states: HashMap::default(),
            initial: None,
        }
    }
}

impl<K, T, S> Lts<K, T, S>
where
    K: Eq + Hash + Clone + Debug,
    S: BuildHasher + Default,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(initial: K) -> Self {
        let mut lts = Self::default();
        lts.set_initial_state(initial, true);
        lts
    }

    pub fn initial_state(&self) -> Option<&K> {
        self.initial.as_ref()
    }

    /// Sets the initial state, creating it when `create_if_missing` holds.
    /// A formal LTS does not require its initial state to exist; with
    /// `create_if_missing == false` the caller is responsible for adding it.
    pub fn set_initial_state(&mut self, state: K, create_if_missing: bool) {
        if create_if_missing && !self.has_state(&state) {
            self.states.insert(state.clone(), State::default());
        }
        self.initial = Some(state);
    }

    pub fn has_state(&self, key: &K) -> bool {
        self.states.contains_key(key)
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_transitions(&self) -> usize {
        self.states.values().map(|s| s.transitions.len()).sum()
    }

    pub fn state(&self, key: &K) -> Option<&State<K, T>> {
        self.states.get(key)
    }

    /// Iteration order is unspecified; use sites that need determinism sort.
    pub fn states(&self) -> impl Iterator<Item = (&K, &State<K, T>)> {
        self.states.iter()
    }

    /// Inserts an empty state. Returns whether the key was new.
    /// `add_transition` is the preferred way to create states.
    pub fn add_state(&mut self, key: K) -> bool {
        if self.has_state(&key) {
            return false;
        }
        self.states.insert(key, State::default());
        true
    }

    /// Appends a transition, creating missing endpoint states when
    /// `create_missing_states` holds. Multi-edges are permitted.
    pub fn add_transition(
        &mut self,
        start: K,
        label: T,
        end: K,
        create_missing_states: bool,
    ) -> Result<()> {
        if !self.has_state(&start) {
            if !create_missing_states {
                return Err(unknown_state(&start));
            }
            self.add_state(start.clone());
        }
        if !self.has_state(&end) {
            if !create_missing_states {
                return Err(unknown_state(&end));
            }
            self.add_state(end.clone());
        }
        self.states
            .get_mut(&start)
            .ok_or_else(|| unknown_state(&start))?
            .add_transition(label, end);
        Ok(())
    }

    /// Removes a state but leaves transitions from other states dangling.
    pub fn erase_shallow(&mut self, key: &K) -> bool {
        self.states.remove(key).is_some()
    }

    /// Removes a state and every transition targeting it. O(V + E).
    pub fn erase_deep(&mut self, key: &K) -> bool {
        if self.states.remove(key).is_none() {
            return false;
        }
        for state in self.states.values_mut() {
            state.transitions.retain(|(_, target)| target != key);
        }
        true
    }
}

pub(crate) fn unknown_state<K: Debug>(key: &K) -> Error {
    Error::UnknownState {
        id: format!("{key:?}"),
    }
}

impl<K, T, S> PartialEq for Lts<K, T, S>
where
    K: Eq + Hash,
    T: PartialEq,
    S: BuildHasher,
{
    /// Two LTSs are equal iff their initial states agree and their
    /// state-to-transitions maps hold the same sets of edges.
    fn eq(&self, other: &Self) -> bool {
        self.initial == other.initial
            && self.states.len() == other.states.len()
            && self
                .states
                .iter()
                .all(|(key, state)| other.states.get(key) == Some(state))
    }
}

impl<K: Eq + Hash, T: Eq, S: BuildHasher> Eq for Lts<K, T, S> {}

impl<K, T, S> Index<&K> for Lts<K, T, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Output = State<K, T>;

    fn index(&self, key: &K) -> &Self::Output {
        &self.states[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Lts {
        let mut lts = Lts::with_initial("s0".to_string());
        lts.add_transition("s0".into(), "a1".into(), "s1".into(), true)
            .unwrap();
        lts.add_transition("s1".into(), "a2".into(), "s2".into(), true)
            .unwrap();
        lts
    }

    #[test]
    fn test_add_transition_creates_states() {
        let lts = abc();
        assert_eq!(lts.num_states(), 3);
        assert_eq!(lts.num_transitions(), 2);
        assert!(lts.has_state(&"s2".to_string()));
        assert_eq!(lts.initial_state(), Some(&"s0".to_string()));
    }

    #[test]
    fn test_add_transition_strict_mode() {
        let mut lts: Lts = Lts::with_initial("s0".to_string());
        let err = lts
            .add_transition("s0".into(), "a".into(), "s1".into(), false)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownState { .. }));
        // nothing was inserted by the failed call
        assert_eq!(lts.num_states(), 1);
        assert_eq!(lts.num_transitions(), 0);
    }

    #[test]
    fn test_multi_edges_are_preserved() {
        let mut lts: Lts = Lts::with_initial("s0".to_string());
        lts.add_transition("s0".into(), "a".into(), "s1".into(), true)
            .unwrap();
        lts.add_transition("s0".into(), "a".into(), "s1".into(), true)
            .unwrap();
        assert_eq!(lts.num_transitions(), 2);
    }

    #[test]
    fn test_erase_shallow_leaves_dangling_edges() {
        let mut lts = abc();
        assert!(lts.erase_shallow(&"s1".to_string()));
        assert!(!lts.has_state(&"s1".to_string()));
        // s0 -> s1 dangles
        assert!(lts[&"s0".to_string()].has_transition(&"a1".to_string(), &"s1".to_string()));
    }

    #[test]
    fn test_erase_deep_removes_incoming_edges() {
        let mut lts = abc();
        assert!(lts.erase_deep(&"s1".to_string()));
        assert!(!lts.has_state(&"s1".to_string()));
        for (_, state) in lts.states() {
            assert!(state.transitions().iter().all(|(_, t)| t != "s1"));
        }
        assert_eq!(lts.num_transitions(), 0);
        assert!(!lts.erase_deep(&"s1".to_string()));
    }

    #[test]
    fn test_equality_ignores_transition_order() {
        let mut a: Lts = Lts::with_initial("s0".to_string());
        a.add_transition("s0".into(), "x".into(), "s1".into(), true)
            .unwrap();
        a.add_transition("s0".into(), "y".into(), "s2".into(), true)
            .unwrap();

        let mut b: Lts = Lts::with_initial("s0".to_string());
        b.add_transition("s0".into(), "y".into(), "s2".into(), true)
            .unwrap();
        b.add_transition("s0".into(), "x".into(), "s1".into(), true)
            .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_respects_initial_state() {
        let mut a: Lts = Lts::with_initial("s0".to_string());
        a.add_state("s1".to_string());
        let mut b: Lts = Lts::with_initial("s1".to_string());
        b.add_state("s0".to_string());
        assert_ne!(a, b);
    }
}
