// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! # Recipe
//! An LTS over recipe state names whose transition labels are composite
//! operations, loaded from the JSON recipe format.

use crate::error::{Error, Result};
use crate::lts::Lts;
use crate::operation::{CompositeOperation, Guard, Handle, Observable};
use serde::{Deserialize, Deserializer};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipe {
    lts: Lts<String, CompositeOperation>,
}

impl Recipe {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(Error::io(path))?;
        Self::parse(&input, path)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        Self::parse(input, Path::new("<json>"))
    }

    fn parse(input: &str, path: &Path) -> Result<Self> {
        let raw: RawRecipe = serde_json::from_str(input).map_err(|err| Error::Parse {
            path: path.to_path_buf(),
            line: err.line(),
            msg: err.to_string(),
        })?;
        let mut lts = Lts::new();
        lts.set_initial_state(raw.initial_state, true);
        for t in raw.transitions {
            lts.add_transition(t.start_state, t.label.into_composite(), t.end_state, true)?;
        }
        Ok(Recipe { lts })
    }

    pub fn lts(&self) -> &Lts<String, CompositeOperation> {
        &self.lts
    }

    pub fn num_transitions(&self) -> usize {
        self.lts.num_transitions()
    }
}

#[derive(Debug, Deserialize)]
struct RawRecipe {
    #[serde(rename = "initialState")]
    initial_state: String,
    #[serde(default)]
    transitions: Vec<RawTransition>,
}

#[derive(Debug, Deserialize)]
struct RawTransition {
    #[serde(rename = "startState")]
    start_state: String,
    #[serde(rename = "endState")]
    end_state: String,
    label: RawLabel,
}

#[derive(Debug, Default, Deserialize)]
struct RawLabel {
    /// An empty guard object denotes "no guard".
    #[serde(default)]
    guard: RawGuard,
    #[serde(default)]
    sequential: Vec<RawObservable>,
    #[serde(default)]
    parallel: Vec<RawObservable>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGuard {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "handle_list")]
    input: Vec<Handle>,
}

#[derive(Debug, Deserialize)]
struct RawObservable {
    name: String,
    #[serde(default, deserialize_with = "handle_list")]
    input: Vec<Handle>,
    #[serde(default, deserialize_with = "handle_list")]
    output: Vec<Handle>,
}

impl RawLabel {
    fn into_composite(self) -> CompositeOperation {
        CompositeOperation {
            guard: self.guard.name.map(|name| Guard {
                name,
                input: self.guard.input,
            }),
            parallel: self.parallel.into_iter().map(RawObservable::into).collect(),
            sequential: self
                .sequential
                .into_iter()
                .map(RawObservable::into)
                .collect(),
        }
    }
}

impl From<RawObservable> for Observable {
    fn from(raw: RawObservable) -> Self {
        Observable {
            name: raw.name,
            input: raw.input,
            output: raw.output,
        }
    }
}

/// Accepts handles written as JSON numbers or as numeric strings.
fn handle_list<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<Handle>, D::Error> {
    use serde::de::Error as _;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(Handle),
        String(String),
    }

    let values = Vec::<NumberOrString>::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|v| match v {
            NumberOrString::Number(handle) => Ok(handle),
            NumberOrString::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid handle `{s}`"))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recipe_with_guard() {
        let input = r#"{
            "initialState": "r0",
            "transitions": [
                {
                    "startState": "r0", "endState": "r1",
                    "label": {
                        "guard": { "name": "check", "input": [1] },
                        "sequential": [ { "name": "weld", "input": ["2"], "output": [3] } ],
                        "parallel": [ { "name": "paint", "input": [], "output": [] } ]
                    }
                }
            ]
        }"#;
        let recipe = Recipe::from_json_str(input).unwrap();
        assert_eq!(recipe.lts().initial_state(), Some(&"r0".to_string()));
        let (co, end) = &recipe.lts()[&"r0".to_string()].transitions()[0];
        assert_eq!(end, "r1");
        assert_eq!(
            co.guard,
            Some(Guard {
                name: "check".to_string(),
                input: vec![1]
            })
        );
        assert_eq!(co.sequential[0].input, vec![2]);
        assert_eq!(co.sequential[0].output, vec![3]);
        assert_eq!(co.parallel[0].name, "paint");
    }

    #[test]
    fn test_empty_guard_object_means_no_guard() {
        let input = r#"{
            "initialState": "r0",
            "transitions": [
                {
                    "startState": "r0", "endState": "r1",
                    "label": { "guard": {}, "sequential": [], "parallel": [] }
                }
            ]
        }"#;
        let recipe = Recipe::from_json_str(input).unwrap();
        let (co, _) = &recipe.lts()[&"r0".to_string()].transitions()[0];
        assert_eq!(co.guard, None);
        assert!(co.sequential.is_empty() && co.parallel.is_empty());
    }

    #[test]
    fn test_bad_handle_is_a_parse_error() {
        let input = r#"{
            "initialState": "r0",
            "transitions": [
                {
                    "startState": "r0", "endState": "r1",
                    "label": { "sequential": [ { "name": "weld", "input": ["x"], "output": [] } ] }
                }
            ]
        }"#;
        assert!(matches!(
            Recipe::from_json_str(input),
            Err(Error::Parse { .. })
        ));
    }
}
