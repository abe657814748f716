// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::error::{Error, Result};
use crate::lts::Lts;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Renders a resource LTS back into the line-oriented text format.
/// States are sorted by key so the output is reproducible.
pub fn serialize_to_str(lts: &Lts) -> String {
    let mut out = String::new();
    if let Some(initial) = lts.initial_state() {
        writeln!(out, "{initial}").unwrap();
    }
    let mut keys: Vec<_> = lts.states().map(|(k, _)| k).collect();
    keys.sort();
    for key in keys {
        for (label, target) in lts[key].transitions() {
            writeln!(out, "{key},{label},{target}").unwrap();
        }
    }
    out
}

/// Writes the text form to `path`, creating parent directories on demand.
pub fn serialize(lts: &Lts, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(Error::io(path))?;
        }
    }
    std::fs::write(path, serialize_to_str(lts)).map_err(Error::io(path))
}

#[derive(Serialize)]
struct JsonResource<'a> {
    #[serde(rename = "initialState")]
    initial_state: &'a str,
    transitions: Vec<JsonTransition<'a>>,
}

#[derive(Serialize)]
struct JsonTransition<'a> {
    #[serde(rename = "startState")]
    start_state: &'a str,
    label: &'a str,
    #[serde(rename = "endState")]
    end_state: &'a str,
}

/// Renders a resource LTS into the JSON resource format, states sorted by
/// key. States without transitions only survive a round trip when they are
/// the initial state or the target of some transition.
pub fn serialize_to_json_str(lts: &Lts) -> String {
    let mut keys: Vec<_> = lts.states().map(|(k, _)| k).collect();
    keys.sort();
    let transitions = keys
        .iter()
        .flat_map(|&key| {
            lts[key]
                .transitions()
                .iter()
                .map(move |(label, target)| JsonTransition {
                    start_state: key,
                    label,
                    end_state: target,
                })
        })
        .collect();
    let resource = JsonResource {
        initial_state: lts.initial_state().map(String::as_str).unwrap_or(""),
        transitions,
    };
    serde_json::to_string_pretty(&resource).expect("resource serialisation cannot fail")
}

/// Writes the JSON form to `path`, creating parent directories on demand.
pub fn serialize_json(lts: &Lts, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(Error::io(path))?;
        }
    }
    std::fs::write(path, serialize_to_json_str(lts)).map_err(Error::io(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lts::parse_str;

    #[test]
    fn test_round_trip() {
        let input = "s0\ns0,a1,s1\ns1,a2,s2\n";
        let lts = parse_str(input).unwrap();
        let reparsed = parse_str(&serialize_to_str(&lts)).unwrap();
        assert_eq!(lts, reparsed);
    }

    #[test]
    fn test_serialized_form_is_sorted() {
        let mut lts = Lts::with_initial("s0".to_string());
        lts.add_transition("s1".into(), "b".into(), "s0".into(), true)
            .unwrap();
        lts.add_transition("s0".into(), "a".into(), "s1".into(), true)
            .unwrap();
        assert_eq!(serialize_to_str(&lts), "s0\ns0,a,s1\ns1,b,s0\n");
    }
}
