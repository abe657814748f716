// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::error::{Error, Result};
use crate::lts::Lts;
use serde::Deserialize;
use std::path::Path;

/// Parses the line-oriented resource format.
///
/// The first non-blank line names the initial state, every following
/// non-blank line is a `start , label , end` row. Blank lines and lines
/// starting with `#` are ignored. Duplicate rows are preserved.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Lts> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path).map_err(Error::io(path))?;
    parse_str_impl(&input, path)
}

pub fn parse_str(input: &str) -> Result<Lts> {
    parse_str_impl(input, Path::new("<string>"))
}

fn parse_str_impl(input: &str, path: &Path) -> Result<Lts> {
    let mut lts = Lts::new();
    let mut saw_initial = false;
    for (line_no, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !saw_initial {
            lts.set_initial_state(line.to_string(), true);
            saw_initial = true;
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        match fields.as_slice() {
            [start, label, end] if !start.is_empty() && !label.is_empty() && !end.is_empty() => {
                lts.add_transition(start.to_string(), label.to_string(), end.to_string(), true)?;
            }
            _ => {
                return Err(Error::Parse {
                    path: path.to_path_buf(),
                    line: line_no + 1,
                    msg: format!("expected `start , label , end`, got `{line}`"),
                });
            }
        }
    }
    Ok(lts)
}

#[derive(Debug, Deserialize)]
struct RawResource {
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
    label: String,
}

/// Parses the JSON resource format: the recipe schema with atomic string
/// labels in place of composite-operation objects.
pub fn parse_json_file(path: impl AsRef<Path>) -> Result<Lts> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path).map_err(Error::io(path))?;
    parse_json_impl(&input, path)
}

pub fn parse_json_str(input: &str) -> Result<Lts> {
    parse_json_impl(input, Path::new("<json>"))
}

fn parse_json_impl(input: &str, path: &Path) -> Result<Lts> {
    let raw: RawResource = serde_json::from_str(input).map_err(|err| Error::Parse {
        path: path.to_path_buf(),
        line: err.line(),
        msg: err.to_string(),
    })?;
    let mut lts = Lts::new();
    lts.set_initial_state(raw.initial_state, true);
    for t in raw.transitions {
        lts.add_transition(t.start_state, t.label, t.end_state, true)?;
    }
    Ok(lts)
}
