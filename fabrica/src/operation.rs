// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! # Operation Model
//! Classifies raw transition labels into operations and defines the composite
//! operation type carried by recipe transitions.

mod composite;

pub use composite::{CompositeOperation, Guard, Observable};

use crate::error::{Error, Result};
use std::fmt;

/// Identifies a data artefact moved between observables.
pub type Handle = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

/// A part moving in or out of a resource over its transfer interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transfer {
    pub direction: Direction,
    pub handle: Handle,
}

/// A classified transition label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    /// A named action of a resource, e.g. `weld`.
    Generic(String),
    /// `in:<handle>` or `out:<handle>`.
    Transfer(Transfer),
    /// The silent action `nop`.
    Nop,
}

impl Operation {
    /// Classify a raw text label.
    ///
    /// `in:`/`out:` prefixed labels must carry an integer handle, `nop` is the
    /// silent action and everything else is a generic named action.
    pub fn from_label(label: &str) -> Result<Self> {
        if let Some(suffix) = label.strip_prefix("in:") {
            let handle = parse_handle(label, suffix)?;
            Ok(Operation::Transfer(Transfer {
                direction: Direction::In,
                handle,
            }))
        } else if let Some(suffix) = label.strip_prefix("out:") {
            let handle = parse_handle(label, suffix)?;
            Ok(Operation::Transfer(Transfer {
                direction: Direction::Out,
                handle,
            }))
        } else if label == "nop" {
            Ok(Operation::Nop)
        } else {
            Ok(Operation::Generic(label.to_string()))
        }
    }

    pub fn is_silent(&self) -> bool {
        !matches!(self, Operation::Generic(_))
    }
}

fn parse_handle(label: &str, suffix: &str) -> Result<Handle> {
    suffix.trim().parse().map_err(|_| Error::BadLabel {
        label: label.to_string(),
    })
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Generic(name) => write!(f, "{name}"),
            Operation::Transfer(Transfer {
                direction: Direction::In,
                handle,
            }) => write!(f, "in:{handle}"),
            Operation::Transfer(Transfer {
                direction: Direction::Out,
                handle,
            }) => write!(f, "out:{handle}"),
            Operation::Nop => write!(f, "nop"),
        }
    }
}
