// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use std::path::PathBuf;
use thiserror::Error;

/// Failure modes of parsing, topology construction and controller synthesis.
/// Nothing is recovered locally; every variant propagates to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("[io] {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("[parse] {}:{line}: {msg}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        msg: String,
    },
    #[error("[operation] malformed label `{label}`")]
    BadLabel { label: String },
    #[error("[lts] unknown state `{id}`")]
    UnknownState { id: String },
    #[error("[topology] topology is out of date, rebuild it with complete() or incremental()")]
    TopologyInvalidated,
    #[error("[controller] recipe transition `{from}` -> `{to}` cannot be realised from topology state ({})", .state.join(","))]
    Unrealisable {
        from: String,
        to: String,
        state: Vec<String>,
    },
    #[error("[controller] synthesis was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}
