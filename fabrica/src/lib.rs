// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

pub mod controller;
pub mod environment;
pub mod error;
pub mod lts;
pub mod operation;
pub mod recipe;
pub mod topology;

pub use error::{Error, Result};
