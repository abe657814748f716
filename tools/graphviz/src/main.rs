// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use anyhow::Context;
use clap::Parser;
use fabrica::lts::{self, graphviz};

#[derive(Parser, Debug)]
struct GraphvizArgs {
    /// Path to a resource LTS file
    #[arg(short, long, required = true)]
    file: String,

    /// Parse the file as JSON instead of the line-oriented text format
    #[arg(long)]
    json: bool,

    /// Write a PNG next to printing the DOT source (requires `dot`)
    #[arg(short, long)]
    output: Option<String>,
}

fn main() {
    if let Err(err) = graphviz() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn graphviz() -> anyhow::Result<()> {
    let args = GraphvizArgs::parse();
    let resource = if args.json {
        lts::parse_json_file(&args.file)
    } else {
        lts::parse_file(&args.file)
    }
    .context("unable to parse input resource file")?;

    let dot = graphviz::resource_dot(&resource);
    println!("{dot}");
    if let Some(output) = args.output {
        graphviz::render(&dot, &output, "png")?;
    }
    Ok(())
}
