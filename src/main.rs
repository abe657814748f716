// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use anyhow::Context;
use clap::Parser;
use fabrica::controller::SynthesisOptions;
use fabrica::environment::Environment;
use fabrica::lts::graphviz;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
struct RunnerOpts {
    /// Folder containing `Resource<N>.txt` / `Resource<N>.json` files and a
    /// `recipe.json`
    #[arg(short, long, required = true)]
    data: PathBuf,

    /// Materialise the topology lazily during synthesis instead of up front
    #[arg(long)]
    incremental: bool,

    /// Render the DOT exports to PNG via the `dot` executable
    #[arg(long)]
    images: bool,

    /// Export only the controller-highlighted topology, not the plain one
    #[arg(long)]
    only_highlighted: bool,

    /// Output folder for exports
    #[arg(long, default_value = "exports")]
    out: PathBuf,
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    let opts = RunnerOpts::parse();
    if let Err(err) = run(&opts) {
        eprintln!("{err:?}");
        std::process::exit(exit_code(&err));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    use fabrica::Error;
    match err.downcast_ref::<Error>() {
        Some(Error::Parse { .. } | Error::BadLabel { .. }) => 2,
        Some(Error::Unrealisable { .. }) => 3,
        Some(Error::Cancelled) => 4,
        _ => 1,
    }
}

fn run(opts: &RunnerOpts) -> anyhow::Result<()> {
    let mut machine = Environment::new();
    for (path, is_json) in resource_files(&opts.data)? {
        machine.add_resource(&path, is_json)?;
    }
    machine
        .set_recipe(opts.data.join("recipe.json"))
        .context("unable to load recipe")?;

    if opts.incremental {
        machine.incremental()?;
    } else {
        machine.complete()?;
    }
    machine.synthesise(SynthesisOptions::default())?;

    export(&machine, opts)?;
    tracing::info!(
        resources = machine.num_resources(),
        topology_states = machine.num_topology_states(),
        "done"
    );
    Ok(())
}

/// `Resource1`, `Resource2`, ... in index order, each either `.txt` or
/// `.json`, stopping at the first index with neither.
fn resource_files(data: &Path) -> anyhow::Result<Vec<(PathBuf, bool)>> {
    let mut found = Vec::new();
    for i in 1.. {
        let txt = data.join(format!("Resource{i}.txt"));
        let json = data.join(format!("Resource{i}.json"));
        if txt.is_file() {
            found.push((txt, false));
        } else if json.is_file() {
            found.push((json, true));
        } else {
            break;
        }
    }
    if found.is_empty() {
        anyhow::bail!("no Resource<N>.txt or Resource<N>.json files in {}", data.display());
    }
    Ok(found)
}

fn export(machine: &Environment, opts: &RunnerOpts) -> anyhow::Result<()> {
    std::fs::create_dir_all(&opts.out)
        .with_context(|| format!("unable to create {}", opts.out.display()))?;

    let topology = machine.topology_graph()?;
    let controller = machine.controller();

    let mut exports: Vec<(String, String)> = Vec::new();
    if !opts.only_highlighted {
        exports.push((
            "topology".to_string(),
            graphviz::tuple_dot(topology, controller, false),
        ));
        for (i, resource) in machine.resources().iter().enumerate() {
            exports.push((format!("resource{}", i + 1), graphviz::resource_dot(resource)));
        }
    }
    exports.push((
        "controller".to_string(),
        graphviz::tuple_dot(topology, controller, true),
    ));

    for (name, dot) in &exports {
        let dot_path = opts.out.join(format!("{name}.dot"));
        std::fs::write(&dot_path, dot)
            .with_context(|| format!("unable to write {}", dot_path.display()))?;
        if opts.images {
            graphviz::render(dot, opts.out.join(format!("{name}.png")), "png")?;
        }
    }
    Ok(())
}
