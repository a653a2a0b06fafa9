//! convert — smallest runnable example for the rust_odr importer.
//!
//! Reads an OpenDRIVE `.xodr` file, runs the full import pipeline, and
//! prints a summary of the resulting road graph.  Warnings collected during
//! the run are listed at the end.
//!
//! Usage: `convert <map.xodr>`

use anyhow::{bail, Result};

use odr_core::{CollectingObserver, IdentityProjection, ImportConfig, LaneTypeCatalog};
use odr_import::import_file;

fn main() -> Result<()> {
    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: convert <map.xodr>");
    };

    let catalog = LaneTypeCatalog::with_defaults();
    let cfg = ImportConfig::default();
    let mut obs = CollectingObserver::new();

    let out = import_file(&path, &catalog, &cfg, &IdentityProjection, &mut obs)?;

    println!("=== {path} ===");
    println!("nodes:           {}", out.nodes.len());
    println!("edges:           {}", out.edges.len());
    println!("connections:     {}", out.edges.connections().len());
    println!("traffic lights:  {}", out.traffic_lights.len());
    if let Some(proj) = &out.proj_string {
        println!("geo reference:   {proj}");
    }
    println!();

    println!("{:<20} {:>6} {:>10} {:<16} {:<16}", "edge", "lanes", "length", "from", "to");
    println!("{}", "-".repeat(72));
    for edge in out.edges.iter() {
        println!(
            "{:<20} {:>6} {:>10.1} {:<16} {:<16}",
            edge.id,
            edge.lane_count(),
            edge.geometry.length2d(),
            edge.from,
            edge.to,
        );
    }

    if !obs.warnings.is_empty() {
        println!();
        println!("{} warning(s):", obs.warnings.len());
        for w in &obs.warnings {
            println!("  {w}");
        }
    }
    for e in &obs.errors {
        eprintln!("error: {e}");
    }

    Ok(())
}
