#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the gridwise systems against ASCII boards.

mod config;
mod map_file;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gridwise_core::{BoardSize, Location};
use gridwise_system_clusters::ClusterMap;
use gridwise_system_motion::{MotionPlanner, MotionTuning};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{config::Config, map_file::BoardLayers};

#[derive(Debug, Parser)]
#[command(name = "gridwise", about = "Plans paths and clusters resources on ASCII boards")]
struct Cli {
    /// TOML file overriding the default tuning.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Finds the hop-nearest resource cell and prints the movement steps.
    Plan {
        /// ASCII board to load.
        #[arg(long)]
        map: PathBuf,
        /// Starting cell written as `x,y`.
        #[arg(long, value_parser = parse_cell)]
        from: CellArg,
        /// Largest magnitude of a single search hop.
        #[arg(long)]
        max_speed: Option<u32>,
        /// Largest magnitude of a compressed movement step.
        #[arg(long)]
        preferred_speed: Option<u32>,
    },
    /// Partitions resource cells into clusters and prints their centroids.
    Clusters {
        /// ASCII board to load.
        #[arg(long)]
        map: PathBuf,
        /// Cell used to break centroid ties, written as `x,y`.
        #[arg(long, value_parser = parse_cell)]
        reference: Option<CellArg>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CellArg {
    x: i32,
    y: i32,
}

impl CellArg {
    fn locate(self, size: BoardSize) -> Result<Location> {
        if !size.contains(self.x, self.y) {
            bail!(
                "cell ({}, {}) lies outside the {side}x{side} board",
                self.x,
                self.y,
                side = size.side()
            );
        }
        Ok(size.pack(self.x, self.y))
    }
}

fn parse_cell(value: &str) -> Result<CellArg, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{value}`"))?;
    let x = x.trim().parse().map_err(|_| format!("invalid column `{x}`"))?;
    let y = y.trim().parse().map_err(|_| format!("invalid row `{y}`"))?;
    Ok(CellArg { x, y })
}

/// Entry point for the gridwise command-line interface.
fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        CliCommand::Plan {
            map,
            from,
            max_speed,
            preferred_speed,
        } => {
            let tuning = MotionTuning {
                max_speed: max_speed.unwrap_or(config.motion.max_speed),
                preferred_speed: preferred_speed.unwrap_or(config.motion.preferred_speed),
            };
            run_plan(&load_board(&map)?, from, tuning)
        }
        CliCommand::Clusters { map, reference } => {
            let layers = load_board(&map)?;
            run_clusters(&layers, reference, &config)
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,gridwise=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn load_board(path: &PathBuf) -> Result<BoardLayers> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read map {}", path.display()))?;
    let layers =
        BoardLayers::parse(&text).with_context(|| format!("invalid map {}", path.display()))?;
    info!(side = layers.size().side(), map = %path.display(), "board loaded");
    Ok(layers)
}

fn run_plan(layers: &BoardLayers, from: CellArg, tuning: MotionTuning) -> Result<()> {
    let view = layers.view()?;
    let size = view.size();
    let source = from.locate(size)?;

    let mut planner = MotionPlanner::new(size);
    planner.solve(
        source,
        tuning.max_speed,
        tuning.preferred_speed,
        |cell| view.has_resource(cell),
        |cell| view.is_passable(cell),
    );

    let Some(destination) = planner.destination() else {
        println!("no resource reachable from ({}, {})", source.x(), source.y());
        return Ok(());
    };

    println!(
        "destination ({}, {}) in {} step(s)",
        destination.x(),
        destination.y(),
        planner.remaining_steps()
    );
    let mut cursor = source;
    while let Some(step) = planner.next_step() {
        cursor = size.add(cursor, step);
        println!(
            "  move {:+} {:+} -> ({}, {})",
            step.dx(),
            step.dy(),
            cursor.x(),
            cursor.y()
        );
    }

    let stats = planner.stats();
    info!(
        expanded = stats.expanded,
        probes = stats.probes,
        gated = stats.gated,
        "search statistics"
    );
    Ok(())
}

fn run_clusters(layers: &BoardLayers, reference: Option<CellArg>, config: &Config) -> Result<()> {
    let view = layers.view()?;
    let size = view.size();
    let reference = match reference {
        Some(cell) => cell.locate(size)?,
        None => Location::OFF_GRID,
    };

    let map = ClusterMap::build(&view, reference, config.clusters);
    if map.is_empty() {
        println!("no resource cells on the board");
        return Ok(());
    }

    for cluster in map.iter() {
        let (min_x, min_y) = cluster.bounds.min();
        let (max_x, max_y) = cluster.bounds.max();
        println!(
            "cluster {}: {} cell(s), centroid ({}, {}), bounds ({min_x}, {min_y})..({max_x}, {max_y})",
            cluster.id.get(),
            cluster.member_count,
            cluster.centroid.x(),
            cluster.centroid.y(),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cell_accepts_spaced_pairs() {
        assert_eq!(parse_cell("3, 4"), Ok(CellArg { x: 3, y: 4 }));
        assert!(parse_cell("3").is_err());
        assert!(parse_cell("a,4").is_err());
    }

    #[test]
    fn locate_rejects_cells_outside_the_board() {
        let size = BoardSize::new(4).expect("valid side");
        assert!(CellArg { x: 4, y: 0 }.locate(size).is_err());
        assert_eq!(
            CellArg { x: 1, y: 2 }.locate(size).expect("on board"),
            size.pack(1, 2)
        );
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
