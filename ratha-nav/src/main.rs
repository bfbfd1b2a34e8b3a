//! RathaNav - Autonomous driving controller for the Ratha simulator.
//!
//! Loads a map and vehicle configuration, then drives the simulation
//! session until the requested goal or sequence completes:
//!
//! ```text
//! ratha-nav [config.toml] [--goal COL,ROW] [--sequence NAME] [--ticks N]
//! ```
//!
//! With no explicit request, a target configured in the map is used as
//! the pathfinding goal.

use std::path::Path;

use ratha_nav::config::RathaConfig;
use ratha_nav::error::{RathaError, Result};
use ratha_nav::session::Session;
use ratha_sim::planning::GridCell;
use tracing::{info, warn};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ratha_nav=info".parse().unwrap()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    let config = if args.len() > 1 && !args[1].starts_with("--") {
        let config_path = Path::new(&args[1]);
        info!("Loading configuration from {:?}", config_path);
        RathaConfig::load(config_path)?
    } else if Path::new("ratha.toml").exists() {
        info!("Loading configuration from ratha.toml");
        RathaConfig::load(Path::new("ratha.toml"))?
    } else {
        info!("Using default configuration");
        RathaConfig::default()
    };

    let goal = flag_value(&args, "--goal")
        .map(|v| parse_goal(&v))
        .transpose()?;
    let sequence = flag_value(&args, "--sequence");
    let max_ticks = flag_value(&args, "--ticks")
        .map(|v| {
            v.parse::<u64>()
                .map_err(|_| RathaError::Config(format!("invalid --ticks value {:?}", v)))
        })
        .transpose()?
        .unwrap_or(config.simulation.max_ticks);

    info!("RathaNav v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Arena {}x{} with {} obstacle(s), cell size {}",
        config.map.width,
        config.map.height,
        config.map.obstacles.len(),
        config.map.cell_size
    );

    let mut session = Session::from_config(&config);

    let sequence_dir = Path::new(&config.interpreter.sequence_dir);
    if sequence_dir.is_dir() {
        session.load_sequences(sequence_dir);
    }

    // Pick the pathfinding goal: explicit flag first, else the map's
    // target marker.
    let goal = goal.or_else(|| {
        session.map().target.as_ref().map(|t| {
            (
                (t.x / config.map.cell_size) as usize,
                (t.y / config.map.cell_size) as usize,
            )
        })
    });

    let mut requested = false;
    if let Some(goal) = goal {
        info!("Planning route to cell {:?}", goal);
        if session.follow_path_to(goal) {
            requested = true;
        } else {
            warn!("No route to {:?}; treating as nothing to do", goal);
        }
    }
    if let Some(name) = sequence {
        info!("Running sequence {:?}", name);
        session.run_sequence(&name);
        requested = session.autopilot_active() || requested;
    }

    if !requested {
        info!("Nothing to drive: no reachable goal and no sequence requested");
        return Ok(());
    }

    // Main loop: tick until the work completes or the budget runs out.
    let mut final_telemetry = None;
    for _ in 0..max_ticks {
        let telemetry = session.tick();

        if session.goal_reached() {
            info!("Goal reached after {} ticks", session.ticks_elapsed());
            final_telemetry = Some(telemetry);
            break;
        }
        if !session.autopilot_active() {
            info!("Controllers idle after {} ticks", session.ticks_elapsed());
            final_telemetry = Some(telemetry);
            break;
        }
        final_telemetry = Some(telemetry);
    }

    if let Some(t) = final_telemetry {
        info!(
            "Final pose ({:.1}, {:.1}), gyro {:.1} deg, battery {:.1}%",
            t.pos_x,
            t.pos_y,
            t.gyro,
            t.battery * 100.0
        );
    }

    info!("RathaNav finished");
    Ok(())
}

/// Value of a `--flag value` pair, if present.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// Parse a `COL,ROW` goal cell.
fn parse_goal(value: &str) -> Result<GridCell> {
    let mut parts = value.split(',');
    let col = parts.next().and_then(|p| p.trim().parse().ok());
    let row = parts.next().and_then(|p| p.trim().parse().ok());
    match (col, row, parts.next()) {
        (Some(col), Some(row), None) => Ok((col, row)),
        _ => Err(RathaError::Config(format!(
            "invalid --goal value {:?}, expected COL,ROW",
            value
        ))),
    }
}
