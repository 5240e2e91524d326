/*
Date: 2026-10-16
Program Details: <Galton board - balls drop through pegs into bins>
*/

use std::path::PathBuf;

use clap::Parser;
use galton_board::modules::board::{HEIGHT, WIDTH};
use galton_board::modules::palette::BACKGROUND;
use galton_board::modules::rapier_world::RapierWorld;
use galton_board::{BoardConfig, GaltonBoard};
use macroquad::miniquad::date;
use macroquad::prelude::*;
use ::rand::SeedableRng;
use ::rand::rngs::StdRng;

#[derive(Debug, Parser)]
#[command(name = "galton_board", about = "Galton board physics visualization")]
struct Cli {
    /// TOML file with board settings
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    ball_count: Option<usize>,
    #[arg(long)]
    ball_size: Option<f32>,
    #[arg(long)]
    peg_size: Option<f32>,
    #[arg(long)]
    bounciness: Option<f32>,
    #[arg(long)]
    seed: Option<u64>,
}

/// Defaults, then the config file, then command line flags.
fn resolve_config(cli: &Cli) -> BoardConfig {
    let mut config = match &cli.config {
        Some(path) if !cfg!(target_arch = "wasm32") => match BoardConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(error = %err, path = %path.display(), "could not load config, using defaults");
                BoardConfig::default()
            }
        },
        _ => BoardConfig::default(),
    };

    if let Some(n) = cli.ball_count {
        config.ball_count = n;
    }
    if let Some(size) = cli.ball_size {
        config.ball_size = size;
    }
    if let Some(size) = cli.peg_size {
        config.peg_size = size;
    }
    if let Some(b) = cli.bounciness {
        config.particle_bounciness = b;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    // Bad values fall back one field at a time so valid overrides survive
    for reason in config.repair() {
        tracing::error!(%reason, "invalid board setting, using its default");
    }
    config
}

fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    tracing_subscriber::fmt::init();
}

/// Set up window settings before the app runs
fn window_conf() -> Conf {
    Conf {
        window_title: "Galton Board".to_string(),
        window_width: WIDTH as i32,
        window_height: HEIGHT as i32,
        fullscreen: false,
        high_dpi: false,
        window_resizable: true,
        sample_count: 4, // MSAA
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    let config = resolve_config(&cli);
    let seed = config.seed.unwrap_or_else(|| (date::now() * 1000.0) as u64);
    tracing::info!(seed, "seeding ball drops");

    let world = RapierWorld::new(config.gravity);
    let mut galton = match GaltonBoard::new(config, world, StdRng::seed_from_u64(seed)) {
        Ok(galton) => galton,
        Err(err) => {
            tracing::error!(error = %err, "could not set up the board");
            return;
        }
    };
    galton.start();

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        galton.update(get_frame_time());

        clear_background(BACKGROUND);
        galton.draw();

        next_frame().await;
    }

    galton.stop();
}
