//=========================================================================
// galvanic — Command-Line Entry Point
//=========================================================================
//
// Parses the command line, initializes logging and hands the game
// script to the engine. The engine's exit code becomes the process
// exit code.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::PathBuf;
use std::process;

use clap::Parser;
use env_logger::Env;

//=== Internal Dependencies ===============================================

use galvanic_engine::EngineBuilder;

//=== Cli =================================================================

/// Runs a Lua game script inside the Galvanic Engine.
#[derive(Parser, Debug)]
#[command(name = "galvanic", version, about)]
struct Cli {
    /// Path to the game script to run.
    script: PathBuf,

    /// Initial frame rate cap (scripts can change it via `fpsCap`).
    #[arg(long, value_name = "FPS", default_value_t = 40,
          value_parser = clap::value_parser!(u32).range(1..))]
    fps_cap: u32,

    /// Initial window title (scripts can change it via `gameName`).
    #[arg(long, default_value = "Untitled")]
    title: String,

    /// Window width in logical pixels.
    #[arg(long, default_value_t = 1024,
          value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Window height in logical pixels.
    #[arg(long, default_value_t = 640,
          value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,
}

//=== Entry Point =========================================================

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let code = EngineBuilder::new(cli.script)
        .with_fps_cap(cli.fps_cap)
        .with_title(cli.title)
        .with_window_size(cli.width, cli.height)
        .build()
        .run();

    process::exit(code);
}
