//! AINA - a desktop pet that renders an interactive glTF avatar
//!
//! This is the main entry point: logging, settings, and either the windowed
//! pet or a headless `--inspect` run.

mod app;
mod inspect;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use winit::event_loop::EventLoop;

use aina_viewer::LoadRequest;

use crate::app::AinaApp;
use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "aina", version, about = "Desktop pet that renders an interactive glTF model")]
struct Args {
    /// Model to show instead of the one in the settings file
    #[arg(long)]
    model: Option<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load the model without a window, print its parts, and exit
    #[arg(long)]
    inspect: bool,
}

/// First model to show, with saved visibility when it is the saved model.
fn startup_request(settings: &Settings, model: Option<PathBuf>) -> LoadRequest {
    let path = model.unwrap_or_else(|| settings.model_path.clone());
    let request = LoadRequest::new(&path);
    match settings.visibility_for(&path) {
        Some(visibility) => request.with_visibility(visibility),
        None => request,
    }
}

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let args = Args::parse();

    let settings_path = args.config.clone().or_else(Settings::default_path);
    let settings = match &settings_path {
        Some(path) => Settings::load(path),
        None => {
            tracing::warn!("Could not determine config directory, using defaults");
            Settings::default()
        }
    };
    let request = startup_request(&settings, args.model);

    if args.inspect {
        return inspect::run(request);
    }

    info!("Starting AINA...");

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = AinaApp::new(settings, settings_path, request);
    event_loop.run_app(&mut app).context("Event loop failed")?;

    info!("AINA exited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aina_core::VisibilityMap;

    fn saved() -> Settings {
        let mut visibility = VisibilityMap::new();
        visibility.set(2, false);
        Settings {
            model_path: PathBuf::from("pets/fox.glb"),
            part_visibility: visibility,
            ..Default::default()
        }
    }

    #[test]
    fn test_startup_uses_saved_model_and_visibility() {
        let request = startup_request(&saved(), None);
        assert_eq!(request.path, PathBuf::from("pets/fox.glb"));
        assert_eq!(request.visibility.unwrap().get(2), Some(false));
    }

    #[test]
    fn test_model_override_drops_saved_visibility() {
        let request = startup_request(&saved(), Some(PathBuf::from("pets/cat.glb")));
        assert_eq!(request.path, PathBuf::from("pets/cat.glb"));
        assert!(request.visibility.is_none());
    }

    #[test]
    fn test_cli_flags_parse() {
        let args = Args::parse_from(["aina", "--model", "pet.glb", "--inspect"]);
        assert_eq!(args.model, Some(PathBuf::from("pet.glb")));
        assert!(args.inspect);
        assert!(args.config.is_none());
    }
}
