use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use glam::Vec3;

use scrollstage::asset::{import_gltf, spawn_placeholder};
use scrollstage::scene_graph::ObjectId;
use scrollstage::{AssetSlot, AudioCue, Presentation, PresentationConfig};

/// Runs the scroll choreography headlessly and logs what happens.
#[derive(Parser)]
#[command(name = "scrollstage")]
#[command(version)]
struct Cli {
    /// Up to two glTF assets; box placeholders stand in for missing ones
    #[arg(num_args = 0..=2)]
    assets: Vec<PathBuf>,

    /// TOML presentation config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames to simulate: half scrolling down, half scrolling back up
    #[arg(long, default_value = "600")]
    frames: u32,

    #[arg(long, default_value = "60")]
    fps: f64,
}

struct LoggedCue;

impl AudioCue for LoggedCue {
    fn play(&mut self) -> Result<()> {
        log::info!("Scan cue");
        Ok(())
    }
}

fn load_asset(presentation: &mut Presentation, slot: AssetSlot, path: Option<&Path>) {
    let imported = path.map(|path| import_gltf(presentation.scene_mut(), path));
    let root = match imported {
        Some(Ok(root)) => root,
        Some(Err(error)) => {
            log::warn!("{error:#}, using a placeholder");
            placeholder(presentation, slot)
        }
        None => placeholder(presentation, slot),
    };

    presentation.on_asset_loaded(slot, root);
}

fn placeholder(presentation: &mut Presentation, slot: AssetSlot) -> ObjectId {
    // Off-origin on purpose, recentering moves it back
    let (name, center, size) = match slot {
        AssetSlot::Primary => ("Scanner", Vec3::new(0.5, 1.0, 0.0), Vec3::new(2.0, 3.0, 0.5)),
        AssetSlot::Secondary => ("Card", Vec3::new(-1.0, 0.0, 0.2), Vec3::new(1.5, 1.0, 0.1)),
    };
    spawn_placeholder(presentation.scene_mut(), name, center, size)
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PresentationConfig::from_toml_file(path)?,
        None => PresentationConfig::default(),
    };
    let scroll_end = config.zones.trigger_zone_start + config.pin_height() * 0.5;

    let mut presentation = Presentation::new(config).with_cue(Box::new(LoggedCue));
    load_asset(&mut presentation, AssetSlot::Primary, cli.assets.first().map(PathBuf::as_path));
    load_asset(&mut presentation, AssetSlot::Secondary, cli.assets.get(1).map(PathBuf::as_path));

    let frame_ms = 1000.0 / cli.fps.max(1.0);
    let half = (cli.frames / 2).max(1) as f32;
    let mut last_state = presentation.state();

    for frame in 0..cli.frames {
        let f = frame as f32;
        let t = if f < half { f / half } else { 2.0 - f / half };
        presentation.on_scroll(scroll_end * t.max(0.0));
        presentation.tick(frame as f64 * frame_ms);

        if presentation.state() != last_state {
            last_state = presentation.state();
            log::info!(
                "Frame {frame}: {:?}, progress {:.2}, container {:.2}",
                last_state,
                presentation.progress().normalized,
                presentation.container_scale()
            );
        }
    }

    log::info!("Finished in {:?}", presentation.state());
    Ok(())
}
