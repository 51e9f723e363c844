mod analysis;
mod buffer;
mod config;
mod decode;
mod error;
mod reconstruction;
mod surface;

use crate::config::Configuration;
use crate::error::AppError;
use crate::reconstruction::{ReconstructionController, ReconstructionParameters};
use crate::surface::RasterSurface;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tracing::{info, Level};

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    let configuration = Configuration::default();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("usage: rasterlab <image> [output.png]");
        return Ok(());
    };
    let output = args.next().unwrap_or_else(|| "reconstruction.png".to_string());

    let source = std::fs::read(&input)?;
    let buffer = decode::decode(Bytes::from(source))?;

    let result = analysis::analyze(&buffer);
    info!(
        "{}: {}x{}, {} pixels, {} palette colors",
        input,
        result.properties.width,
        result.properties.height,
        result.properties.pixel_count,
        result.palette.len()
    );
    if let Ok(json) = serde_json::to_string_pretty(&result.palette) {
        println!("{json}");
    }

    let mut controller = ReconstructionController::new(buffer, result.palette_colors());
    let surface = Arc::new(Mutex::new(RasterSurface::new()));
    controller.start(
        ReconstructionParameters::Mosaic {
            block_size: configuration.block_size,
        },
        surface.clone(),
    )?;
    controller.join().await;

    let guard = surface
        .lock()
        .map_err(|e| AppError::Surface(error::SurfaceError::Unavailable(e.to_string())))?;
    if let Some(image) = guard.image() {
        image.save(&output).map_err(std::io::Error::other)?;
        info!("Wrote mosaic reconstruction to {}", output);
    }

    Ok(())
}
