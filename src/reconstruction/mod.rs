pub mod circles;
pub mod controller;
pub mod mosaic;
pub mod palette;
pub mod progress;

pub use circles::CircleReconstructor;
pub use controller::{ReconstructionController, RunHandle};
pub use mosaic::MosaicReconstructor;
pub use palette::PaletteReconstructor;
pub use progress::{ProgressReporter, RunState, RunStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructionStyle {
    Mosaic,
    Circles,
    PaletteQuantization,
}

/// Parameters for one reconstruction request, variant by style.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconstructionParameters {
    Mosaic {
        block_size: u32,
    },
    Circles {
        num_circles: u32,
        min_radius: f32,
        max_radius: f32,
    },
    PaletteQuantization,
}

impl ReconstructionParameters {
    pub fn style(&self) -> ReconstructionStyle {
        match self {
            Self::Mosaic { .. } => ReconstructionStyle::Mosaic,
            Self::Circles { .. } => ReconstructionStyle::Circles,
            Self::PaletteQuantization => ReconstructionStyle::PaletteQuantization,
        }
    }
}

/// How a run ended. Mid-run per-unit failures are logged and skipped, so they
/// never surface here; cancellation is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}
