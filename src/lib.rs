pub mod analysis;
pub mod buffer;
pub mod config;
pub mod decode;
pub mod error;
pub mod reconstruction;
pub mod surface;

pub use error::{AppError, SurfaceError};

pub use analysis::{analyze, AnalysisResult};
pub use buffer::PixelBuffer;
pub use config::Configuration;
pub use decode::decode;
pub use reconstruction::{
    ReconstructionController, ReconstructionParameters, ReconstructionStyle, RunHandle,
};
pub use surface::{DrawSurface, RasterSurface, RecordingSurface};
