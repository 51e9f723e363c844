use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Invalid pixel buffer: {0}")]
    Buffer(String),
    #[error("Invalid reconstruction parameters: {0}")]
    Parameters(String),
    #[error("Surface Error: {0}")]
    Surface(#[from] SurfaceError),
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
}

// Drawing Surface Error Type
#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Surface is unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to write {0} to surface")]
    WriteFailed(String),
}
