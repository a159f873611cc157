use thiserror::Error;

use crate::compute::ResourceKind;

#[derive(Error, Debug)]
pub enum LatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Failed to provision {resource}: {reason}")]
    Provision { resource: ResourceKind, reason: String },

    #[error("Unsupported binding for {resource}: {reason}")]
    Binding { resource: ResourceKind, reason: String },

    #[error("Kernel launch failed: {0}")]
    Launch(String),

    #[error("Accelerator error: {0}")]
    Device(String),

    #[error("{backend} cannot use a resource owned by another backend")]
    ForeignResource { backend: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid descriptor dump: {0}")]
    DumpFormat(String),
}

pub type Result<T> = std::result::Result<T, LatchError>;
