use thiserror::Error;

#[derive(Debug, Error)]
pub enum BeadError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("invalid color format {0:?}, expected #RRGGBB")]
    InvalidColorFormat(String),

    #[error("no source image loaded")]
    NoImage,

    #[error("PNG encode error: {0}")]
    Encode(#[from] image::ImageError),
}
