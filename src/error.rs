use thiserror::Error;

/// Errors that can occur while turning a texture source into a luminance map.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("HTTP error fetching {url}: {message}")]
    Http { url: String, message: String },
    #[error("Invalid file URL: {0}")]
    InvalidUrl(String),
    #[error("Texture exceeds {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("Invalid texture dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),
    #[error("Load cancelled")]
    Cancelled,
}
