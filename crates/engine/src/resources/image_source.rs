use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;

/// An RGBA8 image decoded from a look file.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl DecodedImage {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rgba_len", &self.rgba.len())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("failed to open image at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode image at {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Where the image cache gets its pixels from.
pub trait ImageSource: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageLoadError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiskImageSource;

impl ImageSource for DiskImageSource {
    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageLoadError> {
        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| ImageLoadError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let decoded = reader.decode().map_err(|source| ImageLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let image = decoded.to_rgba8();
        Ok(DecodedImage {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        })
    }
}
