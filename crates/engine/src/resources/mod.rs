mod image_cache;
mod image_source;

pub use image_cache::ImageCache;
pub use image_source::{DecodedImage, DiskImageSource, ImageLoadError, ImageSource};
