//! Read-through caches shared by consumers.

pub mod image;

pub use image::{ProductImageCache, PLACEHOLDER_IMAGE};
