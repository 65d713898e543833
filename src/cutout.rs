//! Background-removal boundary.
//!
//! The real cutout service is an opaque collaborator: raw image bytes go in,
//! a decodable (ideally transparent) image or an error message comes out.

use thiserror::Error;

/// Error reported by a cutout service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CutoutError {
    /// Nothing to process
    #[error("image content is empty")]
    Empty,
    /// The service rejected or failed the request
    #[error("{0}")]
    Failed(String),
}

/// Removes the background from an encoded image.
pub trait CutoutService {
    fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>, CutoutError>;
}

/// Treats the input as already cut out and hands it back unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl CutoutService for Passthrough {
    fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>, CutoutError> {
        if image.is_empty() {
            return Err(CutoutError::Empty);
        }
        Ok(image.to_vec())
    }
}

impl<F> CutoutService for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, CutoutError>,
{
    fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>, CutoutError> {
        self(image)
    }
}
