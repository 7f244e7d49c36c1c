use std::path::Path;

use crate::SceneError;

/// Grayscale height samples in `[0, 1]`, row-major, row 0 at the top of
/// the image.
#[derive(Debug, Clone, PartialEq)]
pub struct Heightmap {
    width: u32,
    height: u32,
    samples: Vec<f32>,
}

impl Heightmap {
    /// Decode an image file; luminance is weighted `0.3 r + 0.59 g + 0.11 b`.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let image = image::open(path)?.to_rgb8();
        let (width, height) = image.dimensions();
        let samples = image
            .pixels()
            .map(|p| (0.3 * p[0] as f32 + 0.59 * p[1] as f32 + 0.11 * p[2] as f32) / 255.0)
            .collect();
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Build from raw samples. Returns `None` if the buffer size does not
    /// match `width * height` or either side is zero.
    pub fn from_samples(width: u32, height: u32, samples: Vec<f32>) -> Option<Self> {
        (width > 0 && height > 0 && samples.len() == (width * height) as usize).then_some(Self {
            width,
            height,
            samples,
        })
    }

    /// Nearest sample at column fraction `u` and row fraction `v`, both in `[0, 1]`.
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let x = (u.clamp(0.0, 1.0) * (self.width - 1) as f32) as u32;
        let y = (v.clamp(0.0, 1.0) * (self.height - 1) as f32) as u32;
        self.samples[(y * self.width + x) as usize]
    }
}
