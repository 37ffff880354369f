//! Texture-layer blend weights. See [`BlendMap`] docs for more info.

use crate::brush::BrushMask;
use nalgebra::Vector4;

/// Amount of stored weight channels. The base layer is implicit and derived
/// as `1 - sum of stored channels`, so a terrain supports five texture layers
/// in total.
pub const BLEND_CHANNEL_COUNT: usize = 4;

/// `size × size` raster of per-cell texture blend weights, one pixel per
/// terrain cell (weights are per-cell while heights are per-vertex, hence one
/// less pixel than height samples per axis).
///
/// Pixels are stored as RGBA8 and exposed through a `[0, 1]` float API; the
/// byte backing is what the persisted layout and the renderer-side mask
/// texture consume, and it makes save/load round trips bit-exact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlendMap {
    size: i32,
    pixels: Vec<[u8; 4]>,
}

#[inline]
fn to_byte(weight: f32) -> u8 {
    (weight * 255.0).clamp(0.0, 255.0) as u8
}

#[inline]
fn to_weight(byte: u8) -> f32 {
    byte as f32 / 255.0
}

impl BlendMap {
    /// Creates a map with every stored channel at zero, which leaves the
    /// implicit base layer fully opaque everywhere.
    pub fn new(size: i32) -> Self {
        debug_assert!(size >= 0);
        Self {
            size,
            pixels: vec![[0; 4]; (size.max(0) as usize).pow(2)],
        }
    }

    /// Side length of the raster in pixels.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Raw RGBA8 pixels, row-major.
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// Mutable access to the raw RGBA8 pixels.
    pub fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
        &mut self.pixels
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.size && y < self.size
    }

    /// Stored channel weights at the given pixel, or zero outside the raster.
    pub fn weights(&self, x: i32, y: i32) -> Vector4<f32> {
        if self.in_bounds(x, y) {
            let p = self.pixels[(y * self.size + x) as usize];
            Vector4::new(to_weight(p[0]), to_weight(p[1]), to_weight(p[2]), to_weight(p[3]))
        } else {
            Vector4::zeros()
        }
    }

    /// Writes channel weights at the given pixel, each clamped into `[0, 1]`.
    /// Writes outside of the raster are dropped.
    pub fn set_weights(&mut self, x: i32, y: i32, weights: Vector4<f32>) {
        if self.in_bounds(x, y) {
            self.pixels[(y * self.size + x) as usize] = [
                to_byte(weights.x),
                to_byte(weights.y),
                to_byte(weights.z),
                to_byte(weights.w),
            ];
        }
    }

    /// Weight of the implicit base layer: whatever the stored layers leave
    /// uncovered.
    pub fn base_weight(&self, x: i32, y: i32) -> f32 {
        1.0 - self.weights(x, y).sum()
    }

    /// Paints a single layer channel under the given mask.
    ///
    /// `channel` 0 addresses the implicit base layer and is realized by
    /// pulling weight out of *all* stored channels at once; channels `1..=4`
    /// add `alpha` to the corresponding stored channel. For every mask pixel,
    /// the mask intensity `t` scales how much of the delta is applied:
    /// `new = current + delta * t`, clamped per channel into `[0, 1]`.
    ///
    /// Mask pixels that land outside of the raster are skipped one by one, so
    /// a brush may hang over any edge.
    pub fn paint(&mut self, mask: &BrushMask, x: i32, y: i32, channel: usize, alpha: f32) {
        let delta = match channel {
            0 => Vector4::new(-alpha, -alpha, -alpha, -alpha),
            1 => Vector4::new(alpha, 0.0, 0.0, 0.0),
            2 => Vector4::new(0.0, alpha, 0.0, 0.0),
            3 => Vector4::new(0.0, 0.0, alpha, 0.0),
            4 => Vector4::new(0.0, 0.0, 0.0, alpha),
            _ => {
                log::warn!("blend paint on unknown channel {}, ignoring", channel);
                return;
            }
        };

        for j in 0..mask.height() {
            for i in 0..mask.width() {
                let px = x + i;
                let py = y + j;
                if !self.in_bounds(px, py) {
                    continue;
                }
                let t = mask.intensity(i, j);
                self.set_weights(px, py, self.weights(px, py) + delta * t);
            }
        }
    }
}
