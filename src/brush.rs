//! Brush input contract: a grayscale intensity mask plus paint parameters.
//!
//! Brush *shape generation* belongs to the editing layer; the core only
//! consumes the mask-intensity contract. The constructors here cover the
//! stock shapes so tools and tests do not have to hand-roll rasters.

use nalgebra::Vector2;

/// Grayscale intensity raster in `[0, 1]` that modulates the strength of a
/// paint operation per pixel. `0.0` leaves the pixel untouched, `1.0` applies
/// the full brush effect.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushMask {
    width: i32,
    height: i32,
    pixels: Vec<f32>,
}

impl BrushMask {
    /// Wraps an arbitrary row-major intensity raster. Returns `None` if the
    /// pixel count does not match the dimensions.
    pub fn from_pixels(width: i32, height: i32, pixels: Vec<f32>) -> Option<Self> {
        if width < 1 || height < 1 || pixels.len() != (width * height) as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Square mask of full intensity.
    pub fn square(size: i32) -> Self {
        let size = size.max(1);
        Self {
            width: size,
            height: size,
            pixels: vec![1.0; (size * size) as usize],
        }
    }

    /// Hard-edged round mask: full intensity inside the inscribed circle,
    /// zero outside.
    pub fn circle(size: i32) -> Self {
        Self::round(size, |_| 1.0)
    }

    /// Round mask with linear falloff from full intensity at the center to
    /// zero at the rim.
    pub fn smooth_circle(size: i32) -> Self {
        Self::round(size, |normalized_distance| 1.0 - normalized_distance)
    }

    fn round<F: Fn(f32) -> f32>(size: i32, strength: F) -> Self {
        let size = size.max(1);
        let radius = size as f32 * 0.5;
        let center = Vector2::new(radius - 0.5, radius - 0.5);
        let mut pixels = Vec::with_capacity((size * size) as usize);
        for j in 0..size {
            for i in 0..size {
                let distance = (Vector2::new(i as f32, j as f32) - center).norm();
                if distance < radius {
                    pixels.push(strength(distance / radius).clamp(0.0, 1.0));
                } else {
                    pixels.push(0.0);
                }
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    /// Mask width in pixels.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Mask height in pixels.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Intensity at the given mask pixel; zero outside the mask.
    #[inline]
    pub fn intensity(&self, x: i32, y: i32) -> f32 {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize]
        } else {
            0.0
        }
    }
}

/// Operation a brush performs on the terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrushMode {
    /// Adds `mask * alpha` to the height map; negative `alpha` digs.
    ModifyHeight,
    /// Flattens the height map toward the level `alpha`, modulated by the
    /// mask intensity.
    SetHeight,
    /// Reserved smoothing mode. Currently a no-op: the terrain is left
    /// untouched and nothing is rebuilt.
    Smooth,
    /// Paints a single blend-map channel.
    PaintBlend {
        /// Target layer channel; 0 is the implicit base layer, 1..=4 are the
        /// stored channels.
        channel: usize,
    },
}

/// A single brush application: what to stamp, where, and how strongly.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    /// Intensity mask of the brush shape.
    pub mask: BrushMask,
    /// Top-left pixel the mask is anchored at, in raster coordinates. May be
    /// negative or beyond the raster; out-of-range pixels clamp or skip
    /// according to the target raster's rules.
    pub anchor: Vector2<i32>,
    /// Strength of the operation. Exact meaning depends on the mode.
    pub alpha: f32,
    /// Operation to perform.
    pub mode: BrushMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn square_mask_is_fully_saturated() {
        let mask = BrushMask::square(3);
        for j in 0..3 {
            for i in 0..3 {
                assert_eq!(mask.intensity(i, j), 1.0);
            }
        }
    }

    #[test]
    fn circle_mask_clears_corners() {
        let mask = BrushMask::circle(5);
        assert_eq!(mask.intensity(0, 0), 0.0);
        assert_eq!(mask.intensity(4, 4), 0.0);
        assert_eq!(mask.intensity(2, 2), 1.0);
    }

    #[test]
    fn smooth_circle_falls_off_toward_rim() {
        let mask = BrushMask::smooth_circle(5);
        assert_relative_eq!(mask.intensity(2, 2), 1.0);
        let edge = mask.intensity(2, 0);
        assert!(edge > 0.0 && edge < 0.5, "edge = {}", edge);
    }

    #[test]
    fn mismatched_pixel_count_is_rejected() {
        assert!(BrushMask::from_pixels(2, 2, vec![0.0; 3]).is_none());
        assert!(BrushMask::from_pixels(0, 1, vec![]).is_none());
    }

    #[test]
    fn intensity_outside_mask_is_zero() {
        let mask = BrushMask::square(2);
        assert_eq!(mask.intensity(-1, 0), 0.0);
        assert_eq!(mask.intensity(0, 2), 0.0);
    }
}
