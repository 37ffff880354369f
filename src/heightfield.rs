//! Packed height sample storage. See [`HeightField`] docs for more info.

/// Fixed-point scale factor of stored height samples. A stored `u16` raw value
/// maps to `raw / HEIGHT_SCALE` height units, which gives a representable
/// range of `0.0..=65.535` with a quantization step of one millimeter-ish
/// (`1 / HEIGHT_SCALE`) when one height unit is one meter.
pub const HEIGHT_SCALE: f32 = 1000.0;

/// Largest height value that survives encoding without clamping.
pub const MAX_HEIGHT: f32 = u16::MAX as f32 / HEIGHT_SCALE;

/// Encodes a height value into its packed 16-bit representation. Values
/// outside of `0.0..=MAX_HEIGHT` are clamped, never wrapped.
#[inline]
pub fn encode_height(height: f32) -> u16 {
    (height * HEIGHT_SCALE).round().clamp(0.0, u16::MAX as f32) as u16
}

/// Decodes a packed 16-bit sample back into a height value.
#[inline]
pub fn decode_height(raw: u16) -> f32 {
    raw as f32 / HEIGHT_SCALE
}

/// Square raster of `(size + 1)²` packed height samples. Samples sit at grid
/// *vertices*, hence one more sample than cells per axis: a terrain of size
/// `N` has `N×N` cells and `(N+1)×(N+1)` height samples.
///
/// Every accessor clamps coordinates into `[0, size]`, so edits that hang over
/// the raster border are folded onto the border instead of being rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightField {
    size: i32,
    samples: Vec<u16>,
}

impl HeightField {
    /// Creates a new field with all samples set to zero height.
    pub fn new(size: i32) -> Self {
        debug_assert!(size >= 0);
        let stride = (size + 1).max(1) as usize;
        Self {
            size,
            samples: vec![0; stride * stride],
        }
    }

    /// Terrain size. The sample raster is `(size + 1)²`.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Raw packed samples, row-major.
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Mutable access to the raw packed samples. Single-threaded discipline
    /// applies: the caller owns invalidation of any derived geometry.
    pub fn samples_mut(&mut self) -> &mut [u16] {
        &mut self.samples
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        let x = x.clamp(0, self.size);
        let y = y.clamp(0, self.size);
        (y * (self.size + 1) + x) as usize
    }

    /// Returns the height at the given sample, with coordinates clamped into
    /// `[0, size]`.
    #[inline]
    pub fn height(&self, x: i32, y: i32) -> f32 {
        decode_height(self.samples[self.index(x, y)])
    }

    /// Raw packed sample at the given coordinates, clamped like [`Self::height`].
    #[inline]
    pub fn raw(&self, x: i32, y: i32) -> u16 {
        self.samples[self.index(x, y)]
    }

    /// Writes a height sample. Coordinates clamp into `[0, size]`, the value
    /// clamps into `[0, MAX_HEIGHT]`.
    #[inline]
    pub fn set_height(&mut self, x: i32, y: i32, height: f32) {
        let index = self.index(x, y);
        self.samples[index] = encode_height(height);
    }

    /// Overwrites the inclusive rectangle `[x1, x2] × [y1, y2]` with heights
    /// from `src`, which must be a row-major raster of
    /// `(x2 - x1 + 1) × (y2 - y1 + 1)` values. Pixels of the rectangle that
    /// fall outside of `[0, size]` are clipped away; the rest of `src` still
    /// lands on its requested coordinates.
    pub fn blit(&mut self, src: &[f32], x1: i32, y1: i32, x2: i32, y2: i32) {
        self.for_each_in_rect(src, x1, y1, x2, y2, |_, s| s);
    }

    /// Additively blends `src * alpha` into the inclusive rectangle
    /// `[x1, x2] × [y1, y2]`, clipped like [`Self::blit`]. The sum saturates in
    /// the 16-bit encoding; callers that need tighter bounds clamp before
    /// calling.
    pub fn blend(&mut self, src: &[f32], x1: i32, y1: i32, x2: i32, y2: i32, alpha: f32) {
        self.for_each_in_rect(src, x1, y1, x2, y2, |d, s| d + s * alpha);
    }

    fn for_each_in_rect<F>(&mut self, src: &[f32], x1: i32, y1: i32, x2: i32, y2: i32, func: F)
    where
        F: Fn(f32, f32) -> f32,
    {
        if x2 < x1 || y2 < y1 {
            return;
        }
        let src_width = (x2 - x1 + 1) as usize;
        let src_height = (y2 - y1 + 1) as usize;
        if src.len() != src_width * src_height {
            log::warn!(
                "height rect of {}x{} does not match source of {} samples, ignoring",
                src_width,
                src_height,
                src.len()
            );
            return;
        }
        for j in y1.max(0)..=y2.min(self.size) {
            for i in x1.max(0)..=x2.min(self.size) {
                let s = src[(j - y1) as usize * src_width + (i - x1) as usize];
                let index = (j * (self.size + 1) + i) as usize;
                self.samples[index] = encode_height(func(decode_height(self.samples[index]), s));
            }
        }
    }
}
