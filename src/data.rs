//! Terrain surface data: one height field plus one blend map, sized from a
//! single `size` parameter. See [`TerrainData`] docs for more info.

use crate::{
    blendmap::BlendMap,
    brush::BrushMask,
    error::TerrainError,
    heightfield::{HeightField, MAX_HEIGHT},
};

/// Observer of terrain resizes. The event carries no payload: listeners
/// re-derive whatever layout they maintain from the data itself.
///
/// This is the explicit replacement for the signal/slot plumbing a host
/// engine would normally provide; [`crate::chunk::ChunkGrid`] implements it to
/// know when its tile layout went stale.
pub trait SizeChangedListener {
    /// Called after the rasters have been reallocated for a new size.
    fn on_size_changed(&mut self);
}

/// No-op listener for contexts that own no derived state (tools, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreSizeChanged;

impl SizeChangedListener for IgnoreSizeChanged {
    fn on_size_changed(&mut self) {}
}

/// Editable terrain surface: a height field of `(size + 1)²` samples and a
/// blend map of `size²` pixels, kept allocated to the same `size` at all
/// times. Paint operators clamp at this layer, the rasters below only
/// saturate their encodings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerrainData {
    size: i32,
    heights: HeightField,
    blends: BlendMap,
}

impl TerrainData {
    /// Creates zeroed terrain data. Fails for sizes below 1.
    pub fn new(size: i32) -> Result<Self, TerrainError> {
        if size < 1 {
            return Err(TerrainError::InvalidSize(size));
        }
        Ok(Self {
            size,
            heights: HeightField::new(size),
            blends: BlendMap::new(size),
        })
    }

    /// Terrain size; equals the height field size and the blend map size.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// The owned height field.
    pub fn heights(&self) -> &HeightField {
        &self.heights
    }

    /// Mutable access to the height field. The caller owns chunk invalidation
    /// for any samples it touches.
    pub fn heights_mut(&mut self) -> &mut HeightField {
        &mut self.heights
    }

    /// The owned blend map.
    pub fn blends(&self) -> &BlendMap {
        &self.blends
    }

    /// Mutable access to the blend map.
    pub fn blends_mut(&mut self) -> &mut BlendMap {
        &mut self.blends
    }

    /// Resizes the terrain, zeroing both rasters and notifying the listener.
    /// A size equal to the current one is a no-op and fires no event; sizes
    /// below 1 are rejected.
    pub fn set_size(
        &mut self,
        new_size: i32,
        listener: &mut dyn SizeChangedListener,
    ) -> Result<(), TerrainError> {
        if new_size < 1 {
            return Err(TerrainError::InvalidSize(new_size));
        }
        if new_size == self.size {
            return Ok(());
        }
        log::debug!("terrain resized {} -> {}", self.size, new_size);
        self.size = new_size;
        self.heights = HeightField::new(new_size);
        self.blends = BlendMap::new(new_size);
        listener.on_size_changed();
        Ok(())
    }

    /// Raises (or, with negative `alpha`, lowers) the height map under the
    /// mask: `h' = clamp(h + t * alpha, 0, MAX_HEIGHT)` per covered sample.
    pub fn paint_height(&mut self, mask: &BrushMask, x: i32, y: i32, alpha: f32) {
        for j in 0..mask.height() {
            for i in 0..mask.width() {
                let t = mask.intensity(i, j);
                if t == 0.0 {
                    continue;
                }
                let height = self.heights.height(x + i, y + j);
                let result = (height + t * alpha).clamp(0.0, MAX_HEIGHT);
                self.heights.set_height(x + i, y + j, result);
            }
        }
    }

    /// Flattens the height map toward the level `alpha` under the mask:
    /// `h' = h * (1 - t) + alpha * t` per covered sample. A fully saturated
    /// mask pixel assigns the level outright.
    pub fn set_height(&mut self, mask: &BrushMask, x: i32, y: i32, alpha: f32) {
        let level = alpha.clamp(0.0, MAX_HEIGHT);
        for j in 0..mask.height() {
            for i in 0..mask.width() {
                let t = mask.intensity(i, j);
                if t == 0.0 {
                    continue;
                }
                let height = self.heights.height(x + i, y + j);
                self.heights.set_height(x + i, y + j, height * (1.0 - t) + level * t);
            }
        }
    }

    /// Paints one blend-map channel under the mask, see [`BlendMap::paint`].
    pub fn paint_blend(&mut self, mask: &BrushMask, x: i32, y: i32, channel: usize, alpha: f32) {
        self.blends.paint(mask, x, y, channel, alpha);
    }

    /// Rectangular overwrite of the height map, see [`HeightField::blit`].
    pub fn blit_height(&mut self, src: &[f32], x1: i32, y1: i32, x2: i32, y2: i32) {
        self.heights.blit(src, x1, y1, x2, y2);
    }

    /// Rectangular additive blend into the height map, see
    /// [`HeightField::blend`].
    pub fn blend_height(&mut self, src: &[f32], x1: i32, y1: i32, x2: i32, y2: i32, alpha: f32) {
        self.heights.blend(src, x1, y1, x2, y2, alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_invalid_sizes() {
        assert!(matches!(TerrainData::new(0), Err(TerrainError::InvalidSize(0))));
        assert!(matches!(TerrainData::new(-4), Err(TerrainError::InvalidSize(-4))));
        let mut data = TerrainData::new(4).unwrap();
        assert!(data.set_size(0, &mut IgnoreSizeChanged).is_err());
        assert_eq!(data.size(), 4);
    }

    struct CountListener(usize);

    impl SizeChangedListener for CountListener {
        fn on_size_changed(&mut self) {
            self.0 += 1;
        }
    }

    #[test]
    fn resize_notifies_and_reallocates() {
        let mut data = TerrainData::new(4).unwrap();
        data.heights_mut().set_height(1, 1, 3.0);

        let mut listener = CountListener(0);
        data.set_size(4, &mut listener).unwrap();
        assert_eq!(listener.0, 0, "equal size must not fire the event");

        data.set_size(8, &mut listener).unwrap();
        assert_eq!(listener.0, 1);
        assert_eq!(data.heights().size(), 8);
        assert_eq!(data.blends().size(), 8);
        assert_eq!(data.heights().height(1, 1), 0.0, "samples reset on resize");
    }

    #[test]
    fn paint_height_adds_mask_times_alpha() {
        let mut data = TerrainData::new(8).unwrap();
        let mask = BrushMask::from_pixels(2, 1, vec![1.0, 0.25]).unwrap();
        data.paint_height(&mask, 3, 3, 2.0);
        assert_relative_eq!(data.heights().height(3, 3), 2.0);
        assert_relative_eq!(data.heights().height(4, 3), 0.5);
        assert_eq!(data.heights().height(5, 3), 0.0);
    }

    #[test]
    fn paint_height_clamps_at_zero() {
        let mut data = TerrainData::new(4).unwrap();
        data.heights_mut().set_height(2, 2, 1.0);
        data.paint_height(&BrushMask::square(1), 2, 2, -5.0);
        assert_eq!(data.heights().height(2, 2), 0.0);
    }

    #[test]
    fn set_height_flattens_toward_level() {
        let mut data = TerrainData::new(8).unwrap();
        data.heights_mut().set_height(2, 2, 4.0);
        let mask = BrushMask::from_pixels(1, 1, vec![0.5]).unwrap();
        data.set_height(&mask, 2, 2, 2.0);
        assert_relative_eq!(data.heights().height(2, 2), 3.0);
        data.set_height(&BrushMask::square(1), 2, 2, 2.0);
        assert_relative_eq!(data.heights().height(2, 2), 2.0);
    }
}
