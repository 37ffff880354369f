//! Terrain node: the glue that routes edits through the data layer, the
//! chunk grid and the renderer. See [`TerrainNode`] docs for more info.

use crate::{
    brush::{Brush, BrushMode},
    chunk::{ChunkGrid, PixelRect},
    data::TerrainData,
    error::TerrainError,
    renderer::{MaterialHandle, TerrainRenderer},
};
use nalgebra::{Matrix4, Vector3};

/// An editable terrain instance.
///
/// The node owns an optional [`TerrainData`] (a node without data is a valid
/// empty state: every mutating or updating entry point simply returns) and a
/// [`ChunkGrid`] over it. The control flow for an edit is always the same:
/// the brush mutates the rasters, the grid marks the affected tiles, and
/// [`TerrainNode::update`] rebuilds exactly those tiles through the injected
/// renderer.
///
/// Everything here assumes serialized access: one edit is processed to
/// completion before the next one starts, and rebuilds run synchronously.
#[derive(Debug)]
pub struct TerrainNode {
    data: Option<TerrainData>,
    grid: ChunkGrid,
    scale: f32,
    uv_scale: f32,
    material: Option<MaterialHandle>,
    transform: Matrix4<f32>,
}

impl TerrainNode {
    /// Creates a detached node partitioned into tiles of `chunk_size` cells.
    pub fn new(chunk_size: i32) -> Self {
        Self {
            data: None,
            grid: ChunkGrid::new(chunk_size),
            scale: 1.0,
            uv_scale: 1.0,
            material: None,
            transform: Matrix4::identity(),
        }
    }

    /// The attached terrain data, if any.
    pub fn data(&self) -> Option<&TerrainData> {
        self.data.as_ref()
    }

    /// The chunk grid.
    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    /// Mutable access to the chunk grid, mainly for draining blend flags.
    pub fn grid_mut(&mut self) -> &mut ChunkGrid {
        &mut self.grid
    }

    /// Distance between neighboring samples in world units.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Attaches terrain data, creating the tile set and building all of its
    /// geometry. Returns the previously attached data, if any.
    pub fn attach_data(
        &mut self,
        data: TerrainData,
        renderer: &mut dyn TerrainRenderer,
    ) -> Option<TerrainData> {
        let previous = self.detach_data(renderer);
        self.data = Some(data);
        self.sync_and_rebuild(renderer);
        previous
    }

    /// Detaches the terrain data and releases every tile's renderer
    /// resources. The node goes back to the valid empty state.
    pub fn detach_data(&mut self, renderer: &mut dyn TerrainRenderer) -> Option<TerrainData> {
        if self.data.is_some() {
            self.grid.free_chunks(renderer);
        }
        self.data.take()
    }

    /// Resizes the attached terrain. The grid observes the change and
    /// re-creates its tiles, then everything is rebuilt. Rejects sizes below
    /// 1; does nothing when no data is attached.
    pub fn set_size(
        &mut self,
        new_size: i32,
        renderer: &mut dyn TerrainRenderer,
    ) -> Result<(), TerrainError> {
        let data = match self.data.as_mut() {
            Some(data) => data,
            None => return Ok(()),
        };
        data.set_size(new_size, &mut self.grid)?;
        self.sync_and_rebuild(renderer);
        Ok(())
    }

    /// Applies one brush stamp and synchronously rebuilds whatever geometry
    /// it invalidated. Returns the amount of rebuilt tiles.
    pub fn apply_brush(&mut self, brush: &Brush, renderer: &mut dyn TerrainRenderer) -> usize {
        let data = match self.data.as_mut() {
            Some(data) => data,
            None => return 0,
        };
        let (x, y) = (brush.anchor.x, brush.anchor.y);
        let rect = PixelRect::from_anchor(x, y, brush.mask.width(), brush.mask.height());
        match brush.mode {
            BrushMode::ModifyHeight => {
                data.paint_height(&brush.mask, x, y, brush.alpha);
                self.grid.mark_dirty_rect(rect);
            }
            BrushMode::SetHeight => {
                data.set_height(&brush.mask, x, y, brush.alpha);
                self.grid.mark_dirty_rect(rect);
            }
            BrushMode::Smooth => {
                // Smoothing kernel intentionally unimplemented; the mode is
                // accepted so editors can bind it ahead of time.
                log::debug!("smooth brush is a no-op");
                return 0;
            }
            BrushMode::PaintBlend { channel } => {
                data.paint_blend(&brush.mask, x, y, channel, brush.alpha);
                self.grid.mark_blend_dirty_rect(rect);
                // Blend weights do not move vertices, no mesh rebuild needed.
                return 0;
            }
        }
        self.update(renderer)
    }

    /// Writes a single height sample, invalidates the tiles rendering it and
    /// rebuilds them.
    pub fn modify_height_at(
        &mut self,
        x: i32,
        y: i32,
        height: f32,
        renderer: &mut dyn TerrainRenderer,
    ) -> usize {
        let data = match self.data.as_mut() {
            Some(data) => data,
            None => return 0,
        };
        data.heights_mut().set_height(x, y, height);
        self.grid.mark_dirty_for_pixel(x, y);
        self.update(renderer)
    }

    /// Rectangular height overwrite with invalidation, see
    /// [`TerrainData::blit_height`].
    pub fn blit_height(
        &mut self,
        src: &[f32],
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        renderer: &mut dyn TerrainRenderer,
    ) -> usize {
        let data = match self.data.as_mut() {
            Some(data) => data,
            None => return 0,
        };
        data.blit_height(src, x1, y1, x2, y2);
        self.grid.mark_dirty_rect(PixelRect::new(x1, y1, x2, y2));
        self.update(renderer)
    }

    /// Rectangular additive height blend with invalidation, see
    /// [`TerrainData::blend_height`].
    pub fn blend_height(
        &mut self,
        src: &[f32],
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        alpha: f32,
        renderer: &mut dyn TerrainRenderer,
    ) -> usize {
        let data = match self.data.as_mut() {
            Some(data) => data,
            None => return 0,
        };
        data.blend_height(src, x1, y1, x2, y2, alpha);
        self.grid.mark_dirty_rect(PixelRect::new(x1, y1, x2, y2));
        self.update(renderer)
    }

    /// Runs one update pass: re-creates the tile layout if it went stale and
    /// rebuilds every dirty tile. Returns the amount of rebuilt tiles.
    pub fn update(&mut self, renderer: &mut dyn TerrainRenderer) -> usize {
        let data = match self.data.as_ref() {
            Some(data) => data,
            None => return 0,
        };
        if self.grid.is_layout_stale() {
            self.grid.sync_layout(data.size(), &self.transform, renderer);
        }
        self.grid
            .rebuild_dirty(data, self.scale, self.uv_scale, self.material, renderer)
    }

    /// Sets the world-unit distance between samples. All geometry depends on
    /// it, so every tile is rebuilt.
    pub fn set_scale(&mut self, scale: f32, renderer: &mut dyn TerrainRenderer) -> usize {
        self.scale = scale;
        self.grid.mark_all_dirty();
        self.update(renderer)
    }

    /// Sets the UV tiling factor; rebuilds everything, like [`Self::set_scale`].
    pub fn set_uv_scale(&mut self, uv_scale: f32, renderer: &mut dyn TerrainRenderer) -> usize {
        self.uv_scale = uv_scale;
        self.grid.mark_all_dirty();
        self.update(renderer)
    }

    /// Material submitted with every surface. Takes effect with the next
    /// rebuild of each tile; callers that need it immediately mark the grid
    /// dirty and run [`Self::update`].
    pub fn set_material(&mut self, material: Option<MaterialHandle>) {
        self.material = material;
    }

    /// Moves the whole terrain; forwarded to every tile mesh.
    pub fn set_transform(&mut self, transform: Matrix4<f32>, renderer: &mut dyn TerrainRenderer) {
        self.transform = transform;
        self.grid.set_transform(&self.transform, renderer);
    }

    /// Sample column under a local-space position, clamped onto the raster.
    pub fn pixel_x_at(&self, position: Vector3<f32>) -> i32 {
        ((position.x + 0.5 * self.scale) / self.scale) as i32
    }

    /// Sample row under a local-space position, clamped onto the raster.
    pub fn pixel_y_at(&self, position: Vector3<f32>) -> i32 {
        ((position.z + 0.5 * self.scale) / self.scale) as i32
    }

    /// Terrain height under a local-space position, 0 when detached.
    pub fn height_at(&self, position: Vector3<f32>) -> f32 {
        match self.data.as_ref() {
            Some(data) => data
                .heights()
                .height(self.pixel_x_at(position), self.pixel_y_at(position)),
            None => 0.0,
        }
    }

    fn sync_and_rebuild(&mut self, renderer: &mut dyn TerrainRenderer) {
        if let Some(data) = self.data.as_ref() {
            self.grid.free_chunks(renderer);
            self.grid.sync_layout(data.size(), &self.transform, renderer);
            self.grid
                .rebuild_dirty(data, self.scale, self.uv_scale, self.material, renderer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{brush::BrushMask, renderer::RecordingRenderer};
    use nalgebra::Vector2;

    #[test]
    fn detached_node_is_a_valid_empty_state() {
        let mut renderer = RecordingRenderer::new();
        let mut node = TerrainNode::new(16);

        let brush = Brush {
            mask: BrushMask::square(3),
            anchor: Vector2::new(4, 4),
            alpha: 1.0,
            mode: BrushMode::ModifyHeight,
        };
        assert_eq!(node.apply_brush(&brush, &mut renderer), 0);
        assert_eq!(node.update(&mut renderer), 0);
        assert!(node.set_size(64, &mut renderer).is_ok());
        assert_eq!(node.height_at(Vector3::new(1.0, 0.0, 1.0)), 0.0);
        assert_eq!(renderer.mesh_count(), 0);
    }

    #[test]
    fn attach_builds_everything_detach_frees_everything() {
        let mut renderer = RecordingRenderer::new();
        let mut node = TerrainNode::new(16);
        node.attach_data(TerrainData::new(32).unwrap(), &mut renderer);

        assert_eq!(renderer.mesh_count(), 4);
        assert_eq!(renderer.surfaces_added(), 4);
        assert!(node.grid().chunks().iter().all(|c| c.has_surface()));

        let data = node.detach_data(&mut renderer);
        assert!(data.is_some());
        assert_eq!(renderer.mesh_count(), 0);
    }

    #[test]
    fn resize_recreates_tiles_and_rejects_bad_sizes() {
        let mut renderer = RecordingRenderer::new();
        let mut node = TerrainNode::new(16);
        node.attach_data(TerrainData::new(32).unwrap(), &mut renderer);

        node.set_size(48, &mut renderer).unwrap();
        assert_eq!(node.grid().chunks_per_axis(), 3);
        assert_eq!(renderer.mesh_count(), 9);

        assert!(node.set_size(0, &mut renderer).is_err());
        assert_eq!(node.data().unwrap().size(), 48);
    }

    #[test]
    fn interior_brush_rebuilds_one_tile() {
        let mut renderer = RecordingRenderer::new();
        let mut node = TerrainNode::new(16);
        node.attach_data(TerrainData::new(32).unwrap(), &mut renderer);

        let brush = Brush {
            mask: BrushMask::square(3),
            anchor: Vector2::new(4, 4),
            alpha: 1.5,
            mode: BrushMode::ModifyHeight,
        };
        assert_eq!(node.apply_brush(&brush, &mut renderer), 1);
        assert_eq!(node.data().unwrap().heights().height(5, 5), 1.5);
    }

    #[test]
    fn blend_brush_marks_blend_flags_without_mesh_rebuild() {
        let mut renderer = RecordingRenderer::new();
        let mut node = TerrainNode::new(16);
        node.attach_data(TerrainData::new(32).unwrap(), &mut renderer);
        let baseline = renderer.surfaces_added();

        let brush = Brush {
            mask: BrushMask::square(2),
            anchor: Vector2::new(3, 3),
            alpha: 1.0,
            mode: BrushMode::PaintBlend { channel: 1 },
        };
        assert_eq!(node.apply_brush(&brush, &mut renderer), 0);
        assert_eq!(renderer.surfaces_added(), baseline);
        assert_eq!(node.grid_mut().take_blend_dirty(), vec![Vector2::new(0, 0)]);
    }

    #[test]
    fn smooth_brush_is_a_no_op() {
        let mut renderer = RecordingRenderer::new();
        let mut node = TerrainNode::new(16);
        node.attach_data(TerrainData::new(32).unwrap(), &mut renderer);
        let snapshot = node.data().unwrap().clone();

        let brush = Brush {
            mask: BrushMask::square(5),
            anchor: Vector2::new(10, 10),
            alpha: 3.0,
            mode: BrushMode::Smooth,
        };
        assert_eq!(node.apply_brush(&brush, &mut renderer), 0);
        assert_eq!(node.data().unwrap(), &snapshot);
    }

    #[test]
    fn transform_reaches_every_tile() {
        let mut renderer = RecordingRenderer::new();
        let mut node = TerrainNode::new(16);
        node.attach_data(TerrainData::new(32).unwrap(), &mut renderer);

        let transform = Matrix4::new_translation(&Vector3::new(5.0, 0.0, -2.0));
        node.set_transform(transform, &mut renderer);
        for chunk in node.grid().chunks() {
            let mesh = chunk.mesh().unwrap();
            assert_eq!(renderer.mesh(mesh).unwrap().transform, transform);
        }
    }

    #[test]
    fn height_queries_follow_scale() {
        let mut renderer = RecordingRenderer::new();
        let mut node = TerrainNode::new(16);
        node.attach_data(TerrainData::new(32).unwrap(), &mut renderer);
        node.modify_height_at(4, 6, 2.5, &mut renderer);

        assert_eq!(node.pixel_x_at(Vector3::new(4.2, 0.0, 6.1)), 4);
        assert_eq!(node.height_at(Vector3::new(4.2, 0.0, 6.1)), 2.5);

        node.set_scale(2.0, &mut renderer);
        assert_eq!(node.pixel_x_at(Vector3::new(8.4, 0.0, 12.2)), 4);
        assert_eq!(node.height_at(Vector3::new(8.4, 0.0, 12.2)), 2.5);
    }
}
