//! Chunked partitioning of the terrain with per-tile dirty tracking.
//!
//! The grid is what keeps edit latency independent of terrain size: a paint
//! operation only marks the tiles it touched, and the rebuild pass only
//! re-tessellates marked tiles.

use crate::{
    data::{SizeChangedListener, TerrainData},
    geometry::build_chunk_surface,
    renderer::{MaterialHandle, MeshHandle, TerrainRenderer},
};
use nalgebra::{Matrix4, Vector2};

/// Inclusive pixel rectangle `[x1, x2] × [y1, y2]` in raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge.
    pub x1: i32,
    /// Top edge.
    pub y1: i32,
    /// Right edge, inclusive.
    pub x2: i32,
    /// Bottom edge, inclusive.
    pub y2: i32,
}

impl PixelRect {
    /// Rectangle from inclusive corner coordinates.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle covering `width × height` pixels anchored at `(x, y)`.
    pub fn from_anchor(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width - 1, y + height - 1)
    }

    #[inline]
    fn intersects(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        self.x1 <= x2 && self.x2 >= x1 && self.y1 <= y2 && self.y2 >= y1
    }
}

/// One square tile of the terrain. Owns the renderer-side mesh handle for its
/// geometry and the staleness flags that drive incremental rebuilds.
#[derive(Debug)]
pub struct Chunk {
    grid_position: Vector2<i32>,
    mesh: Option<MeshHandle>,
    mesh_dirty: bool,
    blend_dirty: bool,
    surface_present: bool,
}

impl Chunk {
    /// Position of the tile in grid coordinates.
    pub fn grid_position(&self) -> Vector2<i32> {
        self.grid_position
    }

    /// Renderer-side mesh handle, held from tile creation to tile deletion.
    pub fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    /// True if the tile's geometry is stale relative to the height field.
    pub fn is_mesh_dirty(&self) -> bool {
        self.mesh_dirty
    }

    /// True if blend weights under the tile changed since the flag was last
    /// drained.
    pub fn is_blend_dirty(&self) -> bool {
        self.blend_dirty
    }

    /// True once geometry has been submitted for this tile.
    pub fn has_surface(&self) -> bool {
        self.surface_present
    }
}

/// Partition of the terrain into `M × M` square tiles of `chunk_size` cells,
/// where `M = size / chunk_size`.
///
/// Tile footprints are *inclusive* in height-sample coordinates: the tile at
/// `(cx, cy)` covers `[cx·S, cx·S+S] × [cy·S, cy·S+S]`, so neighboring tiles
/// overlap by one sample row/column. An edit on a shared boundary sample must
/// dirty every tile that renders it, otherwise the duplicated boundary
/// vertices of adjacent tiles drift apart and the seam cracks open.
#[derive(Debug)]
pub struct ChunkGrid {
    chunk_size: i32,
    chunks_per_axis: i32,
    chunks: Vec<Chunk>,
    layout_stale: bool,
}

impl SizeChangedListener for ChunkGrid {
    fn on_size_changed(&mut self) {
        self.layout_stale = true;
    }
}

impl ChunkGrid {
    /// Creates an empty grid; tiles appear on the first [`Self::sync_layout`].
    pub fn new(chunk_size: i32) -> Self {
        Self {
            chunk_size,
            chunks_per_axis: 0,
            chunks: Vec::new(),
            layout_stale: true,
        }
    }

    /// Tile side length in cells.
    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    /// Amount of tiles per axis.
    pub fn chunks_per_axis(&self) -> i32 {
        self.chunks_per_axis
    }

    /// All tiles, row-major.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Tile at the given grid coordinates.
    pub fn chunk(&self, cx: i32, cy: i32) -> Option<&Chunk> {
        if cx < 0 || cy < 0 || cx >= self.chunks_per_axis || cy >= self.chunks_per_axis {
            return None;
        }
        self.chunks.get((cy * self.chunks_per_axis + cx) as usize)
    }

    /// True if the tile layout no longer matches the terrain and must be
    /// re-created before the next rebuild.
    pub fn is_layout_stale(&self) -> bool {
        self.layout_stale
    }

    /// Re-creates the tile set for the given terrain size if the layout went
    /// stale: frees every existing mesh handle, then allocates one fresh mesh
    /// per tile (a scoped acquire/release pair over the tile lifecycle) and
    /// marks everything for rebuild.
    pub fn sync_layout(
        &mut self,
        size: i32,
        transform: &Matrix4<f32>,
        renderer: &mut dyn TerrainRenderer,
    ) {
        let chunks_per_axis = if self.chunk_size >= 1 && size >= 1 {
            size / self.chunk_size
        } else {
            0
        };
        if !self.layout_stale && chunks_per_axis == self.chunks_per_axis {
            return;
        }

        self.free_chunks(renderer);

        self.chunks_per_axis = chunks_per_axis;
        self.chunks.reserve((chunks_per_axis * chunks_per_axis) as usize);
        for cy in 0..chunks_per_axis {
            for cx in 0..chunks_per_axis {
                let mesh = renderer.create_mesh();
                renderer.set_transform(mesh, *transform);
                self.chunks.push(Chunk {
                    grid_position: Vector2::new(cx, cy),
                    mesh: Some(mesh),
                    mesh_dirty: true,
                    blend_dirty: false,
                    surface_present: false,
                });
            }
        }
        self.layout_stale = false;
        log::debug!(
            "chunk grid re-created: {0}x{0} tiles of {1} cells",
            chunks_per_axis,
            self.chunk_size
        );
    }

    /// Releases every tile and its renderer resources.
    pub fn free_chunks(&mut self, renderer: &mut dyn TerrainRenderer) {
        for chunk in self.chunks.drain(..) {
            if let Some(mesh) = chunk.mesh {
                renderer.free(mesh);
            }
        }
        self.chunks_per_axis = 0;
        self.layout_stale = true;
    }

    #[inline]
    fn mesh_footprint(&self, chunk: &Chunk) -> (i32, i32, i32, i32) {
        let x1 = chunk.grid_position.x * self.chunk_size;
        let y1 = chunk.grid_position.y * self.chunk_size;
        (x1, y1, x1 + self.chunk_size, y1 + self.chunk_size)
    }

    /// Marks every tile whose inclusive sample footprint contains the pixel.
    /// A pixel on a shared boundary dirties all adjoining tiles, which then
    /// independently regenerate the same duplicated vertex.
    pub fn mark_dirty_for_pixel(&mut self, x: i32, y: i32) {
        self.mark_dirty_rect(PixelRect::new(x, y, x, y));
    }

    /// Marks every tile whose inclusive sample footprint intersects the
    /// rectangle. Deliberately a superset of the minimal corner rule: missing
    /// a tile here shows up as a seam crack later.
    pub fn mark_dirty_rect(&mut self, rect: PixelRect) {
        for i in 0..self.chunks.len() {
            let (x1, y1, x2, y2) = self.mesh_footprint(&self.chunks[i]);
            if rect.intersects(x1, y1, x2, y2) {
                self.chunks[i].mesh_dirty = true;
            }
        }
    }

    /// Marks every tile for rebuild (scale change, attach, etc).
    pub fn mark_all_dirty(&mut self) {
        for chunk in self.chunks.iter_mut() {
            chunk.mesh_dirty = true;
        }
    }

    /// Marks the blend flag of every tile whose *cell* footprint intersects
    /// the rectangle. Blend cells do not overlap between tiles (unlike height
    /// samples): the tile at `(cx, cy)` owns cells `[cx·S, cx·S+S-1]`.
    pub fn mark_blend_dirty_rect(&mut self, rect: PixelRect) {
        for i in 0..self.chunks.len() {
            let (x1, y1, x2, y2) = self.mesh_footprint(&self.chunks[i]);
            if rect.intersects(x1, y1, x2 - 1, y2 - 1) {
                self.chunks[i].blend_dirty = true;
            }
        }
    }

    /// Drains the blend flags, returning the grid positions of tiles whose
    /// blend region changed. Re-uploading mask textures from those regions is
    /// the material layer's job, not the core's.
    pub fn take_blend_dirty(&mut self) -> Vec<Vector2<i32>> {
        let mut positions = Vec::new();
        for chunk in self.chunks.iter_mut() {
            if chunk.blend_dirty {
                chunk.blend_dirty = false;
                positions.push(chunk.grid_position);
            }
        }
        positions
    }

    /// Rebuilds every tile marked `mesh_dirty` and clears the marks. Clean
    /// tiles are not touched at all, so the cost of this pass is proportional
    /// to the amount of dirty tiles, not to the terrain size. Returns how many
    /// surfaces were rebuilt and submitted.
    pub fn rebuild_dirty(
        &mut self,
        data: &TerrainData,
        scale: f32,
        uv_scale: f32,
        material: Option<MaterialHandle>,
        renderer: &mut dyn TerrainRenderer,
    ) -> usize {
        let mut rebuilt = 0;
        for chunk in self.chunks.iter_mut() {
            if !chunk.mesh_dirty {
                continue;
            }
            if let Some(surface) = build_chunk_surface(
                data.heights(),
                chunk.grid_position,
                self.chunk_size,
                scale,
                uv_scale,
            ) {
                let mesh = *chunk.mesh.get_or_insert_with(|| renderer.create_mesh());
                if chunk.surface_present {
                    renderer.remove_surface(mesh);
                }
                renderer.add_surface(mesh, surface, material);
                chunk.surface_present = true;
                rebuilt += 1;
            }
            chunk.mesh_dirty = false;
        }
        if rebuilt > 0 {
            log::trace!("rebuilt {} of {} chunks", rebuilt, self.chunks.len());
        }
        rebuilt
    }

    /// Forwards a new world transform to every tile mesh.
    pub fn set_transform(&self, transform: &Matrix4<f32>, renderer: &mut dyn TerrainRenderer) {
        for chunk in self.chunks.iter() {
            if let Some(mesh) = chunk.mesh {
                renderer.set_transform(mesh, *transform);
            }
        }
    }
}
