//! Injected renderer interface.
//!
//! The terrain core never talks to a graphics API; everything it produces
//! goes through [`TerrainRenderer`], which a host engine implements over its
//! own mesh/instance machinery. [`RecordingRenderer`] is a complete in-memory
//! implementation used by the test suite and by headless tools.

use crate::geometry::TerrainSurface;
use fxhash::FxHashMap;
use nalgebra::Matrix4;

/// Opaque handle of a renderer-side mesh, one per chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Opaque handle of a renderer-side material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// Sink for rebuilt terrain geometry. The renderer owns GPU upload; the core
/// only pairs every `create_mesh` with a `free` and never submits more than
/// one surface per mesh at a time.
pub trait TerrainRenderer {
    /// Allocates an empty renderer-side mesh and returns its handle.
    fn create_mesh(&mut self) -> MeshHandle;

    /// Retracts the surface currently bound to the mesh, if any.
    fn remove_surface(&mut self, mesh: MeshHandle);

    /// Binds a freshly built surface (and optionally a material) to the mesh.
    fn add_surface(
        &mut self,
        mesh: MeshHandle,
        surface: TerrainSurface,
        material: Option<MaterialHandle>,
    );

    /// Moves the mesh instance to the given world transform.
    fn set_transform(&mut self, mesh: MeshHandle, transform: Matrix4<f32>);

    /// Releases the mesh and everything bound to it.
    fn free(&mut self, mesh: MeshHandle);
}

/// Record of one live mesh inside [`RecordingRenderer`].
#[derive(Debug, Clone)]
pub struct MeshRecord {
    /// Last submitted surface with its material, if a surface is bound.
    pub surface: Option<(TerrainSurface, Option<MaterialHandle>)>,
    /// Last transform applied to the mesh.
    pub transform: Matrix4<f32>,
}

/// In-memory [`TerrainRenderer`] that records every submission. Besides
/// serving the tests it doubles as a null sink for headless processing.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    next_handle: u64,
    meshes: FxHashMap<MeshHandle, MeshRecord>,
    surfaces_added: usize,
}

impl RecordingRenderer {
    /// Creates an empty renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount of currently allocated meshes.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Total amount of `add_surface` calls over the renderer's lifetime,
    /// i.e. how many chunk rebuilds actually reached the renderer.
    pub fn surfaces_added(&self) -> usize {
        self.surfaces_added
    }

    /// Record of the given mesh, if it is alive.
    pub fn mesh(&self, mesh: MeshHandle) -> Option<&MeshRecord> {
        self.meshes.get(&mesh)
    }

    /// Surface currently bound to the given mesh.
    pub fn surface(&self, mesh: MeshHandle) -> Option<&TerrainSurface> {
        self.meshes
            .get(&mesh)
            .and_then(|record| record.surface.as_ref())
            .map(|(surface, _)| surface)
    }
}

impl TerrainRenderer for RecordingRenderer {
    fn create_mesh(&mut self) -> MeshHandle {
        let handle = MeshHandle(self.next_handle);
        self.next_handle += 1;
        self.meshes.insert(
            handle,
            MeshRecord {
                surface: None,
                transform: Matrix4::identity(),
            },
        );
        handle
    }

    fn remove_surface(&mut self, mesh: MeshHandle) {
        if let Some(record) = self.meshes.get_mut(&mesh) {
            record.surface = None;
        }
    }

    fn add_surface(
        &mut self,
        mesh: MeshHandle,
        surface: TerrainSurface,
        material: Option<MaterialHandle>,
    ) {
        if let Some(record) = self.meshes.get_mut(&mesh) {
            debug_assert!(record.surface.is_none(), "surface must be retracted first");
            record.surface = Some((surface, material));
            self.surfaces_added += 1;
        }
    }

    fn set_transform(&mut self, mesh: MeshHandle, transform: Matrix4<f32>) {
        if let Some(record) = self.meshes.get_mut(&mesh) {
            record.transform = transform;
        }
    }

    fn free(&mut self, mesh: MeshHandle) {
        self.meshes.remove(&mesh);
    }
}
