//! Editable heightfield terrain core with incremental chunked mesh
//! regeneration.
//!
//! The crate maintains a paintable terrain surface — a packed fixed-point
//! [`HeightField`](heightfield::HeightField) plus a per-cell
//! [`BlendMap`](blendmap::BlendMap) of texture weights — and keeps its
//! renderable geometry up to date as the surface is edited. The terrain is
//! partitioned into square chunks; a brush stroke only invalidates the tiles
//! it touches and only those are re-tessellated, so edit latency depends on
//! the brush size, not on the terrain size.
//!
//! Rendering is abstracted behind [`renderer::TerrainRenderer`]: the crate
//! produces plain vertex/index arrays per chunk and hands them to whatever
//! implements that trait. [`renderer::RecordingRenderer`] is a ready-made
//! in-memory implementation for tests and headless tools.
//!
//! # Example
//!
//! ```
//! use terrain_edit::{
//!     algebra::Vector2,
//!     brush::{Brush, BrushMask, BrushMode},
//!     data::TerrainData,
//!     node::TerrainNode,
//!     renderer::RecordingRenderer,
//! };
//!
//! let mut renderer = RecordingRenderer::new();
//! let mut node = TerrainNode::new(16);
//! node.attach_data(TerrainData::new(32).unwrap(), &mut renderer);
//!
//! // Raise a small hill; only the tiles under the brush are rebuilt.
//! let rebuilt = node.apply_brush(
//!     &Brush {
//!         mask: BrushMask::smooth_circle(5),
//!         anchor: Vector2::new(10, 10),
//!         alpha: 2.0,
//!         mode: BrushMode::ModifyHeight,
//!     },
//!     &mut renderer,
//! );
//! assert_eq!(rebuilt, 1);
//! ```

#![warn(missing_docs)]

/// Linear algebra types used across the public API.
pub use nalgebra as algebra;

pub mod blendmap;
pub mod brush;
pub mod chunk;
pub mod data;
pub mod error;
pub mod geometry;
pub mod heightfield;
pub mod io;
pub mod node;
pub mod renderer;

pub use blendmap::BlendMap;
pub use brush::{Brush, BrushMask, BrushMode};
pub use chunk::{Chunk, ChunkGrid, PixelRect};
pub use data::{SizeChangedListener, TerrainData};
pub use error::TerrainError;
pub use geometry::TerrainSurface;
pub use heightfield::{HeightField, HEIGHT_SCALE, MAX_HEIGHT};
pub use node::TerrainNode;
pub use renderer::{MaterialHandle, MeshHandle, RecordingRenderer, TerrainRenderer};
