//! Per-chunk tessellation of the height field into renderable geometry.

use crate::heightfield::HeightField;
use nalgebra::{Vector2, Vector3};

/// Geometry of one rebuilt chunk, ready for renderer ingest as a single
/// replacement surface. Buffers are parallel: one position, normal and UV per
/// vertex, indices in triangle triplets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerrainSurface {
    /// Vertex positions; `x`/`z` span the chunk footprint, `y` is the decoded
    /// sample height, everything multiplied by the terrain scale.
    pub positions: Vec<Vector3<f32>>,
    /// Smoothed per-vertex normals.
    pub normals: Vec<Vector3<f32>>,
    /// Texture coordinates over the whole terrain, so adjoining chunks sample
    /// one continuous image.
    pub uvs: Vec<Vector2<f32>>,
    /// Triangle list indices into the vertex buffers.
    pub indices: Vec<u32>,
}

/// Builds the surface for the chunk at `grid_position` in a grid of
/// `chunk_size`-cell tiles.
///
/// The footprint covers `(chunk_size + 1)²` samples: the last sample row and
/// column of a chunk are the first ones of its neighbors. Both sides decode
/// the very same packed sample, so the duplicated boundary vertices come out
/// bit-identical and adjoining tiles render seamlessly despite having
/// independent vertex buffers.
///
/// Returns `None` for degenerate requests (non-positive chunk size or an
/// empty field).
pub fn build_chunk_surface(
    field: &HeightField,
    grid_position: Vector2<i32>,
    chunk_size: i32,
    scale: f32,
    uv_scale: f32,
) -> Option<TerrainSurface> {
    if chunk_size < 1 || field.size() < 1 {
        return None;
    }

    let x1 = grid_position.x * chunk_size;
    let y1 = grid_position.y * chunk_size;
    let side = chunk_size + 1;
    let uv_denominator = (field.size() - 1).max(1) as f32;

    let mut surface = TerrainSurface {
        positions: Vec::with_capacity((side * side) as usize),
        normals: vec![Vector3::zeros(); (side * side) as usize],
        uvs: Vec::with_capacity((side * side) as usize),
        indices: Vec::with_capacity((chunk_size * chunk_size * 6) as usize),
    };

    // Vertices, row-major over the inclusive footprint.
    for y in y1..=y1 + chunk_size {
        for x in x1..=x1 + chunk_size {
            let height = field.height(x, y);
            surface
                .positions
                .push(Vector3::new(x as f32 * scale, height * scale, y as f32 * scale));
            surface.uvs.push(
                Vector2::new(x as f32 / uv_denominator, y as f32 / uv_denominator) * uv_scale,
            );
        }
    }

    // Two triangles per quad with a fixed diagonal. The winding must stay
    // exactly like this: lighting parity with existing renders depends on it.
    for qy in 0..chunk_size as u32 {
        for qx in 0..chunk_size as u32 {
            let off = qy * side as u32 + qx;
            let s = chunk_size as u32;
            surface.indices.extend_from_slice(&[off, off + s + 2, off + 1]);
            surface.indices.extend_from_slice(&[off, off + s + 1, off + s + 2]);
        }
    }

    // Smooth normals: accumulate the normalized face normal of every incident
    // triangle, then normalize the sums. A vertex no valid triangle touches
    // falls back to straight up instead of producing NaN.
    for triangle in surface.indices.chunks_exact(3) {
        let v0 = surface.positions[triangle[0] as usize];
        let v1 = surface.positions[triangle[1] as usize];
        let v2 = surface.positions[triangle[2] as usize];
        if let Some(face_normal) = (v1 - v0).cross(&(v2 - v0)).try_normalize(f32::EPSILON) {
            for &index in triangle {
                surface.normals[index as usize] += face_normal;
            }
        }
    }
    for normal in surface.normals.iter_mut() {
        *normal = normal
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::y);
    }

    Some(surface)
}
