//! End-to-end editing scenario over a 2x2 chunk grid.

use terrain_edit::{
    algebra::{Vector2, Vector3},
    brush::{Brush, BrushMask, BrushMode},
    data::TerrainData,
    node::TerrainNode,
    renderer::RecordingRenderer,
};

fn make_node(renderer: &mut RecordingRenderer) -> TerrainNode {
    let mut node = TerrainNode::new(16);
    node.attach_data(TerrainData::new(32).unwrap(), renderer);
    node
}

#[test]
fn boundary_straddling_stroke_rebuilds_all_four_tiles() {
    let mut renderer = RecordingRenderer::new();
    let mut node = make_node(&mut renderer);
    let initial_15 = node.data().unwrap().heights().height(15, 15);
    let initial_16 = node.data().unwrap().heights().height(16, 16);

    // 3x3 saturated mask anchored at (15, 15) covers samples 15..=17 and so
    // straddles the shared boundary sample 16 of all four tiles.
    let rebuilt = node.apply_brush(
        &Brush {
            mask: BrushMask::square(3),
            anchor: Vector2::new(15, 15),
            alpha: 2.0,
            mode: BrushMode::ModifyHeight,
        },
        &mut renderer,
    );
    assert_eq!(rebuilt, 4);

    let heights = node.data().unwrap().heights();
    assert_eq!(heights.height(15, 15), initial_15 + 2.0);
    assert_eq!(heights.height(16, 16), initial_16 + 2.0);

    // Every flag cleared, geometry current: the next pass has nothing to do.
    assert!(node.grid().chunks().iter().all(|c| !c.is_mesh_dirty()));
    assert_eq!(node.update(&mut renderer), 0);
}

#[test]
fn adjacent_tiles_agree_bit_exactly_on_shared_vertices() {
    let mut renderer = RecordingRenderer::new();
    let mut node = make_node(&mut renderer);

    node.apply_brush(
        &Brush {
            mask: BrushMask::smooth_circle(7),
            anchor: Vector2::new(13, 5),
            alpha: 3.5,
            mode: BrushMode::ModifyHeight,
        },
        &mut renderer,
    );

    let left_mesh = node.grid().chunk(0, 0).unwrap().mesh().unwrap();
    let right_mesh = node.grid().chunk(1, 0).unwrap().mesh().unwrap();
    let left = renderer.surface(left_mesh).unwrap();
    let right = renderer.surface(right_mesh).unwrap();

    // Column x = 16 is the last vertex column of the left tile and the first
    // one of the right tile; positions must be bit-identical.
    let side = 17usize;
    for row in 0..side {
        let a = left.positions[row * side + side - 1];
        let b = right.positions[row * side];
        assert_eq!(a, b, "row {}", row);
    }
}

#[test]
fn interior_edits_leave_remote_tiles_untouched() {
    let mut renderer = RecordingRenderer::new();
    let mut node = make_node(&mut renderer);
    let far_mesh = node.grid().chunk(1, 1).unwrap().mesh().unwrap();
    let far_before = renderer.surface(far_mesh).unwrap().clone();

    for stamp in 0..5 {
        node.apply_brush(
            &Brush {
                mask: BrushMask::circle(5),
                anchor: Vector2::new(2 + stamp, 3),
                alpha: 0.4,
                mode: BrushMode::ModifyHeight,
            },
            &mut renderer,
        );
    }

    assert_eq!(renderer.surface(far_mesh).unwrap(), &far_before);
}

#[test]
fn painted_hill_is_visible_to_height_queries() {
    let mut renderer = RecordingRenderer::new();
    let mut node = make_node(&mut renderer);

    node.apply_brush(
        &Brush {
            mask: BrushMask::square(1),
            anchor: Vector2::new(8, 8),
            alpha: 4.0,
            mode: BrushMode::ModifyHeight,
        },
        &mut renderer,
    );

    assert_eq!(node.height_at(Vector3::new(8.0, 0.0, 8.0)), 4.0);
}
