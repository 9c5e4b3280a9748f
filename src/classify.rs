use std::cmp::Ordering;

use snafu::ensure;

use crate::{
    boundary::{above, vertical_order, Vertex, VertexId, VertexState},
    triangulator::{CoincidentVerticesSnafu, TriangulatorError},
    vec2::is_right_turn,
};

/// Tags `v` from its ring predecessor `p` and successor `s`.
pub(crate) fn label(p: &Vertex, v: &Vertex, s: &Vertex) -> Result<VertexState, TriangulatorError> {
    ensure!(
        vertical_order(p, v) != Ordering::Equal && vertical_order(v, s) != Ordering::Equal,
        CoincidentVerticesSnafu { index: v.index }
    );

    let state = match (above(p, v), above(v, s)) {
        (true, true) => VertexState::RegularLeft,
        (true, false) if is_right_turn(p.pos, v.pos, s.pos) => VertexState::Merge,
        (true, false) => VertexState::End,
        (false, true) if is_right_turn(p.pos, v.pos, s.pos) => VertexState::Split,
        (false, true) => VertexState::Start,
        (false, false) => VertexState::RegularRight,
    };
    Ok(state)
}

/// Labels every vertex of every contour using its own cyclic neighbours.
pub(crate) fn classify(
    vertices: &mut [Vertex],
    sequence: &[VertexId],
    lengths: &[usize],
) -> Result<(), TriangulatorError> {
    let mut offset = 0;
    for &len in lengths {
        let ring = &sequence[offset..offset + len];
        for i in 0..len {
            let p = &vertices[ring[(i + len - 1) % len].0];
            let v = &vertices[ring[i].0];
            let s = &vertices[ring[(i + 1) % len].0];
            let state = label(p, v, s)?;
            vertices[ring[i].0].state = state;
        }
        offset += len;
    }
    Ok(())
}
