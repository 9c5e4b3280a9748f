use log::trace;
use snafu::ensure;

use crate::{
    boundary::{above, Boundary, HalfEdgeId},
    triangulator::{DegenerateFaceSnafu, TriangulationListener, TriangulatorError},
    vec2::{Orientation, Vec2},
};

fn is_left(boundary: &Boundary, he: HalfEdgeId) -> bool {
    boundary.vertex(boundary.origin(he)).is_left
}

fn pos(boundary: &Boundary, he: HalfEdgeId) -> Vec2 {
    boundary.vertex(boundary.origin(he)).pos
}

fn emit(
    boundary: &Boundary,
    listener: &mut dyn TriangulationListener,
    a: HalfEdgeId,
    b: HalfEdgeId,
    c: HalfEdgeId,
) {
    listener.add_triangle(
        boundary.index_of(a),
        boundary.index_of(b),
        boundary.index_of(c),
    );
}

/// Orders the ring of a y-monotone face top to bottom, tagging every vertex
/// between the ends with the chain it belongs to.
fn merge_chains(boundary: &mut Boundary, start: HalfEdgeId) -> Vec<HalfEdgeId> {
    let mut top = start;
    for he in boundary.ring(start) {
        if above(
            boundary.vertex(boundary.origin(he)),
            boundary.vertex(boundary.origin(top)),
        ) {
            top = he;
        }
    }

    let mut sequence = vec![top];
    let mut left = boundary.next(top);
    let mut right = boundary.prev(top);
    while left != right {
        let left_vertex = boundary.origin(left);
        let right_vertex = boundary.origin(right);
        if above(boundary.vertex(left_vertex), boundary.vertex(right_vertex)) {
            boundary.vertex_mut(left_vertex).is_left = true;
            sequence.push(left);
            left = boundary.next(left);
        } else {
            boundary.vertex_mut(right_vertex).is_left = false;
            sequence.push(right);
            right = boundary.prev(right);
        }
    }
    sequence.push(right);
    sequence
}

/// Triangulates the y-monotone face whose ring contains `start`.
///
/// Every triangulating diagonal is spliced into the rings and reported to the
/// listener before its triangle. Triangles are emitted counter-clockwise.
pub(crate) fn triangulate_monotone(
    boundary: &mut Boundary,
    start: HalfEdgeId,
    listener: &mut dyn TriangulationListener,
) -> Result<(), TriangulatorError> {
    let len = boundary.ring(start).count();
    ensure!(
        len >= 3,
        DegenerateFaceSnafu {
            vertex: boundary.index_of(start),
            len,
        }
    );

    let sequence = merge_chains(boundary, start);
    trace!(
        "monotone face of {} vertices from {} to {}",
        len,
        boundary.index_of(sequence[0]),
        boundary.index_of(sequence[sequence.len() - 1]),
    );

    let mut stack = vec![sequence[0], sequence[1]];
    for &current in &sequence[2..sequence.len() - 1] {
        let mut uj = current;
        let last = stack[stack.len() - 1];

        if is_left(boundary, uj) != is_left(boundary, last) {
            // opposite chain: fan out to everything on the stack
            for k in (1..stack.len()).rev() {
                let popped = stack[k];
                let below = stack[k - 1];
                boundary.splice(uj, popped, listener);
                if is_left(boundary, popped) {
                    emit(boundary, listener, uj, below, popped);
                } else {
                    emit(boundary, listener, uj, popped, below);
                }
            }
            stack.clear();
            stack.push(boundary.prev(last).twin());
            stack.push(uj);
        } else {
            // same chain: cut off ears while the turn stays inside the face
            let inward = if is_left(boundary, uj) {
                Orientation::Clockwise
            } else {
                Orientation::CounterClockwise
            };
            let mut temp = last;
            stack.truncate(stack.len() - 1);
            while let Some(&peek) = stack.last() {
                let turn = Orientation::of(
                    pos(boundary, uj),
                    pos(boundary, temp),
                    pos(boundary, peek),
                );
                if turn != inward {
                    break;
                }
                stack.pop();
                boundary.splice(uj, peek, listener);
                if is_left(boundary, temp) {
                    emit(boundary, listener, peek, temp, uj);
                } else {
                    emit(boundary, listener, temp, peek, uj);
                }
                uj = boundary.prev(uj).twin();
                temp = peek;
            }
            stack.push(temp);
            stack.push(uj);
        }
    }

    // drain the stack against the bottom vertex
    let bottom = sequence[sequence.len() - 1];
    let mut temp = stack[stack.len() - 1];
    for k in (1..stack.len() - 1).rev() {
        let popped = stack[k];
        boundary.splice(bottom, popped, listener);
        if is_left(boundary, temp) {
            emit(boundary, listener, popped, temp, bottom);
        } else {
            emit(boundary, listener, temp, popped, bottom);
        }
        temp = popped;
    }
    let first = stack[0];
    if is_left(boundary, temp) {
        emit(boundary, listener, first, temp, bottom);
    } else {
        emit(boundary, listener, temp, first, bottom);
    }
    Ok(())
}
