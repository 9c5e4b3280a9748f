mod boundary;
mod classify;
mod monotone;
pub mod rbtree;
mod sweep;
mod triangulator;
mod vec2;

pub use {
    boundary::VertexState,
    triangulator::{
        triangulate_polygon, Contour, Triangulation, TriangulationListener, Triangulator,
        TriangulatorError,
    },
    vec2::{is_right_turn, Orientation, Vec2},
};

#[cfg(test)]
mod test;
