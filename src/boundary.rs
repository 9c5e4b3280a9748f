//! Boundary model: vertices, boundary edges and the half-edge rings that link
//! them (a minimal DCEL).
//!
//! Every record lives in an arena owned by [`Boundary`] and is addressed by a
//! stable handle. Half-edges are allocated in twin pairs, so the twin of
//! half-edge `h` is always `h ^ 1`.

use std::cmp::Ordering;

use crate::{triangulator::TriangulationListener, vec2::Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct VertexId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct EdgeId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct HalfEdgeId(pub(crate) usize);

impl HalfEdgeId {
    #[inline]
    pub(crate) fn twin(self) -> HalfEdgeId {
        HalfEdgeId(self.0 ^ 1)
    }
}

/// Classification of a boundary vertex relative to the downward sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexState {
    Start,
    End,
    Split,
    Merge,
    RegularLeft,
    RegularRight,
}

impl VertexState {
    /// The tag the same vertex gets when its ring is walked the other way round.
    pub fn complement(self) -> Self {
        match self {
            VertexState::Start => VertexState::Split,
            VertexState::Split => VertexState::Start,
            VertexState::End => VertexState::Merge,
            VertexState::Merge => VertexState::End,
            VertexState::RegularLeft => VertexState::RegularRight,
            VertexState::RegularRight => VertexState::RegularLeft,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Vertex {
    /// Position in the combined input, reported to listeners
    pub(crate) index: usize,
    pub(crate) pos: Vec2,
    pub(crate) state: VertexState,
    /// Chain membership, only meaningful inside one monotone pass
    pub(crate) is_left: bool,
    /// Boundary edge leaving this vertex
    pub(crate) incident: EdgeId,
    /// Boundary edge arriving at this vertex
    pub(crate) previous: EdgeId,
}

impl Vertex {
    pub(crate) fn new(index: usize, pos: Vec2) -> Self {
        Self {
            index,
            pos,
            state: VertexState::RegularLeft,
            is_left: false,
            incident: EdgeId(0),
            previous: EdgeId(0),
        }
    }
}

/// Strict top-down order: higher y first, then smaller x, then smaller input
/// index. Only a vertex compared with itself yields `Equal`.
pub(crate) fn vertical_order(a: &Vertex, b: &Vertex) -> Ordering {
    if a.pos.y > b.pos.y {
        Ordering::Less
    } else if a.pos.y < b.pos.y {
        Ordering::Greater
    } else if a.pos.x < b.pos.x {
        Ordering::Less
    } else if a.pos.x > b.pos.x {
        Ordering::Greater
    } else {
        a.index.cmp(&b.index)
    }
}

#[inline]
pub(crate) fn above(a: &Vertex, b: &Vertex) -> bool {
    vertical_order(a, b) == Ordering::Less
}

#[derive(Clone, Debug)]
pub(crate) struct Edge {
    pub(crate) start: VertexId,
    pub(crate) end: VertexId,
    /// Sweep scratch state, see `SweepPartitioner`
    pub(crate) helper: VertexId,
    pub(crate) helper_edge: HalfEdgeId,
    /// Boundary half-edge running from `start` to `end`
    pub(crate) partner: HalfEdgeId,
}

#[derive(Clone, Debug)]
pub(crate) struct HalfEdge {
    pub(crate) origin: VertexId,
    pub(crate) next: HalfEdgeId,
    pub(crate) prev: HalfEdgeId,
}

pub(crate) struct Boundary {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) half_edges: Vec<HalfEdge>,
}

impl Boundary {
    /// Builds one ring per contour. `sequence` lists the vertices of all
    /// contours back to back, `lengths` splits it into contours.
    pub(crate) fn new(mut vertices: Vec<Vertex>, sequence: &[VertexId], lengths: &[usize]) -> Self {
        let count = sequence.len();
        let mut edges = Vec::with_capacity(count);
        let mut half_edges = Vec::with_capacity(count * 2);

        let mut offset = 0;
        for &len in lengths {
            let ring = &sequence[offset..offset + len];
            for i in 0..len {
                let next = (i + 1) % len;
                let prev = (i + len - 1) % len;
                let he = HalfEdgeId((offset + i) * 2);
                let he_next = HalfEdgeId((offset + next) * 2);
                let he_prev = HalfEdgeId((offset + prev) * 2);

                // inner ring follows the contour, its twin ring runs backwards
                half_edges.push(HalfEdge {
                    origin: ring[i],
                    next: he_next,
                    prev: he_prev,
                });
                half_edges.push(HalfEdge {
                    origin: ring[next],
                    next: he_prev.twin(),
                    prev: he_next.twin(),
                });

                edges.push(Edge {
                    start: ring[i],
                    end: ring[next],
                    helper: ring[i],
                    helper_edge: he,
                    partner: he,
                });

                let vertex = &mut vertices[ring[i].0];
                vertex.incident = EdgeId(offset + i);
                vertex.previous = EdgeId(offset + prev);
            }
            offset += len;
        }

        Self {
            vertices,
            edges,
            half_edges,
        }
    }

    #[inline]
    pub(crate) fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0]
    }

    #[inline]
    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.0]
    }

    #[inline]
    pub(crate) fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    #[inline]
    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.0]
    }

    #[inline]
    pub(crate) fn origin(&self, he: HalfEdgeId) -> VertexId {
        self.half_edges[he.0].origin
    }

    #[inline]
    pub(crate) fn next(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.half_edges[he.0].next
    }

    #[inline]
    pub(crate) fn prev(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.half_edges[he.0].prev
    }

    /// State of the helper vertex currently attached to `edge`.
    pub(crate) fn helper_state(&self, edge: EdgeId) -> VertexState {
        self.vertex(self.edge(edge).helper).state
    }

    /// Input index of the vertex a half-edge starts at.
    pub(crate) fn index_of(&self, he: HalfEdgeId) -> usize {
        self.vertex(self.origin(he)).index
    }

    /// Connects the origins of `a` and `b` with a new pair of twin half-edges.
    ///
    /// ```text
    /// ^           +  b       ^       e2  +  b
    ///  \          |           \         ^|
    ///   \         |            \       / |
    ///    \        |    =>       \     /  |
    ///     \       |              \   /   |
    ///      \      |               \ v    |
    ///    a  +     v             a  + e1  v
    /// ```
    ///
    /// `e1` runs from `a` to `b` and continues into `b`, `e2` runs back and
    /// continues into `a`. If `a` and `b` share a ring it is split in two,
    /// otherwise the two rings are joined. Returns `e1`.
    pub(crate) fn splice(
        &mut self,
        a: HalfEdgeId,
        b: HalfEdgeId,
        listener: &mut dyn TriangulationListener,
    ) -> HalfEdgeId {
        let a_prev = self.prev(a);
        let b_prev = self.prev(b);
        let e1 = HalfEdgeId(self.half_edges.len());
        let e2 = e1.twin();

        self.half_edges.push(HalfEdge {
            origin: self.origin(a),
            next: b,
            prev: a_prev,
        });
        self.half_edges.push(HalfEdge {
            origin: self.origin(b),
            next: a,
            prev: b_prev,
        });

        self.half_edges[a_prev.0].next = e1;
        self.half_edges[a.0].prev = e2;
        self.half_edges[b_prev.0].next = e2;
        self.half_edges[b.0].prev = e1;

        listener.add_edge(self.index_of(a), self.index_of(b));
        e1
    }

    /// Walks the ring containing `start`, beginning at `start`.
    pub(crate) fn ring(&self, start: HalfEdgeId) -> Ring<'_> {
        Ring {
            boundary: self,
            start,
            current: Some(start),
        }
    }
}

pub(crate) struct Ring<'a> {
    boundary: &'a Boundary,
    start: HalfEdgeId,
    current: Option<HalfEdgeId>,
}

impl Iterator for Ring<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        let current = self.current?;
        let next = self.boundary.next(current);
        self.current = (next != self.start).then_some(next);
        Some(current)
    }
}
