use std::cmp::Ordering;

use log::trace;
use snafu::{ensure, OptionExt};

use crate::{
    boundary::{above, Boundary, EdgeId, VertexId, VertexState},
    monotone::triangulate_monotone,
    rbtree::RbTreeSet,
    triangulator::{
        DuplicateActiveEdgeSnafu, MissingActiveEdgeSnafu, NoLeftNeighbourSnafu,
        TriangulationListener, TriangulatorError, UnorderedEdgesSnafu,
    },
    vec2::{Orientation, Vec2},
};

fn decisive(a: Orientation, b: Orientation) -> Option<Orientation> {
    match (a, b) {
        (Orientation::Collinear, Orientation::Collinear) => None,
        (a, Orientation::Collinear) => Some(a),
        (Orientation::Collinear, b) => Some(b),
        (a, b) if a == b => Some(a),
        _ => None,
    }
}

fn ordering(orientation: Orientation) -> Ordering {
    match orientation {
        Orientation::Clockwise => Ordering::Greater,
        Orientation::CounterClockwise => Ordering::Less,
        Orientation::Collinear => Ordering::Equal,
    }
}

/// Left-to-right order of two edges crossing the sweep line.
///
/// An edge is less than another if it lies to its left. Collinear edges are
/// ordered by their start vertices along the sweep.
pub(crate) fn compare_edges(
    boundary: &Boundary,
    e1: EdgeId,
    e2: EdgeId,
) -> Result<Ordering, TriangulatorError> {
    if e1 == e2 {
        return Ok(Ordering::Equal);
    }

    let first = boundary.edge(e1);
    let second = boundary.edge(e2);
    let (s1, t1) = (boundary.vertex(first.start), boundary.vertex(first.end));
    let (s2, t2) = (boundary.vertex(second.start), boundary.vertex(second.end));

    let e1a = Orientation::of(s1.pos, t1.pos, s2.pos);
    let e1b = Orientation::of(s1.pos, t1.pos, t2.pos);
    if let Some(side) = decisive(e1a, e1b) {
        return Ok(ordering(side));
    }

    let e2a = Orientation::of(s2.pos, t2.pos, s1.pos);
    let e2b = Orientation::of(s2.pos, t2.pos, t1.pos);
    if let Some(side) = decisive(e2a, e2b) {
        return Ok(ordering(side).reverse());
    }

    let collinear = [e1a, e1b, e2a, e2b]
        .iter()
        .all(|&o| o == Orientation::Collinear);
    if collinear {
        if above(s1, s2) && (above(t1, s2) || t1.pos == s2.pos) {
            return Ok(Ordering::Less);
        }
        if above(s2, s1) && (above(t2, s1) || t2.pos == s1.pos) {
            return Ok(Ordering::Greater);
        }
    }

    UnorderedEdgesSnafu {
        first: (s1.index, t1.index),
        second: (s2.index, t2.index),
    }
    .fail()
}

fn edge_indices(boundary: &Boundary, edge: EdgeId) -> (usize, usize) {
    let edge = boundary.edge(edge);
    (
        boundary.vertex(edge.start).index,
        boundary.vertex(edge.end).index,
    )
}

/// Where `point` lies relative to the active edge `edge`: `Greater` if to its
/// right, `Less` if to its left.
fn side_of(boundary: &Boundary, edge: EdgeId, point: Vec2) -> Ordering {
    let edge = boundary.edge(edge);
    let start = boundary.vertex(edge.start).pos;
    let end = boundary.vertex(edge.end).pos;
    ordering(Orientation::of(start, end, point)).reverse()
}

/// Sweeps the boundary top to bottom, splitting it into y-monotone faces and
/// handing every closed face to the monotone pass.
pub(crate) struct SweepPartitioner<'a> {
    boundary: &'a mut Boundary,
    status: RbTreeSet<EdgeId>,
    listener: &'a mut dyn TriangulationListener,
}

impl<'a> SweepPartitioner<'a> {
    pub(crate) fn new(
        boundary: &'a mut Boundary,
        listener: &'a mut dyn TriangulationListener,
    ) -> Self {
        Self {
            boundary,
            status: RbTreeSet::new(),
            listener,
        }
    }

    /// Processes `order`, which must list every vertex in top-down order.
    pub(crate) fn run(mut self, order: &[VertexId]) -> Result<(), TriangulatorError> {
        for &v in order {
            let state = self.boundary.vertex(v).state;
            trace!(
                "sweep vertex {} ({:?}), {} active edges",
                self.boundary.vertex(v).index,
                state,
                self.status.len()
            );
            match state {
                VertexState::Start => self.start(v)?,
                VertexState::End => self.end(v)?,
                VertexState::Split => self.split(v)?,
                VertexState::Merge => self.merge(v)?,
                VertexState::RegularLeft => self.regular_left(v)?,
                VertexState::RegularRight => self.regular_right(v)?,
            }
        }
        Ok(())
    }

    fn start(&mut self, v: VertexId) -> Result<(), TriangulatorError> {
        let ei = self.boundary.vertex(v).incident;
        self.activate(ei, v)
    }

    fn end(&mut self, v: VertexId) -> Result<(), TriangulatorError> {
        let ei = self.boundary.vertex(v).incident;
        let eim1 = self.boundary.vertex(v).previous;
        self.close_merge_helper(ei, eim1)?;
        let partner = self.boundary.edge(ei).partner;
        triangulate_monotone(self.boundary, partner, self.listener)?;
        self.deactivate(eim1)
    }

    fn split(&mut self, v: VertexId) -> Result<(), TriangulatorError> {
        let ei = self.boundary.vertex(v).incident;
        let ej = self.left_neighbour(v)?;

        let from = self.boundary.edge(ei).partner;
        let to = self.boundary.edge(ej).helper_edge;
        let diagonal = self.boundary.splice(from, to, self.listener);
        let edge = self.boundary.edge_mut(ej);
        edge.helper = v;
        edge.helper_edge = diagonal;

        self.activate(ei, v)
    }

    fn merge(&mut self, v: VertexId) -> Result<(), TriangulatorError> {
        let ei = self.boundary.vertex(v).incident;
        let eim1 = self.boundary.vertex(v).previous;
        self.close_merge_helper(ei, eim1)?;
        self.deactivate(eim1)?;
        self.update_left_neighbour(v, ei)
    }

    fn regular_left(&mut self, v: VertexId) -> Result<(), TriangulatorError> {
        let ei = self.boundary.vertex(v).incident;
        let eim1 = self.boundary.vertex(v).previous;
        self.close_merge_helper(ei, eim1)?;
        self.deactivate(eim1)?;
        self.activate(ei, v)
    }

    fn regular_right(&mut self, v: VertexId) -> Result<(), TriangulatorError> {
        let ei = self.boundary.vertex(v).incident;
        self.update_left_neighbour(v, ei)
    }

    /// Connects `v` to the MERGE helper of the edge arriving at it, if any,
    /// and triangulates the face that closes.
    fn close_merge_helper(&mut self, ei: EdgeId, eim1: EdgeId) -> Result<(), TriangulatorError> {
        if self.boundary.helper_state(eim1) != VertexState::Merge {
            return Ok(());
        }
        let from = self.boundary.edge(ei).partner;
        let to = self.boundary.edge(eim1).helper_edge;
        self.boundary.splice(from, to, self.listener);
        let closed = self.boundary.edge(eim1).partner;
        triangulate_monotone(self.boundary, closed, self.listener)
    }

    /// Makes `v` the helper of the edge to its left, first connecting it to
    /// that edge's helper if the helper is a MERGE vertex.
    fn update_left_neighbour(&mut self, v: VertexId, ei: EdgeId) -> Result<(), TriangulatorError> {
        let ej = self.left_neighbour(v)?;
        let from = self.boundary.edge(ei).partner;
        if self.boundary.helper_state(ej) == VertexState::Merge {
            let to = self.boundary.edge(ej).helper_edge;
            let diagonal = self.boundary.splice(from, to, self.listener);
            let edge = self.boundary.edge_mut(ej);
            edge.helper = v;
            edge.helper_edge = diagonal;
            triangulate_monotone(self.boundary, from, self.listener)
        } else {
            let edge = self.boundary.edge_mut(ej);
            edge.helper = v;
            edge.helper_edge = from;
            Ok(())
        }
    }

    fn left_neighbour(&self, v: VertexId) -> Result<EdgeId, TriangulatorError> {
        let point = self.boundary.vertex(v).pos;
        let boundary = &*self.boundary;
        self.status
            .find_left_neighbour(|&edge| side_of(boundary, edge, point))
            .context(NoLeftNeighbourSnafu {
                vertex: boundary.vertex(v).index,
            })
    }

    fn activate(&mut self, edge: EdgeId, helper: VertexId) -> Result<(), TriangulatorError> {
        let partner = self.boundary.edge(edge).partner;
        let record = self.boundary.edge_mut(edge);
        record.helper = helper;
        record.helper_edge = partner;

        let boundary = &*self.boundary;
        let inserted = self
            .status
            .insert(edge, |a, b| compare_edges(boundary, *a, *b))?;
        ensure!(
            inserted,
            DuplicateActiveEdgeSnafu {
                edge: edge_indices(boundary, edge),
            }
        );
        Ok(())
    }

    fn deactivate(&mut self, edge: EdgeId) -> Result<(), TriangulatorError> {
        let boundary = &*self.boundary;
        let removed = self
            .status
            .remove(&edge, |a, b| compare_edges(boundary, *a, *b))?;
        ensure!(
            removed,
            MissingActiveEdgeSnafu {
                edge: edge_indices(boundary, edge),
            }
        );
        Ok(())
    }
}
