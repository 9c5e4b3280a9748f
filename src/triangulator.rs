use log::debug;
use snafu::{ensure, Snafu};

use crate::{
    boundary::{vertical_order, Boundary, Vertex, VertexId, VertexState},
    classify::classify,
    sweep::SweepPartitioner,
    vec2::Vec2,
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TriangulatorError {
    #[snafu(display("nothing to triangulate"))]
    EmptyInput,
    #[snafu(display("contour {} has {} points, at least 3 are required", contour, len))]
    ContourTooShort { contour: usize, len: usize },
    #[snafu(display("point {} has a non-finite coordinate", index))]
    NonFiniteCoordinate { index: usize },
    #[snafu(display("point {} cannot be ordered against its ring neighbours", index))]
    CoincidentVertices { index: usize },
    #[snafu(display("active edges {:?} and {:?} cannot be ordered", first, second))]
    UnorderedEdges {
        first: (usize, usize),
        second: (usize, usize),
    },
    #[snafu(display("edge {:?} is already active", edge))]
    DuplicateActiveEdge { edge: (usize, usize) },
    #[snafu(display("edge {:?} is not active", edge))]
    MissingActiveEdge { edge: (usize, usize) },
    #[snafu(display("no active edge left of point {}", vertex))]
    NoLeftNeighbour { vertex: usize },
    #[snafu(display("topmost vertex is {:?} after orientation correction", state))]
    UnexpectedTopVertex { state: VertexState },
    #[snafu(display("face at point {} has only {} vertices", vertex, len))]
    DegenerateFace { vertex: usize, len: usize },
}

/// A closed loop of points. The closing point is not repeated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    points: Vec<Vec2>,
}

impl Contour {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Vec2> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Flips the winding of the loop.
    pub fn reverse(mut self) -> Self {
        self.points.reverse();
        self
    }
}

impl<P: Into<Vec2>> FromIterator<P> for Contour {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Receives the output of [`Triangulator::calculate`] as it is produced.
///
/// Indices refer to the points of all contours, concatenated in the order the
/// contours were added.
pub trait TriangulationListener {
    /// The input was wound the wrong way round and is processed reversed.
    /// Fired at most once, before any other event.
    fn reversing(&mut self) {}

    /// A diagonal between two input points was inserted.
    fn add_edge(&mut self, _a: usize, _b: usize) {}

    /// A triangle was emitted, counter-clockwise.
    fn add_triangle(&mut self, _a: usize, _b: usize, _c: usize) {}
}

/// Listener that records every event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Triangulation {
    pub reversed: bool,
    pub edges: Vec<[usize; 2]>,
    pub triangles: Vec<[usize; 3]>,
}

impl TriangulationListener for Triangulation {
    fn reversing(&mut self) {
        self.reversed = true;
    }

    fn add_edge(&mut self, a: usize, b: usize) {
        self.edges.push([a, b]);
    }

    fn add_triangle(&mut self, a: usize, b: usize, c: usize) {
        self.triangles.push([a, b, c]);
    }
}

#[derive(Default)]
pub struct Triangulator {
    pub(crate) contours: Vec<Contour>,
    pub(crate) total_points: usize,
}

impl Triangulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contour<P: Into<Vec2>>(
        &mut self,
        points: impl IntoIterator<Item = P>,
    ) -> Result<(), TriangulatorError> {
        self.push_contour(points.into_iter().collect())
    }

    pub fn push_contour(&mut self, contour: Contour) -> Result<(), TriangulatorError> {
        ensure!(
            contour.len() >= 3,
            ContourTooShortSnafu {
                contour: self.contours.len(),
                len: contour.len(),
            }
        );
        if let Some(i) = contour.points.iter().position(|p| !p.is_finite()) {
            return NonFiniteCoordinateSnafu {
                index: self.total_points + i,
            }
            .fail();
        }

        self.total_points += contour.len();
        self.contours.push(contour);
        Ok(())
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn point_count(&self) -> usize {
        self.total_points
    }

    /// Looks up a point by the index listeners report it under.
    pub fn point(&self, mut index: usize) -> Option<Vec2> {
        for contour in &self.contours {
            if index < contour.len() {
                return contour.get(index);
            }
            index -= contour.len();
        }
        None
    }

    /// Triangulates all contours added so far, reporting diagonals and
    /// triangles to `listener` as they are found.
    ///
    /// On error the events already delivered stay delivered; there is no
    /// rollback.
    pub fn calculate<L: TriangulationListener + ?Sized>(
        &self,
        listener: &mut L,
    ) -> Result<(), TriangulatorError> {
        ensure!(!self.contours.is_empty(), EmptyInputSnafu);

        let mut vertices = Vec::with_capacity(self.total_points);
        for contour in &self.contours {
            for &pos in contour.points() {
                vertices.push(Vertex::new(vertices.len(), pos));
            }
        }
        let mut sequence: Vec<_> = (0..vertices.len()).map(VertexId).collect();
        let mut lengths: Vec<_> = self.contours.iter().map(Contour::len).collect();
        classify(&mut vertices, &sequence, &lengths)?;

        let mut order = sequence.clone();
        order.sort_by(|a, b| vertical_order(&vertices[a.0], &vertices[b.0]));

        let top = order[0];
        if vertices[top.0].state == VertexState::Split {
            debug!("input is wound clockwise, reversing {} contours", lengths.len());
            listener.reversing();
            sequence.reverse();
            lengths.reverse();
            for vertex in &mut vertices {
                vertex.state = vertex.state.complement();
            }
        }
        let state = vertices[top.0].state;
        ensure!(
            state == VertexState::Start,
            UnexpectedTopVertexSnafu { state }
        );

        debug!(
            "sweeping {} points in {} contours",
            vertices.len(),
            lengths.len()
        );
        let mut boundary = Boundary::new(vertices, &sequence, &lengths);
        let mut counter = EventCounter {
            inner: listener,
            edges: 0,
            triangles: 0,
        };
        SweepPartitioner::new(&mut boundary, &mut counter).run(&order)?;
        debug!(
            "emitted {} diagonals and {} triangles",
            counter.edges, counter.triangles
        );
        Ok(())
    }

    pub fn triangulate(&self) -> Result<Triangulation, TriangulatorError> {
        let mut triangulation = Triangulation::default();
        self.calculate(&mut triangulation)?;
        Ok(triangulation)
    }

    /// Like [`Triangulator::triangulate`], but resolves every triangle to
    /// its corner coordinates.
    pub fn triangulate_points(&self) -> Result<Vec<[Vec2; 3]>, TriangulatorError> {
        let points: Vec<Vec2> = self
            .contours
            .iter()
            .flat_map(|c| c.points().iter().copied())
            .collect();
        let triangulation = self.triangulate()?;
        Ok(triangulation
            .triangles
            .iter()
            .map(|&[a, b, c]| [points[a], points[b], points[c]])
            .collect())
    }
}

/// Triangulates a single polygon without holes.
pub fn triangulate_polygon(points: &[Vec2]) -> Result<Triangulation, TriangulatorError> {
    let mut triangulator = Triangulator::new();
    triangulator.add_contour(points.iter().copied())?;
    triangulator.triangulate()
}

struct EventCounter<'a, L: ?Sized> {
    inner: &'a mut L,
    edges: usize,
    triangles: usize,
}

impl<L: TriangulationListener + ?Sized> TriangulationListener for EventCounter<'_, L> {
    fn reversing(&mut self) {
        self.inner.reversing();
    }

    fn add_edge(&mut self, a: usize, b: usize) {
        self.edges += 1;
        self.inner.add_edge(a, b);
    }

    fn add_triangle(&mut self, a: usize, b: usize, c: usize) {
        self.triangles += 1;
        self.inner.add_triangle(a, b, c);
    }
}
