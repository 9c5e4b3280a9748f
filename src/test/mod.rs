use std::{collections::BTreeSet, io::Cursor};

use byteorder::{LittleEndian, ReadBytesExt};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::{
    triangulate_polygon, Contour, Triangulation, TriangulationListener, Triangulator,
    TriangulatorError, Vec2,
};

fn run(contours: &[&[(f64, f64)]]) -> Triangulation {
    let mut triangulator = Triangulator::new();
    for contour in contours {
        triangulator.add_contour(contour.iter().copied()).unwrap();
    }
    triangulator.triangulate().unwrap()
}

fn contains(triangulation: &Triangulation, [a, b, c]: [usize; 3]) -> bool {
    triangulation
        .triangles
        .iter()
        .any(|&t| t == [a, b, c] || t == [b, c, a] || t == [c, a, b])
}

fn assert_triangles(triangulation: &Triangulation, expected: &[[usize; 3]]) {
    assert_eq!(triangulation.triangles.len(), expected.len());
    for &triangle in expected {
        assert!(
            contains(triangulation, triangle),
            "missing {:?} in {:?}",
            triangle,
            triangulation.triangles
        );
    }
}

fn edge_set(edges: &[[usize; 2]]) -> BTreeSet<(usize, usize)> {
    edges.iter().map(|&[a, b]| (a.min(b), a.max(b))).collect()
}

fn assert_edges(triangulation: &Triangulation, expected: &[[usize; 2]]) {
    assert_eq!(triangulation.edges.len(), expected.len());
    assert_eq!(edge_set(&triangulation.edges), edge_set(expected));
}

fn signed_area(points: &[Vec2]) -> f64 {
    let mut area = 0.;
    for (i, p) in points.iter().enumerate() {
        area += p.cross(points[(i + 1) % points.len()]);
    }
    area / 2.
}

fn triangle_area([a, b, c]: [Vec2; 3]) -> f64 {
    (b - a).cross(c - a) / 2.
}

/// Checks the invariants every successful triangulation must satisfy and
/// returns the number of triangles.
fn check(triangulator: &Triangulator) -> usize {
    let triangulation = triangulator.triangulate().unwrap();
    let points = triangulator.triangulate_points().unwrap();
    assert_eq!(points.len(), triangulation.triangles.len());

    let holes = triangulator.contours().len() - 1;
    let n = triangulator.point_count();
    assert_eq!(triangulation.triangles.len(), n + 2 * holes - 2);
    assert_eq!(triangulation.edges.len(), n + 3 * holes - 3);

    let mut covered = 0.;
    for (indices, corners) in triangulation.triangles.iter().zip(&points) {
        assert!(indices[0] != indices[1] && indices[1] != indices[2] && indices[0] != indices[2]);
        assert!(indices.iter().all(|&i| i < n));
        let area = triangle_area(*corners);
        assert!(area > 0., "{:?} is not counter-clockwise", indices);
        covered += area;
    }

    let expected: f64 = triangulator
        .contours()
        .iter()
        .map(|c| signed_area(c.points()))
        .sum::<f64>()
        .abs();
    assert!((covered - expected).abs() <= expected * 1e-9);
    triangulation.triangles.len()
}

type GridPoint = (i64, i64);

fn orient(a: GridPoint, b: GridPoint, c: GridPoint) -> i64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn on_segment(a: GridPoint, b: GridPoint, p: GridPoint) -> bool {
    orient(a, b, p) == 0
        && a.0.min(b.0) <= p.0
        && p.0 <= a.0.max(b.0)
        && a.1.min(b.1) <= p.1
        && p.1 <= a.1.max(b.1)
}

fn segments_touch(a: GridPoint, b: GridPoint, c: GridPoint, d: GridPoint) -> bool {
    let apart = |p: i64, q: i64| (p > 0 && q < 0) || (p < 0 && q > 0);
    if apart(orient(c, d, a), orient(c, d, b)) && apart(orient(a, b, c), orient(a, b, d)) {
        return true;
    }
    on_segment(c, d, a) || on_segment(c, d, b) || on_segment(a, b, c) || on_segment(a, b, d)
}

fn grid_area(polygon: &[GridPoint]) -> i64 {
    (0..polygon.len())
        .map(|i| {
            let (p, q) = (polygon[i], polygon[(i + 1) % polygon.len()]);
            p.0 * q.1 - q.0 * p.1
        })
        .sum()
}

/// Distinct points, no edge folding back onto its predecessor and no two
/// non-adjacent edges sharing a point.
fn is_simple(polygon: &[GridPoint]) -> bool {
    let n = polygon.len();
    if polygon.iter().collect::<BTreeSet<_>>().len() != n || grid_area(polygon) == 0 {
        return false;
    }
    for i in 0..n {
        let (a, v, b) = (polygon[(i + n - 1) % n], polygon[i], polygon[(i + 1) % n]);
        if orient(a, v, b) == 0 && (a.0 - v.0) * (b.0 - v.0) + (a.1 - v.1) * (b.1 - v.1) > 0 {
            return false;
        }
    }
    for i in 0..n {
        for j in i + 2..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (a, b) = (polygon[i], polygon[(i + 1) % n]);
            let (c, d) = (polygon[j], polygon[(j + 1) % n]);
            if segments_touch(a, b, c, d) {
                return false;
            }
        }
    }
    true
}

fn grid_point(rng: &mut StdRng, origin: GridPoint, size: i64) -> GridPoint {
    (
        origin.0 + rng.random_range(0..=size),
        origin.1 + rng.random_range(0..=size),
    )
}

/// Grows a random simple polygon inside the grid square at `origin`, one
/// inserted point at a time.
fn grow_polygon(rng: &mut StdRng, origin: GridPoint, size: i64, target: usize) -> Vec<GridPoint> {
    let mut polygon = loop {
        let candidate = vec![
            grid_point(rng, origin, size),
            grid_point(rng, origin, size),
            grid_point(rng, origin, size),
        ];
        if is_simple(&candidate) {
            break candidate;
        }
    };
    for _ in 0..200 {
        if polygon.len() >= target {
            break;
        }
        let at = rng.random_range(0..polygon.len()) + 1;
        let mut candidate = polygon.clone();
        candidate.insert(at, grid_point(rng, origin, size));
        if is_simple(&candidate) {
            polygon = candidate;
        }
    }
    polygon
}

/// Counter-clockwise square frame with some of its grid points kept on each
/// side, so the outer contour carries collinear runs and horizontal edges.
fn grid_frame(rng: &mut StdRng, width: i64) -> Vec<GridPoint> {
    let corners = [(0, 0), (width, 0), (width, width), (0, width)];
    let mut frame = Vec::new();
    for k in 0..4 {
        let (a, b) = (corners[k], corners[(k + 1) % 4]);
        let step = ((b.0 - a.0) / width, (b.1 - a.1) / width);
        frame.push(a);
        for t in 1..width {
            if rng.random_bool(0.3) {
                frame.push((a.0 + step.0 * t, a.1 + step.1 * t));
            }
        }
    }
    frame
}

fn grid_triangulator(contours: &[Vec<GridPoint>]) -> Triangulator {
    let mut triangulator = Triangulator::new();
    for contour in contours {
        triangulator
            .add_contour(contour.iter().map(|&(x, y)| (x as f64, y as f64)))
            .unwrap();
    }
    triangulator
}

fn random_holes(rng: &mut StdRng) -> (Vec<GridPoint>, Vec<Vec<GridPoint>>) {
    let mut boxes: [GridPoint; 4] = [(1, 1), (6, 1), (1, 6), (6, 6)];
    boxes.shuffle(rng);
    let outer = grid_frame(rng, 11);
    let count = rng.random_range(1..=3);
    let mut holes = Vec::new();
    for &origin in &boxes[..count] {
        let target = rng.random_range(3..8);
        let mut hole = grow_polygon(rng, origin, 3, target);
        // holes wind clockwise
        if grid_area(&hole) > 0 {
            hole.reverse();
        }
        holes.push(hole);
    }
    (outer, holes)
}

#[test]
fn random_grid_polygons() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..500 {
        let target = rng.random_range(3..13);
        let mut polygon = grow_polygon(&mut rng, (0, 0), 6, target);
        if rng.random_bool(0.5) {
            polygon.reverse();
        }
        check(&grid_triangulator(&[polygon]));
    }
}

#[test]
fn random_polygons_with_holes() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..200 {
        let (outer, holes) = random_holes(&mut rng);
        let mut contours = vec![outer];
        contours.extend(holes);
        check(&grid_triangulator(&contours));

        let reversed: Vec<Vec<GridPoint>> = contours
            .iter()
            .map(|contour| contour.iter().rev().copied().collect())
            .collect();
        check(&grid_triangulator(&reversed));
    }
}

#[test]
fn random_holes_listed_first() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        let (outer, mut contours) = random_holes(&mut rng);
        contours.push(outer);
        check(&grid_triangulator(&contours));
    }
}

#[test]
fn fixtures() {
    let mut cursor = Cursor::new(include_bytes!("./fixtures.bin"));
    let mut count = 0;
    loop {
        let next = cursor.read_i32::<LittleEndian>().unwrap();
        if next == 0 {
            break;
        }
        assert_eq!(next, 1);

        let label_length = cursor.read_i32::<LittleEndian>().unwrap();
        let mut label = String::new();
        for _ in 0..label_length {
            label.push(char::from(cursor.read_u8().unwrap()));
        }

        let mut triangulator = Triangulator::new();
        let contour_count = cursor.read_i32::<LittleEndian>().unwrap();
        for _ in 0..contour_count {
            let contour_length = cursor.read_i32::<LittleEndian>().unwrap();
            let mut points = vec![];
            for _ in 0..contour_length {
                let x = cursor.read_f64::<LittleEndian>().unwrap();
                let y = cursor.read_f64::<LittleEndian>().unwrap();
                points.push(Vec2::new(x, y));
            }
            triangulator.add_contour(points).unwrap();
        }

        let triangle_count = cursor.read_i32::<LittleEndian>().unwrap();
        let reversed = cursor.read_i32::<LittleEndian>().unwrap() != 0;

        assert_eq!(check(&triangulator), triangle_count as usize, "{}", label);
        assert_eq!(triangulator.triangulate().unwrap().reversed, reversed, "{}", label);
        count += 1;
    }
    assert_eq!(count, 9);
}

#[test]
fn square() {
    let t = run(&[&[(0., 0.), (1., 0.), (1., 1.), (0., 1.)]]);
    assert_triangles(&t, &[[0, 1, 2], [0, 2, 3]]);
    assert!(!t.reversed);
}

#[test]
fn triangle_with_hole() {
    let t = run(&[
        &[(0., 0.), (4., 0.), (2., 3.)],
        &[(1., 0.5), (2., 2.), (3., 0.5)],
    ]);
    assert_triangles(
        &t,
        &[[0, 5, 3], [0, 1, 5], [1, 2, 5], [2, 4, 5], [0, 3, 2], [3, 4, 2]],
    );
}

#[test]
fn reversed_contour() {
    let contour: Contour = [
        (-6., 1493.),
        (1257., 1493.),
        (1257., 1323.),
        (727., 1323.),
        (727., 0.),
        (524., 0.),
        (524., 1323.),
        (-6., 1323.),
    ]
    .into_iter()
    .collect();
    let mut triangulator = Triangulator::new();
    triangulator.push_contour(contour.reverse()).unwrap();
    let t = triangulator.triangulate().unwrap();
    assert_eq!(t.triangles.len(), 6);
    assert!(contains(&t, [0, 6, 7]));
    assert!(contains(&t, [1, 6, 0]));
}

#[test]
fn single_triangle() {
    let t = run(&[&[(0., 0.), (10., 0.), (0., 10.)]]);
    assert_triangles(&t, &[[0, 1, 2]]);
    assert_edges(&t, &[]);

    let t = run(&[&[(0., 0.), (0., -2.), (1., -1.)]]);
    assert_triangles(&t, &[[0, 1, 2]]);
    assert_edges(&t, &[]);
}

#[test]
fn end_vertex_with_merge_helper() {
    let t = run(&[&[(0., 0.), (-1., 1.), (0., -2.), (1., 1.)]]);
    assert_triangles(&t, &[[0, 1, 2], [2, 3, 0]]);
    assert_edges(&t, &[[0, 2]]);
}

#[test]
fn split_vertex() {
    let t = run(&[&[(0., 0.), (1., -1.), (0., 2.), (-1., -1.)]]);
    assert_triangles(&t, &[[0, 1, 2], [2, 3, 0]]);
    assert_edges(&t, &[[0, 2]]);
}

#[test]
fn merge_vertex_with_merge_helper() {
    let t = run(&[&[(0., 0.), (-1., 1.), (1., -2.), (3., 2.), (2., 1.), (1., 2.)]]);
    assert_triangles(&t, &[[0, 1, 2], [0, 4, 5], [2, 4, 0], [2, 3, 4]]);
    assert_edges(&t, &[[0, 2], [0, 4], [2, 4]]);
}

#[test]
fn merge_vertex_left_of_merge_helper() {
    let t = run(&[&[(0., 0.), (-1., 2.), (-2., 1.), (-3., 2.), (-1., -2.), (1., 1.)]]);
    assert_triangles(&t, &[[0, 1, 2], [0, 2, 4], [2, 3, 4], [4, 5, 0]]);
    assert_edges(&t, &[[0, 2], [0, 4], [2, 4]]);
}

#[test]
fn regular_left_vertex_with_merge_helper() {
    let t = run(&[&[(0., 0.), (-1., 1.), (-1.5, -1.), (0., -2.), (1., 1.)]]);
    assert_triangles(&t, &[[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    assert_edges(&t, &[[0, 2], [0, 3]]);
}

#[test]
fn regular_right_vertex_with_merge_helper() {
    let t = run(&[&[(0., 0.), (-1., 1.), (0., -2.), (1.5, -1.), (1., 1.)]]);
    assert_triangles(&t, &[[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    assert_edges(&t, &[[0, 2], [0, 3]]);
}

#[test]
fn wicked_comparisons() {
    let t = run(&[&[
        (199., -200.),
        (280., -230.),
        (280., -190.),
        (350., -200.),
        (350., -100.),
        (240., -100.),
        (240., -200.),
        (220., -150.),
    ]]);
    assert_triangles(
        &t,
        &[[0, 1, 6], [1, 2, 6], [2, 3, 4], [2, 4, 5], [2, 5, 6], [0, 6, 7]],
    );
    assert_edges(&t, &[[2, 5], [1, 6], [2, 4], [0, 6], [2, 6]]);

    let t = run(&[&[
        (265., -243.),
        (577., -389.),
        (663., -65.),
        (543., -147.),
        (517., -271.),
        (550., -199.),
        (505., -315.),
    ]]);
    assert_triangles(&t, &[[0, 1, 6], [1, 2, 6], [2, 5, 6], [2, 3, 5], [3, 4, 5]]);
    assert_edges(&t, &[[3, 5], [1, 6], [2, 5], [2, 6]]);
}

#[test]
fn monotone_polygons() {
    let t = run(&[&[(0., 0.), (-1., -1.), (0., -2.), (1., -1.)]]);
    assert_triangles(&t, &[[0, 1, 3], [1, 2, 3]]);
    assert_edges(&t, &[[1, 3]]);

    let t = run(&[&[(0., 0.), (-1., -1.), (-3., -2.), (0., -4.), (1., -3.)]]);
    assert_triangles(&t, &[[0, 1, 4], [1, 2, 4], [2, 3, 4]]);
    assert_edges(&t, &[[1, 4], [2, 4]]);

    let t = run(&[&[(0., 0.), (-1., 3.), (0., -3.), (1., -2.), (2., -1.)]]);
    assert_triangles(&t, &[[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    assert_edges(&t, &[[0, 3], [0, 2]]);
}

#[test]
fn seam_with_repeated_points() {
    let t = run(&[&[
        (0., 0.),
        (-3., -3.),
        (3., -3.),
        (2., -2.),
        (-2., -2.),
        (0., -1.),
        (2., -2.),
        (3., -3.),
    ]]);
    assert_triangles(
        &t,
        &[[0, 1, 4], [0, 4, 5], [0, 5, 6], [0, 6, 7], [1, 2, 3], [1, 3, 4]],
    );
    assert_edges(&t, &[[0, 4], [0, 5], [0, 6], [1, 3], [1, 4]]);

    let t = run(&[&[
        (0., 0.),
        (-3., -3.),
        (3., -3.),
        (0., 0.),
        (0., -1.),
        (2., -2.),
        (-2., -2.),
        (0., -1.),
    ]]);
    assert_triangles(
        &t,
        &[[0, 6, 7], [0, 1, 6], [1, 5, 6], [1, 2, 5], [3, 4, 5], [3, 5, 2]],
    );
    assert_edges(&t, &[[0, 6], [1, 6], [2, 5], [3, 5], [1, 5]]);
}

#[test]
fn clockwise_input_is_reversed() {
    let t = run(&[&[(0., 0.), (0., 10.), (10., 0.)]]);
    assert!(t.reversed);
    assert_triangles(&t, &[[0, 2, 1]]);
    assert_edges(&t, &[]);

    let t = run(&[&[
        (0., 0.),
        (0., -1.),
        (-2., -2.),
        (2., -2.),
        (0., -1.),
        (0., 0.),
        (3., -3.),
        (-3., -3.),
    ]]);
    assert!(t.reversed);
    assert_triangles(
        &t,
        &[[0, 2, 1], [3, 2, 7], [2, 0, 7], [5, 4, 3], [3, 7, 6], [5, 3, 6]],
    );
    assert_edges(&t, &[[0, 2], [2, 7], [3, 7], [3, 6], [3, 5]]);
}

#[test]
fn reversal_is_symmetric() {
    let comb = [
        (0., 0.),
        (10., 0.),
        (10., 5.),
        (9., 5.),
        (8., 1.),
        (7., 5.),
        (6., 1.),
        (5., 5.),
        (4., 1.),
        (3., 5.),
        (2., 1.),
        (1., 5.),
        (0., 5.),
    ];
    let n = comb.len();
    let forward = run(&[&comb[..]]);
    let reversed: Vec<_> = comb.iter().rev().copied().collect();
    let backward = run(&[reversed.as_slice()]);

    assert!(!forward.reversed);
    assert!(backward.reversed);

    let normalize = |triangles: &[[usize; 3]], flip: bool| -> BTreeSet<[usize; 3]> {
        triangles
            .iter()
            .map(|t| {
                let mut t = t.map(|i| if flip { n - 1 - i } else { i });
                t.sort_unstable();
                t
            })
            .collect()
    };
    assert_eq!(
        normalize(&forward.triangles, false),
        normalize(&backward.triangles, true)
    );
}

#[test]
fn reversing_fires_once_before_other_events() {
    #[derive(Default)]
    struct Events(Vec<&'static str>);

    impl TriangulationListener for Events {
        fn reversing(&mut self) {
            self.0.push("reversing");
        }

        fn add_triangle(&mut self, _a: usize, _b: usize, _c: usize) {
            self.0.push("triangle");
        }
    }

    let mut triangulator = Triangulator::new();
    triangulator
        .add_contour([(0., 0.), (0., 1.), (1., 1.), (1., 0.)])
        .unwrap();
    let mut events = Events::default();
    triangulator.calculate(&mut events).unwrap();
    assert_eq!(events.0, vec!["reversing", "triangle", "triangle"]);
}

#[test]
fn points_resolve_to_input_coordinates() {
    let mut triangulator = Triangulator::new();
    triangulator.add_contour([[0., 0.], [4., 0.], [2., 3.]]).unwrap();
    triangulator.add_contour([[1., 0.5], [2., 2.], [3., 0.5]]).unwrap();
    assert_eq!(triangulator.point_count(), 6);
    assert_eq!(triangulator.point(4), Some(Vec2::new(2., 2.)));
    assert_eq!(triangulator.point(6), None);

    let triangulation = triangulator.triangulate().unwrap();
    let points = triangulator.triangulate_points().unwrap();
    for (indices, corners) in triangulation.triangles.iter().zip(&points) {
        for (&i, &corner) in indices.iter().zip(corners) {
            assert_eq!(triangulator.point(i), Some(corner));
        }
    }
}

#[test]
fn single_polygon_shortcut() {
    let points = [
        Vec2::new(0., 0.),
        Vec2::new(1., -1.),
        Vec2::new(0., 2.),
        Vec2::new(-1., -1.),
    ];
    let t = triangulate_polygon(&points).unwrap();
    assert_triangles(&t, &[[0, 1, 2], [2, 3, 0]]);
}

#[test]
fn malformed_input_is_rejected() {
    assert!(matches!(
        Triangulator::new().triangulate(),
        Err(TriangulatorError::EmptyInput)
    ));

    let mut triangulator = Triangulator::new();
    triangulator
        .add_contour([(0., 0.), (1., 0.), (0., 1.)])
        .unwrap();
    assert!(matches!(
        triangulator.add_contour([(0., 0.), (1., 0.)]),
        Err(TriangulatorError::ContourTooShort {
            contour: 1,
            len: 2
        })
    ));
    assert!(matches!(
        triangulator.add_contour(Vec::<Vec2>::new()),
        Err(TriangulatorError::ContourTooShort { len: 0, .. })
    ));
    assert!(matches!(
        triangulator.add_contour([(5., 5.), (f64::NAN, 6.), (5., 6.)]),
        Err(TriangulatorError::NonFiniteCoordinate { index: 4 })
    ));
    assert_eq!(triangulator.contours().len(), 1);
    assert_eq!(triangulator.point_count(), 3);
}

#[test]
fn self_crossing_sliver_is_rejected() {
    // two turns go left and two go right: the quad crosses itself. An older
    // test suite expected 2 triangles here; crossing input is not accepted.
    let points = [
        Vec2::new(-24.55202, 6.578696),
        Vec2::new(-3.62958, 0.972544),
        Vec2::new(-3.62185, 0.970474),
        Vec2::new(-24.54430, 6.576626),
    ];
    assert!(matches!(
        triangulate_polygon(&points),
        Err(TriangulatorError::NoLeftNeighbour { vertex: 1 })
    ));
}
