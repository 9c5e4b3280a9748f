use std::ops::Sub;

#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2::new(0., 0.);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn cross(&self, rhs: Vec2) -> f64 {
        (self.x * rhs.y) - (self.y * rhs.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl Sub<Vec2> for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x.sub(rhs.x),
            y: self.y.sub(rhs.y),
        }
    }
}

/// Turn direction of three points, as seen when walking `a -> b -> c`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
    Collinear,
}

impl Orientation {
    pub fn of(a: Vec2, b: Vec2, c: Vec2) -> Self {
        // Expanded determinant; keep the term order stable, near-degenerate
        // inputs depend on the exact rounding.
        let mut det = b.x * c.y + a.x * b.y + a.y * c.x;
        det -= b.y * c.x + a.x * c.y + a.y * b.x;
        if det < 0. {
            Orientation::Clockwise
        } else if det > 0. {
            Orientation::CounterClockwise
        } else {
            Orientation::Collinear
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Orientation::Clockwise => Orientation::CounterClockwise,
            Orientation::CounterClockwise => Orientation::Clockwise,
            Orientation::Collinear => Orientation::Collinear,
        }
    }
}

/// True if `a -> b -> c` turns right at `b`. Collinear points are not a right turn.
pub fn is_right_turn(a: Vec2, b: Vec2, c: Vec2) -> bool {
    Orientation::of(a, b, c) == Orientation::Clockwise
}
