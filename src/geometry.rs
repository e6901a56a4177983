use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn abs(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn norm(self) -> Self {
        let length = self.abs();
        if length > 0.0 {
            Self::new(self.x / length, self.y / length)
        } else {
            self
        }
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Axis-aligned rectangle in logical space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Rect {
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.x.max(b.x), a.y.min(b.y), a.y.max(b.y))
    }

    pub fn bounding(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut rect = Self::new(first.x, first.x, first.y, first.y);
        for point in rest {
            rect.x_min = rect.x_min.min(point.x);
            rect.x_max = rect.x_max.max(point.x);
            rect.y_min = rect.y_min.min(point.y);
            rect.y_max = rect.y_max.max(point.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x_min
            && point.x <= self.x_max
            && point.y >= self.y_min
            && point.y <= self.y_max
    }

    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            self.x_min - margin,
            self.x_max + margin,
            self.y_min - margin,
            self.y_max + margin,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_arithmetic() {
        let a = Point::new(3.0, 4.0);
        let b = Point::new(1.0, -1.0);

        assert_eq!(a + b, Point::new(4.0, 3.0));
        assert_eq!(a - b, Point::new(2.0, 5.0));
        assert_eq!(a * 2.0, Point::new(6.0, 8.0));
        assert_eq!(a.abs(), 5.0);
        assert_eq!(a.norm(), Point::new(0.6, 0.8));
        assert_eq!(Point::ZERO.norm(), Point::ZERO);
        assert_eq!(a.to_string(), "(3,4)");
    }

    #[test]
    fn bounding_rect_covers_all_points() {
        let points = [
            Point::new(1.0, 5.0),
            Point::new(-2.0, 3.0),
            Point::new(4.0, -1.0),
        ];
        let rect = Rect::bounding(&points).unwrap();

        assert_eq!(rect, Rect::new(-2.0, 4.0, -1.0, 5.0));
        assert_eq!(rect.center(), Point::new(1.0, 2.0));
        assert!(points.iter().all(|point| rect.contains(*point)));
        assert!(Rect::bounding(&[]).is_none());
    }
}
