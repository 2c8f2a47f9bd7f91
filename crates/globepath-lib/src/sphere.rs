use serde::Serialize;

use crate::geojson::Coordinate;

/// Default globe radius. The map is rendered as a sphere of diameter 20 units.
pub const DEFAULT_RADIUS: f64 = 10.0;

/// Cartesian coordinates of a city.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Calculate the Euclidean distance to another position.
    pub fn distance_to(&self, other: &Self) -> f64 {
        self.sub(other).length()
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
}

/// Sphere the cities are projected onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub radius: f64,
    pub center: Position,
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS)
    }
}

impl Sphere {
    /// Sphere of the given radius centred on the origin.
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            center: Position::ORIGIN,
        }
    }

    /// Project a `[longitude, latitude]` pair (degrees) onto the sphere.
    ///
    /// Latitude maps to the `y` axis; longitude 0 points along `+x` and
    /// longitude 90 along `+z`.
    pub fn position(&self, coordinate: Coordinate) -> Position {
        let [lon, lat] = coordinate;
        let offset = lat_lon_to_position(lat, lon, self.radius);
        Position::new(
            self.center.x + offset.x,
            self.center.y + offset.y,
            self.center.z + offset.z,
        )
    }

    /// Great-circle distance between the directions of `a` and `b` seen from
    /// the centre, scaled to this sphere's radius.
    ///
    /// Only directions matter, so the inputs do not need to lie on the surface.
    pub fn arc_distance(&self, a: &Position, b: &Position) -> f64 {
        let dir_a = a.sub(&self.center);
        let dir_b = b.sub(&self.center);
        if dir_a.length() == 0.0 || dir_b.length() == 0.0 {
            return 0.0;
        }
        // atan2 keeps precision for nearly parallel and nearly opposite vectors.
        let angle = dir_a.cross(&dir_b).length().atan2(dir_a.dot(&dir_b));
        self.radius * angle
    }
}

/// Convert latitude/longitude in degrees to a position on a sphere of `radius`
/// centred on the origin.
pub fn lat_lon_to_position(lat_deg: f64, lon_deg: f64, radius: f64) -> Position {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    Position::new(
        radius * lat.cos() * lon.cos(),
        radius * lat.sin(),
        radius * lat.cos() * lon.sin(),
    )
}

/// How source coordinates become positions and distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Coordinates are `[lon, lat]` degrees on a globe; distance is arc length.
    Sphere(Sphere),
    /// Coordinates are flat `[x, y]` map units; distance is Euclidean.
    Planar,
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Sphere(Sphere::default())
    }
}

impl Projection {
    pub fn position(&self, coordinate: Coordinate) -> Position {
        match self {
            Projection::Sphere(sphere) => sphere.position(coordinate),
            Projection::Planar => Position::new(coordinate[0], coordinate[1], 0.0),
        }
    }

    pub fn distance(&self, a: &Position, b: &Position) -> f64 {
        match self {
            Projection::Sphere(sphere) => sphere.arc_distance(a, b),
            Projection::Planar => a.distance_to(b),
        }
    }
}
