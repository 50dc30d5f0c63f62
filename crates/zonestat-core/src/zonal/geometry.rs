use serde::Deserialize;

use crate::error::{Result, ZonestatError};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    fn of_points(points: &[[f64; 2]]) -> Self {
        let mut bbox = Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in points {
            bbox.min_x = bbox.min_x.min(p[0]);
            bbox.min_y = bbox.min_y.min(p[1]);
            bbox.max_x = bbox.max_x.max(p[0]);
            bbox.max_y = bbox.max_y.max(p[1]);
        }
        bbox
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Polygon with one exterior ring and any number of holes.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    exterior: Vec<[f64; 2]>,
    holes: Vec<Vec<[f64; 2]>>,
    bbox: BBox,
}

impl Polygon {
    pub fn new(exterior: Vec<[f64; 2]>, holes: Vec<Vec<[f64; 2]>>) -> Result<Self> {
        if exterior.len() < 3 {
            return Err(ZonestatError::InvalidGeometry(format!(
                "exterior ring has {} vertices, need at least 3",
                exterior.len()
            )));
        }
        let bbox = BBox::of_points(&exterior);
        Ok(Self {
            exterior,
            holes,
            bbox,
        })
    }

    /// Axis-aligned rectangle, convenient for tests and tiling.
    pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        let exterior = vec![
            [min_x, min_y],
            [max_x, min_y],
            [max_x, max_y],
            [min_x, max_y],
            [min_x, min_y],
        ];
        Self {
            bbox: BBox::of_points(&exterior),
            exterior,
            holes: Vec::new(),
        }
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.bbox.contains(x, y)
            && ring_contains(&self.exterior, x, y)
            && !self.holes.iter().any(|hole| ring_contains(hole, x, y))
    }
}

/// Even-odd ray casting. Rings may be open or closed.
fn ring_contains(ring: &[[f64; 2]], x: f64, y: f64) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Union of disjoint polygons.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiPolygon {
    polygons: Vec<Polygon>,
    bbox: BBox,
}

impl MultiPolygon {
    pub fn new(polygons: Vec<Polygon>) -> Result<Self> {
        let Some(first) = polygons.first() else {
            return Err(ZonestatError::InvalidGeometry("empty multipolygon".to_string()));
        };
        let bbox = polygons[1..]
            .iter()
            .fold(first.bbox(), |acc, p| acc.union(&p.bbox()));
        Ok(Self { polygons, bbox })
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.bbox.contains(x, y) && self.polygons.iter().any(|p| p.contains(x, y))
    }
}

impl From<Polygon> for MultiPolygon {
    fn from(polygon: Polygon) -> Self {
        Self {
            bbox: polygon.bbox(),
            polygons: vec![polygon],
        }
    }
}

/// GeoJSON geometry subset accepted for zones.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum GeoJsonGeometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
}

impl GeoJsonGeometry {
    pub(crate) fn into_multipolygon(self) -> Result<MultiPolygon> {
        match self {
            Self::Polygon { coordinates } => MultiPolygon::new(vec![polygon_from_rings(coordinates)?]),
            Self::MultiPolygon { coordinates } => MultiPolygon::new(
                coordinates
                    .into_iter()
                    .map(polygon_from_rings)
                    .collect::<Result<Vec<_>>>()?,
            ),
        }
    }
}

fn polygon_from_rings(rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon> {
    let mut rings = rings.into_iter().map(to_points);
    let exterior = rings
        .next()
        .ok_or_else(|| ZonestatError::InvalidGeometry("polygon without rings".to_string()))??;
    let holes = rings.collect::<Result<Vec<_>>>()?;
    Polygon::new(exterior, holes)
}

fn to_points(ring: Vec<Vec<f64>>) -> Result<Vec<[f64; 2]>> {
    ring.into_iter()
        .map(|pos| match pos.as_slice() {
            [x, y, ..] => Ok([*x, *y]),
            _ => Err(ZonestatError::InvalidGeometry(format!(
                "position needs 2 coordinates, got {}",
                pos.len()
            ))),
        })
        .collect()
}
