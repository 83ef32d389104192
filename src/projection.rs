//! Map projection and SVG path generation.
//!
//! Rendering only talks to the [`Cartographer`] trait, so the drawing code
//! and the hit index can be exercised with any projection.

use geo::{BoundingRect, Coord, LineString, MapCoords, MultiPolygon, Rect};
use std::f64::consts::FRAC_PI_4;
use std::fmt::Write;

/// Latitudes beyond this blow up under Mercator.
const MAX_LATITUDE: f64 = 85.0;

pub trait Cartographer {
    /// Geographic (lon, lat) to screen coordinates.
    fn project(&self, coord: Coord<f64>) -> Coord<f64>;

    fn project_geometry(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        geometry.map_coords(|c| self.project(c))
    }

    /// Screen-space bounding box.
    fn bounds(&self, geometry: &MultiPolygon<f64>) -> Option<Rect<f64>> {
        self.project_geometry(geometry).bounding_rect()
    }

    /// SVG path data for the projected geometry.
    fn path_for(&self, geometry: &MultiPolygon<f64>) -> String {
        let projected = self.project_geometry(geometry);
        let mut d = String::new();
        for polygon in &projected {
            write_ring(&mut d, polygon.exterior());
            for interior in polygon.interiors() {
                write_ring(&mut d, interior);
            }
        }
        d
    }
}

fn write_ring(d: &mut String, ring: &LineString<f64>) {
    let coords = &ring.0;
    // closed rings repeat the first point; `Z` covers it
    let open = match (coords.first(), coords.last()) {
        (Some(first), Some(last)) if coords.len() > 1 && first == last => &coords[..coords.len() - 1],
        _ => &coords[..],
    };
    for (i, c) in open.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{}{:.2},{:.2}", cmd, c.x, c.y);
    }
    if !open.is_empty() {
        d.push('Z');
    }
}

/// Spherical Mercator, scaled and translated to fit a drawing area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    scale: f64,
    translate: (f64, f64),
}

impl Mercator {
    pub fn new(scale: f64, translate: (f64, f64)) -> Self {
        Self { scale, translate }
    }

    /// Fits the combined extent of `geometries` to `width` x `height`,
    /// centred along the slack axis.
    pub fn fit_size<'a, I>(width: f64, height: f64, geometries: I) -> Self
    where
        I: IntoIterator<Item = &'a MultiPolygon<f64>>,
    {
        let extent = geometries
            .into_iter()
            .filter_map(|g| g.map_coords(raw).bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    Coord {
                        x: a.min().x.min(b.min().x),
                        y: a.min().y.min(b.min().y),
                    },
                    Coord {
                        x: a.max().x.max(b.max().x),
                        y: a.max().y.max(b.max().y),
                    },
                )
            });

        let Some(extent) = extent else {
            return Self::new(1.0, (width / 2.0, height / 2.0));
        };

        let (dx, dy) = (extent.width(), extent.height());
        let scale = match (dx > 0.0, dy > 0.0) {
            (true, true) => (width / dx).min(height / dy),
            (true, false) => width / dx,
            (false, true) => height / dy,
            (false, false) => 1.0,
        };
        let tx = (width - scale * (extent.min().x + extent.max().x)) / 2.0;
        let ty = (height - scale * (extent.min().y + extent.max().y)) / 2.0;
        Self::new(scale, (tx, ty))
    }
}

impl Cartographer for Mercator {
    fn project(&self, coord: Coord<f64>) -> Coord<f64> {
        let r = raw(coord);
        Coord {
            x: self.scale * r.x + self.translate.0,
            y: self.scale * r.y + self.translate.1,
        }
    }
}

/// Unscaled Mercator with y pointing down.
fn raw(coord: Coord<f64>) -> Coord<f64> {
    let lat = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    Coord {
        x: coord.x.to_radians(),
        y: -(FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}
