//! Screen-space hit testing for pointer events.

use crate::projection::Cartographer;
use crate::types::Region;
use geo::{BoundingRect, Contains, MultiPolygon, Point, Rect};
use rstar::{RTree, RTreeObject, AABB};

struct RegionEnvelope {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for RegionEnvelope {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Projected region shapes indexed by bounding box.
pub struct HitIndex {
    shapes: Vec<MultiPolygon<f64>>,
    bounds: Vec<Option<Rect<f64>>>,
    tree: RTree<RegionEnvelope>,
}

impl HitIndex {
    pub fn build(regions: &[Region], cartographer: &dyn Cartographer) -> Self {
        let shapes: Vec<MultiPolygon<f64>> = regions
            .iter()
            .map(|r| cartographer.project_geometry(&r.geometry))
            .collect();
        let bounds: Vec<Option<Rect<f64>>> = shapes
            .iter()
            .map(|s| s.bounding_rect())
            .collect();

        let items = bounds
            .iter()
            .enumerate()
            .filter_map(|(index, rect)| {
                rect.map(|rect| RegionEnvelope {
                    index,
                    aabb: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        Self {
            shapes,
            bounds,
            tree: RTree::bulk_load(items),
        }
    }

    /// Index of the region containing the chart-space point, if any.
    pub fn locate(&self, x: f64, y: f64) -> Option<usize> {
        let point = Point::new(x, y);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([x, y]))
            .map(|candidate| candidate.index)
            .filter(|&index| self.shapes[index].contains(&point))
            .min()
    }

    pub fn bounds(&self, index: usize) -> Option<Rect<f64>> {
        self.bounds.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Mercator;
    use geo::{polygon, Coord};

    /// Identity projection keeps the arithmetic obvious.
    struct Flat;

    impl Cartographer for Flat {
        fn project(&self, coord: Coord<f64>) -> Coord<f64> {
            coord
        }
    }

    fn region(x: f64, y: f64, size: f64) -> Region {
        Region {
            name: None,
            code: None,
            geometry: MultiPolygon::new(vec![polygon![
                (x: x, y: y),
                (x: x + size, y: y),
                (x: x + size, y: y + size),
                (x: x, y: y + size),
                (x: x, y: y),
            ]]),
        }
    }

    #[test]
    fn locates_containing_region() {
        let regions = vec![region(0.0, 0.0, 10.0), region(20.0, 0.0, 10.0)];
        let index = HitIndex::build(&regions, &Flat);
        assert_eq!(index.len(), 2);
        assert_eq!(index.locate(5.0, 5.0), Some(0));
        assert_eq!(index.locate(25.0, 5.0), Some(1));
        assert_eq!(index.locate(15.0, 5.0), None);
    }

    #[test]
    fn bounding_box_hit_needs_exact_containment() {
        let triangle = Region {
            name: None,
            code: None,
            geometry: MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 0.0, y: 10.0),
                (x: 0.0, y: 0.0),
            ]]),
        };
        let index = HitIndex::build(&[triangle], &Flat);
        assert_eq!(index.locate(2.0, 2.0), Some(0));
        assert_eq!(index.locate(9.0, 9.0), None);
    }

    #[test]
    fn overlapping_envelopes_resolve_to_lowest_index() {
        // second square sits inside the first one's bounding box
        let regions = vec![region(0.0, 0.0, 10.0), region(2.0, 2.0, 3.0)];
        let index = HitIndex::build(&regions, &Flat);
        assert_eq!(index.locate(3.0, 3.0), Some(0));
        assert_eq!(index.locate(8.0, 8.0), Some(0));
        assert_eq!(index.locate(-0.5, 3.0), None);
    }

    #[test]
    fn bounds_follow_projection() {
        let regions = vec![region(140.0, -38.0, 5.0)];
        let mercator = Mercator::fit_size(300.0, 300.0, regions.iter().map(|r| &r.geometry));
        let index = HitIndex::build(&regions, &mercator);
        let b = index.bounds(0).unwrap();
        assert!(b.width() > 0.0 && b.height() > 0.0);
        assert_eq!(index.bounds(3), None);
        let c = b.center();
        assert_eq!(index.locate(c.x, c.y), Some(0));
    }
}
