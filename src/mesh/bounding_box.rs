//! Axis-aligned bounding box

use glam::Vec3;

/// Axis-aligned bounding box in model space.
///
/// A freshly created box is inverted (`+inf`/`-inf`) and only becomes valid
/// once at least one point has been merged in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignedBoundingBox {
    pub minima: Vec3,
    pub maxima: Vec3,
}

impl AxisAlignedBoundingBox {
    /// Create an empty (inverted) box
    pub const fn new() -> Self {
        Self {
            minima: Vec3::splat(f32::MAX),
            maxima: Vec3::splat(f32::MIN),
        }
    }

    /// Create a box from explicit extents
    pub const fn from_min_max(minima: Vec3, maxima: Vec3) -> Self {
        Self { minima, maxima }
    }

    /// Tightest box around a set of points, or `None` for an empty set
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut aabb = Self::new();
        for point in points {
            aabb.merge_point(point);
        }
        aabb.is_valid().then_some(aabb)
    }

    /// Grow the box to contain `point`
    pub fn merge_point(&mut self, point: Vec3) {
        self.minima = self.minima.min(point);
        self.maxima = self.maxima.max(point);
    }

    /// Grow the box to contain `other`
    pub fn merge(&mut self, other: &Self) {
        if other.is_valid() {
            self.merge_point(other.minima);
            self.merge_point(other.maxima);
        }
    }

    /// Whether at least one point has been merged in
    pub fn is_valid(&self) -> bool {
        self.minima.cmple(self.maxima).all()
    }

    pub fn center(&self) -> Vec3 {
        (self.minima + self.maxima) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.maxima - self.minima
    }

    /// Inclusive point containment
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.minima).all() && point.cmple(self.maxima).all()
    }
}

impl Default for AxisAlignedBoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_box_is_inverted() {
        let aabb = AxisAlignedBoundingBox::new();
        assert!(!aabb.is_valid());
        assert!(!aabb.contains(Vec3::ZERO));
    }

    #[test]
    fn test_from_points_is_tight() {
        let points = [
            Vec3::new(1.0, -2.0, 3.0),
            Vec3::new(-1.0, 4.0, 0.5),
            Vec3::new(0.0, 0.0, -6.0),
        ];
        let aabb = AxisAlignedBoundingBox::from_points(points).unwrap();

        assert_eq!(aabb.minima, Vec3::new(-1.0, -2.0, -6.0));
        assert_eq!(aabb.maxima, Vec3::new(1.0, 4.0, 3.0));
        for p in points {
            assert!(aabb.contains(p));
        }
    }

    #[test]
    fn test_from_no_points() {
        assert!(AxisAlignedBoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_center_and_size() {
        let aabb = AxisAlignedBoundingBox::from_min_max(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 2.0, 4.0));
        assert!((aabb.center() - Vec3::new(1.0, 1.0, 3.0)).length() < 0.0001);
        assert!((aabb.size() - Vec3::new(4.0, 2.0, 2.0)).length() < 0.0001);
    }

    #[test]
    fn test_merge_ignores_invalid() {
        let mut aabb = AxisAlignedBoundingBox::from_min_max(Vec3::ZERO, Vec3::ONE);
        aabb.merge(&AxisAlignedBoundingBox::new());
        assert_eq!(aabb.minima, Vec3::ZERO);
        assert_eq!(aabb.maxima, Vec3::ONE);

        aabb.merge(&AxisAlignedBoundingBox::from_min_max(Vec3::splat(-2.0), Vec3::splat(0.5)));
        assert_eq!(aabb.minima, Vec3::splat(-2.0));
        assert_eq!(aabb.maxima, Vec3::ONE);
    }
}
