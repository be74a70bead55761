use eframe::egui::{Pos2, pos2};

use crate::geometry::CropRect;

/// One of the four resize handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Corner {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Corner {
    /// Fixed hit-test order; the first matching corner wins.
    pub const ALL: [Corner; 4] = [
        Corner::NorthWest,
        Corner::NorthEast,
        Corner::SouthWest,
        Corner::SouthEast,
    ];

    pub fn is_west(self) -> bool {
        matches!(self, Corner::NorthWest | Corner::SouthWest)
    }

    pub fn is_north(self) -> bool {
        matches!(self, Corner::NorthWest | Corner::NorthEast)
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::NorthWest => Corner::SouthEast,
            Corner::NorthEast => Corner::SouthWest,
            Corner::SouthWest => Corner::NorthEast,
            Corner::SouthEast => Corner::NorthWest,
        }
    }

    /// Position of this corner on `rect`.
    pub fn of(self, rect: &CropRect) -> Pos2 {
        let x = if self.is_west() { rect.x } else { rect.right() };
        let y = if self.is_north() { rect.y } else { rect.bottom() };
        pos2(x, y)
    }
}

/// Classification of a pointer-down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitResult {
    Corner(Corner),
    Move,
    None,
}

/// Classifies `pos` against `rect`, both in natural pixels.
///
/// `tolerance` is the handle radius in natural pixels. The zone is a disk, not
/// a square box: a press offset (18, 18) from a corner is about 25.5 px away
/// and misses a 20 px handle. Corners take priority over the body; the body
/// test is strict so border points miss.
pub fn hit_test(pos: Pos2, rect: &CropRect, tolerance: f32) -> HitResult {
    for corner in Corner::ALL {
        if pos.distance(corner.of(rect)) <= tolerance {
            return HitResult::Corner(corner);
        }
    }
    if rect.contains_strict(pos) {
        HitResult::Move
    } else {
        HitResult::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECT: CropRect = CropRect::new(100.0, 100.0, 200.0, 150.0);

    #[test]
    fn corners_are_detected_within_tolerance() {
        assert_eq!(
            hit_test(pos2(110.0, 95.0), &RECT, 20.0),
            HitResult::Corner(Corner::NorthWest)
        );
        assert_eq!(
            hit_test(pos2(305.0, 100.0), &RECT, 20.0),
            HitResult::Corner(Corner::NorthEast)
        );
        assert_eq!(
            hit_test(pos2(100.0, 250.0), &RECT, 20.0),
            HitResult::Corner(Corner::SouthWest)
        );
        assert_eq!(
            hit_test(pos2(315.0, 262.0), &RECT, 20.0),
            HitResult::Corner(Corner::SouthEast)
        );
    }

    #[test]
    fn corner_beats_body() {
        assert_eq!(
            hit_test(pos2(105.0, 105.0), &RECT, 20.0),
            HitResult::Corner(Corner::NorthWest)
        );
    }

    #[test]
    fn interior_is_move_and_outside_is_none() {
        assert_eq!(hit_test(pos2(200.0, 175.0), &RECT, 20.0), HitResult::Move);
        assert_eq!(hit_test(pos2(20.0, 20.0), &RECT, 20.0), HitResult::None);
        // on the border, away from corners
        assert_eq!(hit_test(pos2(200.0, 100.0), &RECT, 20.0), HitResult::None);
    }

    #[test]
    fn handle_zone_is_round() {
        assert_eq!(
            hit_test(pos2(118.0, 118.0), &RECT, 20.0),
            HitResult::Move
        );
        assert_eq!(hit_test(pos2(82.0, 82.0), &RECT, 20.0), HitResult::None);
        assert_eq!(
            hit_test(pos2(114.0, 114.0), &RECT, 20.0),
            HitResult::Corner(Corner::NorthWest)
        );
    }

    #[test]
    fn overlapping_zones_resolve_in_fixed_order() {
        let tiny = CropRect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            hit_test(pos2(5.0, 5.0), &tiny, 20.0),
            HitResult::Corner(Corner::NorthWest)
        );
    }

    #[test]
    fn opposite_is_diagonal() {
        for corner in Corner::ALL {
            let opp = corner.opposite();
            assert_ne!(corner.is_west(), opp.is_west());
            assert_ne!(corner.is_north(), opp.is_north());
        }
    }
}
