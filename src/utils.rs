use std::ops::{Deref, DerefMut};

use glam::Vec2;

/// Number of workgroups needed to cover `value` invocations
pub fn workgroup_count(value: u32, workgroup_size: u32) -> u32 {
    value.div_ceil(workgroup_size)
}

/// Maps a cursor position in window pixels to `[-1, 1]` on both axes, `+y` up.
///
/// `None` while the window has no area, e.g. when minimized.
pub fn to_normalized(position: Vec2, window_size: Vec2) -> Option<Vec2> {
    if !(window_size.x > 0.0 && window_size.y > 0.0) {
        return None;
    }

    let half = window_size * 0.5;
    Some((position - half) / (half * Vec2::new(1.0, -1.0)))
}

/// A type thats assumed to exist when accessed
pub enum Exists<T> {
    Some(T),
    None,
}

impl<T> Exists<T> {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn take(&mut self) -> Option<T> {
        match std::mem::replace(self, Self::None) {
            Exists::Some(v) => Some(v),
            Exists::None => None,
        }
    }
}

impl<T> Deref for Exists<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match self {
            Exists::Some(v) => v,
            Exists::None => panic!("Type expected to exist by now but didn't"),
        }
    }
}

impl<T> DerefMut for Exists<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Exists::Some(v) => v,
            Exists::None => panic!("Type expected to exist by now but didn't"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Vec2 = Vec2::new(800.0, 800.0);

    #[test]
    fn workgroups_round_up() {
        assert_eq!(workgroup_count(1_024_000, 256), 4000);
        assert_eq!(workgroup_count(1, 256), 1);
        assert_eq!(workgroup_count(257, 256), 2);
    }

    #[test]
    fn center_maps_to_origin() {
        assert_eq!(to_normalized(WINDOW * 0.5, WINDOW), Some(Vec2::ZERO));
    }

    #[test]
    fn corners_flip_vertical_axis() {
        assert_eq!(to_normalized(Vec2::ZERO, WINDOW), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(to_normalized(WINDOW, WINDOW), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(
            to_normalized(Vec2::new(800.0, 0.0), WINDOW),
            Some(Vec2::new(1.0, 1.0))
        );
    }

    #[test]
    fn mapping_is_linear() {
        let size = Vec2::new(1280.0, 720.0);
        let a = to_normalized(Vec2::new(100.0, 50.0), size).unwrap();
        let b = to_normalized(Vec2::new(300.0, 250.0), size).unwrap();
        let mid = to_normalized(Vec2::new(200.0, 150.0), size).unwrap();
        assert!((mid - (a + b) * 0.5).length() < 1e-6);
    }

    #[test]
    fn minimized_window_has_no_attractor() {
        let cursor = Vec2::new(120.0, 300.0);
        assert_eq!(to_normalized(cursor, Vec2::ZERO), None);
        assert_eq!(to_normalized(cursor, Vec2::new(800.0, 0.0)), None);
        assert_eq!(to_normalized(cursor, Vec2::new(0.0, 800.0)), None);
    }

    #[test]
    fn exists_take_empties() {
        let mut value = Exists::Some(3);
        assert_eq!(value.take(), Some(3));
        assert!(value.is_none());
        assert_eq!(value.take(), None);
    }
}
