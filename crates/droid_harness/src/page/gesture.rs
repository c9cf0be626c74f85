//! Screen-relative gesture geometry

use crate::session::{Point, WindowSize};

fn at(size: WindowSize, fx: f64, fy: f64) -> Point {
    Point::new(
        (f64::from(size.width) * fx) as i32,
        (f64::from(size.height) * fy) as i32,
    )
}

/// Vertical swipe from a quarter to three quarters of the screen height
pub fn swipe_down_path(size: WindowSize) -> (Point, Point) {
    (at(size, 0.5, 0.25), at(size, 0.5, 0.75))
}

/// Horizontal swipe from 75% to 5% of the screen width at mid height
pub fn swipe_left_path(size: WindowSize) -> (Point, Point) {
    (at(size, 0.75, 0.5), at(size, 0.05, 0.5))
}

/// Context to switch to: the last one in enumeration order differing from `current`.
///
/// `None` when only one context exists.
pub fn pick_context(current: &str, contexts: &[String]) -> Option<String> {
    if contexts.len() <= 1 {
        return None;
    }
    contexts.iter().rev().find(|c| c.as_str() != current).cloned()
}
