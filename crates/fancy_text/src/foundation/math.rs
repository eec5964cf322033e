//! Math utilities and types
//!
//! Provides the small set of 2D math types text layout needs.

pub use nalgebra::{Vector2, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 4D vector type, used for RGBA colors
pub type Vec4 = Vector4<f32>;

/// Axis-aligned rectangle in pixel space (top-left origin, +Y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Top-left corner
    pub position: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Rect {
    /// Create a rectangle from its top-left corner and size
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Right edge
    pub fn max_x(&self) -> f32 {
        self.position.x + self.size.x
    }

    /// Bottom edge
    pub fn max_y(&self) -> f32 {
        self.position.y + self.size.y
    }

    /// Whether a point lies inside the rectangle (right/bottom edges exclusive)
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.position.x
            && point.y >= self.position.y
            && point.x < self.max_x()
            && point.y < self.max_y()
    }
}

/// Build an RGBA color
pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Vec4 {
    Vec4::new(r, g, b, a)
}

/// Convert an HSV triple (all components 0-1) to an opaque RGB color
///
/// Used by the random-color text effects.
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Vec4 {
    let h = hue.rem_euclid(1.0) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - saturation * f);
    let t = value * (1.0 - saturation * (1.0 - f));

    let (r, g, b) = match sector as u32 {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };
    Vec4::new(r, g, b, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(10.0, 10.0, 20.0, 5.0);

        assert!(rect.contains(Vec2::new(10.0, 10.0)));
        assert!(rect.contains(Vec2::new(29.9, 14.9)));
        assert!(!rect.contains(Vec2::new(30.0, 12.0)));
        assert!(!rect.contains(Vec2::new(15.0, 9.0)));
    }

    #[test]
    fn test_hsv_primaries() {
        let red = hsv_to_rgb(0.0, 1.0, 1.0);
        assert_relative_eq!(red.x, 1.0);
        assert_relative_eq!(red.y, 0.0);

        let green = hsv_to_rgb(1.0 / 3.0, 1.0, 1.0);
        assert_relative_eq!(green.y, 1.0);
        assert_relative_eq!(green.x, 0.0, epsilon = 1e-5);

        // Hue wraps around
        let wrapped = hsv_to_rgb(1.0, 1.0, 1.0);
        assert_relative_eq!(wrapped.x, 1.0);
    }
}
