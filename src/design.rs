//! The LCARS app icon as a pure pixel function
//!
//! The icon is a round badge: a light outer rim, a black ring, amber and teal
//! cross bars, a two-tone arc and a light blue center disc on a navy field.
//! Every pixel is classified by an ordered list of rules; the first rule that
//! matches decides the color, so the order of [`RULES`] is part of the design.

use image::Rgba;

/// Width and height of the rendered icon in pixels.
pub const CANVAS_SIZE: u32 = 1024;

/// Center of the icon on both axes.
pub const CENTER: u32 = 512;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
pub const BLUE_GRAY: Rgba<u8> = Rgba([102, 136, 204, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const AMBER: Rgba<u8> = Rgba([255, 153, 0, 255]);
pub const TEAL: Rgba<u8> = Rgba([102, 204, 204, 255]);
pub const VIOLET: Rgba<u8> = Rgba([204, 119, 255, 255]);
pub const LIGHT_BLUE: Rgba<u8> = Rgba([153, 204, 255, 255]);
pub const NAVY: Rgba<u8> = Rgba([0, 8, 20, 255]);

/// Position of a pixel relative to the icon center
///
/// Offsets are absolute distances, so every rule only ever sees the first
/// quadrant and the design is mirrored across both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub dx: f64,
    pub dy: f64,
    pub r: f64,
}

impl Sample {
    /// Builds a sample from offsets to the center (sign is dropped)
    pub fn from_offsets(dx: f64, dy: f64) -> Self {
        let (dx, dy) = (dx.abs(), dy.abs());
        Self {
            dx,
            dy,
            r: (dx * dx + dy * dy).sqrt(),
        }
    }

    /// Builds the sample for pixel `(x, y)` of the canvas
    pub fn at(x: u32, y: u32) -> Self {
        let dx = (i64::from(x) - i64::from(CENTER)).abs();
        let dy = (i64::from(y) - i64::from(CENTER)).abs();
        Self::from_offsets(dx as f64, dy as f64)
    }

    /// Angle of the sample in radians, within `[0, π/2]`
    pub fn angle(&self) -> f64 {
        self.dy.atan2(self.dx)
    }
}

/// A single step of the decision list: `Some(color)` claims the pixel
pub type Rule = fn(&Sample) -> Option<Rgba<u8>>;

/// Decision list in evaluation order, first match wins
pub const RULES: &[Rule] = &[
    outside_badge,
    outer_rim,
    black_ring,
    horizontal_bar,
    vertical_bar,
    inner_arc,
    center_disc,
    center_rim,
];

fn outside_badge(s: &Sample) -> Option<Rgba<u8>> {
    (s.r > 460.0).then_some(TRANSPARENT)
}

fn outer_rim(s: &Sample) -> Option<Rgba<u8>> {
    (s.r > 440.0).then_some(BLUE_GRAY)
}

fn black_ring(s: &Sample) -> Option<Rgba<u8>> {
    (s.r > 400.0).then_some(BLACK)
}

fn horizontal_bar(s: &Sample) -> Option<Rgba<u8>> {
    (s.dy < 60.0 && s.dx < 350.0).then_some(AMBER)
}

fn vertical_bar(s: &Sample) -> Option<Rgba<u8>> {
    (s.dx < 60.0 && s.dy < 350.0).then_some(TEAL)
}

/// Two-tone arc; angles at or past 1.5 rad are left to the later rules
fn inner_arc(s: &Sample) -> Option<Rgba<u8>> {
    if !(s.r > 300.0 && s.r < 340.0) {
        return None;
    }
    match s.angle() {
        a if a < 0.8 => Some(VIOLET),
        a if a < 1.5 => Some(BLUE_GRAY),
        _ => None,
    }
}

fn center_disc(s: &Sample) -> Option<Rgba<u8>> {
    (s.r < 120.0).then_some(LIGHT_BLUE)
}

fn center_rim(s: &Sample) -> Option<Rgba<u8>> {
    (s.r < 125.0).then_some(BLUE_GRAY)
}

/// Runs the decision list for a sample, falling back to the navy field
pub fn classify(sample: &Sample) -> Rgba<u8> {
    RULES
        .iter()
        .find_map(|rule| rule(sample))
        .unwrap_or(NAVY)
}

/// Color of the icon at pixel `(x, y)`
pub fn icon(x: u32, y: u32) -> Rgba<u8> {
    classify(&Sample::at(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_pixel_is_light_blue() {
        assert_eq!(icon(512, 512), LIGHT_BLUE);
    }

    #[test]
    fn test_corner_pixel_is_transparent() {
        assert_eq!(icon(0, 0), TRANSPARENT);
        assert_eq!(icon(1023, 1023), TRANSPARENT);
    }

    #[test]
    fn test_outer_boundary_classification() {
        // r > 460 is strict, so exactly 460 still belongs to the rim
        assert_eq!(classify(&Sample::from_offsets(460.0, 0.0)), BLUE_GRAY);
        assert_eq!(classify(&Sample::from_offsets(460.0001, 0.0)), TRANSPARENT);
        assert_eq!(classify(&Sample::from_offsets(459.9999, 0.0)), BLUE_GRAY);
        assert_eq!(icon(512 + 460, 512), BLUE_GRAY);
        assert_eq!(icon(512 + 461, 512), TRANSPARENT);
    }

    #[test]
    fn test_ring_bands() {
        assert_eq!(icon(512 + 441, 512), BLUE_GRAY);
        assert_eq!(icon(512 + 440, 512), BLACK);
        assert_eq!(icon(512 + 401, 512), BLACK);
        // r == 400 falls through to the bars and the arc rules
        assert_eq!(icon(512 + 400, 512), NAVY);
    }

    #[test]
    fn test_cross_bars() {
        assert_eq!(icon(512 + 349, 512 + 59), AMBER);
        assert_eq!(icon(512 + 59, 512 + 349), TEAL);
        // both predicates hold near the center; the horizontal bar wins
        assert_eq!(icon(512 + 10, 512 + 10), AMBER);
        assert_eq!(icon(512 + 350, 512), NAVY);
        assert_eq!(icon(512, 512 + 350), NAVY);
    }

    #[test]
    fn test_inner_arc_tones() {
        // angle ~0.79 rad sits just under the violet cutoff
        assert_eq!(icon(512 + 230, 512 + 230), VIOLET);
        // angle ~1.0 rad
        assert_eq!(icon(512 + 173, 512 + 270), BLUE_GRAY);
        assert_eq!(icon(512 + 60, 512 + 320), BLUE_GRAY);
        // steep angles are left to later rules, which the vertical bar claims
        assert_eq!(inner_arc(&Sample::from_offsets(20.0, 320.0)), None);
        assert_eq!(classify(&Sample::from_offsets(20.0, 320.0)), TEAL);
        assert_eq!(inner_arc(&Sample::from_offsets(290.0, 10.0)), None);
    }

    #[test]
    fn test_center_disc_and_rim() {
        assert_eq!(classify(&Sample::from_offsets(80.0, 80.0)), LIGHT_BLUE);
        assert_eq!(classify(&Sample::from_offsets(50.0, 80.0)), TEAL);
        assert_eq!(classify(&Sample::from_offsets(85.0, 86.0)), BLUE_GRAY);
        assert_eq!(classify(&Sample::from_offsets(90.0, 90.0)), NAVY);
    }

    #[test]
    fn test_deterministic() {
        for y in (0..CANVAS_SIZE).step_by(7) {
            for x in (0..CANVAS_SIZE).step_by(11) {
                assert_eq!(icon(x, y), icon(x, y));
            }
        }
    }

    #[test]
    fn test_mirror_symmetry() {
        for y in (1..CANVAS_SIZE).step_by(5) {
            for x in (1..CANVAS_SIZE).step_by(5) {
                let mirrored_x = 2 * CENTER - x;
                let mirrored_y = 2 * CENTER - y;
                assert_eq!(icon(x, y), icon(mirrored_x, y), "x mirror at ({x}, {y})");
                assert_eq!(icon(x, y), icon(x, mirrored_y), "y mirror at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_quarter_turn_symmetry_outside_bars_and_arc() {
        for dy in (0..460u32).step_by(3) {
            for dx in (0..460u32).step_by(3) {
                let sample = Sample::from_offsets(dx as f64, dy as f64);
                let on_bar = (sample.dx < 60.0 && sample.dy < 350.0)
                    || (sample.dy < 60.0 && sample.dx < 350.0);
                let on_arc = sample.r > 300.0 && sample.r < 340.0;
                if on_bar || on_arc {
                    continue;
                }
                assert_eq!(
                    icon(CENTER + dx, CENTER + dy),
                    icon(CENTER + dy, CENTER + dx),
                    "quarter turn at offset ({dx}, {dy})"
                );
            }
        }
    }

    #[test]
    fn test_bars_swap_under_quarter_turn() {
        assert_eq!(icon(512 + 200, 512), AMBER);
        assert_eq!(icon(512, 512 + 200), TEAL);
    }
}
