//! Core value types with newtype pattern for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Time code in seconds (f64 precision).
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TimeCode(pub f64);

impl TimeCode {
    pub const ZERO: Self = Self(0.0);

    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }

    pub fn as_millis(self) -> f64 {
        self.0 * 1000.0
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.0;
        let hours = (total_secs / 3600.0) as u32;
        let mins = ((total_secs % 3600.0) / 60.0) as u32;
        let secs = total_secs % 60.0;
        write!(f, "{hours:02}:{mins:02}:{secs:06.3}")
    }
}

/// Rational number for frame rates (e.g., 30000/1001 for 29.97fps).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub const FPS_24: Self = Self { num: 24, den: 1 };
    pub const FPS_25: Self = Self { num: 25, den: 1 };
    pub const FPS_30: Self = Self { num: 30, den: 1 };
    pub const FPS_29_97: Self = Self {
        num: 30000,
        den: 1001,
    };
    pub const FPS_60: Self = Self { num: 60, den: 1 };
    pub const FPS_59_94: Self = Self {
        num: 60000,
        den: 1001,
    };

    pub fn new(num: u32, den: u32) -> Self {
        assert!(den > 0, "Rational denominator must be > 0");
        Self { num, den }
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Snap a floating-point rate to a common broadcast rational when one
    /// is within 0.05; otherwise approximate as n/1000.
    pub fn from_fps(fps: f64) -> Self {
        const COMMON: [(f64, Rational); 8] = [
            (
                23.976,
                Rational {
                    num: 24000,
                    den: 1001,
                },
            ),
            (24.0, Rational::FPS_24),
            (25.0, Rational::FPS_25),
            (29.97, Rational::FPS_29_97),
            (30.0, Rational::FPS_30),
            (50.0, Rational { num: 50, den: 1 }),
            (59.94, Rational::FPS_59_94),
            (60.0, Rational::FPS_60),
        ];

        let mut best: Option<(f64, Rational)> = None;
        for (target, rational) in &COMMON {
            let diff = (fps - target).abs();
            if diff < 0.05 && best.map_or(true, |(d, _)| diff < d) {
                best = Some((diff, *rational));
            }
        }
        if let Some((_, rational)) = best {
            return rational;
        }

        Self::new((fps * 1000.0).round() as u32, 1000)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Video resolution in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Byte size of one packed output frame at the given component count.
    pub fn packed_byte_size(self, components: u32) -> usize {
        self.width as usize * self.height as usize * components as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_display() {
        assert_eq!(Rational::FPS_30.to_string(), "30");
        assert_eq!(Rational::FPS_29_97.to_string(), "30000/1001");
    }

    #[test]
    fn rational_from_fps_snaps_common_rates() {
        assert_eq!(Rational::from_fps(29.97), Rational::FPS_29_97);
        assert_eq!(Rational::from_fps(23.976), Rational::new(24000, 1001));
        assert_eq!(Rational::from_fps(60.0), Rational::FPS_60);
    }

    #[test]
    fn rational_from_fps_unusual() {
        // 15 fps has no broadcast sibling; approximated as 15000/1000
        let r = Rational::from_fps(15.0);
        assert_eq!(r.num, 15000);
        assert_eq!(r.den, 1000);
    }

    #[test]
    fn resolution_packed_size() {
        let res = Resolution::new(640, 480);
        assert_eq!(res.packed_byte_size(3), 640 * 480 * 3);
        assert_eq!(res.packed_byte_size(4), 640 * 480 * 4);
    }

    #[test]
    fn timecode_display() {
        let tc = TimeCode::from_secs(3661.5);
        assert!(tc.to_string().starts_with("01:01:01"));
    }
}
