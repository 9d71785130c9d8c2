//! Aspect classification of uploaded videos.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Width/height ratio of a 16:9 frame.
pub const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;

/// Width/height ratio of a 9:16 frame.
pub const PORTRAIT_RATIO: f64 = 9.0 / 16.0;

/// Maximum distance from a target ratio that still counts as a match.
pub const RATIO_TOLERANCE: f64 = 0.1;

/// Categorical bucket derived from a video's width-to-height ratio.
///
/// The lowercase name doubles as the object key prefix, so stored videos
/// are partitioned as `landscape/...`, `portrait/...` and `other/...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectClass {
    Landscape,
    Portrait,
    Other,
}

impl AspectClass {
    /// All classes, in classification order.
    pub const ALL: [AspectClass; 3] = [
        AspectClass::Landscape,
        AspectClass::Portrait,
        AspectClass::Other,
    ];

    /// Classify a frame size.
    ///
    /// Landscape is checked first, so it wins if both targets ever matched.
    /// Zero dimensions never match a target and fall through to `Other`.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return AspectClass::Other;
        }

        let ratio = width as f64 / height as f64;

        if (ratio - LANDSCAPE_RATIO).abs() < RATIO_TOLERANCE {
            AspectClass::Landscape
        } else if (ratio - PORTRAIT_RATIO).abs() < RATIO_TOLERANCE {
            AspectClass::Portrait
        } else {
            AspectClass::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }
}

impl fmt::Display for AspectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "landscape" => Ok(AspectClass::Landscape),
            "portrait" => Ok(AspectClass::Portrait),
            "other" => Ok(AspectClass::Other),
            _ => Err(ValidationError::UnknownAspectClass(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_resolutions() {
        assert_eq!(AspectClass::from_dimensions(1920, 1080), AspectClass::Landscape);
        assert_eq!(AspectClass::from_dimensions(1280, 720), AspectClass::Landscape);
        assert_eq!(AspectClass::from_dimensions(1080, 1920), AspectClass::Portrait);
        assert_eq!(AspectClass::from_dimensions(720, 1280), AspectClass::Portrait);
        assert_eq!(AspectClass::from_dimensions(1000, 1000), AspectClass::Other);
    }

    #[test]
    fn test_sixteen_by_ten_is_other() {
        // 1.6 is 0.178 away from 16:9
        assert_eq!(AspectClass::from_dimensions(1920, 1200), AspectClass::Other);
    }

    #[test]
    fn test_tolerance_boundary() {
        // 1.85 is within 0.1 of 1.777..., 1.9 is not
        assert_eq!(AspectClass::from_dimensions(1850, 1000), AspectClass::Landscape);
        assert_eq!(AspectClass::from_dimensions(1900, 1000), AspectClass::Other);
        // 0.6 is within 0.1 of 0.5625, 0.7 is not
        assert_eq!(AspectClass::from_dimensions(600, 1000), AspectClass::Portrait);
        assert_eq!(AspectClass::from_dimensions(700, 1000), AspectClass::Other);
    }

    #[test]
    fn test_zero_dimensions() {
        assert_eq!(AspectClass::from_dimensions(0, 1080), AspectClass::Other);
        assert_eq!(AspectClass::from_dimensions(1920, 0), AspectClass::Other);
        assert_eq!(AspectClass::from_dimensions(0, 0), AspectClass::Other);
    }

    #[test]
    fn test_parse_round_trip() {
        for class in AspectClass::ALL {
            assert_eq!(class.as_str().parse::<AspectClass>().unwrap(), class);
        }
        assert!("square".parse::<AspectClass>().is_err());
    }

    #[test]
    fn test_serde_name() {
        let json = serde_json::to_string(&AspectClass::Portrait).unwrap();
        assert_eq!(json, "\"portrait\"");
    }
}
