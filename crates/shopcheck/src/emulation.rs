//! Viewport emulation
//!
//! Named device-size presets applied to the page before navigation. A
//! profile changes how the storefront renders, never what a scenario does.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::{CheckError, CheckResult};

/// Name of the profile used when nothing else is configured
pub const DEFAULT_PROFILE: &str = "default";

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Create a new viewport
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if viewport is in portrait orientation
    #[must_use]
    pub const fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A named device-size preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportProfile {
    /// Preset name (e.g., "iphone-x")
    pub name: String,
    /// Viewport dimensions
    pub viewport: Viewport,
    /// Device pixel ratio
    pub device_scale_factor: f64,
    /// Whether the page should be rendered in mobile mode
    pub is_mobile: bool,
    /// Whether touch events are emulated
    pub has_touch: bool,
}

impl ViewportProfile {
    /// Create a desktop profile
    #[must_use]
    pub fn desktop(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            viewport: Viewport::new(width, height),
            device_scale_factor: 1.0,
            is_mobile: false,
            has_touch: false,
        }
    }

    /// Create a touch-enabled mobile profile
    #[must_use]
    pub fn mobile(name: impl Into<String>, width: u32, height: u32, scale: f64) -> Self {
        Self {
            name: name.into(),
            viewport: Viewport::new(width, height),
            device_scale_factor: scale,
            is_mobile: true,
            has_touch: true,
        }
    }

    /// Look up a built-in preset by name
    pub fn named(name: &str) -> CheckResult<Self> {
        presets()
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| CheckError::UnknownViewport {
                name: name.to_string(),
            })
    }

    /// The profile used before every scenario
    #[must_use]
    pub fn default_desktop() -> Self {
        Self::desktop(DEFAULT_PROFILE, 1000, 660)
    }
}

impl Default for ViewportProfile {
    fn default() -> Self {
        Self::default_desktop()
    }
}

/// Built-in presets, ordered from desktop down to phones
#[must_use]
pub fn presets() -> Vec<ViewportProfile> {
    vec![
        ViewportProfile::default_desktop(),
        ViewportProfile::desktop("macbook-16", 1536, 960),
        ViewportProfile::desktop("macbook-15", 1440, 900),
        ViewportProfile::desktop("macbook-13", 1280, 800),
        ViewportProfile::desktop("macbook-11", 1366, 768),
        ViewportProfile::mobile("ipad-2", 768, 1024, 2.0),
        ViewportProfile::mobile("ipad-mini", 768, 1024, 2.0),
        ViewportProfile::mobile("iphone-xr", 414, 896, 2.0),
        ViewportProfile::mobile("iphone-x", 375, 812, 3.0),
        ViewportProfile::mobile("iphone-8", 375, 667, 2.0),
        ViewportProfile::mobile("iphone-6+", 414, 736, 3.0),
        ViewportProfile::mobile("iphone-6", 375, 667, 2.0),
        ViewportProfile::mobile("iphone-se2", 375, 667, 2.0),
        ViewportProfile::mobile("iphone-5", 320, 568, 2.0),
        ViewportProfile::mobile("samsung-note9", 414, 846, 3.5),
        ViewportProfile::mobile("samsung-s10", 360, 760, 4.0),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_iphone_x_preset() {
        let profile = ViewportProfile::named("iphone-x").unwrap();
        assert_eq!(profile.viewport, Viewport::new(375, 812));
        assert!(profile.is_mobile);
        assert!(profile.has_touch);
        assert!(profile.viewport.is_portrait());
    }

    #[test]
    fn test_default_profile() {
        let profile = ViewportProfile::default();
        assert_eq!(profile.name, DEFAULT_PROFILE);
        assert_eq!(profile.viewport.to_string(), "1000x660");
        assert!(!profile.is_mobile);
        assert_eq!(ViewportProfile::named(DEFAULT_PROFILE).unwrap(), profile);
    }

    #[test]
    fn test_unknown_profile() {
        let err = ViewportProfile::named("iphone-99").unwrap_err();
        assert!(matches!(err, CheckError::UnknownViewport { ref name } if name == "iphone-99"));
    }

    #[test]
    fn test_preset_names_unique() {
        let mut names: Vec<String> = presets().into_iter().map(|p| p.name).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
