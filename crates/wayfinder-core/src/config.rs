use serde::{Deserialize, Serialize};

/// Source image dimensions the stored node coordinates are expressed in.
const IMAGE_WIDTH: f64 = 2475.0;
/// Source image height, in pixels.
const IMAGE_HEIGHT: f64 = 1485.0;
/// On-screen map viewport width the display coordinates are expressed in.
const MAP_WIDTH: f64 = 1661.0;
/// On-screen map viewport height.
const MAP_HEIGHT: f64 = 997.0;

/// Fixed per-axis linear scale between store-space and display-space
/// coordinates.
///
/// Store coordinates are integral pixel positions in the source map image;
/// display coordinates are the scaled positions the presentation layer
/// renders at. The defaults reproduce the deployed map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionScale {
    /// display-x per store-x
    pub horizontal: f64,
    /// display-y per store-y
    pub vertical: f64,
}

impl Default for ProjectionScale {
    fn default() -> Self {
        Self {
            horizontal: MAP_WIDTH / IMAGE_WIDTH,
            vertical: MAP_HEIGHT / IMAGE_HEIGHT,
        }
    }
}

/// Configuration for a graph editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Floor loaded when the session opens
    pub default_floor: i32,

    /// Building loaded when the session opens
    pub default_building: String,

    /// Store-space to display-space scale factors
    pub scale: ProjectionScale,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_floor: 4,
            default_building: "Faulkner".to_string(),
            scale: ProjectionScale::default(),
        }
    }
}
