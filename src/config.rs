//! Scene configuration.
//!
//! [`SceneConfig`] carries the content tables (labels, boards, logos) and every
//! tunable the scene reads at runtime. `SceneConfig::default()` is the portfolio
//! as it ships; tests and the native preview build variations of it.

/// Text lines drawn onto one label sprite. Line 0 is the heading.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelDescriptor {
    pub lines: Vec<String>,
}

impl LabelDescriptor {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// Axis offsets applied on top of a board's world position.
///
/// Parsed from the flag strings of the content tables. `"xz"` sets both
/// `x` and `z`, `"-x"` sets `neg_x` as well as `x` because it contains the
/// letter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AxisOffsets {
    pub x: bool,
    pub z: bool,
    pub neg_x: bool,
}

impl AxisOffsets {
    pub const BASE_Y: f32 = -0.1;
    pub const X: f32 = -0.1;
    pub const Z: f32 = 0.05;
    pub const NEG_X: f32 = 0.2;

    pub fn parse(flags: &str) -> Self {
        Self {
            x: flags.contains('x'),
            z: flags.contains('z'),
            neg_x: flags.contains("-x"),
        }
    }

    pub fn apply(&self, position: cgmath::Vector3<f32>) -> cgmath::Vector3<f32> {
        let mut position = position;
        position.y += Self::BASE_Y;
        if self.x {
            position.x += Self::X;
        }
        if self.z {
            position.z += Self::Z;
        }
        if self.neg_x {
            position.x += Self::NEG_X;
        }
        position
    }
}

/// Where a label is attached: the board node, its offsets and a uniform scale.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardPlacement {
    pub node: String,
    pub offsets: AxisOffsets,
    pub scale: f32,
}

impl BoardPlacement {
    pub fn new(node: &str, flags: &str, scale: f32) -> Self {
        Self {
            node: node.to_string(),
            offsets: AxisOffsets::parse(flags),
            scale,
        }
    }
}

/// Accumulator limits of the scroll gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelConfig {
    /// Once the magnitude exceeds this value the next update starts from zero.
    pub wrap_threshold: f64,
    /// Accumulated units per second of animation time.
    pub units_per_second: f64,
    /// Reveal thresholds `(first, second)` for a forward scroll.
    pub forward_reveal: (f64, f64),
    /// Reveal thresholds `(first, second)` for a backward scroll.
    pub backward_reveal: (f64, f64),
    /// Pixels per line when the platform reports wheel deltas in lines.
    pub pixels_per_line: f64,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            wrap_threshold: 4500.0,
            units_per_second: 1000.0,
            forward_reveal: (1000.0, 2000.0),
            backward_reveal: (-1000.0, -1500.0),
            pixels_per_line: 100.0,
        }
    }
}

/// Canvas sizing rules. Ratios are height over width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportConfig {
    pub mobile_max_width: f64,
    pub initial_mobile_ratio: f64,
    pub resize_mobile_ratio: f64,
    pub desktop_ratio: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            mobile_max_width: 768.0,
            initial_mobile_ratio: 16.0 / 9.0,
            resize_mobile_ratio: 8.0 / 6.0,
            desktop_ratio: 9.0 / 16.0,
        }
    }
}

/// Camera overrides applied to the camera embedded in the asset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    pub index: usize,
    pub fov_degrees: f32,
    pub mobile_fov_degrees: f32,
    pub mobile_aspect: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 1,
            fov_degrees: 35.0,
            mobile_fov_degrees: 40.0,
            mobile_aspect: 9.0 / 16.0,
        }
    }
}

/// Per-node shadow flags, matched against top-level node names.
#[derive(Clone, Debug, PartialEq)]
pub enum ShadowMatch {
    Exact(String),
    Contains(String),
}

impl ShadowMatch {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            ShadowMatch::Exact(pattern) => name == pattern,
            ShadowMatch::Contains(pattern) => name.contains(pattern.as_str()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShadowRule {
    pub matcher: ShadowMatch,
    pub cast: Option<bool>,
    pub receive: Option<bool>,
    /// Also flag the matched node itself, not only the meshes directly below it.
    pub include_node: bool,
}

/// Lighting and shadow configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct LightingConfig {
    pub ambient_colour: u32,
    pub key_light: String,
    /// Nodes containing this marker are only shown with the dark theme.
    pub night_marker: String,
    pub directional_shadow_bias: f32,
    pub point_shadow_bias: f32,
    pub point_distance: f32,
    pub point_decay: f32,
    pub point_intensity: f32,
    pub point_nudge: [f32; 3],
    pub shadow_map_size: u32,
    pub shadow_extent: f32,
    pub shadow_rules: Vec<ShadowRule>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        let rule = |matcher, cast, receive, include_node| ShadowRule {
            matcher,
            cast,
            receive,
            include_node,
        };
        Self {
            ambient_colour: 0xaaccff,
            key_light: "light_key".to_string(),
            night_marker: "kagaribi".to_string(),
            directional_shadow_bias: -0.0008,
            point_shadow_bias: 0.008,
            point_distance: 5.0,
            point_decay: 2.0,
            point_intensity: 1.0,
            point_nudge: [0.0, 0.05, 0.05],
            shadow_map_size: 2048,
            shadow_extent: 5.0,
            shadow_rules: vec![
                rule(ShadowMatch::Exact("base".into()), None, Some(true), true),
                rule(ShadowMatch::Contains("board".into()), Some(true), None, false),
                rule(ShadowMatch::Contains("monument".into()), Some(true), None, false),
                rule(ShadowMatch::Contains("wall".into()), Some(true), Some(true), false),
                rule(ShadowMatch::Contains("hori".into()), Some(false), Some(true), false),
            ],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FogConfig {
    pub near: f32,
    pub far: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self { near: 5.0, far: 12.0 }
    }
}

/// Everything the scene needs to know up front.
#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub asset_path: String,
    pub labels: Vec<LabelDescriptor>,
    pub boards: Vec<BoardPlacement>,
    pub logos: Vec<String>,
    /// The label that is visible from the start. All others are revealed by scrolling.
    pub always_visible_label: usize,
    /// The label that carries the logo row.
    pub logo_label: usize,
    pub camera: CameraConfig,
    pub wheel: WheelConfig,
    pub viewport: ViewportConfig,
    pub lighting: LightingConfig,
    pub fog: FogConfig,
    /// Start in dark mode.
    pub dark: bool,
    /// Log the number of draw calls of every frame.
    pub debug: bool,
}

const DEVICON_BASE: &str = "https://cdn.jsdelivr.net/gh/devicons/devicon/icons";

fn devicon(name: &str) -> String {
    format!("{DEVICON_BASE}/{name}/{name}-original.svg")
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset_path: "/portfolio/koguchi_asset_portfolio.glb".to_string(),
            labels: vec![
                LabelDescriptor::new([
                    "About",
                    "Name: hokugo_wd",
                    "Location: Hokkaido, Japan",
                    "X: https://x.com/HokugoW",
                ]),
                LabelDescriptor::new([
                    "Skill",
                    "Web Development - Full Stack",
                    "3D Modeling - Blender, Three.js",
                ]),
                LabelDescriptor::new(["Works"]),
            ],
            boards: vec![
                BoardPlacement::new("board", "-x", 1.0),
                BoardPlacement::new("board001", "xz", 1.0),
                BoardPlacement::new("board_small", "-x", 0.75),
            ],
            logos: ["nodejs", "python", "svelte", "blender", "threejs"]
                .into_iter()
                .map(devicon)
                .collect(),
            always_visible_label: 1,
            logo_label: 1,
            camera: CameraConfig::default(),
            wheel: WheelConfig::default(),
            viewport: ViewportConfig::default(),
            lighting: LightingConfig::default(),
            fog: FogConfig::default(),
            dark: false,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;

    #[test]
    fn flags_parse_like_substring_checks() {
        assert_eq!(
            AxisOffsets::parse("-x"),
            AxisOffsets {
                x: true,
                z: false,
                neg_x: true
            }
        );
        assert_eq!(
            AxisOffsets::parse("xz"),
            AxisOffsets {
                x: true,
                z: true,
                neg_x: false
            }
        );
        assert_eq!(AxisOffsets::parse(""), AxisOffsets::default());
    }

    #[test]
    fn negative_x_nets_a_positive_shift() {
        let p = AxisOffsets::parse("-x").apply(Vector3::new(1.0, 1.0, 1.0));
        assert!((p.x - 1.1).abs() < 1e-6);
        assert!((p.y - 0.9).abs() < 1e-6);
        assert!((p.z - 1.0).abs() < 1e-6);

        let p = AxisOffsets::parse("xz").apply(Vector3::new(0.0, 0.0, 0.0));
        assert!((p.x + 0.1).abs() < 1e-6);
        assert!((p.z - 0.05).abs() < 1e-6);
    }

    #[test]
    fn default_tables_pair_up() {
        let config = SceneConfig::default();
        assert_eq!(config.labels.len(), config.boards.len());
        assert_eq!(config.logos.len(), 5);
        assert!(config.logos[0].ends_with("nodejs/nodejs-original.svg"));
        assert_eq!(config.labels[1].lines[0], "Skill");
    }

    #[test]
    fn shadow_matchers() {
        assert!(ShadowMatch::Exact("base".into()).matches("base"));
        assert!(!ShadowMatch::Exact("base".into()).matches("base001"));
        assert!(ShadowMatch::Contains("wall".into()).matches("wall_left"));
    }
}
