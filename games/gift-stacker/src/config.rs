//! Difficulty presets, persisted player settings and per-round geometry.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Gravity at drop multiplier 1.0, px/s².
pub const BASE_GRAVITY: f32 = 1400.0;

pub const DEFAULT_VIEWPORT: Vec2 = Vec2::new(800.0, 800.0);

const PLATFORM_HEIGHT: f32 = 20.0;
const PLATFORM_MIN_WIDTH: f32 = 200.0;
/// Platform center sits this far above the bottom edge.
const PLATFORM_BOTTOM_OFFSET: f32 = 50.0;
const BOX_SIZE_FRACTION: f32 = 0.15;
const BOX_MIN_SIZE: f32 = 60.0;
const BOX_MAX_SIZE: f32 = 120.0;
/// Boxes below `height + OFFSCREEN_MARGIN` are gone for good.
pub const OFFSCREEN_MARGIN: f32 = 100.0;
const GROUND_HEIGHT: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Standard,
    Hard,
}

/// Tuning values a difficulty level applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyPreset {
    pub slide: f32,
    pub drop: f32,
    pub bounce: f32,
    pub lives: u32,
    pub width_pct: f32,
    /// Auto-drop countdown per box; `None` disables it.
    pub drop_time_ms: Option<f32>,
}

impl Difficulty {
    pub fn preset(self) -> DifficultyPreset {
        match self {
            Difficulty::Easy => DifficultyPreset {
                slide: 0.5,
                drop: 0.8,
                bounce: 0.0,
                lives: 5,
                width_pct: 0.58,
                drop_time_ms: None,
            },
            Difficulty::Standard => DifficultyPreset {
                slide: 1.0,
                drop: 1.0,
                bounce: 0.05,
                lives: 3,
                width_pct: 0.48,
                drop_time_ms: Some(11_000.0),
            },
            Difficulty::Hard => DifficultyPreset {
                slide: 1.5,
                drop: 1.4,
                bounce: 0.12,
                lives: 1,
                width_pct: 0.42,
                drop_time_ms: Some(7_000.0),
            },
        }
    }

    /// Host-side index: 0 easy, 1 standard, 2 hard.
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Difficulty::Easy),
            1 => Some(Difficulty::Standard),
            2 => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Player settings persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    pub slide_mult: f32,
    pub drop_mult: f32,
    pub bounce: f32,
    pub random_sizes: bool,
    pub sound: bool,
    /// Opaque to the game; only stored for the host.
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        let preset = Difficulty::Standard.preset();
        Self {
            difficulty: Difficulty::Standard,
            slide_mult: preset.slide,
            drop_mult: preset.drop,
            bounce: preset.bounce,
            random_sizes: false,
            sound: true,
            theme: "christmas".to_string(),
        }
    }
}

impl Settings {
    /// Select a difficulty and overwrite the slide, drop and bounce tuning
    /// with its presets.
    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        let preset = difficulty.preset();
        self.difficulty = difficulty;
        self.slide_mult = preset.slide;
        self.drop_mult = preset.drop;
        self.bounce = preset.bounce;
    }

    /// Hand-tuned multipliers. Non-finite or negative values are ignored.
    pub fn set_tuning(&mut self, slide_mult: f32, drop_mult: f32, bounce: f32) {
        if slide_mult.is_finite() && slide_mult > 0.0 {
            self.slide_mult = slide_mult;
        }
        if drop_mult.is_finite() && drop_mult > 0.0 {
            self.drop_mult = drop_mult;
        }
        if bounce.is_finite() && bounce >= 0.0 {
            self.bounce = bounce.min(1.0);
        }
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::new(0.0, BASE_GRAVITY * self.drop_mult)
    }

    pub fn preset(&self) -> DifficultyPreset {
        self.difficulty.preset()
    }
}

/// Geometry of one round, fixed at round start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub box_size: f32,
    pub platform_width: f32,
}

impl Layout {
    pub fn new(viewport: Vec2, width_pct: f32) -> Self {
        Self {
            width: viewport.x,
            height: viewport.y,
            box_size: (viewport.x * BOX_SIZE_FRACTION).clamp(BOX_MIN_SIZE, BOX_MAX_SIZE),
            platform_width: (viewport.x * width_pct).max(PLATFORM_MIN_WIDTH),
        }
    }

    pub fn platform_center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height - PLATFORM_BOTTOM_OFFSET)
    }

    pub fn platform_size(&self) -> Vec2 {
        Vec2::new(self.platform_width, PLATFORM_HEIGHT)
    }

    /// Y of the platform's top face.
    pub fn platform_surface(&self) -> f32 {
        self.platform_center().y - PLATFORM_HEIGHT / 2.0
    }

    pub fn ground_center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height + OFFSCREEN_MARGIN)
    }

    pub fn ground_size(&self) -> Vec2 {
        Vec2::new(self.width * 2.0, GROUND_HEIGHT)
    }

    /// Boxes whose center passes this line have left the play area.
    pub fn offscreen_line(&self) -> f32 {
        self.height + OFFSCREEN_MARGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_table() {
        let easy = Difficulty::Easy.preset();
        assert_eq!((easy.lives, easy.drop_time_ms), (5, None));
        let standard = Difficulty::Standard.preset();
        assert_eq!((standard.lives, standard.drop_time_ms), (3, Some(11_000.0)));
        let hard = Difficulty::Hard.preset();
        assert_eq!((hard.slide, hard.drop, hard.bounce), (1.5, 1.4, 0.12));
        assert_eq!(hard.width_pct, 0.42);
    }

    #[test]
    fn apply_difficulty_overwrites_tuning() {
        let mut settings = Settings::default();
        settings.set_tuning(2.0, 2.0, 0.9);
        settings.apply_difficulty(Difficulty::Easy);
        assert_eq!(settings.difficulty, Difficulty::Easy);
        assert_eq!((settings.slide_mult, settings.drop_mult, settings.bounce), (0.5, 0.8, 0.0));
    }

    #[test]
    fn invalid_tuning_is_ignored() {
        let mut settings = Settings::default();
        settings.set_tuning(f32::NAN, -1.0, 3.0);
        assert_eq!(settings.slide_mult, 1.0);
        assert_eq!(settings.drop_mult, 1.0);
        assert_eq!(settings.bounce, 1.0);
    }

    #[test]
    fn gravity_scales_with_drop_speed() {
        let mut settings = Settings::default();
        settings.apply_difficulty(Difficulty::Hard);
        assert!((settings.gravity().y - 1960.0).abs() < 1e-3);
    }

    #[test]
    fn settings_json_fills_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{"difficulty":"hard","sound":false}"#).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert!(!settings.sound);
        assert_eq!(settings.theme, "christmas");
    }

    #[test]
    fn layout_for_desktop_viewport() {
        let layout = Layout::new(Vec2::new(800.0, 800.0), 0.48);
        assert_eq!(layout.box_size, 120.0);
        assert!((layout.platform_width - 384.0).abs() < 1e-3);
        assert_eq!(layout.platform_center(), Vec2::new(400.0, 750.0));
        assert_eq!(layout.platform_surface(), 740.0);
        assert_eq!(layout.ground_center(), Vec2::new(400.0, 900.0));
        assert_eq!(layout.ground_size(), Vec2::new(1600.0, 50.0));
    }

    #[test]
    fn layout_clamps_small_screens() {
        let layout = Layout::new(Vec2::new(320.0, 640.0), 0.42);
        assert_eq!(layout.box_size, 60.0);
        assert_eq!(layout.platform_width, 200.0);
    }
}
