//! Deterministic rasterization of game states into RGB24 frames.
//!
//! Every entity's position is mapped from the configured game coordinate
//! space into output pixel space via a fixed linear scale transform
//! computed once at construction. Rendering is bit-deterministic: the same
//! state always produces the same bytes, which the video-level tests rely
//! on as much as the state-level determinism.
//!
//! Draw order mirrors the upstream game's look: background, food items,
//! then players sorted smallest-to-largest so bigger circles paint over
//! smaller ones. Radii scale by the smaller of the two axis factors to
//! stay circular on non-uniform aspect ratios.

use chrono::{DateTime, Utc};
use replay_types::{EntityId, EntityKind, GameState};

use crate::error::RenderConfigError;

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// Black.
    pub const BLACK: Self = Self(0, 0, 0);
    /// White.
    pub const WHITE: Self = Self(255, 255, 255);
    /// Red.
    pub const RED: Self = Self(255, 0, 0);
    /// Blue.
    pub const BLUE: Self = Self(0, 0, 255);
    /// Green.
    pub const GREEN: Self = Self(0, 128, 0);
    /// Yellow.
    pub const YELLOW: Self = Self(255, 255, 0);
    /// Purple.
    pub const PURPLE: Self = Self(128, 0, 128);
}

/// Renderer configuration: output raster size, source coordinate space,
/// and colors.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Output frame width in pixels.
    pub video_width: u32,
    /// Output frame height in pixels.
    pub video_height: u32,
    /// Game coordinate space width.
    pub game_width: f64,
    /// Game coordinate space height.
    pub game_height: f64,
    /// Background fill color.
    pub background: Color,
    /// Color for food entities.
    pub food_color: Color,
    /// Palette cycled over players (sorted smallest radius first).
    pub player_palette: Vec<Color>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            video_width: 400,
            video_height: 300,
            game_width: 800.0,
            game_height: 600.0,
            background: Color::BLACK,
            food_color: Color::WHITE,
            player_palette: vec![
                Color::RED,
                Color::BLUE,
                Color::GREEN,
                Color::YELLOW,
                Color::PURPLE,
            ],
        }
    }
}

/// One rasterized frame, tagged with its sample timestamp and ordinal
/// index within the replay.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Ordinal index within the frame sequence.
    pub index: u32,
    /// The sample timestamp this frame depicts.
    pub timestamp: DateTime<Utc>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Tightly packed RGB24 pixel data, row-major, `width * height * 3`
    /// bytes.
    pub data: Vec<u8>,
}

/// Maps game states to fixed-size RGB24 raster frames.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    config: RenderConfig,
    scale_x: f64,
    scale_y: f64,
}

impl FrameRenderer {
    /// Build a renderer, validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderConfigError`] for zero output dimensions, a
    /// non-positive game coordinate space, or an empty player palette.
    /// Callers treat this as startup-fatal.
    pub fn new(config: RenderConfig) -> Result<Self, RenderConfigError> {
        if config.video_width == 0 || config.video_height == 0 {
            return Err(RenderConfigError::InvalidVideoDims {
                width: config.video_width,
                height: config.video_height,
            });
        }
        if !(config.game_width.is_finite() && config.game_width > 0.0)
            || !(config.game_height.is_finite() && config.game_height > 0.0)
        {
            return Err(RenderConfigError::InvalidGameDims {
                width: config.game_width,
                height: config.game_height,
            });
        }
        if config.player_palette.is_empty() {
            return Err(RenderConfigError::EmptyPalette);
        }

        let scale_x = f64::from(config.video_width) / config.game_width;
        let scale_y = f64::from(config.video_height) / config.game_height;
        Ok(Self {
            config,
            scale_x,
            scale_y,
        })
    }

    /// Output frame width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.config.video_width
    }

    /// Output frame height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.config.video_height
    }

    /// Map a game-space position and radius into pixel space.
    fn map_to_pixels(&self, x: f64, y: f64, radius: f64) -> (f64, f64, f64) {
        // The radius scales by the smaller factor so circles stay circular.
        let pixel_radius = radius * self.scale_x.min(self.scale_y);
        (x * self.scale_x, y * self.scale_y, pixel_radius)
    }

    /// Render one game state into a frame.
    ///
    /// Deterministic: identical states produce byte-identical frames.
    #[must_use]
    pub fn render(&self, state: &GameState, index: u32) -> Frame {
        let width = self.config.video_width;
        let height = self.config.video_height;
        let mut data = vec![0_u8; (width as usize) * (height as usize) * 3];
        fill(&mut data, self.config.background);

        // Food first, players on top.
        for entity in state
            .entities
            .values()
            .filter(|e| e.kind == EntityKind::Food)
        {
            let (px, py, pr) = self.map_to_pixels(entity.x, entity.y, entity.radius);
            fill_circle(&mut data, width, height, px, py, pr, self.config.food_color);
        }

        // Players sorted smallest radius first (entity id breaks ties so
        // the order -- and therefore the palette assignment -- is total).
        let mut players: Vec<(&EntityId, &replay_types::Entity)> = state
            .entities
            .iter()
            .filter(|(_, e)| e.kind == EntityKind::Player)
            .collect();
        players.sort_by(|(id_a, a), (id_b, b)| {
            a.radius.total_cmp(&b.radius).then_with(|| id_a.cmp(id_b))
        });

        for (i, (_, entity)) in players.iter().enumerate() {
            let color = self
                .config
                .player_palette
                .get(i % self.config.player_palette.len())
                .copied()
                .unwrap_or(Color::WHITE);
            let (px, py, pr) = self.map_to_pixels(entity.x, entity.y, entity.radius);
            fill_circle(&mut data, width, height, px, py, pr, color);
        }

        Frame {
            index,
            timestamp: state.as_of,
            width,
            height,
            data,
        }
    }
}

/// Fill the whole buffer with one color.
fn fill(data: &mut [u8], color: Color) {
    for pixel in data.chunks_exact_mut(3) {
        pixel.copy_from_slice(&[color.0, color.1, color.2]);
    }
}

/// Rasterize a filled circle, clipped to the frame bounds.
///
/// A pixel is inside the circle when its center lies within the radius.
// Bounding-box coordinates are clamped to [0, dim] before the f64 -> u32
// casts, so neither truncation nor sign loss can occur.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fill_circle(data: &mut [u8], width: u32, height: u32, cx: f64, cy: f64, r: f64, color: Color) {
    if !(r.is_finite() && r > 0.0) || !cx.is_finite() || !cy.is_finite() {
        return;
    }
    let y_min = ((cy - r).floor().max(0.0)) as u32;
    let y_max = ((cy + r).ceil().min(f64::from(height))) as u32;
    let x_min = ((cx - r).floor().max(0.0)) as u32;
    let x_max = ((cx + r).ceil().min(f64::from(width))) as u32;
    let r_sq = r * r;

    for py in y_min..y_max {
        let dy = f64::from(py) + 0.5 - cy;
        for px in x_min..x_max {
            let dx = f64::from(px) + 0.5 - cx;
            if dx * dx + dy * dy <= r_sq {
                let offset = ((py as usize) * (width as usize) + (px as usize)) * 3;
                if let Some(pixel) = data.get_mut(offset..offset + 3) {
                    pixel.copy_from_slice(&[color.0, color.1, color.2]);
                }
            }
        }
    }
}
