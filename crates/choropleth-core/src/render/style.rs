use std::fmt;
use std::str::FromStr;

use choropleth_geometry::Granularity;
use serde::{Deserialize, Serialize};

use crate::error::{ChoroplethError, Result};
use crate::render::projection::Projection;

const MAX_IMAGE_SIDE: u32 = 16_384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Linear interpolation in RGB space; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    fn named(name: &str) -> Option<Color> {
        let color = match name {
            "white" => Color::rgb(255, 255, 255),
            "black" => Color::rgb(0, 0, 0),
            "red" => Color::rgb(255, 0, 0),
            "green" => Color::rgb(0, 255, 0),
            "blue" => Color::rgb(0, 0, 255),
            "yellow" => Color::rgb(255, 255, 0),
            "orange" => Color::rgb(255, 165, 0),
            "purple" => Color::rgb(160, 32, 240),
            "darkred" => Color::rgb(139, 0, 0),
            "darkblue" => Color::rgb(0, 0, 139),
            "steelblue" => Color::rgb(70, 130, 180),
            "grey" | "gray" => Color::rgb(190, 190, 190),
            "grey50" | "gray50" => Color::rgb(127, 127, 127),
            "lightgrey" | "lightgray" => Color::rgb(211, 211, 211),
            "darkgrey" | "darkgray" => Color::rgb(169, 169, 169),
            "transparent" => Color::rgba(0, 0, 0, 0),
            _ => return None,
        };
        Some(color)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            let channel = |idx: usize| {
                hex.get(idx..idx + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| format!("invalid hex color '{trimmed}'"))
            };
            return match hex.len() {
                6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
                8 => Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
                _ => Err(format!("invalid hex color '{trimmed}'")),
            };
        }

        Color::named(&trimmed.to_ascii_lowercase())
            .ok_or_else(|| format!("unknown color name '{trimmed}'"))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    Px,
    #[default]
    In,
    Cm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionChoice {
    /// Quickmap for world geometry, Mercator otherwise.
    #[default]
    Auto,
    Mercator,
    Quickmap,
}

impl ProjectionChoice {
    pub fn resolve(self, granularity: Granularity) -> Projection {
        match self {
            ProjectionChoice::Auto => Projection::for_granularity(granularity),
            ProjectionChoice::Mercator => Projection::Mercator,
            ProjectionChoice::Quickmap => Projection::Quickmap,
        }
    }
}

/// Presentation settings for the rasterized map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub title: Option<String>,
    pub low: Color,
    pub mid: Color,
    pub high: Color,
    pub missing: Color,
    pub border: Option<Color>,
    pub background: Color,
    /// Fixed `[min, max]` for the color scale instead of the data range.
    pub limits: Option<[f64; 2]>,
    pub midpoint: Option<f64>,
    pub show_axes: bool,
    pub show_legend: bool,
    pub width: f64,
    pub height: f64,
    pub unit: SizeUnit,
    pub dpi: f64,
    pub projection: ProjectionChoice,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            title: None,
            low: Color::rgb(0, 0, 255),
            mid: Color::rgb(255, 255, 255),
            high: Color::rgb(255, 0, 0),
            missing: Color::rgb(127, 127, 127),
            border: Some(Color::rgb(51, 51, 51)),
            background: Color::rgb(255, 255, 255),
            limits: None,
            midpoint: None,
            show_axes: false,
            show_legend: true,
            width: 8.0,
            height: 5.0,
            unit: SizeUnit::In,
            dpi: 100.0,
            projection: ProjectionChoice::Auto,
        }
    }
}

impl StyleConfig {
    /// Output size in pixels.
    pub fn pixel_size(&self) -> Result<(u32, u32)> {
        Ok((self.to_pixels(self.width)?, self.to_pixels(self.height)?))
    }

    fn to_pixels(&self, length: f64) -> Result<u32> {
        if self.unit != SizeUnit::Px && !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(ChoroplethError::Render(format!(
                "dpi must be positive, got {}",
                self.dpi
            )));
        }
        let pixels = match self.unit {
            SizeUnit::Px => length,
            SizeUnit::In => length * self.dpi,
            SizeUnit::Cm => length / 2.54 * self.dpi,
        }
        .round();

        if !pixels.is_finite() || pixels < 1.0 || pixels > MAX_IMAGE_SIDE as f64 {
            return Err(ChoroplethError::Render(format!(
                "image side of {length} {:?} resolves to {pixels} px; expected 1..={MAX_IMAGE_SIDE}",
                self.unit
            )));
        }
        Ok(pixels as u32)
    }
}
