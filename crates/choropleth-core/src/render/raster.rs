use crate::error::Result;
use crate::render::style::Color;

/// RGBA8 pixel buffer with the few drawing primitives a choropleth needs.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&[background.r, background.g, background.b, background.a]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        Some(Color::rgba(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ))
    }

    /// Source-over blend of `color` onto one pixel; out-of-bounds writes are ignored.
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        match color.a {
            0 => {}
            255 => {
                self.pixels[idx..idx + 4].copy_from_slice(&[color.r, color.g, color.b, 255]);
            }
            alpha => {
                let a = alpha as f64 / 255.0;
                for (offset, channel) in [color.r, color.g, color.b].into_iter().enumerate() {
                    let dst = self.pixels[idx + offset] as f64;
                    self.pixels[idx + offset] = (channel as f64 * a + dst * (1.0 - a)).round() as u8;
                }
                let dst_a = self.pixels[idx + 3] as f64 / 255.0;
                self.pixels[idx + 3] = ((a + dst_a * (1.0 - a)) * 255.0).round() as u8;
            }
        }
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: i64, height: i64, color: Color) {
        for py in y..y + height {
            for px in x..x + width {
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Even-odd scanline fill of a closed ring; the last vertex connects back to the first.
    ///
    /// A pixel is filled when its center lies inside the ring.
    pub fn fill_polygon(&mut self, points: &[(f64, f64)], color: Color) {
        if points.len() < 3 {
            return;
        }

        let (min_y, max_y) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
                (lo.min(y), hi.max(y))
            });
        let first_row = (min_y - 0.5).ceil().max(0.0) as i64;
        let last_row = ((max_y - 0.5).floor() as i64).min(self.height as i64 - 1);

        let mut crossings: Vec<f64> = Vec::with_capacity(points.len());
        for row in first_row..=last_row {
            let sample_y = row as f64 + 0.5;
            crossings.clear();

            for (idx, &(x0, y0)) in points.iter().enumerate() {
                let (x1, y1) = points[(idx + 1) % points.len()];
                if (y0 <= sample_y && y1 > sample_y) || (y1 <= sample_y && y0 > sample_y) {
                    let t = (sample_y - y0) / (y1 - y0);
                    crossings.push(x0 + t * (x1 - x0));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));

            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().max(0.0) as i64;
                let end = ((span[1] - 0.5).floor() as i64).min(self.width as i64 - 1);
                for col in start..=end {
                    self.blend_pixel(col, row, color);
                }
            }
        }
    }

    /// Bresenham line between two points, endpoints included.
    pub fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), color: Color) {
        let (mut x0, mut y0) = (from.0.floor() as i64, from.1.floor() as i64);
        let (x1, y1) = (to.0.floor() as i64, to.1.floor() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.blend_pixel(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    pub fn stroke_ring(&mut self, points: &[(f64, f64)], color: Color) {
        if points.len() < 2 {
            return;
        }
        for (idx, &from) in points.iter().enumerate() {
            let to = points[(idx + 1) % points.len()];
            self.draw_line(from, to, color);
        }
    }

    /// Encodes the canvas as an RGBA PNG. `title` is stored as a `Title` text chunk.
    pub fn to_png(&self, title: Option<&str>) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buffer, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            if let Some(title) = title {
                encoder.add_text_chunk("Title".to_string(), title.to_string())?;
            }
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        Ok(buffer)
    }
}
