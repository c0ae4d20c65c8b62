//! Freehand signature capture
//!
//! Records pointer strokes in logical canvas pixels and rasterizes them to a
//! transparent PNG with tiny-skia.

use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::error::SignError;
use crate::signature::SignatureImage;

/// Opaque RGB ink color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InkColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl InkColor {
    /// Parse `#RRGGBB` or `RRGGBB`
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InkStyle {
    pub color: InkColor,
    /// Line width in logical pixels
    pub width: f32,
}

impl Default for InkStyle {
    fn default() -> Self {
        Self {
            color: InkColor::default(),
            width: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct InkStroke {
    style: InkStyle,
    points: Vec<(f32, f32)>,
}

/// Drawing surface for a handwritten signature
#[derive(Debug, Clone)]
pub struct InkCanvas {
    width: u32,
    height: u32,
    pixel_ratio: f32,
    style: InkStyle,
    strokes: Vec<InkStroke>,
    drawing: bool,
}

impl InkCanvas {
    /// `width`/`height` are logical pixels; the raster is scaled by `pixel_ratio`.
    pub fn new(width: u32, height: u32, pixel_ratio: f32, style: InkStyle) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
            style,
            strokes: Vec::new(),
            drawing: false,
        }
    }

    /// Style for strokes started from now on
    pub fn set_style(&mut self, style: InkStyle) {
        self.style = style;
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.strokes.push(InkStroke {
            style: self.style,
            points: vec![(x, y)],
        });
        self.drawing = true;
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if !self.drawing {
            return;
        }
        if let Some(stroke) = self.strokes.last_mut() {
            stroke.points.push((x, y));
        }
    }

    pub fn pointer_up(&mut self) {
        self.drawing = false;
    }

    /// Leaving the surface ends the current stroke
    pub fn pointer_leave(&mut self) {
        self.drawing = false;
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
    }

    /// Number of line segments drawn so far
    pub fn segment_count(&self) -> usize {
        self.strokes
            .iter()
            .map(|s| s.points.len().saturating_sub(1))
            .sum()
    }

    pub fn is_blank(&self) -> bool {
        self.segment_count() == 0
    }

    /// Rasterize all strokes to a PNG signature image
    pub fn render_png(&self) -> Result<SignatureImage, SignError> {
        if self.is_blank() {
            return Err(SignError::EmptySignature);
        }

        let raster_w = (self.width as f32 * self.pixel_ratio).round() as u32;
        let raster_h = (self.height as f32 * self.pixel_ratio).round() as u32;
        let mut pixmap = Pixmap::new(raster_w, raster_h).ok_or_else(|| {
            SignError::CaptureError(format!("invalid canvas size {}x{}", raster_w, raster_h))
        })?;
        let transform = Transform::from_scale(self.pixel_ratio, self.pixel_ratio);

        for stroke in &self.strokes {
            if stroke.points.len() < 2 {
                continue;
            }
            let mut pb = PathBuilder::new();
            let (x0, y0) = stroke.points[0];
            pb.move_to(x0, y0);
            for &(x, y) in &stroke.points[1..] {
                pb.line_to(x, y);
            }
            let Some(path) = pb.finish() else {
                continue;
            };

            let mut paint = Paint::default();
            let InkColor { r, g, b } = stroke.style.color;
            paint.set_color_rgba8(r, g, b, 255);
            paint.anti_alias = true;

            let line = Stroke {
                width: stroke.style.width,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Default::default()
            };
            pixmap.stroke_path(&path, &paint, &line, transform, None);
        }

        let bytes = pixmap
            .encode_png()
            .map_err(|e| SignError::CaptureError(e.to_string()))?;
        Ok(SignatureImage::from_bytes(bytes))
    }
}
