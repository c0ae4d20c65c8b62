//! Coordinate transformation between rendered-page pixels and PDF points
//!
//! Pixel space: origin top-left, y grows downward, one unit per raster pixel.
//! Point space: origin bottom-left of the page's MediaBox, y grows upward.

use serde::{Deserialize, Serialize};

/// A point in page-render pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

impl PixelSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn from_parts(origin: PixelPoint, size: PixelSize) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }
}

/// Rectangle in PDF point space; `(x, y)` is the lower-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Native page geometry in points (a MediaBox as origin + size)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    /// Page box anchored at the origin
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Build from MediaBox corners `[llx, lly, urx, ury]`
    pub fn from_corners(corners: [f64; 4]) -> Self {
        let [llx, lly, urx, ury] = corners;
        Self {
            x: llx.min(urx),
            y: lly.min(ury),
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
        }
    }
}

/// Pixel <-> point mapping for one rendered page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    page: PageBox,
    scale: f64,
}

impl Viewport {
    /// # Panics
    ///
    /// Panics if `scale` is zero, negative, or not finite.
    pub fn new(page: PageBox, scale: f64) -> Self {
        assert_valid_scale(scale);
        Self { page, scale }
    }

    pub fn page(&self) -> PageBox {
        self.page
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pixel_width(&self) -> f64 {
        self.page.width * self.scale
    }

    pub fn pixel_height(&self) -> f64 {
        self.page.height * self.scale
    }

    pub fn pixel_size(&self) -> PixelSize {
        PixelSize::new(self.pixel_width(), self.pixel_height())
    }

    /// Convert a pixel-space point to PDF point space (flip Y axis)
    pub fn pixel_to_point(&self, point: PixelPoint) -> (f64, f64) {
        let pdf_x = self.page.x + point.x / self.scale;
        let pdf_y = self.page.y + self.page.height - point.y / self.scale;
        (pdf_x, pdf_y)
    }

    /// Convert a PDF point-space position to pixel space
    pub fn point_to_pixel(&self, pdf_x: f64, pdf_y: f64) -> PixelPoint {
        PixelPoint {
            x: (pdf_x - self.page.x) * self.scale,
            y: (self.page.height - (pdf_y - self.page.y)) * self.scale,
        }
    }

    /// Project a pixel rectangle onto the page.
    ///
    /// The rectangle's visual bottom edge becomes the PDF origin, so the
    /// lower-left y subtracts both the top offset and the height.
    pub fn rect_to_points(&self, rect: &PixelRect) -> PdfRect {
        let width = rect.width / self.scale;
        let height = rect.height / self.scale;
        PdfRect {
            x: self.page.x + rect.x / self.scale,
            y: self.page.y + self.page.height - rect.y / self.scale - height,
            width,
            height,
        }
    }

    pub fn rect_to_pixels(&self, rect: &PdfRect) -> PixelRect {
        let top = rect.y + rect.height;
        let origin = self.point_to_pixel(rect.x, top);
        PixelRect {
            x: origin.x,
            y: origin.y,
            width: rect.width * self.scale,
            height: rect.height * self.scale,
        }
    }

    /// Clamp a top-left position so a `size` rectangle stays on the page.
    ///
    /// When the rectangle is larger than the page along an axis the
    /// position on that axis is pinned to 0.
    pub fn clamp_position(&self, position: PixelPoint, size: PixelSize) -> PixelPoint {
        PixelPoint {
            x: clamp_axis(position.x, self.pixel_width() - size.width),
            y: clamp_axis(position.y, self.pixel_height() - size.height),
        }
    }
}

/// Native geometry of every page plus the render scale shared by all pages.
///
/// Viewports are derived per page, so documents mixing page sizes map each
/// page through its own box.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pages: Vec<PageBox>,
    scale: f64,
}

impl PageLayout {
    /// # Panics
    ///
    /// Panics if `scale` is zero, negative, or not finite.
    pub fn new(pages: Vec<PageBox>, scale: f64) -> Self {
        assert_valid_scale(scale);
        Self { pages, scale }
    }

    /// Layout with no pages (nothing loaded yet)
    pub fn empty(scale: f64) -> Self {
        Self::new(Vec::new(), scale)
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn contains_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.page_count()
    }

    /// Viewport for a 1-based page index
    pub fn viewport(&self, page: u32) -> Option<Viewport> {
        if !self.contains_page(page) {
            return None;
        }
        self.pages
            .get(page as usize - 1)
            .map(|page_box| Viewport::new(*page_box, self.scale))
    }

    /// # Panics
    ///
    /// Panics if `scale` is zero, negative, or not finite.
    pub(crate) fn set_scale(&mut self, scale: f64) {
        assert_valid_scale(scale);
        self.scale = scale;
    }
}

fn clamp_axis(value: f64, upper: f64) -> f64 {
    let upper = upper.max(0.0);
    if !value.is_finite() {
        return if value == f64::INFINITY { upper } else { 0.0 };
    }
    value.max(0.0).min(upper)
}

pub(crate) fn assert_valid_scale(scale: f64) {
    assert!(
        scale.is_finite() && scale > 0.0,
        "viewport scale must be positive and finite, got {scale}"
    );
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimension() -> impl Strategy<Value = f64> {
        1.0f64..2000.0
    }

    fn percentage() -> impl Strategy<Value = f64> {
        0.0f64..=1.0
    }

    fn scale() -> impl Strategy<Value = f64> {
        0.25f64..4.0
    }

    proptest! {
        /// pixel -> point -> pixel returns the original point
        #[test]
        fn roundtrip_pixel_to_point(
            pdf_w in dimension(),
            pdf_h in dimension(),
            s in scale(),
            x_pct in percentage(),
            y_pct in percentage(),
        ) {
            let vp = Viewport::new(PageBox::new(pdf_w, pdf_h), s);
            let pixel = PixelPoint::new(x_pct * vp.pixel_width(), y_pct * vp.pixel_height());
            let (px, py) = vp.pixel_to_point(pixel);
            let back = vp.point_to_pixel(px, py);

            let tolerance = 0.0001;
            prop_assert!((back.x - pixel.x).abs() < tolerance);
            prop_assert!((back.y - pixel.y).abs() < tolerance);
        }

        /// Rectangles survive the projection and its inverse
        #[test]
        fn roundtrip_rect(
            offset_x in 0.0f64..100.0,
            offset_y in 0.0f64..100.0,
            pdf_w in dimension(),
            pdf_h in dimension(),
            s in scale(),
            x_pct in percentage(),
            y_pct in percentage(),
            w in 1.0f64..300.0,
            h in 1.0f64..300.0,
        ) {
            let page = PageBox { x: offset_x, y: offset_y, width: pdf_w, height: pdf_h };
            let vp = Viewport::new(page, s);
            let rect = PixelRect {
                x: x_pct * vp.pixel_width(),
                y: y_pct * vp.pixel_height(),
                width: w,
                height: h,
            };
            let back = vp.rect_to_pixels(&vp.rect_to_points(&rect));

            let tolerance = 0.0001;
            prop_assert!((back.x - rect.x).abs() < tolerance, "x: {} vs {}", back.x, rect.x);
            prop_assert!((back.y - rect.y).abs() < tolerance, "y: {} vs {}", back.y, rect.y);
            prop_assert!((back.width - rect.width).abs() < tolerance);
            prop_assert!((back.height - rect.height).abs() < tolerance);
        }

        /// Moving down in pixel space moves down in PDF space
        #[test]
        fn y_axis_movement_direction(
            pdf_w in dimension(),
            pdf_h in dimension(),
            s in scale(),
            y1_pct in 0.0f64..0.5,
        ) {
            let vp = Viewport::new(PageBox::new(pdf_w, pdf_h), s);
            let (_, y1) = vp.pixel_to_point(PixelPoint::new(0.0, y1_pct * vp.pixel_height()));
            let (_, y2) = vp.pixel_to_point(PixelPoint::new(0.0, (y1_pct + 0.1) * vp.pixel_height()));
            prop_assert!(y2 < y1);
        }

        /// Clamped rectangles always lie within the page (or pin to 0 when too big)
        #[test]
        fn clamp_keeps_rect_on_page(
            pdf_w in dimension(),
            pdf_h in dimension(),
            s in scale(),
            x in -5000.0f64..5000.0,
            y in -5000.0f64..5000.0,
            w in 1.0f64..500.0,
            h in 1.0f64..500.0,
        ) {
            let vp = Viewport::new(PageBox::new(pdf_w, pdf_h), s);
            let size = PixelSize::new(w, h);
            let pos = vp.clamp_position(PixelPoint::new(x, y), size);

            prop_assert!(pos.x >= 0.0 && pos.y >= 0.0);
            prop_assert!(pos.x <= (vp.pixel_width() - w).max(0.0));
            prop_assert!(pos.y <= (vp.pixel_height() - h).max(0.0));
        }
    }
}
