//! SVG builder: accumulates SVG elements and produces the final string.
//!
//! User units are millimetres; the root element declares its size in `mm`
//! so the file prints at scale.

use crate::model::Canvas;

const BACKGROUND_COLOR: &str = "white";
const MARK_COLOR: &str = "black";

// ═══════════════════════════════════════════════════════════════════════
// SvgBuilder
// ═══════════════════════════════════════════════════════════════════════

pub(crate) struct SvgBuilder {
    elements: Vec<String>,
    width: f64,
    height: f64,
}

impl SvgBuilder {
    pub(crate) fn new(width: f64, height: f64) -> Self {
        Self {
            elements: Vec::new(),
            width,
            height,
        }
    }

    pub(crate) fn build(self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {:.3} {:.3}" width="{:.3}mm" height="{:.3}mm">"#,
            self.width, self.height, self.width, self.height
        );
        svg.push('\n');
        for el in &self.elements {
            svg.push_str("  ");
            svg.push_str(el);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }

    /// Straight stroke with flat ends, so the drawn length equals `x2 - x1`.
    pub(crate) fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64) {
        self.elements.push(format!(
            r#"<line x1="{:.3}" y1="{:.3}" x2="{:.3}" y2="{:.3}" stroke="{}" stroke-width="{:.3}" stroke-linecap="butt"/>"#,
            x1, y1, x2, y2, color, width
        ));
    }

    pub(crate) fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) {
        self.elements.push(format!(
            r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="{}"/>"#,
            x, y, w, h, fill
        ));
    }
}

/// `rgb()` colour for a grey level in `0.0..=1.0` (0 = black).
pub(crate) fn gray_to_rgb(gray: f64) -> String {
    let v = (gray.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("rgb({v},{v},{v})")
}

/// Serialize a canvas to a standalone SVG document.
pub fn render_svg(canvas: &Canvas) -> String {
    let page = &canvas.page;
    let mut svg = SvgBuilder::new(page.width_mm, page.height_mm);

    svg.rect(0.0, 0.0, page.width_mm, page.height_mm, BACKGROUND_COLOR);

    // Calibration square, flush with the bottom-left corner
    let mark = page.calibration_mark_mm;
    if mark > 0.0 {
        svg.rect(0.0, page.height_mm - mark, mark, mark, MARK_COLOR);
    }

    for segment in &canvas.segments {
        let y = page.bar_center_from_top_mm(segment.y);
        svg.line(
            segment.x_start,
            y,
            segment.x_end,
            y,
            &gray_to_rgb(segment.gray()),
            page.note_height_mm,
        );
    }

    svg.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_levels() {
        assert_eq!(gray_to_rgb(0.0), "rgb(0,0,0)");
        assert_eq!(gray_to_rgb(1.0), "rgb(255,255,255)");
        assert_eq!(gray_to_rgb(0.5), "rgb(128,128,128)");
        assert_eq!(gray_to_rgb(-3.0), "rgb(0,0,0)");
    }

    #[test]
    fn builder_wraps_elements() {
        let mut svg = SvgBuilder::new(10.0, 20.0);
        svg.line(1.0, 2.0, 3.0, 2.0, "black", 0.25);
        let out = svg.build();
        assert!(out.starts_with("<svg"));
        assert!(out.contains(r#"width="10.000mm""#));
        assert!(out.contains(r#"<line x1="1.000" y1="2.000" x2="3.000" y2="2.000""#));
        assert!(out.trim_end().ends_with("</svg>"));
    }
}
