//! Single-page PDF writer.
//!
//! Produces an uncompressed PDF 1.4 file: catalog, page tree, one page and
//! one content stream of filled rectangles. PDF user space is in points with
//! the origin at the bottom-left corner, so page positions measured from the
//! bottom map over directly.

use crate::model::Canvas;

/// PostScript points per millimetre.
pub const MM_TO_PT: f64 = 72.0 / 25.4;

pub fn mm_to_pt(mm: f64) -> f64 {
    mm * MM_TO_PT
}

// ═══════════════════════════════════════════════════════════════════════
// Content stream
// ═══════════════════════════════════════════════════════════════════════

/// Drawing operators for the page content stream.
pub(crate) struct PdfBuilder {
    ops: String,
    width: f64,
    height: f64,
}

impl PdfBuilder {
    /// Page size in millimetres.
    pub(crate) fn new(width_mm: f64, height_mm: f64) -> Self {
        Self {
            ops: String::new(),
            width: mm_to_pt(width_mm),
            height: mm_to_pt(height_mm),
        }
    }

    /// Filled rectangle with a grey fill, all coordinates in millimetres.
    pub(crate) fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, gray: f64) {
        self.ops.push_str(&format!(
            "{:.4} g\n{:.3} {:.3} {:.3} {:.3} re f\n",
            gray.clamp(0.0, 1.0),
            mm_to_pt(x),
            mm_to_pt(y),
            mm_to_pt(w),
            mm_to_pt(h)
        ));
    }

    /// Assemble the complete file.
    pub(crate) fn build(self) -> Vec<u8> {
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.3} {:.3}] /Contents 4 0 R /Resources << >> >>",
                self.width, self.height
            ),
            format!(
                "<< /Length {} >>\nstream\n{}endstream",
                self.ops.len(),
                self.ops
            ),
        ];

        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");

        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        // Cross-reference table: fixed 20-byte entries
        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }

        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_offset
            )
            .as_bytes(),
        );

        out
    }
}

/// Serialize a canvas to a PDF document.
pub fn render_pdf(canvas: &Canvas) -> Vec<u8> {
    let page = &canvas.page;
    let mut pdf = PdfBuilder::new(page.width_mm, page.height_mm);

    let mark = page.calibration_mark_mm;
    if mark > 0.0 {
        pdf.fill_rect(0.0, 0.0, mark, mark, 0.0);
    }

    for segment in &canvas.segments {
        pdf.fill_rect(
            segment.x_start,
            page.bar_bottom_mm(segment.y),
            segment.length(),
            page.note_height_mm,
            segment.gray(),
        );
    }

    pdf.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_factor() {
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-12);
    }

    #[test]
    fn xref_points_at_objects() {
        let mut pdf = PdfBuilder::new(100.0, 297.0);
        pdf.fill_rect(10.0, 10.0, 5.0, 0.25, 0.5);
        let bytes = pdf.build();
        let text = String::from_utf8(bytes).unwrap();

        let xref_at: usize = text
            .split("startxref\n")
            .nth(1)
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(text[xref_at..].starts_with("xref\n0 5\n"));

        let entries: Vec<usize> = text[xref_at..]
            .lines()
            .skip(3)
            .take(4)
            .map(|l| l[..10].parse().unwrap())
            .collect();
        for (i, offset) in entries.iter().enumerate() {
            assert!(text[*offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn stream_length_matches_content() {
        let mut pdf = PdfBuilder::new(50.0, 50.0);
        pdf.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0);
        let ops_len = pdf.ops.len();
        let text = String::from_utf8(pdf.build()).unwrap();
        assert!(text.contains(&format!("<< /Length {ops_len} >>\nstream\n")));
        assert!(text.contains("0.0000 g\n0.000 0.000 2.835 2.835 re f\nendstream"));
    }
}
