//! sp3ctra-score: MIDI to graphical score converter for the Sp3ctra
//! instrument.
//!
//! A MIDI file is decoded into notes, each note is mapped to a horizontal
//! stroke on a page whose vertical band matches the scanner's 3456 sensor
//! points (C1-B8), and the page is written as SVG or PDF.
//!
//! # Example
//! ```no_run
//! use sp3ctra_score::{render_file, Layout, OutputFormat};
//!
//! let summary = render_file("melody.mid", "melody.pdf", OutputFormat::Pdf, &Layout::default(), &Default::default()).unwrap();
//! println!("{} notes drawn, page {:.1} mm wide", summary.segments, summary.width_mm);
//! ```

pub mod config;
pub mod error;
pub mod midi;
pub mod model;
pub mod renderer;
pub mod timemap;

use std::path::Path;

pub use config::{Layout, OutOfRange, TimeScale};
pub use error::{Error, Result};
pub use midi::{decode, DecodeOptions, DecodedMidi, TrackSelection};
pub use model::*;
pub use renderer::{render_notes, render_pdf, render_svg, ScoreRenderer};
pub use timemap::TempoMap;

/// Decode MIDI bytes and lay them out on a canvas.
pub fn canvas_from_bytes(data: &[u8], layout: &Layout, options: &DecodeOptions) -> Result<Canvas> {
    let decoded = decode(data, options)?;
    render_notes(&decoded.notes, &decoded.tempo_map, layout)
}

/// Decode MIDI bytes and serialize the result in `format`.
pub fn render_bytes(
    data: &[u8],
    format: OutputFormat,
    layout: &Layout,
    options: &DecodeOptions,
) -> Result<Vec<u8>> {
    let canvas = canvas_from_bytes(data, layout, options)?;
    Ok(encode_canvas(&canvas, format))
}

pub fn encode_canvas(canvas: &Canvas, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Svg => render_svg(canvas).into_bytes(),
        OutputFormat::Pdf => render_pdf(canvas),
    }
}

/// Convert a canvas to a JSON string, for inspection or for passing
/// across FFI boundaries.
pub fn canvas_to_json(canvas: &Canvas) -> Result<String> {
    Ok(serde_json::to_string_pretty(canvas)?)
}

/// What [`render_file`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub segments: usize,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// Read a MIDI file, render it and write the document to `output`,
/// creating parent directories as needed.
pub fn render_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    format: OutputFormat,
    layout: &Layout,
    options: &DecodeOptions,
) -> Result<RenderSummary> {
    let (input, output) = (input.as_ref(), output.as_ref());

    let data = std::fs::read(input).map_err(|e| Error::io(input, e))?;
    let canvas = canvas_from_bytes(&data, layout, options)?;
    let bytes = encode_canvas(&canvas, format);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    std::fs::write(output, bytes).map_err(|e| Error::io(output, e))?;

    log::info!(
        "Written {}: {:.1} mm × {:.1} mm | start offset {:.1} mm | bottom offset {:.1} mm",
        output.display(),
        canvas.page.width_mm,
        canvas.page.height_mm,
        layout.start_offset_mm,
        layout.bottom_offset_mm
    );

    Ok(RenderSummary {
        segments: canvas.segments.len(),
        width_mm: canvas.page.width_mm,
        height_mm: canvas.page.height_mm,
    })
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI: for embedding hosts (scanner front-ends, mobile apps)
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::CString;
use std::os::raw::c_char;

/// Render MIDI bytes with the default layout and return SVG as a C string.
/// The caller must free the returned string with `sp3ctra_free_string`.
/// Returns null on any error.
///
/// # Safety
/// `data` must point to `len` valid bytes.
#[no_mangle]
pub unsafe extern "C" fn sp3ctra_render_svg(data: *const u8, len: usize) -> *mut c_char {
    if data.is_null() || len == 0 {
        return std::ptr::null_mut();
    }
    let bytes = unsafe { std::slice::from_raw_parts(data, len) };

    match canvas_from_bytes(bytes, &Layout::default(), &DecodeOptions::default()) {
        Ok(canvas) => CString::new(render_svg(&canvas)).unwrap_or_default().into_raw(),
        Err(e) => {
            log::error!("sp3ctra_render_svg: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Free a string previously returned by sp3ctra functions.
///
/// # Safety
/// `ptr` must be a string previously returned by an sp3ctra function, or null.
#[no_mangle]
pub unsafe extern "C" fn sp3ctra_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
