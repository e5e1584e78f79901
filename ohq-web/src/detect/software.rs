//! Software fallback strategy: canvas frame grab + `rqrr` decode.

use image::GrayImage;
use rqrr::PreparedImage;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement};

use crate::detect::DecoderError;
use crate::dom;
use ohq_core::{BoundingBox, Detection};

/// BT.601 luma weights, integer arithmetic.
fn rgba_to_luma(rgba: &[u8]) -> Vec<u8> {
    let mut luma = Vec::with_capacity(rgba.len() / 4);
    for px in rgba.chunks_exact(4) {
        let weighted =
            u32::from(px[0]) * 299 + u32::from(px[1]) * 587 + u32::from(px[2]) * 114;
        #[allow(clippy::cast_possible_truncation)] // weighted / 1000 <= 255
        luma.push((weighted / 1000) as u8);
    }
    luma
}

pub struct SoftwareDecoder {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl SoftwareDecoder {
    /// Allocate the offscreen scratch canvas the decoder reads frames
    /// through.
    ///
    /// # Errors
    ///
    /// Returns `DecoderError::Init` when no 2d context can be created.
    pub fn new() -> Result<Self, DecoderError> {
        let canvas = dom::document()
            .create_element("canvas")
            .map_err(|e| DecoderError::Init(dom::js_error_message(&e)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| DecoderError::Init(String::from("canvas element has unexpected type")))?;
        let context = canvas
            .get_context("2d")
            .map_err(|e| DecoderError::Init(dom::js_error_message(&e)))?
            .ok_or_else(|| DecoderError::Init(String::from("2d canvas context unavailable")))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| DecoderError::Init(String::from("2d context has unexpected type")))?;
        Ok(Self { canvas, context })
    }

    /// One bounded decode attempt against the current frame. Misses and
    /// per-pass failures are both "no result"; the loop reschedules after
    /// its fixed delay either way.
    #[must_use]
    pub fn decode(&self, video: &HtmlVideoElement) -> Option<Detection> {
        let width = video.video_width();
        let height = video.video_height();
        if width == 0 || height == 0 {
            // Stream attached but no frame delivered yet.
            return None;
        }
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.context
            .draw_image_with_html_video_element(video, 0.0, 0.0)
            .ok()?;
        let image_data = self
            .context
            .get_image_data(0.0, 0.0, f64::from(width), f64::from(height))
            .ok()?;
        let luma = rgba_to_luma(&image_data.data());

        let gray = GrayImage::from_raw(width, height, luma)?;
        let mut prepared = PreparedImage::prepare(gray);
        let grids = prepared.detect_grids();
        let grid = grids.first()?;
        let (_meta, text) = grid.decode().ok()?;
        let corners: Vec<(f64, f64)> = grid
            .bounds
            .iter()
            .map(|p| (f64::from(p.x), f64::from(p.y)))
            .collect();
        let mut detection = Detection::new(text);
        if let Some(bounds) = BoundingBox::around(&corners) {
            detection = detection.with_bounds(bounds);
        }
        Some(detection)
    }
}
