//! Platform `BarcodeDetector` strategy.
//!
//! `BarcodeDetector` has no stable web-sys binding, so the handful of
//! members the scanner needs are bound by hand.

use js_sys::{Array, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlVideoElement;

use crate::detect::DecoderError;
use crate::dom;
use ohq_core::{BoundingBox, Detection};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = BarcodeDetector)]
    type JsBarcodeDetector;

    #[wasm_bindgen(catch, constructor, js_class = "BarcodeDetector")]
    fn new(options: &JsValue) -> Result<JsBarcodeDetector, JsValue>;

    #[wasm_bindgen(catch, method)]
    fn detect(this: &JsBarcodeDetector, source: &JsValue) -> Result<Promise, JsValue>;
}

fn get_f64(value: &JsValue, key: &str) -> Option<f64> {
    Reflect::get(value, &JsValue::from_str(key)).ok()?.as_f64()
}

fn bounds_from_js(rect: &JsValue) -> Option<BoundingBox> {
    Some(BoundingBox {
        x: get_f64(rect, "x")?,
        y: get_f64(rect, "y")?,
        width: get_f64(rect, "width")?,
        height: get_f64(rect, "height")?,
    })
}

pub struct NativeDetector {
    inner: JsBarcodeDetector,
}

impl NativeDetector {
    /// Capability probe: does this platform ship a zero-configuration
    /// barcode detector?
    #[must_use]
    pub fn available() -> bool {
        web_sys::window().is_some_and(|window| {
            Reflect::has(&window, &JsValue::from_str("BarcodeDetector")).unwrap_or(false)
        })
    }

    /// Construct a detector restricted to QR codes.
    ///
    /// # Errors
    ///
    /// Returns `DecoderError::Init` when the constructor throws (e.g. the
    /// format is unsupported).
    pub fn new() -> Result<Self, DecoderError> {
        let options = Object::new();
        let formats = Array::of1(&JsValue::from_str("qr_code"));
        Reflect::set(&options, &JsValue::from_str("formats"), &formats)
            .map_err(|e| DecoderError::Init(dom::js_error_message(&e)))?;
        let inner = JsBarcodeDetector::new(&options)
            .map_err(|e| DecoderError::Init(dom::js_error_message(&e)))?;
        Ok(Self { inner })
    }

    /// One non-blocking pass against the current frame. Detector errors
    /// (saturation, detached frame) are swallowed: the loop just tries
    /// again next tick.
    #[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
    pub async fn decode(&self, video: &HtmlVideoElement) -> Option<Detection> {
        let source: &JsValue = video.as_ref();
        let promise = self.inner.detect(source).ok()?;
        let results = JsFuture::from(promise).await.ok()?;
        let first = Array::from(&results).get(0);
        if first.is_undefined() || first.is_null() {
            return None;
        }
        let text = Reflect::get(&first, &JsValue::from_str("rawValue"))
            .ok()?
            .as_string()?;
        let bounds = Reflect::get(&first, &JsValue::from_str("boundingBox"))
            .ok()
            .and_then(|rect| bounds_from_js(&rect));
        Some(Detection { text, bounds })
    }
}
