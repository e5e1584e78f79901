//! Camera stream acquisition and release.
//!
//! The stream is an exclusive hardware resource: every acquired track must
//! be stopped on teardown, or the browser keeps the camera indicator lit.

use js_sys::{Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlVideoElement, MediaStream, MediaStreamConstraints, MediaStreamTrack};

use crate::dom;

const IDEAL_WIDTH: f64 = 1280.0;
const IDEAL_HEIGHT: f64 = 720.0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("camera access needs a secure (https) page")]
    InsecureContext,
    #[error("this browser does not expose a camera API")]
    Unsupported,
    #[error("camera unavailable: {0}")]
    Access(String),
}

fn ideal(value: f64) -> Result<JsValue, JsValue> {
    let spec = Object::new();
    Reflect::set(&spec, &JsValue::from_str("ideal"), &JsValue::from_f64(value))?;
    Ok(spec.into())
}

fn video_constraints() -> Result<JsValue, JsValue> {
    let video = Object::new();
    Reflect::set(
        &video,
        &JsValue::from_str("facingMode"),
        &JsValue::from_str("environment"),
    )?;
    Reflect::set(&video, &JsValue::from_str("width"), &ideal(IDEAL_WIDTH)?)?;
    Reflect::set(&video, &JsValue::from_str("height"), &ideal(IDEAL_HEIGHT)?)?;
    Ok(video.into())
}

/// Request a live rear-facing camera stream and attach it to `video`.
///
/// On success the element is muted, playing inline, and fed by the
/// returned stream. The caller owns the stream and must release it with
/// [`release_camera`].
///
/// # Errors
///
/// Returns a `CameraError` with a human-readable diagnostic when the
/// context is insecure, the camera API is missing, or the user or
/// hardware rejects the request. Not retried automatically.
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn acquire_camera(video: &HtmlVideoElement) -> Result<MediaStream, CameraError> {
    let window = dom::window();
    if !window.is_secure_context() {
        return Err(CameraError::InsecureContext);
    }
    let devices = window
        .navigator()
        .media_devices()
        .map_err(|_| CameraError::Unsupported)?;

    let constraints = MediaStreamConstraints::new();
    let video_spec = video_constraints()
        .map_err(|e| CameraError::Access(dom::js_error_message(&e)))?;
    constraints.set_video(&video_spec);

    let promise = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(|e| CameraError::Access(dom::js_error_message(&e)))?;
    let stream: MediaStream = JsFuture::from(promise)
        .await
        .map_err(|e| CameraError::Access(dom::js_error_message(&e)))?
        .dyn_into()
        .map_err(|e| CameraError::Access(dom::js_error_message(&e)))?;

    video.set_muted(true);
    let _ = video.set_attribute("playsinline", "true");
    video.set_src_object(Some(&stream));
    // Muted inline playback is allowed without a gesture; a rejected play
    // still leaves the stream attached, so treat it as non-fatal.
    if let Ok(playing) = video.play() {
        let _ = JsFuture::from(playing).await;
    }
    Ok(stream)
}

/// Stop every hardware track and detach the element. Required on unmount;
/// pausing detection alone must NOT go through here.
pub fn release_camera(stream: &MediaStream, video: Option<&HtmlVideoElement>) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
    if let Some(video) = video {
        video.set_src_object(None);
    }
}
