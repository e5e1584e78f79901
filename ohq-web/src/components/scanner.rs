//! Camera viewport + detection loop.
//!
//! The component owns the full hardware lifecycle: acquire the stream on
//! mount, run one decode pass per tick while unpaused, stop every track
//! on unmount. Pausing only parks the loop; the camera stays attached so
//! resume is instant.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use web_sys::{HtmlVideoElement, MediaStream};
use yew::prelude::*;

use crate::camera;
use crate::detect::{Cadence, Decoder};
use crate::dom;
use ohq_core::Detection;

/// Poll interval for the paused loop; detection attempts are not
/// scheduled while paused, only this flag check is.
const PAUSE_POLL_MS: i32 = 200;

/// Overlay rectangle in percentages of the video frame, so CSS scaling of
/// the element cannot drift from the detector's image-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OverlayBox {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum ScannerStatus {
    Starting,
    Scanning { strategy: &'static str },
    Failed { message: String },
}

#[derive(Properties, PartialEq, Clone)]
pub struct Props {
    /// Fired once per successful decode pass.
    pub on_detection: Callback<Detection>,
    /// Pauses detection without releasing the camera.
    #[prop_or_default]
    pub paused: bool,
}

fn overlay_from(detection: &Detection, video: &HtmlVideoElement) -> Option<OverlayBox> {
    let bounds = detection.bounds?;
    let width = f64::from(video.video_width());
    let height = f64::from(video.video_height());
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(OverlayBox {
        left: bounds.x / width * 100.0,
        top: bounds.y / height * 100.0,
        width: bounds.width / width * 100.0,
        height: bounds.height / height * 100.0,
    })
}

#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
async fn run_detection_loop(
    decoder: Decoder,
    video: HtmlVideoElement,
    alive: Rc<Cell<bool>>,
    paused: Rc<RefCell<bool>>,
    overlay: UseStateHandle<Option<OverlayBox>>,
    on_detection: Callback<Detection>,
) {
    let mut last_overlay: Option<OverlayBox> = None;
    while alive.get() {
        if *paused.borrow() {
            let _ = dom::sleep_ms(PAUSE_POLL_MS).await;
            continue;
        }
        let found = decoder.decode_pass(&video).await;
        if !alive.get() {
            break;
        }
        if *paused.borrow() {
            // The pass was in flight when the pause landed; drop it.
            continue;
        }
        let next_overlay = found
            .as_ref()
            .and_then(|detection| overlay_from(detection, &video));
        if next_overlay != last_overlay {
            last_overlay = next_overlay;
            overlay.set(next_overlay);
        }
        if let Some(detection) = found {
            on_detection.emit(detection);
        }
        let scheduled = match decoder.cadence() {
            Cadence::AnimationFrame => dom::next_animation_frame().await,
            Cadence::Delay(ms) => dom::sleep_ms(ms).await,
        };
        if scheduled.is_err() {
            break;
        }
    }
}

#[function_component(Scanner)]
pub fn scanner(props: &Props) -> Html {
    let video_ref = use_node_ref();
    let status = use_state(|| ScannerStatus::Starting);
    let overlay = use_state(|| None::<OverlayBox>);
    let user_paused = use_state(|| false);
    let pause_flag = use_mut_ref(|| false);
    *pause_flag.borrow_mut() = props.paused || *user_paused;

    {
        let video_ref = video_ref.clone();
        let status = status.clone();
        let overlay = overlay.clone();
        let paused = pause_flag.clone();
        let on_detection = props.on_detection.clone();
        use_effect_with((), move |()| {
            let alive = Rc::new(Cell::new(true));
            let stream: Rc<Cell<Option<MediaStream>>> = Rc::new(Cell::new(None));
            {
                let alive = alive.clone();
                let stream = stream.clone();
                let video_ref = video_ref.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let Some(video) = video_ref.cast::<HtmlVideoElement>() else {
                        status.set(ScannerStatus::Failed {
                            message: String::from("video element not mounted"),
                        });
                        return;
                    };
                    let media = match camera::acquire_camera(&video).await {
                        Ok(media) => media,
                        Err(err) => {
                            status.set(ScannerStatus::Failed {
                                message: err.to_string(),
                            });
                            return;
                        }
                    };
                    if !alive.get() {
                        // Unmounted while permission was pending.
                        camera::release_camera(&media, Some(&video));
                        return;
                    }
                    stream.set(Some(media));

                    let decoder = match Decoder::probe() {
                        Ok(decoder) => decoder,
                        Err(err) => {
                            status.set(ScannerStatus::Failed {
                                message: err.to_string(),
                            });
                            return;
                        }
                    };
                    status.set(ScannerStatus::Scanning {
                        strategy: decoder.label(),
                    });
                    run_detection_loop(decoder, video, alive, paused, overlay, on_detection)
                        .await;
                });
            }
            move || {
                alive.set(false);
                if let Some(media) = stream.take() {
                    let video = video_ref.cast::<HtmlVideoElement>();
                    camera::release_camera(&media, video.as_ref());
                }
            }
        });
    }

    let on_toggle_pause = {
        let user_paused = user_paused.clone();
        Callback::from(move |_: MouseEvent| {
            user_paused.set(!*user_paused);
        })
    };

    let overlay_style = (*overlay).map(|o| {
        format!(
            "left:{:.2}%;top:{:.2}%;width:{:.2}%;height:{:.2}%",
            o.left, o.top, o.width, o.height
        )
    });

    html! {
        <section class="ohq-scanner">
            <div class="ohq-viewport">
                <video ref={video_ref} class="ohq-video" />
                if let Some(style) = overlay_style {
                    <div class="ohq-overlay" {style} />
                }
            </div>
            {
                match &*status {
                    ScannerStatus::Starting => html! {
                        <p class="ohq-scanner-status">{ "Starting camera…" }</p>
                    },
                    ScannerStatus::Scanning { strategy } => html! {
                        <p class="ohq-scanner-status">
                            { if *user_paused { "Paused" } else { "Point at a station code" } }
                            <span class="ohq-strategy">{ format!(" ({strategy})") }</span>
                        </p>
                    },
                    ScannerStatus::Failed { message } => html! {
                        <p class="ohq-scanner-error" role="alert">{ message.clone() }</p>
                    },
                }
            }
            if matches!(&*status, ScannerStatus::Scanning { .. }) {
                <button class="ohq-pause" onclick={on_toggle_pause}>
                    { if *user_paused { "Resume scanning" } else { "Pause scanning" } }
                </button>
            }
        </section>
    }
}
