//! Console hooks for manual QA.
//!
//! Installs `window.__ohq` with `scan(payload)` and `progress()` so a
//! hunt can be exercised from the devtools console without printing
//! physical codes. `scan` feeds the exact production pipeline the camera
//! uses.

use std::cell::RefCell;
use std::rc::Rc;

use yew::Callback;

use crate::hunt::WebSession;
use ohq_core::Detection;

#[cfg(target_arch = "wasm32")]
pub fn install(session: &Rc<RefCell<WebSession>>, on_detection: &Callback<Detection>) {
    use wasm_bindgen::prelude::*;

    use crate::dom;

    let bridge = js_sys::Object::new();

    let scan = {
        let on_detection = on_detection.clone();
        Closure::<dyn Fn(String)>::new(move |payload: String| {
            on_detection.emit(Detection::new(payload));
        })
    };
    let _ = js_sys::Reflect::set(&bridge, &JsValue::from_str("scan"), scan.as_ref());
    scan.forget();

    let progress = {
        let session = session.clone();
        Closure::<dyn Fn() -> JsValue>::new(move || {
            serde_wasm_bindgen::to_value(&session.borrow().snapshot())
                .unwrap_or(JsValue::NULL)
        })
    };
    let _ = js_sys::Reflect::set(&bridge, &JsValue::from_str("progress"), progress.as_ref());
    progress.forget();

    if js_sys::Reflect::set(
        &JsValue::from(dom::window()),
        &JsValue::from_str("__ohq"),
        &bridge,
    )
    .is_err()
    {
        dom::console_error("failed to install __ohq bridge");
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn install(_session: &Rc<RefCell<WebSession>>, _on_detection: &Callback<Detection>) {}
