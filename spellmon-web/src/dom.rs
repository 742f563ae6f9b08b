use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Storage, Window};

/// Retrieve the global `window` object, if running in a browser.
#[must_use]
pub fn window() -> Option<Window> {
    web_sys::window()
}

/// Retrieve `localStorage`; `None` when storage is disabled or unavailable.
#[must_use]
pub fn local_storage() -> Option<Storage> {
    window()?.local_storage().ok().flatten()
}

/// Convert a JavaScript value into a readable string for error reporting.
#[must_use]
pub fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| err.message().into())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Wrap a Rust error message into a JavaScript `Error`.
#[must_use]
pub fn js_error(message: &str) -> JsValue {
    js_sys::Error::new(message).into()
}
