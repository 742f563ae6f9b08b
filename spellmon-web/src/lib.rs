#![forbid(unsafe_code)]
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod dom;
pub mod game;
#[cfg(target_arch = "wasm32")]
pub mod handle;

#[cfg(target_arch = "wasm32")]
pub use handle::ProgressHandle;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
