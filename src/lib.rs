/// ThreadSense - AI assistant overlay for Piazza
/// Built with Rust + WASM + Yew

pub mod bridge;
pub mod config;
pub mod contracts;
pub mod debounce;
pub mod dispatch;
pub mod dom;
pub mod nav;
pub mod observer;
pub mod root;
pub mod storage;
pub mod ui;

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
mod testutil;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Content-script entry: inject the overlay UI into the host page
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_content() {
    web::content::boot();
}

// Background entry: serve the request/response map
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_background() {
    web::background::boot();
}

// Start the Yew app for the popup
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}
