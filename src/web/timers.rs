/// `TimerPort` over `window.setTimeout`.
use wasm_bindgen::JsCast;
use wasm_bindgen::UnwrapThrowExt;
use wasm_bindgen::closure::Closure;

use crate::dom::TimerPort;

pub struct WebTimers;

impl TimerPort for WebTimers {
    type Handle = i32;

    fn set_timeout(&self, delay_ms: u32, f: Box<dyn FnOnce() + 'static>) -> i32 {
        let callback = Closure::once_into_js(f);
        web_sys::window()
            .expect_throw("no window")
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                delay_ms as i32,
            )
            .unwrap_throw()
    }

    fn clear_timeout(&self, handle: i32) {
        if let Some(window) = web_sys::window() {
            window.clear_timeout_with_handle(handle);
        }
    }

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}
