/// Background-script bootstrap: the dispatcher answers everything that
/// arrives over the runtime channel.
use std::rc::Rc;

use crate::dispatch::BackgroundDispatcher;
use crate::web::runtime::{self, WebCookies};
use crate::web::WebTimers;

pub fn boot() {
    let dispatcher = Rc::new(BackgroundDispatcher::new(
        Rc::new(WebCookies),
        Rc::new(WebTimers),
    ));
    runtime::on_runtime_message(move |value, respond| {
        dispatcher.dispatch(&value, respond);
    });
    log::info!("background: dispatcher ready");
}
