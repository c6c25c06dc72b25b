/// Browser-backed implementations of the ports, plus the entry wiring
/// for the content and background scripts. wasm32 only.
pub mod background;
pub mod content;
pub mod document;
pub mod runtime;
pub mod timers;

pub use document::WebDocument;
pub use runtime::{WebCookies, WebPage, WebRuntime};
pub use timers::WebTimers;
