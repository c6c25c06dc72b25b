/// Injected UI: widget fragments, their scoped styles, and the renderer
/// that mounts them into roots owned by the `RootManager`.
pub mod render;
pub mod styles;
pub mod widgets;

#[cfg(target_arch = "wasm32")]
pub mod popup;
