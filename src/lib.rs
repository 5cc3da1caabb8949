//! Client-side behaviour for the portfolio site: particle background,
//! navbar styling, project image gallery and the AJAX contact form.
//!
//! The page logic in the top-level modules is target-independent and tested
//! on the host; the `wasm` module binds it to the browser.

pub mod config;
pub mod error;
pub mod form;
pub mod gallery;
pub mod log;
pub mod navbar;
pub mod particles;

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use wasm_bindgen::prelude::*;

    mod dom;
    pub mod form;
    pub mod gallery;
    pub mod navbar;
    mod probe;
    pub mod render;
    pub mod site;

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        std::panic::set_hook(Box::new(|info| {
            web_sys::console::error_1(&info.to_string().into());
        }));

        crate::console_log!("portfolio: starting");
        site::install(site::load_config())?;
        Ok(())
    }

    /// Detach every page behaviour; exported for hosts that swap pages in place.
    #[wasm_bindgen]
    pub fn teardown() {
        site::teardown();
    }
}
