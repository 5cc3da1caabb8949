//! `println!`-style console logging.
//!
//! In the browser these forward to `console.log` / `console.warn` /
//! `console.error`; on host targets (tests, tooling) they go to stderr.

#[doc(hidden)]
pub fn __emit(level: Level, msg: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        let value = wasm_bindgen::JsValue::from_str(msg);
        match level {
            Level::Info => web_sys::console::log_1(&value),
            Level::Warn => web_sys::console::warn_1(&value),
            Level::Error => web_sys::console::error_1(&value),
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        eprintln!("[{}] {msg}", level.tag());
    }
}

#[doc(hidden)]
#[derive(Clone, Copy, Debug)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    fn tag(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => ($crate::log::__emit($crate::log::Level::Info, &format_args!($($t)*).to_string()))
}

#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => ($crate::log::__emit($crate::log::Level::Warn, &format_args!($($t)*).to_string()))
}

#[macro_export]
macro_rules! console_error {
    ($($t:tt)*) => ($crate::log::__emit($crate::log::Level::Error, &format_args!($($t)*).to_string()))
}
