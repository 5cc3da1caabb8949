//! Error types for the site runtime.

use std::fmt;

/// Errors raised while wiring the page or talking to the network.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteError {
    /// A global browser object (window, document, 2D context) is unavailable.
    MissingApi(&'static str),
    /// No element matched the id or selector.
    MissingElement(String),
    /// The element exists but is not of the expected type.
    WrongElementType(String),
    /// A browser call threw; carries the exception text.
    Js(String),
    /// The inline configuration block could not be parsed.
    Config(String),
    /// The server answered with a non-2xx status.
    Http(u16),
}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteError::MissingApi(name) => write!(f, "browser API unavailable: {}", name),
            SiteError::MissingElement(sel) => write!(f, "element not found: {}", sel),
            SiteError::WrongElementType(sel) => write!(f, "element has unexpected type: {}", sel),
            SiteError::Js(msg) => write!(f, "{}", msg),
            SiteError::Config(msg) => write!(f, "invalid site config: {}", msg),
            SiteError::Http(status) => write!(f, "HTTP {}", status),
        }
    }
}

impl std::error::Error for SiteError {}

impl From<serde_json::Error> for SiteError {
    fn from(e: serde_json::Error) -> Self {
        SiteError::Config(e.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for SiteError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        use wasm_bindgen::JsCast;

        if let Some(err) = value.dyn_ref::<js_sys::Error>() {
            return SiteError::Js(String::from(err.message()));
        }
        SiteError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<SiteError> for wasm_bindgen::JsValue {
    fn from(e: SiteError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}
