//! Browser-side network helpers: `fetch` wrappers and image existence probes.

use std::future::Future;

use js_sys::Promise;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlImageElement, Request, RequestInit, Response};

use super::dom;
use crate::error::SiteError;
use crate::gallery::ImageProbe;

pub async fn fetch(request: Request) -> Result<Response, SiteError> {
    let resp = JsFuture::from(dom::window()?.fetch_with_request(&request)).await?;
    resp.dyn_into::<Response>()
        .map_err(|_| SiteError::Js("not a Response".into()))
}

/// Response body as text; an unreadable body comes back empty.
pub async fn text(resp: &Response) -> String {
    let Ok(promise) = resp.text() else {
        return String::new();
    };
    JsFuture::from(promise)
        .await
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_default()
}

async fn get_text(url: &str) -> Result<String, SiteError> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    let request = Request::new_with_str_and_init(url, &opts)?;
    let resp = fetch(request).await?;
    if !resp.ok() {
        return Err(SiteError::Http(resp.status()));
    }
    Ok(text(&resp).await)
}

/// Start loading `url` into a detached image. The promise resolves on load
/// and rejects on error.
fn load_image(url: &str) -> Result<(HtmlImageElement, Promise), SiteError> {
    let img = HtmlImageElement::new()?;
    let promise = Promise::new(&mut |resolve, reject| {
        img.set_onload(Some(&resolve));
        img.set_onerror(Some(&reject));
    });
    img.set_src(url);
    Ok((img, promise))
}

/// Probes against the live page origin.
pub struct BrowserProbe;

impl ImageProbe for BrowserProbe {
    fn fetch_manifest(&self, url: &str) -> impl Future<Output = Option<String>> {
        let url = url.to_string();
        async move { get_text(&url).await.ok() }
    }

    fn probe_image(&self, url: &str) -> impl Future<Output = bool> {
        let started = load_image(url);
        async move {
            match started {
                Ok((_img, promise)) => JsFuture::from(promise).await.is_ok(),
                Err(_) => false,
            }
        }
    }
}
