use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, Window};

use crate::error::SiteError;

pub fn window() -> Result<Window, SiteError> {
    web_sys::window().ok_or(SiteError::MissingApi("window"))
}

pub fn document() -> Result<Document, SiteError> {
    window()?.document().ok_or(SiteError::MissingApi("document"))
}

pub fn body() -> Result<HtmlElement, SiteError> {
    document()?.body().ok_or(SiteError::MissingElement("body".into()))
}

/// Element with `id`, cast to `T`.
pub fn by_id<T: JsCast>(id: &str) -> Result<T, SiteError> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| SiteError::MissingElement(format!("#{id}")))?
        .dyn_into::<T>()
        .map_err(|_| SiteError::WrongElementType(format!("#{id}")))
}

/// First descendant of `root` matching `selector`, cast to `T`.
pub fn query<T: JsCast>(root: &Element, selector: &str) -> Result<T, SiteError> {
    root.query_selector(selector)?
        .ok_or_else(|| SiteError::MissingElement(selector.to_string()))?
        .dyn_into::<T>()
        .map_err(|_| SiteError::WrongElementType(selector.to_string()))
}

pub fn set_display(el: &HtmlElement, value: &str) {
    el.style().set_property("display", value).ok();
}

/// An event listener that unregisters itself when dropped.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn new(
        target: &EventTarget,
        event: &'static str,
        f: impl FnMut(Event) + 'static,
    ) -> Result<Self, SiteError> {
        let callback = Closure::<dyn FnMut(Event)>::new(f);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
            .ok();
    }
}
