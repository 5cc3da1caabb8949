use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Element, HtmlElement, HtmlImageElement, KeyboardEvent};

use super::dom::{self, Listener};
use super::probe::BrowserProbe;
use crate::config::GalleryConfig;
use crate::error::SiteError;
use crate::gallery::{self, Discovery, DiscoveryTracker, Gallery, ImageSource, View};

const EMPTY_CLASS: &str = "gallery-empty";

#[derive(Default)]
struct Session {
    gallery: Gallery,
    discovery: DiscoveryTracker,
}

struct Inner {
    modal: Element,
    content: Element,
    image: HtmlImageElement,
    prev: HtmlElement,
    next: HtmlElement,
    session: RefCell<Session>,
    cfg: GalleryConfig,
    _fade_in: Closure<dyn FnMut()>,
}

/// The "Ver más" image modal and its triggers.
pub struct GalleryModal {
    inner: Rc<Inner>,
    _listeners: Vec<Listener>,
}

impl Inner {
    fn render(&self, view: View<'_>) {
        match view {
            View::Hidden => {
                self.modal.set_attribute("aria-hidden", "true").ok();
                if let Ok(body) = dom::body() {
                    body.style().set_property("overflow", "").ok();
                }
            }
            View::Empty => {
                self.clear_empty_indicator();
                dom::set_display(&self.image, "none");
                let msg = dom::document()
                    .and_then(|d| d.create_element("div").map_err(SiteError::from));
                if let Ok(msg) = msg {
                    msg.set_class_name(EMPTY_CLASS);
                    msg.set_text_content(Some(&self.cfg.empty_message));
                    self.content.append_child(&msg).ok();
                }
                dom::set_display(&self.prev, "none");
                dom::set_display(&self.next, "none");
            }
            View::Image {
                src,
                index,
                total,
                navigable,
            } => {
                self.clear_empty_indicator();
                self.show_image(src, index, total);
                let nav = if navigable { "flex" } else { "none" };
                dom::set_display(&self.prev, nav);
                dom::set_display(&self.next, nav);
            }
        }
    }

    fn clear_empty_indicator(&self) {
        while let Ok(Some(msg)) = self.content.query_selector(&format!(".{EMPTY_CLASS}")) {
            msg.remove();
        }
    }

    /// Swap the image source, fading in once the new image settles.
    fn show_image(&self, src: &str, index: usize, total: usize) {
        let img = &self.image;
        dom::set_display(img, "none");
        img.class_list().remove_1("visible").ok();
        dom::set_display(img, "block");
        img.style().set_property("opacity", "0").ok();
        img.set_src(src);
        img.set_alt(&gallery::alt_text(index, total));
    }

    fn open(&self, images: Vec<String>) {
        {
            let mut session = self.session.borrow_mut();
            let view = session.gallery.open(images);
            self.render(view);
        }
        self.modal.set_attribute("aria-hidden", "false").ok();
        if let Ok(body) = dom::body() {
            body.style().set_property("overflow", "hidden").ok();
        }
    }

    fn close(&self) {
        let mut session = self.session.borrow_mut();
        session.discovery.invalidate();
        let view = session.gallery.close();
        self.render(view);
    }

    fn step(&self, forward: bool) {
        let mut session = self.session.borrow_mut();
        let view = if forward {
            session.gallery.next()
        } else {
            session.gallery.prev()
        };
        if let Some(view) = view {
            self.render(view);
        }
    }

    fn is_open(&self) -> bool {
        self.session.borrow().gallery.is_open()
    }

    /// Image source declared on `trigger` or its enclosing card.
    fn source_for(&self, trigger: &Element) -> ImageSource {
        let attr = format!("data-{}", self.cfg.data_key);
        ImageSource::resolve(trigger.get_attribute(&attr), || {
            trigger
                .closest(&self.cfg.card_selector)
                .ok()
                .flatten()
                .and_then(|card| card.get_attribute(&attr))
        })
    }

    fn activate(self: &Rc<Self>, trigger: &Element) {
        let generation = self.session.borrow_mut().discovery.begin();

        let folder = match self.source_for(trigger) {
            ImageSource::List(images) => return self.open(images),
            ImageSource::Folder(folder) => folder,
        };

        let cached = self.session.borrow().discovery.cached(&folder);
        if let Some(images) = cached {
            return self.open(images);
        }

        let inner = Rc::clone(self);
        wasm_bindgen_futures::spawn_local(async move {
            let (images, how) = gallery::discover(&folder, &BrowserProbe, &inner.cfg).await;
            match how {
                Discovery::Manifest => {
                    crate::console_log!("gallery: {folder} manifest lists {} images", images.len())
                }
                Discovery::Probed { attempted } => crate::console_log!(
                    "gallery: {folder} probed {attempted} names, found {}",
                    images.len()
                ),
            }
            let shown = inner
                .session
                .borrow_mut()
                .discovery
                .settle(generation, folder, images);
            if let Some(images) = shown {
                inner.open(images);
            }
        });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.image.set_onload(None);
        self.image.set_onerror(None);
    }
}

/// Wire the modal's controls, keyboard shortcuts and every trigger button.
pub fn attach(cfg: GalleryConfig) -> Result<GalleryModal, SiteError> {
    let modal: Element = dom::by_id(&cfg.modal_id)?;
    let image: HtmlImageElement = dom::query(&modal, ".gallery-image")?;
    let close: HtmlElement = dom::query(&modal, ".gallery-close")?;
    let prev: HtmlElement = dom::query(&modal, ".gallery-prev")?;
    let next: HtmlElement = dom::query(&modal, ".gallery-next")?;
    let overlay: HtmlElement = dom::query(&modal, ".gallery-overlay")?;
    let content: Element = dom::query(&modal, ".gallery-content")?;

    // Shown on load and on error alike, so a broken image still shows its alt text.
    let fade_in = Closure::<dyn FnMut()>::new({
        let image = image.clone();
        move || {
            image.style().set_property("opacity", "1").ok();
            image.class_list().add_1("visible").ok();
        }
    });
    image.set_onload(Some(fade_in.as_ref().unchecked_ref()));
    image.set_onerror(Some(fade_in.as_ref().unchecked_ref()));

    let inner = Rc::new(Inner {
        modal,
        content,
        image,
        prev: prev.clone(),
        next: next.clone(),
        session: RefCell::new(Session::default()),
        cfg,
        _fade_in: fade_in,
    });

    let mut listeners = vec![
        Listener::new(&prev, "click", {
            let inner = inner.clone();
            move |_| inner.step(false)
        })?,
        Listener::new(&next, "click", {
            let inner = inner.clone();
            move |_| inner.step(true)
        })?,
        Listener::new(&close, "click", {
            let inner = inner.clone();
            move |_| inner.close()
        })?,
        Listener::new(&overlay, "click", {
            let inner = inner.clone();
            move |_| inner.close()
        })?,
        Listener::new(&dom::document()?, "keydown", {
            let inner = inner.clone();
            move |event| {
                let Some(key) = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) else {
                    return;
                };
                if !inner.is_open() {
                    return;
                }
                match key.as_str() {
                    "Escape" => inner.close(),
                    "ArrowRight" => inner.step(true),
                    "ArrowLeft" => inner.step(false),
                    _ => {}
                }
            }
        })?,
    ];

    let triggers = dom::document()?.query_selector_all(&inner.cfg.trigger_selector)?;
    for i in 0..triggers.length() {
        let Some(trigger) = triggers.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        listeners.push(Listener::new(&trigger, "click", {
            let inner = inner.clone();
            let trigger = trigger.clone();
            move |_| inner.activate(&trigger)
        })?);
    }
    crate::console_log!("gallery: {} triggers", triggers.length());

    Ok(GalleryModal {
        inner,
        _listeners: listeners,
    })
}

impl GalleryModal {
    pub fn open(&self, images: Vec<String>) {
        self.inner.open(images);
    }

    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}
