use std::cell::RefCell;

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{HtmlCanvasElement, PageTransitionEvent};

use super::{dom, form, gallery, navbar, render};
use crate::config::{SiteConfig, CONFIG_ELEMENT_ID};
use crate::error::SiteError;

/// Every behaviour attached to the page. Dropping it detaches them all.
pub struct Site {
    pub particles: Option<render::ParticleField>,
    pub navbar: Option<navbar::Navbar>,
    pub gallery: Option<gallery::GalleryModal>,
    pub form: Option<form::ContactForm>,
}

thread_local! {
    static SITE: RefCell<Option<Site>> = const { RefCell::new(None) };
}

fn optional<T>(name: &str, attached: Result<T, SiteError>) -> Option<T> {
    match attached {
        Ok(part) => {
            crate::console_log!("{name}: ready");
            Some(part)
        }
        Err(e) => {
            crate::console_warn!("{name}: skipped ({e})");
            None
        }
    }
}

/// Configuration from the page's inline JSON block, or the defaults.
pub fn load_config() -> SiteConfig {
    let text = dom::document()
        .ok()
        .and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
        .and_then(|el| el.text_content());
    match text {
        None => SiteConfig::default(),
        Some(text) => SiteConfig::from_json(&text).unwrap_or_else(|e| {
            crate::console_warn!("{e}; using defaults");
            SiteConfig::default()
        }),
    }
}

impl Site {
    pub fn mount(cfg: SiteConfig) -> Site {
        let particles = optional("particles", {
            let hero = dom::document()
                .ok()
                .and_then(|d| d.get_element_by_id(&cfg.particles.hero_id));
            dom::by_id::<HtmlCanvasElement>(&cfg.particles.canvas_id)
                .and_then(|canvas| render::start(canvas, hero, cfg.particles))
        });

        Site {
            particles,
            navbar: optional("navbar", navbar::attach(cfg.navbar)),
            gallery: optional("gallery", gallery::attach(cfg.gallery)),
            form: optional("form", form::attach(cfg.form)),
        }
    }
}

/// Mount the site and keep it alive until the page is discarded.
pub fn install(cfg: SiteConfig) -> Result<(), SiteError> {
    let site = Site::mount(cfg);
    SITE.with(|slot| *slot.borrow_mut() = Some(site));

    // A page going into the back/forward cache keeps its behaviour.
    let on_pagehide = Closure::<dyn FnMut(PageTransitionEvent)>::new(|e: PageTransitionEvent| {
        if !e.persisted() {
            teardown();
        }
    });
    dom::window()?
        .add_event_listener_with_callback("pagehide", on_pagehide.as_ref().unchecked_ref())?;
    on_pagehide.forget();
    Ok(())
}

/// Detach everything mounted by [`install`]. Safe to call more than once.
pub fn teardown() {
    let site = SITE.with(|slot| slot.borrow_mut().take());
    if site.is_some() {
        crate::console_log!("site: teardown");
    }
}
