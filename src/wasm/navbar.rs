use web_sys::HtmlElement;

use super::dom::{self, Listener};
use crate::config::NavbarConfig;
use crate::error::SiteError;
use crate::navbar::background_for;

pub struct Navbar {
    _scroll: Listener,
}

fn apply(navbar: &HtmlElement, cfg: &NavbarConfig) {
    let scroll_y = dom::window()
        .and_then(|w| w.scroll_y().map_err(SiteError::from))
        .unwrap_or(0.0);
    navbar
        .style()
        .set_property("background-color", background_for(scroll_y, cfg))
        .ok();
}

/// Restyle the navbar background whenever the page scrolls.
pub fn attach(cfg: NavbarConfig) -> Result<Navbar, SiteError> {
    let root = dom::document()?
        .document_element()
        .ok_or(SiteError::MissingElement("html".into()))?;
    let navbar: HtmlElement = dom::query(&root, &cfg.selector)?;
    apply(&navbar, &cfg);

    let scroll = Listener::new(&dom::window()?, "scroll", move |_| apply(&navbar, &cfg))?;
    Ok(Navbar { _scroll: scroll })
}
