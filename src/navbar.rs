use crate::config::NavbarConfig;

/// Background the navbar should carry at vertical scroll offset `scroll_y`.
pub fn background_for(scroll_y: f64, cfg: &NavbarConfig) -> &str {
    if scroll_y > cfg.scroll_threshold {
        &cfg.scrolled_background
    } else {
        &cfg.top_background
    }
}
