//! Site configuration.
//!
//! Everything has a default matching the production page. A page can override
//! any subset of fields with an inline JSON block:
//!
//! ```html
//! <script id="site-config" type="application/json">{"particles": {"count": 80}}</script>
//! ```

use serde::Deserialize;

use crate::error::SiteError;

/// Id of the optional inline JSON override block.
pub const CONFIG_ELEMENT_ID: &str = "site-config";

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub particles: ParticleConfig,
    pub navbar: NavbarConfig,
    pub gallery: GalleryConfig,
    pub form: FormConfig,
}

impl SiteConfig {
    /// Parse a (possibly partial) JSON override.
    pub fn from_json(text: &str) -> Result<Self, SiteError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParticleConfig {
    pub canvas_id: String,
    /// Page region whose visibility gates the frame loop.
    pub hero_id: String,
    pub count: usize,
    pub influence_radius: f64,
    /// Numerator K of the pull factor `min(K / d, cap)`.
    pub pull_strength: f64,
    pub pull_cap: f64,
    pub ease_rate: f64,
    pub wander_amplitude: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    pub connection_radius: f64,
    pub link_width: f64,
    /// `r, g, b` used for links and the inner/outer glow stops.
    pub primary_rgb: [u8; 3],
    /// `r, g, b` of the middle glow stop.
    pub accent_rgb: [u8; 3],
    pub visibility_threshold: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            canvas_id: "particles-canvas".into(),
            hero_id: "inicio".into(),
            count: 50,
            influence_radius: 200.0,
            pull_strength: 200.0,
            pull_cap: 10.0,
            ease_rate: 0.01,
            wander_amplitude: 0.3,
            min_speed: 0.1,
            max_speed: 0.6,
            min_radius: 1.0,
            max_radius: 4.0,
            connection_radius: 100.0,
            link_width: 0.5,
            primary_rgb: [29, 211, 176],
            accent_rgb: [175, 252, 65],
            visibility_threshold: 0.1,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct NavbarConfig {
    pub selector: String,
    pub scroll_threshold: f64,
    pub scrolled_background: String,
    pub top_background: String,
}

impl Default for NavbarConfig {
    fn default() -> Self {
        Self {
            selector: ".navbar".into(),
            scroll_threshold: 50.0,
            scrolled_background: "rgba(60, 22, 66, 0.95)".into(),
            top_background: "var(--russian-violet)".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GalleryConfig {
    pub modal_id: String,
    pub trigger_selector: String,
    pub card_selector: String,
    /// Suffix of the `data-*` attribute holding the image source.
    pub data_key: String,
    pub empty_message: String,
    pub manifest_name: String,
    pub probe_names: Vec<String>,
    pub probe_extensions: Vec<String>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            modal_id: "gallery-modal".into(),
            trigger_selector: ".btn-view-more".into(),
            card_selector: ".project-card".into(),
            data_key: "images".into(),
            empty_message: "No hay imágenes disponibles para este proyecto.".into(),
            manifest_name: "index.json".into(),
            probe_names: (1..=6).map(|i| format!("img{i}")).collect(),
            probe_extensions: vec!["webp".into(), "jpg".into(), "png".into()],
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FormConfig {
    pub form_id: String,
    pub status_id: String,
    pub submit_id: String,
    pub success_message: String,
    pub generic_failure: String,
    pub error_prefix: String,
    pub loading_html: String,
    pub status_hide_ms: i32,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            form_id: "contact-form".into(),
            status_id: "form-status".into(),
            submit_id: "submit-btn".into(),
            success_message: "¡Gracias por tu mensaje! Te responderé a la brevedad.".into(),
            generic_failure: "Hubo un problema al enviar el formulario.".into(),
            error_prefix: "Oops! Ocurrió un error: ".into(),
            loading_html: "<span class=\"spinner-border spinner-border-sm\" role=\"status\" aria-hidden=\"true\"></span> Enviando..."
                .into(),
            status_hide_ms: 4000,
        }
    }
}
