use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{FormData, Headers, HtmlButtonElement, HtmlElement, HtmlFormElement, Request, RequestInit};

use super::dom::{self, Listener};
use super::probe;
use crate::config::FormConfig;
use crate::error::SiteError;
use crate::form::{self, StatusMessage, Submission};

struct Inner {
    form: HtmlFormElement,
    status: HtmlElement,
    submit: HtmlButtonElement,
    idle_label: String,
    submission: RefCell<Submission>,
    cfg: FormConfig,
}

/// AJAX contact form posting to its `action` URL.
pub struct ContactForm {
    _submit: Listener,
}

impl Inner {
    /// POST the form as multipart data; returns the status and raw body.
    async fn post(&self) -> Result<(u16, String), SiteError> {
        let action = self
            .form
            .get_attribute("action")
            .ok_or_else(|| SiteError::MissingElement("form[action]".into()))?;

        let headers = Headers::new()?;
        headers.set("Accept", "application/json")?;

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_headers(&headers.into());
        opts.set_body(&FormData::new_with_form(&self.form)?.into());

        let request = Request::new_with_str_and_init(&action, &opts)?;
        let resp = probe::fetch(request).await?;
        let status = resp.status();
        Ok((status, probe::text(&resp).await))
    }

    fn show(&self, msg: &StatusMessage) {
        self.status.set_class_name(msg.kind.class_name());
        self.status.set_text_content(Some(&msg.text));
        dom::set_display(&self.status, "block");
    }

    fn hide_status_later(self: &Rc<Self>, generation: u32) {
        let inner = Rc::clone(self);
        let hide = Closure::once_into_js(move || {
            if inner.submission.borrow().is_current(generation) {
                dom::set_display(&inner.status, "none");
            }
        });
        let armed = dom::window().and_then(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(
                hide.unchecked_ref(),
                self.cfg.status_hide_ms,
            )
            .map_err(SiteError::from)
        });
        if let Err(e) = armed {
            crate::console_warn!("form: could not arm status timer: {e}");
        }
    }

    async fn send(self: Rc<Self>, generation: u32) {
        self.submit.set_disabled(true);
        self.submit.set_inner_html(&self.cfg.loading_html);
        dom::set_display(&self.status, "none");

        let msg = match self.post().await {
            Ok((status, body)) => form::interpret_response(status, &body, &self.cfg),
            Err(e) => form::failure(&e.to_string(), &self.cfg),
        };
        self.show(&msg);
        if msg.is_success() {
            crate::console_log!("form: sent");
            self.form.reset();
            self.hide_status_later(generation);
        } else {
            crate::console_warn!("form: {}", msg.text);
        }

        self.submit.set_disabled(false);
        self.submit.set_inner_html(&self.idle_label);
        self.submission.borrow_mut().finish();
    }
}

/// Intercept native submission of the contact form.
pub fn attach(cfg: FormConfig) -> Result<ContactForm, SiteError> {
    let form: HtmlFormElement = dom::by_id(&cfg.form_id)?;
    let status: HtmlElement = dom::by_id(&cfg.status_id)?;
    let submit: HtmlButtonElement = dom::by_id(&cfg.submit_id)?;

    let inner = Rc::new(Inner {
        idle_label: submit.inner_html(),
        form: form.clone(),
        status,
        submit,
        submission: RefCell::new(Submission::default()),
        cfg,
    });

    let listener = Listener::new(&form, "submit", move |event| {
        event.prevent_default();
        let Some(generation) = inner.submission.borrow_mut().begin() else {
            return;
        };
        wasm_bindgen_futures::spawn_local(Rc::clone(&inner).send(generation));
    })?;

    Ok(ContactForm { _submit: listener })
}
