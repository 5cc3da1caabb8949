use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{
    CanvasRenderingContext2d, Element, HtmlCanvasElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, MouseEvent,
};

use super::dom::{self, Listener};
use crate::config::ParticleConfig;
use crate::error::SiteError;
use crate::particles::{self, Bounds, FrameGate, Particle, Pointer, Surface};

/// 2D canvas backend for the particle renderer.
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    line_rgb: [u8; 3],
    line_width: f64,
    glow_stops: [(f32, String); 3],
}

impl CanvasSurface {
    pub fn new(canvas: &HtmlCanvasElement, cfg: &ParticleConfig) -> Result<Self, SiteError> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or(SiteError::MissingApi("2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SiteError::MissingApi("2d context"))?;
        let [r, g, b] = cfg.primary_rgb;
        let [ar, ag, ab] = cfg.accent_rgb;
        Ok(Self {
            ctx,
            line_rgb: cfg.primary_rgb,
            line_width: cfg.link_width,
            glow_stops: [
                (0.0, format!("rgba({r}, {g}, {b}, 0.8)")),
                (0.5, format!("rgba({ar}, {ag}, {ab}, 0.4)")),
                (1.0, format!("rgba({r}, {g}, {b}, 0)")),
            ],
        })
    }
}

impl Surface for CanvasSurface {
    fn clear(&mut self, bounds: Bounds) {
        self.ctx.clear_rect(0.0, 0.0, bounds.width, bounds.height);
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), alpha: f64) {
        let [r, g, b] = self.line_rgb;
        self.ctx.begin_path();
        self.ctx.move_to(from.0, from.1);
        self.ctx.line_to(to.0, to.1);
        self.ctx.set_stroke_style_str(&format!("rgba({r}, {g}, {b}, {alpha})"));
        self.ctx.set_line_width(self.line_width);
        self.ctx.stroke();
    }

    fn glow(&mut self, (x, y): (f64, f64), radius: f64) {
        self.ctx.begin_path();
        if self.ctx.arc(x, y, radius, 0.0, std::f64::consts::TAU).is_err() {
            return;
        }
        let Ok(gradient) = self.ctx.create_radial_gradient(x, y, 0.0, x, y, radius * 3.0) else {
            return;
        };
        for (offset, color) in &self.glow_stops {
            gradient.add_color_stop(*offset, color).ok();
        }
        self.ctx.set_fill_style_canvas_gradient(&gradient);
        self.ctx.fill();
    }
}

struct FieldState {
    particles: Vec<Particle>,
    pointer: Option<Pointer>,
    bounds: Bounds,
    gate: FrameGate,
    surface: CanvasSurface,
    cfg: ParticleConfig,
    frame_id: Option<i32>,
}

impl FieldState {
    fn advance(&mut self) {
        particles::step(&mut self.particles, self.pointer, self.bounds, &self.cfg);
        particles::render(&self.particles, self.bounds, &mut self.surface, &self.cfg);
    }
}

type FrameSlot = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// The running particle background. Dropping it stops the loop and detaches
/// every listener.
pub struct ParticleField {
    state: Rc<RefCell<FieldState>>,
    frame: FrameSlot,
    observer: Option<(IntersectionObserver, Closure<dyn FnMut(js_sys::Array)>)>,
    _listeners: Vec<Listener>,
}

fn window_bounds() -> Result<Bounds, SiteError> {
    let window = dom::window()?;
    let width = window.inner_width()?.as_f64().unwrap_or(0.0);
    let height = window.inner_height()?.as_f64().unwrap_or(0.0);
    Ok(Bounds { width, height })
}

fn fit_canvas(canvas: &HtmlCanvasElement, bounds: Bounds) {
    canvas.set_width(bounds.width as u32);
    canvas.set_height(bounds.height as u32);
}

fn request_frame(state: &RefCell<FieldState>, frame: &FrameSlot) {
    let slot = frame.borrow();
    let Some(callback) = slot.as_ref() else {
        return;
    };
    let id = dom::window().and_then(|w| {
        w.request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(SiteError::from)
    });
    match id {
        Ok(id) => state.borrow_mut().frame_id = Some(id),
        Err(e) => {
            crate::console_error!("particles: requestAnimationFrame failed: {e}");
            state.borrow_mut().gate.release();
        }
    }
}

/// Spawn the particles on `canvas` and start the render loop. When `hero` is
/// given, the loop only runs while that region is on screen.
pub fn start(
    canvas: HtmlCanvasElement,
    hero: Option<Element>,
    cfg: ParticleConfig,
) -> Result<ParticleField, SiteError> {
    let bounds = window_bounds()?;
    fit_canvas(&canvas, bounds);

    let state = Rc::new(RefCell::new(FieldState {
        particles: particles::spawn_all(bounds, &cfg, js_sys::Math::random),
        pointer: None,
        bounds,
        gate: FrameGate::new(),
        surface: CanvasSurface::new(&canvas, &cfg)?,
        cfg,
        frame_id: None,
    }));

    let mut listeners = Vec::new();

    // Resize canvas to fit window
    listeners.push(Listener::new(&dom::window()?, "resize", {
        let canvas = canvas.clone();
        let state = state.clone();
        move |_| {
            if let Ok(bounds) = window_bounds() {
                fit_canvas(&canvas, bounds);
                state.borrow_mut().bounds = bounds;
            }
        }
    })?);

    listeners.push(Listener::new(&canvas, "mousemove", {
        let state = state.clone();
        move |event| {
            if let Some(e) = event.dyn_ref::<MouseEvent>() {
                state.borrow_mut().pointer = Some(Pointer {
                    x: e.client_x() as f64,
                    y: e.client_y() as f64,
                });
            }
        }
    })?);

    // `frame` holds the animation-frame closure so that it can keep calling
    // `request_animation_frame` on itself.
    let frame: FrameSlot = Rc::new(RefCell::new(None));
    *frame.borrow_mut() = Some(Closure::new({
        let state = state.clone();
        let frame = frame.clone();
        move || {
            {
                let mut s = state.borrow_mut();
                s.frame_id = None;
                if !s.gate.tick() {
                    crate::console_log!("particles: suspended");
                    return;
                }
                s.advance();
            }
            request_frame(&state, &frame);
        }
    }));

    // Draw right away so the hero never flashes empty.
    if state.borrow_mut().gate.start() {
        request_frame(&state, &frame);
    }

    let mut field = ParticleField {
        state,
        frame,
        observer: None,
        _listeners: listeners,
    };
    // On error `field` drops here, which cancels the frame already requested.
    if let Some(hero) = hero {
        field.observer = Some(observe(&hero, &field.state, &field.frame)?);
    }
    Ok(field)
}

fn observe(
    hero: &Element,
    state: &Rc<RefCell<FieldState>>,
    frame: &FrameSlot,
) -> Result<(IntersectionObserver, Closure<dyn FnMut(js_sys::Array)>), SiteError> {
    let threshold = state.borrow().cfg.visibility_threshold;
    let callback = Closure::<dyn FnMut(js_sys::Array)>::new({
        let state = state.clone();
        let frame = frame.clone();
        move |entries: js_sys::Array| {
            for entry in entries.iter() {
                let entry: IntersectionObserverEntry = entry.unchecked_into();
                let resume = state.borrow_mut().gate.set_visible(entry.is_intersecting());
                if resume {
                    crate::console_log!("particles: resumed");
                    request_frame(&state, &frame);
                }
            }
        }
    });

    let options = IntersectionObserverInit::new();
    options.set_threshold(&threshold.into());
    let observer =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)?;
    observer.observe(hero);
    Ok((observer, callback))
}

impl Drop for ParticleField {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.gate.stop();
        if let (Some(id), Ok(window)) = (state.frame_id.take(), dom::window()) {
            window.cancel_animation_frame(id).ok();
        }
        drop(state);
        if let Some((observer, _)) = &self.observer {
            observer.disconnect();
        }
        // Breaks the closure's reference cycle through `frame`.
        self.frame.borrow_mut().take();
    }
}
