//! Particle background: simulation step and 2D render contract.
//!
//! Particles live in a flat `Vec` and are driven by free functions; the
//! browser only supplies a [`Surface`] to draw on and the pointer position.

use crate::config::ParticleConfig;

/// Smallest distance used when computing the pointer pull, so a particle
/// sitting exactly on the cursor still gets a finite factor.
pub const MIN_PULL_DISTANCE: f64 = 1e-6;

/// Size of the drawing surface in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

/// Last known cursor position in surface coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    /// Anchor the particle eases back to when the pointer is far away.
    pub base_x: f64,
    pub base_y: f64,
    pub radius: f64,
    pub angle: f64,
    pub speed: f64,
}

impl Particle {
    /// Create a particle from uniform samples in `[0, 1)`.
    pub fn spawn(bounds: Bounds, cfg: &ParticleConfig, mut rand: impl FnMut() -> f64) -> Self {
        let x = rand() * bounds.width;
        let y = rand() * bounds.height;
        Self {
            x,
            y,
            base_x: x,
            base_y: y,
            radius: cfg.min_radius + rand() * (cfg.max_radius - cfg.min_radius),
            angle: rand() * std::f64::consts::TAU,
            speed: cfg.min_speed + rand() * (cfg.max_speed - cfg.min_speed),
        }
    }
}

/// Spawn the fixed particle set.
pub fn spawn_all(bounds: Bounds, cfg: &ParticleConfig, mut rand: impl FnMut() -> f64) -> Vec<Particle> {
    (0..cfg.count)
        .map(|_| Particle::spawn(bounds, cfg, &mut rand))
        .collect()
}

/// Pull factor `min(K / d, cap)`, always finite and never above `cap`.
pub fn pull_factor(distance: f64, cfg: &ParticleConfig) -> f64 {
    let d = if distance.is_finite() {
        distance.max(MIN_PULL_DISTANCE)
    } else {
        f64::MAX
    };
    (cfg.pull_strength / d).min(cfg.pull_cap)
}

/// Advance one particle by one tick.
pub fn step_particle(p: &mut Particle, pointer: Option<Pointer>, bounds: Bounds, cfg: &ParticleConfig) {
    let attracted = pointer.and_then(|m| {
        let dx = m.x - p.x;
        let dy = m.y - p.y;
        let distance = (dx * dx + dy * dy).sqrt();
        (distance < cfg.influence_radius).then_some((dx, dy, distance))
    });

    match attracted {
        Some((dx, dy, distance)) => {
            let force = pull_factor(distance, cfg);
            p.x += dx * force * cfg.ease_rate;
            p.y += dy * force * cfg.ease_rate;
        }
        None => {
            p.x += (p.base_x - p.x) * cfg.ease_rate;
            p.y += (p.base_y - p.y) * cfg.ease_rate;
        }
    }

    p.angle += p.speed;
    p.base_x += p.angle.sin() * cfg.wander_amplitude;
    p.base_y += p.angle.cos() * cfg.wander_amplitude;

    if p.base_x < 0.0 {
        p.base_x = bounds.width;
    } else if p.base_x > bounds.width {
        p.base_x = 0.0;
    }
    if p.base_y < 0.0 {
        p.base_y = bounds.height;
    } else if p.base_y > bounds.height {
        p.base_y = 0.0;
    }
}

pub fn step(particles: &mut [Particle], pointer: Option<Pointer>, bounds: Bounds, cfg: &ParticleConfig) {
    for p in particles.iter_mut() {
        step_particle(p, pointer, bounds, cfg);
    }
}

/// Drawing operations the renderer needs.
pub trait Surface {
    fn clear(&mut self, bounds: Bounds);
    /// Straight link between two particles; `alpha` is in `(0, 1]`.
    fn line(&mut self, from: (f64, f64), to: (f64, f64), alpha: f64);
    /// Glow-shaded disc; the gradient extends to three times `radius`.
    fn glow(&mut self, center: (f64, f64), radius: f64);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub pairs_checked: usize,
    pub links_drawn: usize,
}

/// Link opacity for two particles `distance` apart, or `None` when they are
/// not close enough to be joined.
pub fn link_alpha(distance: f64, cfg: &ParticleConfig) -> Option<f64> {
    (distance < cfg.connection_radius).then(|| 1.0 - distance / cfg.connection_radius)
}

/// Clear the surface, draw links for every close pair, then every particle.
pub fn render<S: Surface + ?Sized>(
    particles: &[Particle],
    bounds: Bounds,
    surface: &mut S,
    cfg: &ParticleConfig,
) -> FrameStats {
    surface.clear(bounds);

    let mut stats = FrameStats::default();
    for (i, a) in particles.iter().enumerate() {
        for b in &particles[i + 1..] {
            stats.pairs_checked += 1;
            let dx = a.x - b.x;
            let dy = a.y - b.y;
            if let Some(alpha) = link_alpha((dx * dx + dy * dy).sqrt(), cfg) {
                surface.line((a.x, a.y), (b.x, b.y), alpha);
                stats.links_drawn += 1;
            }
        }
    }

    for p in particles {
        surface.glow((p.x, p.y), p.radius);
    }
    stats
}

/// Run/suspend bookkeeping for the frame loop.
///
/// `scheduled` tracks whether an animation-frame callback is outstanding, so
/// hiding and showing the region between two ticks never starts a second loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGate {
    enabled: bool,
    scheduled: bool,
}

impl Default for FrameGate {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGate {
    pub fn new() -> Self {
        Self {
            enabled: true,
            scheduled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Request the first frame. Returns `true` if the caller must schedule it.
    pub fn start(&mut self) -> bool {
        self.enabled = true;
        self.claim()
    }

    /// Visibility changed. Returns `true` if the caller must schedule a frame.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        self.enabled = visible;
        visible && self.claim()
    }

    /// A scheduled frame fired. Returns `true` if the tick should run and the
    /// next frame be scheduled; `false` means the loop is now suspended.
    pub fn tick(&mut self) -> bool {
        self.scheduled = false;
        self.enabled && self.claim()
    }

    /// Stop for good; any pending frame becomes a no-op.
    pub fn stop(&mut self) {
        self.enabled = false;
    }

    /// The frame that was claimed could not be requested; forget it so the
    /// next visibility change can schedule again.
    pub fn release(&mut self) {
        self.scheduled = false;
    }

    fn claim(&mut self) -> bool {
        if self.scheduled {
            return false;
        }
        self.scheduled = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: Bounds = Bounds {
        width: 800.0,
        height: 600.0,
    };

    #[derive(Default)]
    struct Recorder {
        clears: usize,
        lines: Vec<f64>,
        glows: Vec<(f64, f64, f64)>,
    }

    impl Surface for Recorder {
        fn clear(&mut self, _bounds: Bounds) {
            self.clears += 1;
        }
        fn line(&mut self, _from: (f64, f64), _to: (f64, f64), alpha: f64) {
            self.lines.push(alpha);
        }
        fn glow(&mut self, c: (f64, f64), r: f64) {
            self.glows.push((c.0, c.1, r));
        }
    }

    fn at(x: f64, y: f64) -> Particle {
        Particle {
            x,
            y,
            base_x: x,
            base_y: y,
            radius: 2.0,
            angle: 0.0,
            speed: 0.0,
        }
    }

    /// Deterministic stand-in for `Math.random`.
    fn lcg(seed: u64) -> impl FnMut() -> f64 {
        let mut state = seed;
        move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    #[test]
    fn spawn_respects_ranges() {
        let cfg = ParticleConfig::default();
        let ps = spawn_all(BOUNDS, &cfg, lcg(7));
        assert_eq!(ps.len(), 50);
        for p in &ps {
            assert!((0.0..BOUNDS.width).contains(&p.x));
            assert!((0.0..BOUNDS.height).contains(&p.y));
            assert_eq!((p.x, p.y), (p.base_x, p.base_y));
            assert!((1.0..4.0).contains(&p.radius));
            assert!((0.1..0.6).contains(&p.speed));
        }
    }

    #[test]
    fn render_checks_every_pair_once() {
        let cfg = ParticleConfig::default();
        for n in [0usize, 1, 2, 5, 50] {
            let ps = spawn_all(BOUNDS, &ParticleConfig { count: n, ..cfg.clone() }, lcg(n as u64));
            let mut rec = Recorder::default();
            let stats = render(&ps, BOUNDS, &mut rec, &cfg);
            assert_eq!(stats.pairs_checked, n * n.saturating_sub(1) / 2);
            assert_eq!(stats.links_drawn, rec.lines.len());
            assert_eq!(rec.glows.len(), n);
            assert_eq!(rec.clears, 1);
        }
    }

    #[test]
    fn links_only_below_connection_radius() {
        let cfg = ParticleConfig::default();
        let ps = [at(0.0, 0.0), at(50.0, 0.0), at(100.0, 0.0), at(400.0, 400.0)];
        let mut rec = Recorder::default();
        let stats = render(&ps, BOUNDS, &mut rec, &cfg);
        // (0,50) and (50,100) link at d=50; (0,100) is exactly at the radius.
        assert_eq!(stats.pairs_checked, 6);
        assert_eq!(stats.links_drawn, 2);
        for alpha in rec.lines {
            assert!((alpha - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn pull_factor_is_finite_and_capped() {
        let cfg = ParticleConfig::default();
        for d in [0.0, -0.0, 1e-300, 0.5, 20.0, 40.0, 199.0, f64::INFINITY, f64::NAN] {
            let f = pull_factor(d, &cfg);
            assert!(f.is_finite(), "d={d} gave {f}");
            assert!(f <= cfg.pull_cap);
        }
        assert_eq!(pull_factor(40.0, &cfg), 5.0);
    }

    #[test]
    fn pointer_on_particle_stays_finite() {
        let cfg = ParticleConfig::default();
        let mut p = at(100.0, 100.0);
        let pointer = Some(Pointer { x: 100.0, y: 100.0 });
        step_particle(&mut p, pointer, BOUNDS, &cfg);
        step_particle(&mut p, pointer, BOUNDS, &cfg);
        assert!(p.x.is_finite() && p.y.is_finite());
        assert_eq!((p.x, p.y), (100.0, 100.0));
    }

    #[test]
    fn pointer_within_radius_attracts() {
        let cfg = ParticleConfig::default();
        let mut p = at(100.0, 100.0);
        step_particle(&mut p, Some(Pointer { x: 140.0, y: 100.0 }), BOUNDS, &cfg);
        // force = min(200/40, 10) = 5; moves 40 * 5 * 0.01 = 2
        assert!((p.x - 102.0).abs() < 1e-9);
        assert_eq!(p.y, 100.0);
    }

    #[test]
    fn far_pointer_eases_back_to_anchor() {
        let cfg = ParticleConfig::default();
        let mut p = at(100.0, 100.0);
        p.base_x = 200.0;
        step_particle(&mut p, Some(Pointer { x: 700.0, y: 500.0 }), BOUNDS, &cfg);
        assert!((p.x - 101.0).abs() < 1e-9);

        let mut q = at(100.0, 100.0);
        q.base_x = 200.0;
        step_particle(&mut q, None, BOUNDS, &cfg);
        assert_eq!(p.x, q.x);
    }

    #[test]
    fn anchor_wraps_into_bounds() {
        let cfg = ParticleConfig::default();
        let mut p = at(0.0, 0.0);
        // sin(angle) < 0 and cos(angle) < 0 push the anchor negative
        p.angle = std::f64::consts::PI;
        p.speed = 0.5;
        p.base_x = 0.0;
        p.base_y = 0.0;
        step_particle(&mut p, None, BOUNDS, &cfg);
        assert_eq!(p.base_x, BOUNDS.width);
        assert_eq!(p.base_y, BOUNDS.height);

        let mut q = at(BOUNDS.width, BOUNDS.height);
        q.angle = 0.0;
        q.speed = 0.5;
        step_particle(&mut q, None, BOUNDS, &cfg);
        assert_eq!(q.base_x, 0.0);
        assert_eq!(q.base_y, 0.0);
    }

    #[test]
    fn gate_runs_until_hidden() {
        let mut gate = FrameGate::new();
        assert!(gate.start());
        assert!(!gate.start(), "already scheduled");
        assert!(gate.tick());
        assert!(gate.tick());
        gate.set_visible(false);
        assert!(!gate.tick());
        assert!(!gate.is_scheduled());
        assert!(gate.set_visible(true));
        assert!(gate.tick());
    }

    #[test]
    fn gate_flicker_between_ticks_keeps_one_loop() {
        let mut gate = FrameGate::new();
        assert!(gate.start());
        assert!(!gate.set_visible(false));
        // The pending frame is still outstanding, so no second loop.
        assert!(!gate.set_visible(true));
        assert!(gate.tick());
    }

    #[test]
    fn released_gate_can_resume() {
        let mut gate = FrameGate::new();
        assert!(gate.start());
        // Requesting the frame failed, so nothing will ever call `tick`.
        gate.release();
        assert!(!gate.is_scheduled());
        gate.set_visible(false);
        assert!(gate.set_visible(true));
    }

    #[test]
    fn stopped_gate_ignores_pending_frame() {
        let mut gate = FrameGate::new();
        gate.start();
        gate.stop();
        assert!(!gate.tick());
        assert!(!gate.is_enabled());
    }
}
