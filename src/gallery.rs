//! Image gallery: session state machine, trigger parsing and folder discovery.

use std::collections::HashMap;
use std::future::Future;

use crate::config::GalleryConfig;

/// What a `data-images` attribute asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Explicit, possibly empty, list of image URLs.
    List(Vec<String>),
    /// A folder path (ends with `/`) to discover images in.
    Folder(String),
}

impl ImageSource {
    /// Source for a trigger: its own attribute when present and non-empty,
    /// otherwise the enclosing card's. Whitespace counts as present.
    pub fn resolve(own: Option<String>, card: impl FnOnce() -> Option<String>) -> Self {
        let value = own.filter(|s| !s.is_empty()).or_else(card);
        Self::parse(value.as_deref().unwrap_or(""))
    }

    pub fn parse(attr: &str) -> Self {
        let attr = attr.trim();
        if attr.ends_with('/') && !attr.contains(',') {
            return ImageSource::Folder(attr.to_string());
        }
        ImageSource::List(
            attr.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }
}

/// What the modal should display after a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View<'a> {
    Hidden,
    /// Open with nothing to show: the "no images" indicator, no navigation.
    Empty,
    Image {
        src: &'a str,
        index: usize,
        total: usize,
        /// Prev/next controls are shown only with more than one image.
        navigable: bool,
    },
}

/// Closed, or open on a list of images with a cursor.
///
/// An open session with an empty list is the "no images" state; the index is
/// always in bounds otherwise.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Gallery {
    #[default]
    Closed,
    Open { images: Vec<String>, index: usize },
}

impl Gallery {
    pub fn is_open(&self) -> bool {
        matches!(self, Gallery::Open { .. })
    }

    /// Replace any current session with `images`, starting at the first one.
    pub fn open(&mut self, images: Vec<String>) -> View<'_> {
        *self = Gallery::Open { images, index: 0 };
        self.view()
    }

    pub fn close(&mut self) -> View<'_> {
        *self = Gallery::Closed;
        View::Hidden
    }

    /// Move forward, wrapping. `None` when nothing changed.
    pub fn next(&mut self) -> Option<View<'_>> {
        self.shift(1)
    }

    /// Move backward, wrapping. `None` when nothing changed.
    pub fn prev(&mut self) -> Option<View<'_>> {
        self.shift(-1)
    }

    fn shift(&mut self, delta: isize) -> Option<View<'_>> {
        let Gallery::Open { images, index } = self else {
            return None;
        };
        let len = images.len();
        if len < 2 {
            return None;
        }
        *index = (*index as isize + delta).rem_euclid(len as isize) as usize;
        Some(self.view())
    }

    pub fn view(&self) -> View<'_> {
        match self {
            Gallery::Closed => View::Hidden,
            Gallery::Open { images, index } => match images.get(*index) {
                None => View::Empty,
                Some(src) => View::Image {
                    src,
                    index: *index,
                    total: images.len(),
                    navigable: images.len() > 1,
                },
            },
        }
    }
}

/// Folder discovery bookkeeping for the modal.
///
/// Every trigger click and every close starts a new generation. A discovery
/// that settles under an older generation is cached but not shown.
#[derive(Debug, Default)]
pub struct DiscoveryTracker {
    generation: u32,
    discovered: HashMap<String, Vec<String>>,
}

impl DiscoveryTracker {
    /// A trigger was activated; returns its generation.
    pub fn begin(&mut self) -> u32 {
        self.invalidate();
        self.generation
    }

    /// The modal closed; pending discoveries become stale.
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Images already discovered for `folder`.
    pub fn cached(&self, folder: &str) -> Option<Vec<String>> {
        self.discovered.get(folder).cloned()
    }

    /// Record a finished discovery. Returns the images to show, or `None`
    /// when `generation` is no longer current.
    pub fn settle(&mut self, generation: u32, folder: String, urls: Vec<String>) -> Option<Vec<String>> {
        self.discovered.insert(folder, urls.clone());
        (self.generation == generation).then_some(urls)
    }
}

/// Alt text for the image at zero-based `index` of `total`.
pub fn alt_text(index: usize, total: usize) -> String {
    format!("Imagen {} de {}", index + 1, total)
}

/// Conventional file names tried when a folder has no manifest, in probe order.
pub fn probe_candidates(folder: &str, cfg: &GalleryConfig) -> Vec<String> {
    cfg.probe_names
        .iter()
        .flat_map(|name| {
            cfg.probe_extensions
                .iter()
                .map(move |ext| format!("{folder}{name}.{ext}"))
        })
        .collect()
}

/// Manifest file names resolved against `folder`. An empty manifest yields
/// `None` so the caller falls back to probing.
pub fn parse_manifest(folder: &str, body: &str) -> Option<Vec<String>> {
    let names: Vec<String> = serde_json::from_str(body).ok()?;
    let urls: Vec<String> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .map(|n| format!("{folder}{n}"))
        .collect();
    (!urls.is_empty()).then_some(urls)
}

/// Keep the first occurrence of every URL.
pub fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

/// Network side of discovery.
///
/// `probe_image` must start the load before returning, so that calling it for
/// every candidate and then awaiting the results runs all loads concurrently.
pub trait ImageProbe {
    /// Body of the manifest at `url`, or `None` if it is missing/unreadable.
    fn fetch_manifest(&self, url: &str) -> impl Future<Output = Option<String>>;
    /// Whether `url` loads as an image. Never fails.
    fn probe_image(&self, url: &str) -> impl Future<Output = bool>;
}

/// How a folder's image list was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Discovery {
    Manifest,
    Probed { attempted: usize },
}

/// Resolve a folder into an ordered, de-duplicated image list.
///
/// A non-empty manifest at `<folder><manifest_name>` is authoritative.
/// Otherwise every candidate is probed; the result is produced only once all
/// probes have settled and keeps candidate order.
pub async fn discover<P: ImageProbe>(
    folder: &str,
    probe: &P,
    cfg: &GalleryConfig,
) -> (Vec<String>, Discovery) {
    let manifest_url = format!("{folder}{}", cfg.manifest_name);
    if let Some(urls) = probe
        .fetch_manifest(&manifest_url)
        .await
        .and_then(|body| parse_manifest(folder, &body))
    {
        return (dedup_preserving_order(urls), Discovery::Manifest);
    }

    let candidates = probe_candidates(folder, cfg);
    let pending: Vec<_> = candidates
        .iter()
        .map(|url| probe.probe_image(url))
        .collect();

    let mut found = Vec::new();
    for (url, loaded) in candidates.iter().zip(pending) {
        if loaded.await {
            found.push(url.clone());
        }
    }
    let attempted = candidates.len();
    (dedup_preserving_order(found), Discovery::Probed { attempted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeProbe {
        manifests: HashMap<String, String>,
        images: Vec<String>,
        probed: RefCell<Vec<String>>,
    }

    impl ImageProbe for FakeProbe {
        fn fetch_manifest(&self, url: &str) -> impl Future<Output = Option<String>> {
            let body = self.manifests.get(url).cloned();
            async move { body }
        }

        fn probe_image(&self, url: &str) -> impl Future<Output = bool> {
            self.probed.borrow_mut().push(url.to_string());
            let hit = self.images.iter().any(|i| i == url);
            async move { hit }
        }
    }

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_trigger_attribute() {
        assert_eq!(ImageSource::parse(""), ImageSource::List(vec![]));
        assert_eq!(ImageSource::parse("  "), ImageSource::List(vec![]));
        assert_eq!(
            ImageSource::parse(" a.png , ,b.jpg "),
            ImageSource::List(list(&["a.png", "b.jpg"]))
        );
        assert_eq!(
            ImageSource::parse(" img/proj1/ "),
            ImageSource::Folder("img/proj1/".into())
        );
        assert_eq!(
            ImageSource::parse("a.png,img/"),
            ImageSource::List(list(&["a.png", "img/"]))
        );
    }

    #[test]
    fn next_cycles_back_to_start() {
        for len in 1..=5 {
            let mut g = Gallery::default();
            g.open((0..len).map(|i| format!("{i}.png")).collect());
            for _ in 0..len {
                g.next();
            }
            assert!(matches!(g.view(), View::Image { index: 0, .. }), "len {len}");
        }
    }

    #[test]
    fn prev_from_first_goes_to_last() {
        let mut g = Gallery::default();
        g.open(list(&["a", "b", "c"]));
        assert_eq!(
            g.prev(),
            Some(View::Image {
                src: "c",
                index: 2,
                total: 3,
                navigable: true
            })
        );
    }

    #[test]
    fn single_image_navigation_is_noop() {
        let mut g = Gallery::default();
        let view = g.open(list(&["only.png"]));
        assert!(matches!(view, View::Image { navigable: false, .. }));
        assert_eq!(g.next(), None);
        assert_eq!(g.prev(), None);
    }

    #[test]
    fn empty_open_then_reopen() {
        let mut g = Gallery::default();
        assert_eq!(g.open(vec![]), View::Empty);
        assert!(g.is_open());
        assert_eq!(g.next(), None);
        assert!(matches!(g.open(list(&["a", "b"])), View::Image { index: 0, .. }));
    }

    #[test]
    fn reopen_resets_index_and_close_hides() {
        let mut g = Gallery::default();
        g.open(list(&["a", "b"]));
        g.next();
        assert!(matches!(g.open(list(&["x", "y"])), View::Image { src: "x", .. }));
        assert_eq!(g.close(), View::Hidden);
        assert!(!g.is_open());
        assert_eq!(g.next(), None);
    }

    #[test]
    fn alt_text_is_one_based() {
        assert_eq!(alt_text(0, 3), "Imagen 1 de 3");
    }

    #[test]
    fn manifest_is_authoritative() {
        let cfg = GalleryConfig::default();
        let probe = FakeProbe {
            manifests: HashMap::from([(
                "p/index.json".to_string(),
                r#"["a.png","b.png"]"#.to_string(),
            )]),
            images: list(&["p/img1.webp"]),
            ..Default::default()
        };
        let (urls, how) = pollster::block_on(discover("p/", &probe, &cfg));
        assert_eq!(urls, list(&["p/a.png", "p/b.png"]));
        assert_eq!(how, Discovery::Manifest);
        assert!(probe.probed.borrow().is_empty());
    }

    #[test]
    fn empty_or_bad_manifest_falls_back_to_probing() {
        let cfg = GalleryConfig::default();
        for body in ["[]", "{\"files\": 1}", "not json"] {
            let probe = FakeProbe {
                manifests: HashMap::from([("p/index.json".to_string(), body.to_string())]),
                images: list(&["p/img3.png"]),
                ..Default::default()
            };
            let (urls, how) = pollster::block_on(discover("p/", &probe, &cfg));
            assert_eq!(urls, list(&["p/img3.png"]), "manifest {body}");
            assert_eq!(how, Discovery::Probed { attempted: 18 });
        }
    }

    #[test]
    fn probing_keeps_candidate_order() {
        let cfg = GalleryConfig::default();
        let probe = FakeProbe {
            images: list(&["f/img5.webp", "f/img2.jpg"]),
            ..Default::default()
        };
        let (urls, _) = pollster::block_on(discover("f/", &probe, &cfg));
        assert_eq!(urls, list(&["f/img2.jpg", "f/img5.webp"]));

        let probed = probe.probed.borrow();
        assert_eq!(probed.len(), 18);
        assert_eq!(probed[0], "f/img1.webp");
        assert_eq!(probed[1], "f/img1.jpg");
        assert_eq!(probed[17], "f/img6.png");
    }

    #[test]
    fn nothing_found_is_empty_not_error() {
        let cfg = GalleryConfig::default();
        let (urls, _) = pollster::block_on(discover("none/", &FakeProbe::default(), &cfg));
        assert!(urls.is_empty());
    }

    #[test]
    fn trigger_attribute_wins_unless_empty() {
        let card = || Some("c.png".to_string());
        assert_eq!(
            ImageSource::resolve(Some("a.png".into()), card),
            ImageSource::List(list(&["a.png"]))
        );
        assert_eq!(
            ImageSource::resolve(Some(String::new()), card),
            ImageSource::List(list(&["c.png"]))
        );
        assert_eq!(ImageSource::resolve(None, card), ImageSource::List(list(&["c.png"])));
        // Whitespace is a value: it opens an empty gallery.
        assert_eq!(ImageSource::resolve(Some("  ".into()), card), ImageSource::List(vec![]));
        assert_eq!(ImageSource::resolve(None, || None), ImageSource::List(vec![]));
    }

    #[test]
    fn current_discovery_is_shown_and_cached() {
        let mut tracker = DiscoveryTracker::default();
        let gen = tracker.begin();
        assert_eq!(tracker.cached("p/"), None);
        assert_eq!(
            tracker.settle(gen, "p/".into(), list(&["p/img1.webp"])),
            Some(list(&["p/img1.webp"]))
        );
        assert_eq!(tracker.cached("p/"), Some(list(&["p/img1.webp"])));
    }

    #[test]
    fn stale_discovery_is_cached_but_not_shown() {
        let mut tracker = DiscoveryTracker::default();
        let first = tracker.begin();
        // Another trigger is clicked before the first folder settles.
        let second = tracker.begin();
        assert_eq!(tracker.settle(first, "a/".into(), list(&["a/img1.jpg"])), None);
        assert_eq!(tracker.cached("a/"), Some(list(&["a/img1.jpg"])));
        assert_eq!(tracker.settle(second, "b/".into(), vec![]), Some(vec![]));
    }

    #[test]
    fn closing_makes_pending_discovery_stale() {
        let mut tracker = DiscoveryTracker::default();
        let gen = tracker.begin();
        tracker.invalidate();
        assert_eq!(tracker.settle(gen, "a/".into(), list(&["a/img2.png"])), None);
    }

    #[test]
    fn reopening_cached_folder_skips_discovery() {
        let cfg = GalleryConfig::default();
        let probe = FakeProbe {
            images: list(&["f/img2.jpg"]),
            ..Default::default()
        };
        let mut tracker = DiscoveryTracker::default();

        let gen = tracker.begin();
        let (urls, _) = pollster::block_on(discover("f/", &probe, &cfg));
        tracker.settle(gen, "f/".into(), urls);
        let probed = probe.probed.borrow().len();

        tracker.begin();
        let reopened = tracker
            .cached("f/")
            .unwrap_or_else(|| pollster::block_on(discover("f/", &probe, &cfg)).0);
        assert_eq!(reopened, list(&["f/img2.jpg"]));
        assert_eq!(probe.probed.borrow().len(), probed);
    }

    #[test]
    fn dedup_keeps_first_seen() {
        assert_eq!(
            dedup_preserving_order(list(&["b", "a", "b", "c", "a"])),
            list(&["b", "a", "c"])
        );
    }
}
