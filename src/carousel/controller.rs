//! Carousel navigation state machine.

use std::collections::BTreeSet;
use web_time::Instant;

use crate::config::CarouselConfig;

use super::autoplay::AutoAdvance;

/// One position dot under the carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicator {
    pub index: usize,
    pub active: bool,
}

/// Cyclic position over an ordered list of image references.
///
/// Starts uninitialized; [`mark_ready`](Self::mark_ready) is the rendering
/// surface's "created" signal. While ready, `current_index` is always inside
/// the slide range, or `None` when there are no slides.
#[derive(Debug, Clone)]
pub struct CarouselController {
    slides: Vec<String>,
    current: Option<usize>,
    ready: bool,
    /// Slides whose resource failed to load
    failed: BTreeSet<usize>,
    fallback: String,
    autoplay: Option<AutoAdvance>,
}

impl CarouselController {
    /// Create an uninitialized carousel over `slides`.
    pub fn new(slides: Vec<String>, config: &CarouselConfig) -> Self {
        Self {
            slides,
            current: None,
            ready: false,
            failed: BTreeSet::new(),
            fallback: config.fallback_slide.clone(),
            autoplay: config.autoplay_interval().map(AutoAdvance::new),
        }
    }

    /// The rendering surface finished initializing.
    ///
    /// Slide changes received before this point are picked up here.
    pub fn mark_ready(&mut self) {
        if self.ready {
            return;
        }

        self.ready = true;
        self.current = (!self.slides.is_empty()).then_some(0);
        self.restart_autoplay();
        log::debug!("🖼️ Carousel ready with {} slides", self.slides.len());
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Tear down back to uninitialized. Cancels autoplay.
    pub fn teardown(&mut self) {
        self.ready = false;
        self.current = None;
        if let Some(timer) = &mut self.autoplay {
            timer.cancel();
        }
        log::debug!("🖼️ Carousel torn down");
    }

    /// Replace the slide list. Returns false if the content is unchanged.
    ///
    /// Once ready, any change re-synchronizes: the position is clamped into
    /// the new range, load failures are forgotten and autoplay restarts.
    pub fn set_slides(&mut self, slides: Vec<String>) -> bool {
        if slides == self.slides {
            return false;
        }

        self.slides = slides;
        self.failed.clear();

        if self.ready {
            let last = self.slides.len().checked_sub(1);
            self.current = match (self.current, last) {
                (_, None) => None,
                (Some(index), Some(last)) => Some(index.min(last)),
                (None, Some(_)) => Some(0),
            };
            self.restart_autoplay();
            log::debug!(
                "🖼️ Carousel re-synced: {} slides, index {:?}",
                self.slides.len(),
                self.current
            );
        }

        true
    }

    pub fn slides(&self) -> &[String] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Source of the slide on screen, with the fallback substituted on failure.
    pub fn current_slide(&self) -> Option<&str> {
        self.current.and_then(|index| self.slide_source(index))
    }

    /// Arrows and dots are only offered when ready with more than one slide.
    pub fn controls_available(&self) -> bool {
        self.ready && self.slides.len() > 1
    }

    /// Position dots, empty when controls are unavailable.
    pub fn indicators(&self) -> Vec<Indicator> {
        if !self.controls_available() {
            return Vec::new();
        }

        (0..self.slides.len())
            .map(|index| Indicator {
                index,
                active: self.current == Some(index),
            })
            .collect()
    }

    /// Advance one slide, wrapping from the last to the first.
    pub fn next(&mut self) -> bool {
        self.step(true, true)
    }

    /// Go back one slide, wrapping from the first to the last.
    pub fn prev(&mut self) -> bool {
        self.step(false, true)
    }

    /// Jump to a slide. Out-of-range requests are ignored.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if !self.controls_available() || index >= self.slides.len() {
            log::debug!("🖼️ Ignoring jump to {} of {}", index, self.slides.len());
            return false;
        }

        self.current = Some(index);
        self.restart_autoplay();
        true
    }

    /// Advance automatically if the autoplay deadline has passed.
    ///
    /// Returns true when the slide changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.controls_available() {
            return false;
        }

        let Some(timer) = &mut self.autoplay else {
            return false;
        };
        if !timer.is_due(now) {
            return false;
        }

        timer.restart(now);
        self.step(true, false)
    }

    pub fn autoplay(&self) -> Option<&AutoAdvance> {
        self.autoplay.as_ref()
    }

    /// Record that a slide's resource failed to load.
    ///
    /// The slide keeps its position and is rendered with the fallback image.
    pub fn mark_failed(&mut self, index: usize) -> bool {
        let Some(source) = self.slides.get(index) else {
            return false;
        };

        if self.failed.insert(index) {
            log::error!("🖼️ Failed to load image: {}", source);
        }
        true
    }

    pub fn is_failed(&self, index: usize) -> bool {
        self.failed.contains(&index)
    }

    /// Source to render for a slide.
    pub fn slide_source(&self, index: usize) -> Option<&str> {
        let source = self.slides.get(index)?;
        if self.failed.contains(&index) {
            Some(&self.fallback)
        } else {
            Some(source)
        }
    }

    /// All slide sources to render, in order.
    pub fn display_slides(&self) -> Vec<&str> {
        (0..self.slides.len())
            .filter_map(|index| self.slide_source(index))
            .collect()
    }

    /// Alt text for a slide.
    pub fn slide_label(index: usize) -> String {
        format!("Slide {}", index + 1)
    }

    fn step(&mut self, forward: bool, manual: bool) -> bool {
        if !self.controls_available() {
            return false;
        }
        let Some(index) = self.current else {
            return false;
        };

        let len = self.slides.len();
        let target = if forward {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        self.current = Some(target);

        if manual {
            self.restart_autoplay();
        }
        true
    }

    fn restart_autoplay(&mut self) {
        let available = self.controls_available();
        if let Some(timer) = &mut self.autoplay {
            if available {
                timer.restart(Instant::now());
            } else {
                timer.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn slides(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn ready(names: &[&str]) -> CarouselController {
        let mut carousel = CarouselController::new(slides(names), &CarouselConfig::default());
        carousel.mark_ready();
        carousel
    }

    fn autoplaying(names: &[&str], interval: Duration) -> CarouselController {
        let config = CarouselConfig {
            autoplay: true,
            autoplay_interval_ms: interval.as_millis() as u64,
            ..CarouselConfig::default()
        };
        let mut carousel = CarouselController::new(slides(names), &config);
        carousel.mark_ready();
        carousel
    }

    #[test]
    fn test_uninitialized_until_ready() {
        let mut carousel =
            CarouselController::new(slides(&["a", "b"]), &CarouselConfig::default());
        assert!(!carousel.is_ready());
        assert_eq!(carousel.current_index(), None);
        assert!(!carousel.controls_available());
        assert!(!carousel.next());

        carousel.mark_ready();
        assert!(carousel.is_ready());
        assert_eq!(carousel.current_index(), Some(0));
        assert!(carousel.controls_available());
    }

    #[test]
    fn test_next_cycles_back_to_start() {
        let mut carousel = ready(&["a", "b", "c"]);
        carousel.next();
        carousel.next();
        assert_eq!(carousel.current_index(), Some(2));
        carousel.next();
        assert_eq!(carousel.current_index(), Some(0));
    }

    #[test]
    fn test_prev_wraps_to_last() {
        let mut carousel = ready(&["a", "b", "c"]);
        assert!(carousel.prev());
        assert_eq!(carousel.current_index(), Some(2));
        assert_eq!(carousel.current_slide(), Some("c"));
    }

    #[test]
    fn test_empty_and_single_are_inert() {
        let mut empty = ready(&[]);
        assert_eq!(empty.current_index(), None);
        assert!(!empty.next());
        assert!(!empty.prev());
        assert!(!empty.controls_available());
        assert!(empty.indicators().is_empty());
        assert_eq!(empty.current_slide(), None);

        let mut single = ready(&["only"]);
        assert!(!single.next());
        assert!(!single.prev());
        assert_eq!(single.current_index(), Some(0));
        assert!(!single.controls_available());
        assert!(single.indicators().is_empty());
        assert_eq!(single.current_slide(), Some("only"));
    }

    #[test]
    fn test_jump_to() {
        let mut carousel = ready(&["a", "b", "c"]);
        assert!(carousel.jump_to(2));
        assert_eq!(carousel.current_index(), Some(2));

        assert!(!carousel.jump_to(3));
        assert!(!carousel.jump_to(usize::MAX));
        assert_eq!(carousel.current_index(), Some(2));
    }

    #[test]
    fn test_indicators_mark_active() {
        let mut carousel = ready(&["a", "b", "c"]);
        carousel.next();

        let active: Vec<bool> = carousel.indicators().iter().map(|i| i.active).collect();
        assert_eq!(active, vec![false, true, false]);
    }

    #[test]
    fn test_shrinking_slides_clamps_index() {
        let mut carousel = ready(&["a", "b", "c", "d", "e"]);
        carousel.jump_to(4);

        assert!(carousel.set_slides(slides(&["x", "y"])));
        assert_eq!(carousel.current_index(), Some(1));
    }

    #[test]
    fn test_growing_from_empty_starts_at_zero() {
        let mut carousel = ready(&[]);
        carousel.set_slides(slides(&["a", "b"]));
        assert_eq!(carousel.current_index(), Some(0));

        carousel.set_slides(Vec::new());
        assert_eq!(carousel.current_index(), None);
    }

    #[test]
    fn test_same_content_is_not_a_change() {
        let mut carousel = ready(&["a", "b"]);
        carousel.next();
        assert!(!carousel.set_slides(slides(&["a", "b"])));
        assert_eq!(carousel.current_index(), Some(1));

        // Same length, different content still re-syncs
        carousel.mark_failed(0);
        assert!(carousel.set_slides(slides(&["a", "z"])));
        assert!(!carousel.is_failed(0));
    }

    #[test]
    fn test_changes_before_ready_are_absorbed() {
        let mut carousel = CarouselController::new(slides(&["a"]), &CarouselConfig::default());
        carousel.set_slides(slides(&["x", "y", "z"]));
        assert_eq!(carousel.current_index(), None);

        carousel.mark_ready();
        assert_eq!(carousel.slide_count(), 3);
        assert_eq!(carousel.current_index(), Some(0));
    }

    #[test]
    fn test_failed_slide_uses_fallback() {
        let mut carousel = ready(&["a", "b", "c"]);
        carousel.jump_to(1);

        assert!(carousel.mark_failed(2));
        assert!(!carousel.mark_failed(10));

        assert_eq!(carousel.current_index(), Some(1));
        assert_eq!(carousel.slide_count(), 3);
        assert_eq!(
            carousel.display_slides(),
            vec!["a", "b", "/images/banners/1.jpg"]
        );
    }

    #[test]
    fn test_teardown_returns_to_uninitialized() {
        let mut carousel = autoplaying(&["a", "b"], Duration::from_secs(1));
        assert!(carousel.autoplay().unwrap().is_scheduled());

        carousel.teardown();
        assert!(!carousel.is_ready());
        assert_eq!(carousel.current_index(), None);
        assert!(!carousel.autoplay().unwrap().is_scheduled());
        assert!(!carousel.tick(Instant::now() + Duration::from_secs(10)));
    }

    #[test]
    fn test_autoplay_advances_when_due() {
        let mut carousel = autoplaying(&["a", "b", "c"], Duration::from_secs(5));
        let now = Instant::now();

        assert!(!carousel.tick(now));
        assert!(carousel.tick(now + Duration::from_secs(6)));
        assert_eq!(carousel.current_index(), Some(1));

        // Rescheduled from the tick time
        assert!(!carousel.tick(now + Duration::from_secs(7)));
        assert!(carousel.tick(now + Duration::from_secs(12)));
        assert_eq!(carousel.current_index(), Some(2));
    }

    #[test]
    fn test_manual_navigation_resets_autoplay() {
        let mut carousel = autoplaying(&["a", "b", "c"], Duration::from_secs(5));

        let nav_time = Instant::now();
        carousel.next();

        let remaining = carousel.autoplay().unwrap().remaining(nav_time).unwrap();
        assert!(remaining >= Duration::from_secs(5));
        assert!(!carousel.tick(nav_time + Duration::from_secs(4)));
        assert_eq!(carousel.current_index(), Some(1));
    }

    #[test]
    fn test_autoplay_inert_without_controls() {
        let mut carousel = autoplaying(&["only"], Duration::from_millis(1));
        assert!(!carousel.autoplay().unwrap().is_scheduled());
        assert!(!carousel.tick(Instant::now() + Duration::from_secs(1)));
    }

    #[test]
    fn test_slide_label() {
        assert_eq!(CarouselController::slide_label(0), "Slide 1");
    }
}
