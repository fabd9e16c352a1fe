//! Testimonial carousel with autoplay.
//!
//! One index into a fixed number of slides. A repeating timer advances it with
//! wrap-around; indicator dots jump straight to a slide; hovering the track
//! pauses autoplay and leaving it resumes.

use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::debug;

use crate::config::WidgetConfig;
use crate::scheduler::{Scheduler, TimerSlot};

/// The rendered track and its indicator dots.
pub trait CarouselSurface {
    /// Rendered width of the first slide, `None` when the track is empty.
    fn first_slide_width(&self) -> Option<f64>;

    /// Shift the track by `offset_px` and mark dot `active`.
    fn render(&self, offset_px: f64, active: usize);
}

/// CSS `transform` value for an offset, e.g. `translateX(-316px)`.
pub fn translate_x(offset_px: f64) -> String {
    // Avoid printing "-0px" for the first slide.
    let offset = if offset_px == 0.0 { 0.0 } else { offset_px };
    format!("translateX({offset}px)")
}

struct Shared {
    index: Cell<usize>,
    slide_count: usize,
    interval: Duration,
    gap_px: f64,
    fallback_step_px: f64,
    timer: TimerSlot,
    scheduler: Rc<dyn Scheduler>,
    surface: Rc<dyn CarouselSurface>,
}

#[derive(Clone)]
pub struct Carousel {
    shared: Rc<Shared>,
}

impl Carousel {
    /// `None` when there are no slides: nothing to rotate.
    pub fn new(
        slide_count: usize,
        surface: Rc<dyn CarouselSurface>,
        scheduler: Rc<dyn Scheduler>,
        config: &WidgetConfig,
    ) -> Option<Self> {
        if slide_count == 0 {
            return None;
        }
        Some(Self {
            shared: Rc::new(Shared {
                index: Cell::new(0),
                slide_count,
                interval: config.carousel_interval(),
                gap_px: config.slide_gap_px,
                fallback_step_px: config.fallback_step_px,
                timer: TimerSlot::new(),
                scheduler,
                surface,
            }),
        })
    }

    pub fn index(&self) -> usize {
        self.shared.index.get()
    }

    pub fn slide_count(&self) -> usize {
        self.shared.slide_count
    }

    pub fn is_playing(&self) -> bool {
        self.shared.timer.is_armed()
    }

    /// Begin autoplay.
    pub fn start(&self) {
        let weak: Weak<Shared> = Rc::downgrade(&self.shared);
        self.shared.timer.arm_every(
            self.shared.scheduler.as_ref(),
            self.shared.interval,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.advance();
                }
            }),
        );
    }

    /// Indicator click. Out-of-range indices are ignored.
    pub fn on_dot_click(&self, index: usize) {
        if index < self.shared.slide_count {
            self.shared.go(index);
        } else {
            debug!(index, slides = self.shared.slide_count, "ignoring dot outside range");
        }
    }

    /// Indicator click carrying the raw `data-i` attribute.
    pub fn on_dot_attr(&self, raw: &str) {
        match raw.trim().parse::<usize>() {
            Ok(i) => self.on_dot_click(i),
            Err(_) => debug!(raw, "ignoring dot with unparsable index"),
        }
    }

    pub fn on_mouse_enter(&self) {
        self.shared.timer.clear(self.shared.scheduler.as_ref());
    }

    pub fn on_mouse_leave(&self) {
        self.start();
    }

    /// Current step between slides.
    pub fn step_px(&self) -> f64 {
        self.shared.step_px()
    }
}

impl Shared {
    fn step_px(&self) -> f64 {
        match self.surface.first_slide_width() {
            Some(width) => width + self.gap_px,
            None => self.fallback_step_px,
        }
    }

    fn go(&self, index: usize) {
        self.index.set(index);
        let offset = -(self.step_px() * index as f64);
        self.surface.render(offset, index);
    }

    fn advance(&self) {
        self.go((self.index.get() + 1) % self.slide_count);
    }
}
