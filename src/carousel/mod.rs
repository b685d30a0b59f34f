//! Carousel preview of the published images.

mod autoplay;
mod controller;

pub use autoplay::AutoAdvance;
pub use controller::{CarouselController, Indicator};
