pub mod badge;
pub mod blur;
pub mod canvas;

pub use badge::{badge_bounds, draw_badge, render_pill, render_subtitle_lines, Shadow};
pub use canvas::{Canvas, RgbFrame};
