pub mod face;
pub mod layout;
pub mod paint;

pub use face::{BlockFace, Face, FontSet, FontdueFace, LineMetrics};
pub use layout::{fit_block, wrap, BlockFrame, FitPolicy, OverflowPolicy, TextBlock, ELLIPSIS};
