//! Domain types for minute-bar export

pub mod bar;
pub mod window;

pub use bar::{is_minute_aligned, MinuteBar};
pub use window::SessionWindow;
