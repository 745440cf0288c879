#![forbid(unsafe_code)]

pub mod i18n;
pub mod model;
pub mod text;
pub mod time;

pub use i18n::{Lang, LandingCopy};
pub use time::Clock;
