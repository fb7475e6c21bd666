//! UI layer for the desktop game: app shell, screens, and image decoding.

pub mod app;
pub mod images;
mod screens;

pub use app::CarQuizApp;
