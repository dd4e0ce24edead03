//! Terminal user interface.

mod app;
pub mod styles;
pub mod ui;
pub mod worker;

pub use app::{App, Screen};
