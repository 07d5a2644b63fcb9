mod app;
mod console;
mod effects;
pub mod logging;
mod persistence;
mod render;

pub use app::{run_app, AppOptions};
