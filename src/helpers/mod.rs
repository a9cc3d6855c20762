//! Helper functions shared by the renderer, views and feed

mod date;
mod html;

pub use date::*;
pub use html::*;
