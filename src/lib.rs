//! Vizzy: a terminal client for a conversational image and video
//! generation server.

pub mod api;
pub mod core;
pub mod render;
pub mod tui;

#[cfg(test)]
pub mod test_support;
