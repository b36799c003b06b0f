//! # Core Application Logic
//!
//! This module contains Vizzy's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • perform() (effects)  │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │   render   │      │ Controller │
//!     │  Adapter   │      │ (HTML tree)│      │ (headless) │
//!     │ (ratatui)  │      │            │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct: all application state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`effects`]: Executes effects against the backend
//! - [`store`], [`compose`], [`transcript`]: the pieces `App` is made of
//! - [`media`]: video detection, lightbox, downloads, dictation
//! - [`config`]: layered configuration

pub mod action;
pub mod compose;
pub mod config;
pub mod effects;
pub mod media;
pub mod state;
pub mod store;
pub mod transcript;

pub use action::{Action, Effect, update};
pub use effects::{Controller, Services, perform};
pub use state::App;
