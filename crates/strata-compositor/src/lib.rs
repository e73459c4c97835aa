//! Strata compositor crate.
//!
//! Drives an impl-side renderer from a main-side scene host through commits,
//! draws and graphics-context loss. The single-thread proxy runs both roles
//! on the calling thread; the headless renderer provides a CPU backend for
//! demos and tests.

pub mod coords;
pub mod device;
pub mod headless;
pub mod host;
pub mod logging;
pub mod proxy;
pub mod renderer;
pub mod resource;
pub mod time;
