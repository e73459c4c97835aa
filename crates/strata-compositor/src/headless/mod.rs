//! CPU reference renderer.
//!
//! `HeadlessRenderer` implements the full renderer contract without a GPU:
//! textures live in host memory, layers are rasterized as solid or textured
//! rectangles into an RGBA back buffer, and swaps copy it to a front buffer.
//! It backs the studio demo and end-to-end tests of the proxy.

mod init;
mod renderer;
mod resources;

pub use init::HeadlessInit;
pub use renderer::{HeadlessFrame, HeadlessLayer, HeadlessRenderer};
pub use resources::HeadlessResources;
