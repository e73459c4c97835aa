//! Texture resources and the commit-time upload queue.
//!
//! Responsibilities:
//! - describe pending texture writes produced by the host before a commit
//! - define the resource-provider contract renderers expose
//! - drain a queue into a provider during the commit

mod controller;
mod provider;
mod queue;

pub use controller::{update_textures, UploadSummary};
pub use provider::{ResourceProvider, TextureId, UploadError, UploaderKind};
pub use queue::{TextureUpload, TextureUploadQueue};
