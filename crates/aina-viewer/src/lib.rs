//! AINA Viewer - Model load state machine and interaction
//!
//! Ties asset decoding and GPU resources together behind [`Viewer`]:
//! - `Empty -> Loading -> Ready` transitions with visibility reconciliation
//! - Background decoding through [`ModelLoader`]
//! - Pointer gestures mapped onto the orbit camera

mod error;
pub mod input;
pub mod loader;
pub mod state;
pub mod viewer;

pub use error::ViewerError;
pub use input::{CameraAction, PointerInput};
pub use loader::{ModelLoader, PendingLoad};
pub use state::{LoadState, ViewerState};
pub use viewer::{LoadRequest, Viewer};
