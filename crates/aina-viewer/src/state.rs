//! Viewer state owned by the load state machine

use std::path::{Path, PathBuf};

use aina_core::{RenderMode, VisibilityMap};
use aina_render::OrbitCamera;

/// Where the viewer is in the load cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing to draw
    #[default]
    Empty,
    /// A load request is being decoded or uploaded
    Loading,
    /// Parts are resident and drawable
    Ready,
}

/// Everything the shell can observe about the viewer.
///
/// Only [`crate::Viewer`] writes to it.
#[derive(Debug, Clone, Default)]
pub struct ViewerState {
    pub load_state: LoadState,
    pub loaded_path: Option<PathBuf>,
    pub camera: OrbitCamera,
    pub render_mode: RenderMode,
    pub visibility: VisibilityMap,
    /// Animation names of the loaded model
    pub animations: Vec<String>,
    redraw_requested: bool,
}

impl ViewerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` names the model that is currently loaded
    pub fn is_loaded(&self, path: &Path) -> bool {
        self.loaded_path.as_deref() == Some(path)
    }

    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    /// Consume the pending redraw request, if any.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    pub fn redraw_requested(&self) -> bool {
        self.redraw_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redraw_request_is_consumed_once() {
        let mut state = ViewerState::new();
        assert!(!state.take_redraw_request());

        state.request_redraw();
        state.request_redraw();
        assert!(state.redraw_requested());
        assert!(state.take_redraw_request());
        assert!(!state.take_redraw_request());
    }

    #[test]
    fn test_is_loaded_compares_paths() {
        let mut state = ViewerState::new();
        assert!(!state.is_loaded(Path::new("pet.glb")));

        state.loaded_path = Some(PathBuf::from("pet.glb"));
        assert!(state.is_loaded(Path::new("pet.glb")));
        assert!(!state.is_loaded(Path::new("other.glb")));
    }
}
