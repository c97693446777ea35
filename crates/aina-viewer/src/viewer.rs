//! Load / reload state machine
//!
//! A [`Viewer`] owns the GPU backend, the resident parts, and the
//! [`ViewerState`]. Every load goes `Loading -> Ready` on success or
//! `Loading -> Empty` on failure, and always releases the previous model's
//! GPU objects first.

use std::path::{Path, PathBuf};

use aina_assets::{load_scene, SceneAsset};
use aina_core::{PartId, PartInfo, RenderMode, VisibilityMap};
use aina_render::{normalize_scene, render_frame, FrameStats, GpuBackend, GpuResources, OrbitCamera};
use tracing::{error, info, warn};

use crate::error::ViewerError;
use crate::input::CameraAction;
use crate::state::{LoadState, ViewerState};

/// A model to load and the visibility to start it with.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub path: PathBuf,
    /// Persisted visibility, applied when the path is not the loaded model
    pub visibility: Option<VisibilityMap>,
    /// Ignore both the persisted and the current visibility
    pub reset_visibility: bool,
}

impl LoadRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            visibility: None,
            reset_visibility: false,
        }
    }

    /// Attach a visibility map from saved settings.
    pub fn with_visibility(mut self, visibility: VisibilityMap) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Start with every part visible.
    pub fn all_visible(mut self) -> Self {
        self.visibility = None;
        self.reset_visibility = true;
        self
    }
}

pub struct Viewer<B: GpuBackend> {
    backend: B,
    resources: GpuResources,
    state: ViewerState,
}

impl<B: GpuBackend> Viewer<B> {
    /// Wrap a ready backend. No model is loaded yet.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            resources: GpuResources::new(),
            state: ViewerState::new(),
        }
    }

    /// Load a model synchronously on the calling (GPU-owning) thread.
    pub fn load(&mut self, request: LoadRequest) -> Result<(), ViewerError> {
        self.transition(request, |path| load_scene(path).map_err(ViewerError::from))
    }

    /// Mark a background load as started.
    pub fn begin_loading(&mut self) {
        self.state.load_state = LoadState::Loading;
    }

    /// Finish a load whose decode ran on the background loader.
    pub fn apply_loaded(
        &mut self,
        request: LoadRequest,
        decoded: Result<SceneAsset, ViewerError>,
    ) -> Result<(), ViewerError> {
        self.transition(request, move |_| decoded)
    }

    /// Load `path` with every part visible.
    pub fn restore_default_model(&mut self, path: impl Into<PathBuf>) -> Result<(), ViewerError> {
        info!("Restoring default model");
        self.load(LoadRequest::new(path).all_visible())
    }

    fn transition<F>(&mut self, request: LoadRequest, decode: F) -> Result<(), ViewerError>
    where
        F: FnOnce(&Path) -> Result<SceneAsset, ViewerError>,
    {
        self.state.load_state = LoadState::Loading;
        let snapshot = self.state.visibility.clone();
        let same_model = self.state.is_loaded(&request.path);
        info!(
            "Loading {} ({})",
            request.path.display(),
            if same_model { "reload" } else { "new model" }
        );

        self.resources.clear(&mut self.backend);

        match self.populate(&request.path, decode) {
            Ok(scene) => {
                let previous = if request.reset_visibility {
                    VisibilityMap::new()
                } else if same_model {
                    snapshot
                } else {
                    request.visibility.unwrap_or_default()
                };
                self.state.visibility = VisibilityMap::reconcile(
                    self.resources.parts().map(|record| record.id),
                    &previous,
                );
                self.state.animations = scene.animations;
                self.state.loaded_path = Some(request.path);
                self.state.load_state = LoadState::Ready;
                self.state.request_redraw();
                self.resources.log_summary();
                Ok(())
            }
            Err(e) => {
                error!("Failed to load {}: {}", request.path.display(), e);
                self.resources.clear(&mut self.backend);
                self.state.animations.clear();
                self.state.loaded_path = None;
                self.state.load_state = LoadState::Empty;
                self.state.request_redraw();
                Err(e)
            }
        }
    }

    /// Decode, upload, and normalize. Returns the scene for its metadata.
    fn populate<F>(&mut self, path: &Path, decode: F) -> Result<SceneAsset, ViewerError>
    where
        F: FnOnce(&Path) -> Result<SceneAsset, ViewerError>,
    {
        let mut scene = decode(path)?;

        self.resources.upload_textures(&mut self.backend, &scene.textures);
        for part in &scene.parts {
            self.resources.create(&mut self.backend, part);
        }
        normalize_scene(&mut self.backend, &mut self.resources)?;

        // Pixels and vertices now live on the GPU side.
        scene.textures.clear();
        scene.parts.clear();
        Ok(scene)
    }

    /// Release every GPU object and return to `Empty`.
    pub fn clear(&mut self) {
        self.resources.clear(&mut self.backend);
        self.state.loaded_path = None;
        self.state.animations.clear();
        self.state.load_state = LoadState::Empty;
        self.state.request_redraw();
    }

    /// Draw one frame.
    pub fn render(&mut self, aspect: f32) -> Result<FrameStats, ViewerError> {
        let stats = render_frame(
            &mut self.backend,
            &self.resources,
            &self.state.visibility,
            &self.state.camera,
            aspect,
            self.state.render_mode,
        )?;
        Ok(stats)
    }

    /// Ordered part list for the visibility checklist
    pub fn parts(&self) -> Vec<PartInfo> {
        self.resources.part_infos()
    }

    pub fn visibility(&self) -> &VisibilityMap {
        &self.state.visibility
    }

    pub fn is_part_visible(&self, id: PartId) -> bool {
        self.state.visibility.is_visible(id)
    }

    /// Show or hide a part. Returns `false` for unknown ids.
    pub fn set_part_visible(&mut self, id: PartId, visible: bool) -> bool {
        if self.resources.part(id).is_none() {
            warn!("Ignoring visibility change for unknown part {}", id);
            return false;
        }
        self.state.visibility.set(id, visible);
        self.state.request_redraw();
        true
    }

    /// Flip a part's visibility and return the new value.
    pub fn toggle_part(&mut self, id: PartId) -> Option<bool> {
        if self.resources.part(id).is_none() {
            warn!("Ignoring visibility toggle for unknown part {}", id);
            return None;
        }
        let visible = self.state.visibility.toggle(id);
        self.state.request_redraw();
        Some(visible)
    }

    pub fn rotate_by(&mut self, dx: f32, dy: f32) {
        self.state.camera.rotate_by(dx, dy);
        self.state.request_redraw();
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.state.camera.pan_by(dx, dy);
        self.state.request_redraw();
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.state.camera.zoom_by(delta);
        self.state.request_redraw();
    }

    /// Apply a pointer gesture to the camera.
    pub fn apply_camera_action(&mut self, action: CameraAction) {
        match action {
            CameraAction::Rotate { dx, dy } => self.rotate_by(dx, dy),
            CameraAction::Pan { dx, dy } => self.pan_by(dx, dy),
            CameraAction::Zoom(delta) => self.zoom_by(delta),
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.state.camera
    }

    pub fn render_mode(&self) -> RenderMode {
        self.state.render_mode
    }

    /// Switch render mode. A mode the backend cannot rasterize is kept but
    /// drawn as solid.
    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if !self.backend.supports_render_mode(mode) {
            warn!("{:?} rendering is not supported by this GPU; drawing solid", mode);
        }
        self.state.render_mode = mode;
        self.state.request_redraw();
    }

    pub fn toggle_wireframe(&mut self) {
        self.set_render_mode(self.state.render_mode.toggled_wireframe());
    }

    pub fn toggle_points(&mut self) {
        self.set_render_mode(self.state.render_mode.toggled_points());
    }

    /// Consume the redraw flag raised by loads and state changes.
    pub fn take_redraw_request(&mut self) -> bool {
        self.state.take_redraw_request()
    }

    pub fn load_state(&self) -> LoadState {
        self.state.load_state
    }

    pub fn loaded_path(&self) -> Option<&Path> {
        self.state.loaded_path.as_deref()
    }

    pub fn animations(&self) -> &[String] {
        &self.state.animations
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn resources(&self) -> &GpuResources {
        &self.resources
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aina_assets::fixtures::{temp_dir, textured_pet, FixtureBuilder, PrimitiveSpec};
    use aina_render::{AllocationKind, BufferKind, HeadlessBackend};
    use std::fs;

    fn viewer() -> Viewer<HeadlessBackend> {
        Viewer::new(HeadlessBackend::new())
    }

    fn three_part_model(dir: &Path, name: &str) -> PathBuf {
        let mut builder = FixtureBuilder::new();
        builder.add_mesh(
            Some("Head"),
            vec![PrimitiveSpec::triangle(), PrimitiveSpec::quad()],
        );
        builder.add_mesh(Some("Tail"), vec![PrimitiveSpec::triangle()]);
        builder.write_glb(dir, name)
    }

    #[test]
    fn test_textured_and_plain_parts() {
        let dir = temp_dir("viewer-pet");
        let path = textured_pet(&dir, "pet");
        let mut viewer = viewer();

        viewer.load(LoadRequest::new(&path)).unwrap();

        assert_eq!(viewer.load_state(), LoadState::Ready);
        let parts = viewer.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "Body");
        assert!(viewer.resources().texture_for(0).is_some());
        assert!(viewer.resources().texture_for(1).is_none());
        assert!(viewer.is_part_visible(0));
        assert!(viewer.is_part_visible(1));
        assert_eq!(viewer.visibility().len(), 2);
        assert!(viewer.take_redraw_request());
        assert!(!viewer.take_redraw_request());
    }

    #[test]
    fn test_reload_same_model_keeps_visibility() {
        let dir = temp_dir("viewer-reload");
        let path = three_part_model(&dir, "pet");
        let mut viewer = viewer();
        viewer.load(LoadRequest::new(&path)).unwrap();

        viewer.set_part_visible(1, false);
        let before = viewer.visibility().clone();
        viewer.load(LoadRequest::new(&path)).unwrap();

        assert_eq!(viewer.visibility(), &before);
        assert!(!viewer.is_part_visible(1));
    }

    #[test]
    fn test_new_model_resets_visibility_except_config() {
        let dir = temp_dir("viewer-switch");
        let first = three_part_model(&dir, "first");
        let second = three_part_model(&dir, "second");
        let mut viewer = viewer();
        viewer.load(LoadRequest::new(&first)).unwrap();
        viewer.set_part_visible(0, false);
        viewer.set_part_visible(1, false);

        let mut saved = VisibilityMap::new();
        saved.set(2, false);
        saved.set(9, false);
        viewer
            .load(LoadRequest::new(&second).with_visibility(saved))
            .unwrap();

        assert!(viewer.is_part_visible(0));
        assert!(viewer.is_part_visible(1));
        assert!(!viewer.is_part_visible(2));
        assert!(!viewer.visibility().contains(9));
        assert_eq!(viewer.loaded_path(), Some(second.as_path()));
    }

    #[test]
    fn test_restore_default_model_shows_everything() {
        let dir = temp_dir("viewer-restore");
        let path = three_part_model(&dir, "pet");
        let mut viewer = viewer();
        viewer.load(LoadRequest::new(&path)).unwrap();
        viewer.toggle_part(0);

        viewer.restore_default_model(&path).unwrap();

        assert!(viewer.visibility().iter().all(|(_, visible)| visible));
    }

    #[test]
    fn test_missing_buffer_leaves_empty_and_visibility_unchanged() {
        let dir = temp_dir("viewer-missing");
        let good = three_part_model(&dir, "good");
        let mut builder = FixtureBuilder::new();
        builder.add_mesh(Some("Body"), vec![PrimitiveSpec::triangle()]);
        let broken = builder.write_gltf(&dir, "broken");
        fs::remove_file(dir.join("broken.bin")).unwrap();

        let mut viewer = viewer();
        viewer.load(LoadRequest::new(&good)).unwrap();
        viewer.set_part_visible(2, false);
        let before = viewer.visibility().clone();

        let result = viewer.load(LoadRequest::new(&broken));

        assert!(matches!(result, Err(ViewerError::Asset(_))));
        assert_eq!(viewer.load_state(), LoadState::Empty);
        assert!(viewer.parts().is_empty());
        assert_eq!(viewer.visibility(), &before);
        assert_eq!(viewer.loaded_path(), None);
        assert_eq!(viewer.backend().live_buffers(), 0);
        assert_eq!(viewer.backend().live_textures(), 0);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let mut viewer = viewer();
        let result = viewer.load(LoadRequest::new("/nonexistent/pet.glb"));
        assert!(matches!(
            result,
            Err(ViewerError::Asset(aina_assets::AssetError::NotFound(_)))
        ));
        assert_eq!(viewer.load_state(), LoadState::Empty);
    }

    #[test]
    fn test_indexed_part_draws_every_index() {
        let dir = temp_dir("viewer-indexed");
        let mut builder = FixtureBuilder::new();
        builder.add_mesh(Some("Strip"), vec![PrimitiveSpec::indexed_strip(100, 300)]);
        let path = builder.write_glb(&dir, "strip");
        let mut viewer = viewer();
        viewer.load(LoadRequest::new(&path)).unwrap();

        let buffers = viewer.resources().part(0).unwrap().buffers.clone().unwrap();
        assert_eq!(buffers.face_count, 100);
        let indices = buffers.indices.unwrap();
        assert_eq!(viewer.backend().buffer(indices).unwrap().element_count(), 300);

        let stats = viewer.render(1.0).unwrap();
        assert_eq!(stats.elements, 300);
        assert_eq!(viewer.backend().last_frame().unwrap().draws[0].element_count, 300);
    }

    #[test]
    fn test_repeated_loads_do_not_leak() {
        let dir = temp_dir("viewer-leak");
        let pet = textured_pet(&dir, "pet");
        let other = three_part_model(&dir, "other");
        let mut viewer = viewer();

        for path in [&pet, &other, &pet, &pet] {
            viewer.load(LoadRequest::new(path)).unwrap();
        }
        let expected = viewer.resources().part_count();
        assert_eq!(expected, 2);
        assert_eq!(viewer.backend().live_textures(), 1);

        viewer.clear();
        viewer.clear();
        assert_eq!(viewer.backend().live_buffers(), 0);
        assert_eq!(viewer.backend().live_textures(), 0);
        assert_eq!(viewer.load_state(), LoadState::Empty);
    }

    #[test]
    fn test_degenerate_model_loads_unscaled() {
        let dir = temp_dir("viewer-point");
        let mut builder = FixtureBuilder::new();
        builder.add_mesh(
            Some("Dot"),
            vec![PrimitiveSpec::from_positions(vec![[1.0, 2.0, 3.0]; 3])],
        );
        let path = builder.write_glb(&dir, "dot");
        let mut viewer = viewer();
        viewer.load(LoadRequest::new(&path)).unwrap();

        let handle = viewer.resources().part(0).unwrap().buffers.as_ref().unwrap().positions;
        let data = viewer.backend().vertex_data(handle).unwrap();
        assert_eq!(data, &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_allocation_failure_keeps_part_by_name() {
        let dir = temp_dir("viewer-alloc");
        let path = textured_pet(&dir, "pet");
        let mut backend = HeadlessBackend::new();
        backend.fail_allocations(AllocationKind::Vertex(BufferKind::Positions));
        let mut viewer = Viewer::new(backend);

        viewer.load(LoadRequest::new(&path)).unwrap();

        assert_eq!(viewer.parts().len(), 2);
        let stats = viewer.render(1.0).unwrap();
        assert_eq!(stats.drawn, 0);
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn test_hidden_part_is_not_drawn() {
        let dir = temp_dir("viewer-hidden");
        let path = textured_pet(&dir, "pet");
        let mut viewer = viewer();
        viewer.load(LoadRequest::new(&path)).unwrap();

        assert_eq!(viewer.toggle_part(0), Some(false));
        assert_eq!(viewer.toggle_part(7), None);
        assert!(!viewer.set_part_visible(7, false));
        viewer.render(1.0).unwrap();

        let frame = viewer.backend().last_frame().unwrap();
        assert_eq!(frame.draws.len(), 1);
        assert_eq!(frame.draws[0].part, 1);
    }

    #[test]
    fn test_camera_changes_request_redraw() {
        let mut viewer = viewer();
        viewer.rotate_by(10.0, 4.0);
        assert!(viewer.take_redraw_request());
        assert_eq!(viewer.camera().yaw, 35.0);
        assert_eq!(viewer.camera().pitch, 32.0);

        viewer.apply_camera_action(CameraAction::Zoom(120.0));
        assert!(viewer.take_redraw_request());
        assert!((viewer.camera().zoom - (-2.8)).abs() < 1e-5);
    }

    #[test]
    fn test_unsupported_mode_draws_solid() {
        let dir = temp_dir("viewer-mode");
        let path = textured_pet(&dir, "pet");
        let mut backend = HeadlessBackend::new();
        backend.set_render_mode_supported(RenderMode::Wireframe, false);
        let mut viewer = Viewer::new(backend);
        viewer.load(LoadRequest::new(&path)).unwrap();

        viewer.toggle_wireframe();
        assert_eq!(viewer.render_mode(), RenderMode::Wireframe);
        viewer.render(1.0).unwrap();
        assert_eq!(
            viewer.backend().last_frame().unwrap().params.mode,
            RenderMode::Solid
        );

        viewer.toggle_points();
        viewer.render(1.0).unwrap();
        assert_eq!(
            viewer.backend().last_frame().unwrap().params.mode,
            RenderMode::Points
        );
    }

    #[test]
    fn test_animation_names_follow_the_model() {
        let dir = temp_dir("viewer-anim");
        let mut builder = FixtureBuilder::new();
        builder.add_mesh(Some("Body"), vec![PrimitiveSpec::triangle()]);
        builder.add_animation_name(Some("Idle"));
        let path = builder.write_glb(&dir, "anim");
        let mut viewer = viewer();

        viewer.load(LoadRequest::new(&path)).unwrap();
        assert_eq!(viewer.animations(), ["Idle".to_string()]);

        let _ = viewer.load(LoadRequest::new(dir.join("missing.glb")));
        assert!(viewer.animations().is_empty());
    }
}
