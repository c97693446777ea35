//! Per-frame draw orchestration

use aina_core::{Color, RenderMode, VisibilityMap};
use tracing::{debug, warn};

use crate::backend::{FrameParams, FrameStatus, GpuBackend};
use crate::camera::OrbitCamera;
use crate::error::RenderError;
use crate::resources::GpuResources;

/// What happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub hidden: usize,
    /// Parts that had nothing to draw or whose draw failed
    pub skipped: usize,
    /// Indices plus unindexed vertices submitted
    pub elements: u64,
    /// `false` when the backend had no image to render into
    pub presented: bool,
}

/// Render mode the backend can actually rasterize.
pub fn effective_mode<B: GpuBackend + ?Sized>(backend: &B, requested: RenderMode) -> RenderMode {
    if backend.supports_render_mode(requested) {
        requested
    } else {
        RenderMode::Solid
    }
}

/// Draw every visible part once, in ascending id order.
///
/// A part whose draw fails is logged and skipped; only frame-level errors
/// are returned.
pub fn render_frame<B: GpuBackend + ?Sized>(
    backend: &mut B,
    resources: &GpuResources,
    visibility: &VisibilityMap,
    camera: &OrbitCamera,
    aspect: f32,
    mode: RenderMode,
) -> Result<FrameStats, RenderError> {
    let mode = effective_mode(backend, mode);
    let params = FrameParams {
        model_view: camera.model_view(),
        projection: OrbitCamera::projection(aspect),
        clear_color: Color::TRANSPARENT,
        mode,
    };

    let mut stats = FrameStats::default();
    if backend.begin_frame(&params)? == FrameStatus::Skipped {
        debug!("Frame skipped by backend");
        return Ok(stats);
    }
    stats.presented = true;

    for record in resources.parts() {
        if !visibility.is_visible(record.id) {
            stats.hidden += 1;
            continue;
        }
        let Some(call) = resources.draw_call(record.id, mode) else {
            stats.skipped += 1;
            continue;
        };
        match backend.draw(&call) {
            Ok(()) => {
                stats.drawn += 1;
                stats.elements += u64::from(call.element_count);
            }
            Err(e) => {
                warn!("Failed to draw part {} ('{}'): {}", record.id, record.name, e);
                stats.skipped += 1;
            }
        }
    }

    backend.end_frame()?;
    Ok(stats)
}
