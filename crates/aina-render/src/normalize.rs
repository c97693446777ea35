//! Scene normalization
//!
//! Rescales and recenters every part so the whole model fits a fixed extent
//! around the origin, whatever units the asset was authored in.

use glam::Vec3;
use tracing::{debug, info};

use crate::backend::GpuBackend;
use crate::error::RenderError;
use crate::resources::GpuResources;

/// Edge length of the largest bounding-box side after normalization.
pub const TARGET_EXTENT: f32 = 4.0;

/// Uniform scale and centroid applied as `v * scale - centroid * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub scale: f32,
    pub centroid: Vec3,
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
}

impl Normalization {
    pub fn apply(&self, position: [f32; 3]) -> [f32; 3] {
        let v = Vec3::from_array(position);
        (v * self.scale - self.centroid * self.scale).to_array()
    }
}

/// Compute the transform for a set of position streams.
///
/// Non-finite positions are ignored. Returns `None` when there are no finite
/// vertices or the bounds are degenerate (zero or non-finite extent); the
/// scene is then left untouched.
pub fn compute_normalization<'a>(
    streams: impl IntoIterator<Item = &'a [[f32; 3]]>,
) -> Option<Normalization> {
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    let mut sum = glam::DVec3::ZERO;
    let mut count = 0usize;

    for stream in streams {
        for position in stream {
            let v = Vec3::from_array(*position);
            if !v.is_finite() {
                continue;
            }
            min = min.min(v);
            max = max.max(v);
            sum += v.as_dvec3();
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }

    let extent = (max - min).max_element();
    if !extent.is_finite() || extent <= 0.0 {
        debug!("Degenerate bounds {:?}..{:?}, skipping normalization", min, max);
        return None;
    }

    Some(Normalization {
        scale: TARGET_EXTENT / extent,
        centroid: (sum / count as f64).as_vec3(),
        bounds_min: min,
        bounds_max: max,
    })
}

/// Normalize every uploaded part in place and re-upload its positions.
pub fn normalize_scene<B: GpuBackend + ?Sized>(
    backend: &mut B,
    resources: &mut GpuResources,
) -> Result<Option<Normalization>, RenderError> {
    let Some(normalization) = compute_normalization(resources.position_streams()) else {
        return Ok(None);
    };

    resources.transform_positions(backend, |p| normalization.apply(p))?;
    info!(
        "Normalized scene: bounds {:?}..{:?}, scale {:.4}, centroid {:?}",
        normalization.bounds_min, normalization.bounds_max, normalization.scale, normalization.centroid
    );
    Ok(Some(normalization))
}
