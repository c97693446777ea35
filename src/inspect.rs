//! Headless model inspection for `aina --inspect`

use std::fmt::Write as _;

use aina_render::{GpuBackend, HeadlessBackend};
use aina_viewer::{LoadRequest, Viewer};
use anyhow::{Context, Result};

/// Load a model without a window and print its part table.
pub fn run(request: LoadRequest) -> Result<()> {
    let path = request.path.clone();
    let mut viewer = Viewer::new(HeadlessBackend::new());
    viewer
        .load(request)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    print!("{}", part_table(&viewer));
    Ok(())
}

/// One line per part plus the animation list.
pub fn part_table<B: GpuBackend>(viewer: &Viewer<B>) -> String {
    let mut out = String::new();
    let resources = viewer.resources();

    let _ = writeln!(
        out,
        "{:>4}  {:<24} {:>8} {:>8}  {:<7} {:<8} {}",
        "id", "name", "vertices", "faces", "indexed", "textured", "visible"
    );
    for record in resources.parts() {
        let (vertices, faces, indexed) = match &record.buffers {
            Some(buffers) => (
                buffers.vertex_count.to_string(),
                buffers.face_count.to_string(),
                yes_no(buffers.indices.is_some()),
            ),
            None => ("-".to_string(), "-".to_string(), "-"),
        };
        let _ = writeln!(
            out,
            "{:>4}  {:<24} {:>8} {:>8}  {:<7} {:<8} {}",
            record.id,
            record.name,
            vertices,
            faces,
            indexed,
            yes_no(resources.texture_for(record.id).is_some()),
            yes_no(viewer.is_part_visible(record.id)),
        );
    }

    if !viewer.animations().is_empty() {
        let _ = writeln!(out, "animations: {}", viewer.animations().join(", "));
    }
    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
