//! Vertex input layout
//!
//! Each stream lives in its own buffer, bound to its own binding slot.

use std::collections::HashMap;

use vulkano::format::Format;
use vulkano::pipeline::graphics::vertex_input::{
    VertexBufferDescription, VertexInputRate, VertexMemberInfo,
};

use crate::backend::BufferKind;

/// Binding slot of a stream
pub fn binding(kind: BufferKind) -> u32 {
    match kind {
        BufferKind::Positions => 0,
        BufferKind::Normals => 1,
        BufferKind::TexCoords => 2,
    }
}

/// Shader input name of a stream
pub fn attribute_name(kind: BufferKind) -> &'static str {
    match kind {
        BufferKind::Positions => "position",
        BufferKind::Normals => "normal",
        BufferKind::TexCoords => "uv",
    }
}

fn format(kind: BufferKind) -> Format {
    match kind {
        BufferKind::Positions | BufferKind::Normals => Format::R32G32B32_SFLOAT,
        BufferKind::TexCoords => Format::R32G32_SFLOAT,
    }
}

/// Vulkano vertex buffer description for one tightly packed stream
pub fn per_vertex(kind: BufferKind) -> VertexBufferDescription {
    let stride = (kind.components() * std::mem::size_of::<f32>()) as u32;
    VertexBufferDescription {
        stride,
        input_rate: VertexInputRate::Vertex,
        members: HashMap::from([(
            attribute_name(kind).to_string(),
            VertexMemberInfo {
                offset: 0,
                format: format(kind),
                num_elements: 1,
                stride,
            },
        )]),
    }
}

/// Descriptions for all streams, in binding order
pub fn all_streams() -> [VertexBufferDescription; 3] {
    [
        per_vertex(BufferKind::Positions),
        per_vertex(BufferKind::Normals),
        per_vertex(BufferKind::TexCoords),
    ]
}
