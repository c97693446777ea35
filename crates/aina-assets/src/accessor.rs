//! Typed, strided accessor decoding.
//!
//! Works on plain layout descriptors instead of `gltf` types so it can be fed
//! anything that describes a byte range: the loader converts glTF accessors
//! and buffer views into [`AccessorLayout`] / [`ViewLayout`] first.

use tracing::warn;

/// Errors raised while decoding a single accessor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessorError {
    #[error("unsupported component type {0}")]
    UnsupportedComponentType(u32),

    #[error("malformed accessor: {0}")]
    Malformed(String),

    #[error("accessor data truncated: needed {needed} bytes, buffer holds {available}")]
    Truncated { needed: usize, available: usize },
}

/// Storage type of one accessor component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// Map a GL enum code (as stored in glTF `componentType`) to a component type.
    pub fn from_gl(code: u32) -> Result<Self, AccessorError> {
        match code {
            5120 => Ok(ComponentType::I8),
            5121 => Ok(ComponentType::U8),
            5122 => Ok(ComponentType::I16),
            5123 => Ok(ComponentType::U16),
            5125 => Ok(ComponentType::U32),
            5126 => Ok(ComponentType::F32),
            other => Err(AccessorError::UnsupportedComponentType(other)),
        }
    }

    /// Width of one component in bytes
    pub fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }

    /// Divisor used to map a normalized integer onto `[0, 1]` or `[-1, 1]`.
    fn normalization_divisor(self) -> Option<f32> {
        match self {
            ComponentType::I8 => Some(127.0),
            ComponentType::U8 => Some(255.0),
            ComponentType::I16 => Some(32767.0),
            ComponentType::U16 => Some(65535.0),
            ComponentType::U32 | ComponentType::F32 => None,
        }
    }
}

/// Byte window of a buffer view inside its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewLayout {
    pub byte_offset: usize,
    pub byte_length: usize,
    /// Declared stride; `None` or `Some(0)` means tightly packed.
    pub byte_stride: Option<usize>,
}

/// Typed array description relative to a buffer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorLayout {
    pub component_type: ComponentType,
    /// Components per element (1 for scalars, 2 for UVs, 3 for positions).
    pub components: usize,
    /// Number of elements.
    pub count: usize,
    /// Offset of the first element relative to the view.
    pub byte_offset: usize,
    pub normalized: bool,
}

impl AccessorLayout {
    /// Size of one tightly packed element in bytes
    pub fn element_size(&self) -> usize {
        self.components * self.component_type.size()
    }
}

/// Dense decoded values, one variant per storage type.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessorValues {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl AccessorValues {
    /// Number of scalar values
    pub fn len(&self) -> usize {
        match self {
            AccessorValues::I8(v) => v.len(),
            AccessorValues::U8(v) => v.len(),
            AccessorValues::I16(v) => v.len(),
            AccessorValues::U16(v) => v.len(),
            AccessorValues::U32(v) => v.len(),
            AccessorValues::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of decoding one accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAccessor {
    pub components: usize,
    pub values: AccessorValues,
}

impl DecodedAccessor {
    /// Number of elements (tuples of `components` values)
    pub fn element_count(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.values.len() / self.components
        }
    }

    /// All values widened to `f32`.
    pub fn to_f32(&self) -> Vec<f32> {
        match &self.values {
            AccessorValues::I8(v) => v.iter().map(|&x| x as f32).collect(),
            AccessorValues::U8(v) => v.iter().map(|&x| x as f32).collect(),
            AccessorValues::I16(v) => v.iter().map(|&x| x as f32).collect(),
            AccessorValues::U16(v) => v.iter().map(|&x| x as f32).collect(),
            AccessorValues::U32(v) => v.iter().map(|&x| x as f32).collect(),
            AccessorValues::F32(v) => v.clone(),
        }
    }

    /// Values widened to `u32`; only unsigned integer storage qualifies.
    pub fn to_u32(&self) -> Result<Vec<u32>, AccessorError> {
        match &self.values {
            AccessorValues::U8(v) => Ok(v.iter().map(|&x| u32::from(x)).collect()),
            AccessorValues::U16(v) => Ok(v.iter().map(|&x| u32::from(x)).collect()),
            AccessorValues::U32(v) => Ok(v.clone()),
            _ => Err(AccessorError::Malformed(
                "index data must use an unsigned integer component type".into(),
            )),
        }
    }

    /// Values grouped into fixed-size `f32` tuples.
    pub fn to_f32_tuples<const N: usize>(&self) -> Result<Vec<[f32; N]>, AccessorError> {
        if self.components != N {
            return Err(AccessorError::Malformed(format!(
                "expected {} components per element, accessor has {}",
                N, self.components
            )));
        }
        Ok(self
            .to_f32()
            .chunks_exact(N)
            .map(|chunk| {
                let mut out = [0.0; N];
                out.copy_from_slice(chunk);
                out
            })
            .collect())
    }
}

/// Decode `accessor` out of `buffer` through `view`.
///
/// Fails without panicking when the described range does not fit in `buffer`.
pub fn decode_accessor(
    buffer: &[u8],
    view: &ViewLayout,
    accessor: &AccessorLayout,
) -> Result<DecodedAccessor, AccessorError> {
    if accessor.components == 0 {
        return Err(AccessorError::Malformed("accessor has zero components".into()));
    }

    let view_end = view
        .byte_offset
        .checked_add(view.byte_length)
        .ok_or_else(|| AccessorError::Malformed("buffer view range overflows".into()))?;
    if view_end > buffer.len() {
        warn!(
            "Buffer view [{}..{}) exceeds buffer length {}",
            view.byte_offset,
            view_end,
            buffer.len()
        );
        return Err(AccessorError::Truncated {
            needed: view_end,
            available: buffer.len(),
        });
    }

    let element_size = accessor.element_size();
    let stride = match view.byte_stride {
        Some(stride) if stride != 0 => stride,
        _ => element_size,
    };
    if stride < element_size {
        return Err(AccessorError::Malformed(format!(
            "stride {} is smaller than element size {}",
            stride, element_size
        )));
    }

    let base = view
        .byte_offset
        .checked_add(accessor.byte_offset)
        .ok_or_else(|| AccessorError::Malformed("accessor offset overflows".into()))?;

    let needed = if accessor.count == 0 {
        base
    } else {
        (accessor.count - 1)
            .checked_mul(stride)
            .and_then(|span| span.checked_add(base))
            .and_then(|start| start.checked_add(element_size))
            .ok_or_else(|| AccessorError::Malformed("accessor range overflows".into()))?
    };
    if needed > buffer.len() {
        warn!(
            "Accessor of {} elements needs {} bytes but buffer holds {}",
            accessor.count,
            needed,
            buffer.len()
        );
        return Err(AccessorError::Truncated {
            needed,
            available: buffer.len(),
        });
    }

    if needed > view_end {
        warn!(
            "Accessor of {} elements ends at byte {} past its buffer view end {}",
            accessor.count, needed, view_end
        );
        return Err(AccessorError::Malformed(format!(
            "accessor ends at byte {} but its buffer view ends at {}",
            needed, view_end
        )));
    }

    // Gather the element bytes into one dense run. Packed data is a single
    // slice; interleaved data is copied element by element.
    let dense: std::borrow::Cow<'_, [u8]> = if stride == element_size {
        std::borrow::Cow::Borrowed(&buffer[base..base + accessor.count * element_size])
    } else {
        let mut packed = Vec::with_capacity(accessor.count * element_size);
        for i in 0..accessor.count {
            let start = base + i * stride;
            packed.extend_from_slice(&buffer[start..start + element_size]);
        }
        std::borrow::Cow::Owned(packed)
    };

    let values = decode_components(&dense, accessor.component_type);
    let values = if accessor.normalized {
        normalize(values, accessor.component_type)
    } else {
        values
    };

    Ok(DecodedAccessor {
        components: accessor.components,
        values,
    })
}

fn decode_components(bytes: &[u8], component_type: ComponentType) -> AccessorValues {
    match component_type {
        ComponentType::I8 => AccessorValues::I8(bytes.iter().map(|&b| b as i8).collect()),
        ComponentType::U8 => AccessorValues::U8(bytes.to_vec()),
        ComponentType::I16 => AccessorValues::I16(
            bytes
                .chunks_exact(2)
                .map(|c| i16::from_le_bytes([c[0], c[1]]))
                .collect(),
        ),
        ComponentType::U16 => AccessorValues::U16(
            bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect(),
        ),
        ComponentType::U32 => AccessorValues::U32(
            bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        ComponentType::F32 => AccessorValues::F32(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
    }
}

fn normalize(values: AccessorValues, component_type: ComponentType) -> AccessorValues {
    let Some(divisor) = component_type.normalization_divisor() else {
        return values;
    };
    let floats: Vec<f32> = match values {
        AccessorValues::I8(v) => v.iter().map(|&x| (x as f32 / divisor).max(-1.0)).collect(),
        AccessorValues::U8(v) => v.iter().map(|&x| x as f32 / divisor).collect(),
        AccessorValues::I16(v) => v.iter().map(|&x| (x as f32 / divisor).max(-1.0)).collect(),
        AccessorValues::U16(v) => v.iter().map(|&x| x as f32 / divisor).collect(),
        other => return other,
    };
    AccessorValues::F32(floats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats_le(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn packed_view(buffer: &[u8]) -> ViewLayout {
        ViewLayout {
            byte_offset: 0,
            byte_length: buffer.len(),
            byte_stride: None,
        }
    }

    #[test]
    fn test_component_codes() {
        assert_eq!(ComponentType::from_gl(5126), Ok(ComponentType::F32));
        assert_eq!(ComponentType::from_gl(5123), Ok(ComponentType::U16));
        assert_eq!(
            ComponentType::from_gl(5124),
            Err(AccessorError::UnsupportedComponentType(5124))
        );
        assert_eq!(ComponentType::I16.size(), 2);
    }

    #[test]
    fn test_packed_floats() {
        let buffer = floats_le(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let accessor = AccessorLayout {
            component_type: ComponentType::F32,
            components: 3,
            count: 2,
            byte_offset: 0,
            normalized: false,
        };
        let decoded = decode_accessor(&buffer, &packed_view(&buffer), &accessor).unwrap();
        assert_eq!(decoded.element_count(), 2);
        assert_eq!(
            decoded.to_f32_tuples::<3>().unwrap(),
            vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]
        );
    }

    #[test]
    fn test_interleaved_matches_packed() {
        // position (3 floats) + uv (2 floats) interleaved, stride 20
        let interleaved = floats_le(&[
            0.0, 1.0, 2.0, 9.0, 9.0, //
            3.0, 4.0, 5.0, 9.0, 9.0, //
            6.0, 7.0, 8.0, 9.0, 9.0,
        ]);
        let packed = floats_le(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let accessor = AccessorLayout {
            component_type: ComponentType::F32,
            components: 3,
            count: 3,
            byte_offset: 0,
            normalized: false,
        };
        let strided_view = ViewLayout {
            byte_offset: 0,
            byte_length: interleaved.len(),
            byte_stride: Some(20),
        };
        let zero_stride_view = ViewLayout {
            byte_stride: Some(0),
            ..packed_view(&packed)
        };

        let slow = decode_accessor(&interleaved, &strided_view, &accessor).unwrap();
        let fast = decode_accessor(&packed, &zero_stride_view, &accessor).unwrap();
        assert_eq!(slow, fast);
    }

    #[test]
    fn test_offsets_are_applied() {
        let mut buffer = vec![0xAA; 6];
        buffer.extend_from_slice(&7u16.to_le_bytes());
        buffer.extend_from_slice(&9u16.to_le_bytes());
        let view = ViewLayout {
            byte_offset: 4,
            byte_length: 6,
            byte_stride: None,
        };
        let accessor = AccessorLayout {
            component_type: ComponentType::U16,
            components: 1,
            count: 2,
            byte_offset: 2,
            normalized: false,
        };
        let decoded = decode_accessor(&buffer, &view, &accessor).unwrap();
        assert_eq!(decoded.values, AccessorValues::U16(vec![7, 9]));
        assert_eq!(decoded.to_u32().unwrap(), vec![7, 9]);
    }

    #[test]
    fn test_normalized_unsigned_in_unit_range() {
        let buffer = vec![0u8, 128, 255, 64];
        let accessor = AccessorLayout {
            component_type: ComponentType::U8,
            components: 2,
            count: 2,
            byte_offset: 0,
            normalized: true,
        };
        let decoded = decode_accessor(&buffer, &packed_view(&buffer), &accessor).unwrap();
        let AccessorValues::F32(values) = &decoded.values else {
            panic!("normalized data should decode to floats");
        };
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(values[0], 0.0);
        assert_eq!(values[2], 1.0);
    }

    #[test]
    fn test_normalized_signed_in_symmetric_range() {
        let buffer: Vec<u8> = [i16::MIN, -32767, 0, i16::MAX]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let accessor = AccessorLayout {
            component_type: ComponentType::I16,
            components: 1,
            count: 4,
            byte_offset: 0,
            normalized: true,
        };
        let decoded = decode_accessor(&buffer, &packed_view(&buffer), &accessor).unwrap();
        assert_eq!(decoded.to_f32(), vec![-1.0, -1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_normalized_flag_ignored_for_floats() {
        let buffer = floats_le(&[2.5]);
        let accessor = AccessorLayout {
            component_type: ComponentType::F32,
            components: 1,
            count: 1,
            byte_offset: 0,
            normalized: true,
        };
        let decoded = decode_accessor(&buffer, &packed_view(&buffer), &accessor).unwrap();
        assert_eq!(decoded.values, AccessorValues::F32(vec![2.5]));
    }

    #[test]
    fn test_truncated_packed_buffer() {
        let buffer = floats_le(&[1.0, 2.0, 3.0, 4.0]);
        let accessor = AccessorLayout {
            component_type: ComponentType::F32,
            components: 3,
            count: 2,
            byte_offset: 0,
            normalized: false,
        };
        let err = decode_accessor(&buffer, &packed_view(&buffer), &accessor).unwrap_err();
        assert_eq!(
            err,
            AccessorError::Truncated {
                needed: 24,
                available: 16
            }
        );
    }

    #[test]
    fn test_truncated_strided_buffer() {
        let buffer = floats_le(&[0.0; 9]);
        let view = ViewLayout {
            byte_offset: 0,
            byte_length: buffer.len(),
            byte_stride: Some(16),
        };
        let accessor = AccessorLayout {
            component_type: ComponentType::F32,
            components: 3,
            count: 3,
            byte_offset: 0,
            normalized: false,
        };
        assert!(matches!(
            decode_accessor(&buffer, &view, &accessor),
            Err(AccessorError::Truncated { .. })
        ));
    }

    #[test]
    fn test_view_outside_buffer() {
        let buffer = vec![0u8; 8];
        let view = ViewLayout {
            byte_offset: 4,
            byte_length: 8,
            byte_stride: None,
        };
        let accessor = AccessorLayout {
            component_type: ComponentType::U8,
            components: 1,
            count: 1,
            byte_offset: 0,
            normalized: false,
        };
        assert!(matches!(
            decode_accessor(&buffer, &view, &accessor),
            Err(AccessorError::Truncated { .. })
        ));
    }

    #[test]
    fn test_accessor_past_view_end() {
        // Two views share the buffer; the accessor on the first one claims
        // three floats but its view only holds two.
        let buffer = floats_le(&[1.0, 2.0, 3.0, 4.0]);
        let view = ViewLayout {
            byte_offset: 0,
            byte_length: 8,
            byte_stride: None,
        };
        let accessor = AccessorLayout {
            component_type: ComponentType::F32,
            components: 1,
            count: 3,
            byte_offset: 0,
            normalized: false,
        };
        assert!(matches!(
            decode_accessor(&buffer, &view, &accessor),
            Err(AccessorError::Malformed(_))
        ));

        let fits = AccessorLayout { count: 2, ..accessor };
        let decoded = decode_accessor(&buffer, &view, &fits).unwrap();
        assert_eq!(decoded.to_f32(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_stride_smaller_than_element() {
        let buffer = vec![0u8; 64];
        let view = ViewLayout {
            byte_offset: 0,
            byte_length: 64,
            byte_stride: Some(4),
        };
        let accessor = AccessorLayout {
            component_type: ComponentType::F32,
            components: 3,
            count: 2,
            byte_offset: 0,
            normalized: false,
        };
        assert!(matches!(
            decode_accessor(&buffer, &view, &accessor),
            Err(AccessorError::Malformed(_))
        ));
    }

    #[test]
    fn test_signed_indices_rejected() {
        let decoded = DecodedAccessor {
            components: 1,
            values: AccessorValues::I16(vec![1, 2, 3]),
        };
        assert!(decoded.to_u32().is_err());
    }

    #[test]
    fn test_empty_accessor() {
        let buffer = Vec::new();
        let accessor = AccessorLayout {
            component_type: ComponentType::F32,
            components: 3,
            count: 0,
            byte_offset: 0,
            normalized: false,
        };
        let decoded = decode_accessor(&buffer, &packed_view(&buffer), &accessor).unwrap();
        assert_eq!(decoded.element_count(), 0);
    }
}
