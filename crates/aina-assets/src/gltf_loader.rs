use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::accessor::{
    decode_accessor, AccessorError, AccessorLayout, ComponentType, DecodedAccessor, ViewLayout,
};
use crate::error::AssetError;
use crate::mesh::{MaterialInfo, PartData, PartGeometry};
use crate::texture::{self, TextureAsset};
use crate::uri;

/// Everything decoded from one glTF/GLB file.
#[derive(Debug, Clone)]
pub struct SceneAsset {
    pub path: PathBuf,
    /// One entry per mesh primitive, in document order. Ids are dense from 0.
    pub parts: Vec<PartData>,
    pub textures: Vec<TextureAsset>,
    pub materials: Vec<MaterialInfo>,
    /// Animation names. Playback is not supported.
    pub animations: Vec<String>,
}

impl SceneAsset {
    /// Parts that decoded successfully and can be uploaded.
    pub fn drawable_parts(&self) -> impl Iterator<Item = &PartData> {
        self.parts.iter().filter(|part| part.geometry.is_some())
    }

    pub fn texture(&self, image_index: usize) -> Option<&TextureAsset> {
        self.textures
            .iter()
            .find(|texture| texture.image_index == image_index)
    }
}

/// Whether `path` carries a `.gltf` or `.glb` extension (any case).
pub fn is_supported_model(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gltf") || ext.eq_ignore_ascii_case("glb"))
        .unwrap_or(false)
}

/// Load a glTF 2.0 file (.gltf or .glb) and decode every mesh primitive.
///
/// Primitives whose attributes fail to decode are kept as parts without
/// geometry so part ids stay stable; only file-level problems are errors.
pub fn load_scene(path: &Path) -> Result<SceneAsset, AssetError> {
    if !path.exists() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }
    if !is_supported_model(path) {
        return Err(AssetError::UnsupportedFormat(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|e| AssetError::Io(path.to_path_buf(), e))?;
    let gltf = parse_document(path, &bytes)?;

    let asset_dir = uri::asset_directory(path);
    let buffers = resolve_buffers(&gltf.document, gltf.blob.as_deref(), path, &asset_dir)?;
    let materials = collect_materials(&gltf.document);
    let textures = texture::resolve_images(&gltf.document, &buffers, &asset_dir);
    let parts = collect_parts(&gltf.document, &buffers, &materials);
    let animations: Vec<String> = gltf
        .document
        .animations()
        .map(|animation| {
            animation
                .name()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Animation_{}", animation.index()))
        })
        .collect();

    for name in &animations {
        debug!("Found animation '{}'", name);
    }

    info!(
        "Loaded '{}': {} parts ({} drawable), {} textures, {} materials",
        path.display(),
        parts.len(),
        parts.iter().filter(|p| p.geometry.is_some()).count(),
        textures.len(),
        materials.len()
    );

    Ok(SceneAsset {
        path: path.to_path_buf(),
        parts,
        textures,
        materials,
        animations,
    })
}

/// Parse and validate the document.
///
/// A primitive without POSITION fails validation, but it is only a per-part
/// problem: when those are the sole findings the document is accepted and
/// the affected primitives are skipped later.
fn parse_document(path: &Path, bytes: &[u8]) -> Result<gltf::Gltf, AssetError> {
    match gltf::Gltf::from_slice(bytes) {
        Ok(gltf) => Ok(gltf),
        Err(gltf::Error::Validation(errors))
            if !errors.is_empty() && errors.iter().all(|(at, _)| is_missing_position(at.as_str())) =>
        {
            for (at, err) in &errors {
                debug!("Tolerating validation finding at {}: {}", at, err);
            }
            gltf::Gltf::from_slice_without_validation(bytes)
                .map_err(|e| AssetError::GltfLoadFailed(path.to_path_buf(), e.to_string()))
        }
        Err(e) => Err(AssetError::GltfLoadFailed(path.to_path_buf(), e.to_string())),
    }
}

fn is_missing_position(at: &str) -> bool {
    at.starts_with("meshes[") && at.ends_with("attributes[\"POSITION\"]")
}

/// Resolve the bytes of every buffer in document order.
fn resolve_buffers(
    document: &gltf::Document,
    blob: Option<&[u8]>,
    path: &Path,
    asset_dir: &Path,
) -> Result<Vec<Vec<u8>>, AssetError> {
    let mut buffers = Vec::with_capacity(document.buffers().len());

    for buffer in document.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => blob
                .map(<[u8]>::to_vec)
                .ok_or_else(|| AssetError::MissingBinaryChunk(path.to_path_buf()))?,
            gltf::buffer::Source::Uri(location) if uri::is_data_uri(location) => {
                return Err(AssetError::GltfLoadFailed(
                    path.to_path_buf(),
                    format!("buffer {} uses an embedded data URI", buffer.index()),
                ));
            }
            gltf::buffer::Source::Uri(location) => {
                let buffer_path = uri::resolve_relative(asset_dir, location);
                if !buffer_path.exists() {
                    return Err(AssetError::MissingExternalBuffer(buffer_path));
                }
                fs::read(&buffer_path).map_err(|e| AssetError::Io(buffer_path.clone(), e))?
            }
        };

        if data.len() < buffer.length() {
            warn!(
                "Buffer {} declares {} bytes but only {} are available",
                buffer.index(),
                buffer.length(),
                data.len()
            );
        }
        debug!("Resolved buffer {} ({} bytes)", buffer.index(), data.len());
        buffers.push(data);
    }

    Ok(buffers)
}

fn collect_materials(document: &gltf::Document) -> Vec<MaterialInfo> {
    document
        .materials()
        .enumerate()
        .map(|(index, material)| {
            let pbr = material.pbr_metallic_roughness();
            let info = MaterialInfo {
                index,
                name: material.name().map(str::to_owned),
                base_color_image: pbr
                    .base_color_texture()
                    .map(|t| t.texture().source().index()),
                metallic_roughness_image: pbr
                    .metallic_roughness_texture()
                    .map(|t| t.texture().source().index()),
                normal_image: material
                    .normal_texture()
                    .map(|t| t.texture().source().index()),
                occlusion_image: material
                    .occlusion_texture()
                    .map(|t| t.texture().source().index()),
                emissive_image: material
                    .emissive_texture()
                    .map(|t| t.texture().source().index()),
            };
            debug!(
                "Material {} ({}): base color {:?}, metallic/roughness {:?}, normal {:?}, occlusion {:?}, emissive {:?}",
                index,
                info.name.as_deref().unwrap_or("unnamed"),
                info.base_color_image,
                info.metallic_roughness_image,
                info.normal_image,
                info.occlusion_image,
                info.emissive_image
            );
            info
        })
        .collect()
}

fn collect_parts(
    document: &gltf::Document,
    buffers: &[Vec<u8>],
    materials: &[MaterialInfo],
) -> Vec<PartData> {
    let mut parts = Vec::new();

    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            let id = parts.len();
            let name = mesh
                .name()
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Mesh_{}_Prim_{}", mesh.index(), primitive.index()));

            if primitive.mode() != gltf::mesh::Mode::Triangles {
                debug!(
                    "Part {} ('{}') uses {:?}; drawing it as a triangle list",
                    id,
                    name,
                    primitive.mode()
                );
            }

            let material = primitive.material().index();
            let base_color_image = material
                .and_then(|index| materials.get(index))
                .and_then(|info| info.base_color_image);

            let geometry = match decode_primitive(&primitive, buffers) {
                Ok(geometry) => {
                    debug!(
                        "Part {} ('{}'): {} vertices, {} faces, normals: {}, uvs: {}",
                        id,
                        name,
                        geometry.vertex_count(),
                        geometry.face_count(),
                        geometry.normals.is_some(),
                        geometry.tex_coords.is_some()
                    );
                    Some(geometry)
                }
                Err(e) => {
                    warn!("Skipping part {} ('{}'): {}", id, name, e);
                    None
                }
            };

            parts.push(PartData {
                id,
                name,
                mesh_index: mesh.index(),
                primitive_index: primitive.index(),
                material,
                base_color_image,
                geometry,
            });
        }
    }

    parts
}

fn decode_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[Vec<u8>],
) -> Result<PartGeometry, AssetError> {
    let position = primitive
        .get(&gltf::Semantic::Positions)
        .ok_or(AssetError::MissingAttribute("POSITION"))?;
    let positions = as_tuples::<3>(&position, read_accessor(&position, buffers, 3)?)?;

    let normals = primitive
        .get(&gltf::Semantic::Normals)
        .map(|accessor| as_tuples::<3>(&accessor, read_accessor(&accessor, buffers, 3)?))
        .transpose()?;

    let tex_coords = primitive
        .get(&gltf::Semantic::TexCoords(0))
        .map(|accessor| as_tuples::<2>(&accessor, read_accessor(&accessor, buffers, 2)?))
        .transpose()?
        .map(|uvs| uvs.into_iter().map(|[u, v]| [u, 1.0 - v]).collect());

    let indices = primitive
        .indices()
        .map(|accessor| {
            read_accessor(&accessor, buffers, 1)?
                .to_u32()
                .map_err(|source| AssetError::Accessor {
                    index: accessor.index(),
                    source,
                })
        })
        .transpose()?;

    Ok(PartGeometry {
        positions,
        normals,
        tex_coords,
        indices,
    })
}

fn as_tuples<const N: usize>(
    accessor: &gltf::Accessor<'_>,
    decoded: DecodedAccessor,
) -> Result<Vec<[f32; N]>, AssetError> {
    decoded
        .to_f32_tuples::<N>()
        .map_err(|source| AssetError::Accessor {
            index: accessor.index(),
            source,
        })
}

/// Translate a glTF accessor into plain layouts and decode it.
fn read_accessor(
    accessor: &gltf::Accessor<'_>,
    buffers: &[Vec<u8>],
    expected_components: usize,
) -> Result<DecodedAccessor, AssetError> {
    let index = accessor.index();
    let fail = |source: AccessorError| AssetError::Accessor { index, source };

    let view = accessor.view().ok_or_else(|| {
        fail(AccessorError::Malformed(
            "accessor has no buffer view".to_string(),
        ))
    })?;

    let components = accessor.dimensions().multiplicity();
    if components != expected_components {
        return Err(fail(AccessorError::Malformed(format!(
            "expected {} components per element, found {}",
            expected_components, components
        ))));
    }

    let component_type = ComponentType::from_gl(accessor.data_type().as_gl_enum()).map_err(fail)?;

    let buffer = buffers.get(view.buffer().index()).ok_or_else(|| {
        fail(AccessorError::Malformed(format!(
            "buffer {} was not loaded",
            view.buffer().index()
        )))
    })?;

    let view_layout = ViewLayout {
        byte_offset: view.offset(),
        byte_length: view.length(),
        byte_stride: view.stride(),
    };
    let layout = AccessorLayout {
        component_type,
        components,
        count: accessor.count(),
        byte_offset: accessor.offset(),
        normalized: accessor.normalized(),
    };

    decode_accessor(buffer, &view_layout, &layout).map_err(fail)
}
