//! In-memory glTF/GLB builders for tests.
//!
//! Enabled for this crate's own tests and, through the `fixtures` feature,
//! for downstream crates. Helpers panic on I/O failure.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde_json::{json, Value};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;

/// Create a fresh, empty directory under the system temp dir.
pub fn temp_dir(label: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "aina-{}-{}-{}",
        label,
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    if dir.exists() {
        fs::remove_dir_all(&dir).expect("failed to clear fixture directory");
    }
    fs::create_dir_all(&dir).expect("failed to create fixture directory");
    dir
}

/// Vertex streams of one primitive to be written.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveSpec {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub indices: Option<Vec<u32>>,
    pub material: Option<usize>,
    omit_positions: bool,
    declared_count: Option<usize>,
}

impl PrimitiveSpec {
    pub fn from_positions(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            ..Default::default()
        }
    }

    /// Single unindexed triangle in the XY plane.
    pub fn triangle() -> Self {
        Self::from_positions(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
    }

    /// Indexed two-triangle quad spanning -1..1 in X and Y.
    pub fn quad() -> Self {
        Self {
            positions: vec![
                [-1.0, -1.0, 0.0],
                [1.0, -1.0, 0.0],
                [1.0, 1.0, 0.0],
                [-1.0, 1.0, 0.0],
            ],
            indices: Some(vec![0, 1, 2, 0, 2, 3]),
            ..Default::default()
        }
    }

    /// `vertex_count` vertices referenced by `index_count` wrapping indices.
    pub fn indexed_strip(vertex_count: usize, index_count: usize) -> Self {
        let positions = (0..vertex_count)
            .map(|i| [i as f32, (i % 2) as f32, 0.0])
            .collect();
        let indices = (0..index_count).map(|i| (i % vertex_count) as u32).collect();
        Self {
            positions,
            indices: Some(indices),
            ..Default::default()
        }
    }

    /// Texture coordinates spanning the unit square, cycling per vertex.
    pub fn with_uvs(mut self) -> Self {
        const CORNERS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        self.tex_coords = Some(
            (0..self.positions.len())
                .map(|i| CORNERS[i % CORNERS.len()])
                .collect(),
        );
        self
    }

    /// +Z normals for every vertex.
    pub fn with_normals(mut self) -> Self {
        self.normals = Some(vec![[0.0, 0.0, 1.0]; self.positions.len()]);
        self
    }

    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    /// Write the primitive without a POSITION attribute (normals only).
    pub fn without_positions(mut self) -> Self {
        self.omit_positions = true;
        if self.normals.is_none() {
            self = self.with_normals();
        }
        self
    }

    /// Declare a POSITION count larger than the data actually written.
    pub fn with_declared_count(mut self, count: usize) -> Self {
        self.declared_count = Some(count);
        self
    }
}

#[derive(Debug, Clone)]
struct MeshSpec {
    name: Option<String>,
    primitives: Vec<PrimitiveSpec>,
}

/// Assembles a glTF document plus its binary payload.
#[derive(Debug, Clone, Default)]
pub struct FixtureBuilder {
    meshes: Vec<MeshSpec>,
    images: Vec<Vec<u8>>,
    materials: Vec<Option<usize>>,
    animations: Vec<Option<String>>,
}

/// Binary payload under construction.
#[derive(Default)]
struct Payload {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl Payload {
    fn push_view(&mut self, bytes: &[u8]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
        }));
        self.views.len() - 1
    }

    fn push_floats<const N: usize>(&mut self, data: &[[f32; N]], count: Option<usize>) -> usize {
        let bytes: Vec<u8> = data
            .iter()
            .flat_map(|v| v.iter().flat_map(|c| c.to_le_bytes()))
            .collect();
        let view = self.push_view(&bytes);
        let kind = match N {
            2 => "VEC2",
            3 => "VEC3",
            4 => "VEC4",
            _ => "SCALAR",
        };
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": FLOAT,
            "count": count.unwrap_or(data.len()),
            "type": kind,
        }));
        self.accessors.len() - 1
    }

    fn push_positions(&mut self, data: &[[f32; 3]], count: Option<usize>) -> usize {
        let index = self.push_floats(data, count);
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in data {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        if data.is_empty() {
            min = [0.0; 3];
            max = [0.0; 3];
        }
        self.accessors[index]["min"] = json!(min);
        self.accessors[index]["max"] = json!(max);
        index
    }

    fn push_indices(&mut self, indices: &[u32]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.push_view(&bytes);
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": UNSIGNED_INT,
            "count": indices.len(),
            "type": "SCALAR",
        }));
        self.accessors.len() - 1
    }
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a solid-color PNG image and return its image index.
    pub fn add_png_image(&mut self, width: u32, height: u32, rgba: [u8; 4]) -> usize {
        let image = RgbaImage::from_pixel(width, height, Rgba(rgba));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("failed to encode fixture PNG");
        self.images.push(bytes);
        self.images.len() - 1
    }

    /// Add a material, optionally using `image` as its base-color texture.
    pub fn add_material(&mut self, base_color_image: Option<usize>) -> usize {
        self.materials.push(base_color_image);
        self.materials.len() - 1
    }

    pub fn add_mesh(&mut self, name: Option<&str>, primitives: Vec<PrimitiveSpec>) {
        self.meshes.push(MeshSpec {
            name: name.map(str::to_owned),
            primitives,
        });
    }

    /// Add an animation entry with no channels.
    pub fn add_animation_name(&mut self, name: Option<&str>) {
        self.animations.push(name.map(str::to_owned));
    }

    /// Write `<name>.glb` with embedded images.
    pub fn write_glb(&self, dir: &Path, name: &str) -> PathBuf {
        let mut payload = Payload::default();
        let images: Vec<Value> = self
            .images
            .iter()
            .map(|png| {
                let view = payload.push_view(png);
                json!({ "bufferView": view, "mimeType": "image/png" })
            })
            .collect();

        let mut document = self.document(&mut payload, images);
        if !payload.bin.is_empty() {
            document["buffers"] = json!([{ "byteLength": payload.bin.len() }]);
        }

        let path = dir.join(format!("{}.glb", name));
        fs::write(&path, glb_bytes(&document, &payload.bin)).expect("failed to write GLB fixture");
        path
    }

    /// Write `<name>.gltf` plus `<name>.bin` and one PNG file per image.
    pub fn write_gltf(&self, dir: &Path, name: &str) -> PathBuf {
        let mut payload = Payload::default();
        let images: Vec<Value> = self
            .images
            .iter()
            .enumerate()
            .map(|(index, png)| {
                let file_name = format!("{}_image{}.png", name, index);
                fs::write(dir.join(&file_name), png).expect("failed to write fixture image");
                json!({ "uri": encode_uri(&file_name) })
            })
            .collect();

        let mut document = self.document(&mut payload, images);
        if !payload.bin.is_empty() {
            let bin_name = format!("{}.bin", name);
            fs::write(dir.join(&bin_name), &payload.bin).expect("failed to write fixture buffer");
            document["buffers"] = json!([{
                "uri": encode_uri(&bin_name),
                "byteLength": payload.bin.len(),
            }]);
        }

        let path = dir.join(format!("{}.gltf", name));
        let text = serde_json::to_string_pretty(&document).expect("failed to serialize fixture");
        fs::write(&path, text).expect("failed to write glTF fixture");
        path
    }

    fn document(&self, payload: &mut Payload, images: Vec<Value>) -> Value {
        let meshes: Vec<Value> = self
            .meshes
            .iter()
            .map(|mesh| {
                let primitives: Vec<Value> = mesh
                    .primitives
                    .iter()
                    .map(|primitive| primitive_json(payload, primitive))
                    .collect();
                let mut value = json!({ "primitives": primitives });
                if let Some(name) = &mesh.name {
                    value["name"] = json!(name);
                }
                value
            })
            .collect();

        let textures: Vec<Value> = (0..images.len()).map(|i| json!({ "source": i })).collect();
        let materials: Vec<Value> = self
            .materials
            .iter()
            .map(|image| match image {
                Some(image) => json!({
                    "pbrMetallicRoughness": { "baseColorTexture": { "index": image } }
                }),
                None => json!({
                    "pbrMetallicRoughness": { "baseColorFactor": [1.0, 1.0, 1.0, 1.0] }
                }),
            })
            .collect();
        let animations: Vec<Value> = self
            .animations
            .iter()
            .map(|name| {
                let mut value = json!({ "channels": [], "samplers": [] });
                if let Some(name) = name {
                    value["name"] = json!(name);
                }
                value
            })
            .collect();
        let nodes: Vec<Value> = (0..meshes.len()).map(|i| json!({ "mesh": i })).collect();
        let scene_nodes: Vec<usize> = (0..nodes.len()).collect();

        let mut document = json!({
            "asset": { "version": "2.0", "generator": "aina fixtures" },
            "scene": 0,
            "scenes": [{ "nodes": scene_nodes }],
            "nodes": nodes,
            "meshes": meshes,
        });
        let optional = [
            ("images", images),
            ("textures", textures),
            ("materials", materials),
            ("animations", animations),
        ];
        for (key, values) in optional {
            if !values.is_empty() {
                document[key] = Value::Array(values);
            }
        }
        document["bufferViews"] = Value::Array(std::mem::take(&mut payload.views));
        document["accessors"] = Value::Array(std::mem::take(&mut payload.accessors));
        document
    }
}

fn primitive_json(payload: &mut Payload, primitive: &PrimitiveSpec) -> Value {
    let mut attributes = serde_json::Map::new();
    if !primitive.omit_positions {
        let index = payload.push_positions(&primitive.positions, primitive.declared_count);
        attributes.insert("POSITION".into(), json!(index));
    }
    if let Some(normals) = &primitive.normals {
        attributes.insert("NORMAL".into(), json!(payload.push_floats(normals, None)));
    }
    if let Some(uvs) = &primitive.tex_coords {
        attributes.insert("TEXCOORD_0".into(), json!(payload.push_floats(uvs, None)));
    }

    let mut value = json!({ "attributes": attributes, "mode": 4 });
    if let Some(indices) = &primitive.indices {
        value["indices"] = json!(payload.push_indices(indices));
    }
    if let Some(material) = primitive.material {
        value["material"] = json!(material);
    }
    value
}

fn encode_uri(name: &str) -> String {
    name.replace('%', "%25").replace(' ', "%20")
}

fn glb_bytes(document: &Value, bin: &[u8]) -> Vec<u8> {
    let mut json_chunk = serde_json::to_vec(document).expect("failed to serialize fixture");
    while json_chunk.len() % 4 != 0 {
        json_chunk.push(b' ');
    }
    let mut bin_chunk = bin.to_vec();
    while bin_chunk.len() % 4 != 0 {
        bin_chunk.push(0);
    }

    let mut total = 12 + 8 + json_chunk.len();
    if !bin_chunk.is_empty() {
        total += 8 + bin_chunk.len();
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json_chunk);
    if !bin_chunk.is_empty() {
        out.extend_from_slice(&(bin_chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin_chunk);
    }
    out
}

/// Two-part pet: a textured "Body" quad and an unnamed untextured triangle.
pub fn textured_pet(dir: &Path, name: &str) -> PathBuf {
    let mut builder = FixtureBuilder::new();
    let image = builder.add_png_image(4, 4, [220, 180, 140, 255]);
    let material = builder.add_material(Some(image));
    builder.add_mesh(
        Some("Body"),
        vec![PrimitiveSpec::quad()
            .with_normals()
            .with_uvs()
            .with_material(material)],
    );
    builder.add_mesh(None, vec![PrimitiveSpec::triangle()]);
    builder.write_glb(dir, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glb_header_is_consistent() {
        let mut builder = FixtureBuilder::new();
        builder.add_mesh(Some("Body"), vec![PrimitiveSpec::triangle()]);
        let dir = temp_dir("fixture-header");
        let bytes = fs::read(builder.write_glb(&dir, "pet")).unwrap();

        assert_eq!(&bytes[0..4], GLB_MAGIC);
        let total = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        assert_eq!(total, bytes.len());
        assert_eq!(total % 4, 0);
    }

    #[test]
    fn uri_encoding() {
        assert_eq!(encode_uri("pet model.bin"), "pet%20model.bin");
        assert_eq!(encode_uri("100%.png"), "100%25.png");
    }
}
