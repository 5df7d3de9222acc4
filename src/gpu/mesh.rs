/// GLB mesh decoding and scene geometry
///
/// Turns the bytes behind a `world_url` into a flat vertex/index soup the
/// scene pipeline can upload, walking the glTF node tree with transforms
/// applied. Also builds the two fixed pieces of scene furniture: the
/// ground reference plane and the wireframe placeholder cube.
use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3};
use thiserror::Error;

/// Largest bounding-box span a model may keep before being shrunk
pub const MAX_MODEL_SPAN: f32 = 50.0;

/// Ground plane half extent (100x100 overall)
const GROUND_HALF: f32 = 50.0;
/// Ground sits just below the origin so models rest on it
const GROUND_Y: f32 = -0.1;
/// Ground color #2d3748
const GROUND_COLOR: [f32; 4] = [0.176, 0.216, 0.282, 1.0];

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("not a valid glTF/GLB file: {0}")]
    Decode(#[from] gltf::Error),
    #[error("model contains no triangle geometry")]
    Empty,
}

/// Vertex layout shared by the model and the ground plane
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

/// Positions only, for the wireframe placeholder
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
}

/// Axis-aligned bounding box accumulated while decoding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
        }
    }

    pub fn extend(&mut self, point: [f32; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(point[axis]);
            self.max[axis] = self.max[axis].max(point[axis]);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0]
    }

    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    pub fn largest_dimension(&self) -> f32 {
        (self.max[0] - self.min[0])
            .max(self.max[1] - self.min[1])
            .max(self.max[2] - self.min[2])
    }
}

/// Recenter-and-rescale rule for loaded models
///
/// The model is recentered at the origin; it only shrinks (by
/// `MAX_MODEL_SPAN / largest`) when its largest dimension exceeds the
/// span cap, and is never enlarged.
pub fn fit_transform(bounds: &Aabb) -> ([f32; 3], f32) {
    let center = bounds.center();
    let largest = bounds.largest_dimension();

    let scale = if largest > MAX_MODEL_SPAN {
        MAX_MODEL_SPAN / largest
    } else {
        1.0
    };

    (center, scale)
}

/// A decoded world mesh, ready for GPU upload
#[derive(Debug, Clone)]
pub struct WorldMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub bounds: Aabb,
    /// Bounding-box center subtracted by the model matrix
    pub center: [f32; 3],
    /// Uniform shrink factor applied by the model matrix
    pub scale: f32,
}

impl WorldMesh {
    /// Model matrix placing the mesh centered at the origin, capped in span
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let center = Vector3::new(self.center[0], self.center[1], self.center[2]);
        Matrix4::from_scale(self.scale) * Matrix4::from_translation(-center)
    }
}

struct MeshBuilder {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    bounds: Aabb,
}

/// Decode GLB (or JSON glTF) bytes into a single flattened mesh
pub fn decode_glb(bytes: &[u8]) -> Result<WorldMesh, MeshError> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;

    let mut builder = MeshBuilder {
        vertices: Vec::new(),
        indices: Vec::new(),
        bounds: Aabb::empty(),
    };

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(MeshError::Empty)?;

    for node in scene.nodes() {
        walk_node(&node, Matrix4::identity(), &buffers, &mut builder);
    }

    if builder.vertices.is_empty() {
        return Err(MeshError::Empty);
    }

    let (center, scale) = fit_transform(&builder.bounds);

    println!(
        "🧊 Decoded mesh: {} vertices, {} triangles, span {:.1} (scale {:.3})",
        builder.vertices.len(),
        builder.indices.len() / 3,
        builder.bounds.largest_dimension(),
        scale
    );

    Ok(WorldMesh {
        vertices: builder.vertices,
        indices: builder.indices,
        bounds: builder.bounds,
        center,
        scale,
    })
}

fn walk_node(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    builder: &mut MeshBuilder,
) {
    let global = parent * Matrix4::from(node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            push_primitive(&primitive, &global, buffers, builder);
        }
    }

    for child in node.children() {
        walk_node(&child, global, buffers, builder);
    }
}

fn push_primitive(
    primitive: &gltf::Primitive,
    global: &Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    builder: &mut MeshBuilder,
) {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        return;
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<Vector3<f32>> = match reader.read_positions() {
        Some(iter) => iter
            .map(|p| (global * Vector3::from(p).extend(1.0)).truncate())
            .collect(),
        None => return,
    };

    let indices: Vec<u32> = match reader.read_indices() {
        Some(iter) => iter.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let normals: Vec<Vector3<f32>> = match reader.read_normals() {
        Some(iter) => iter
            .map(|n| normalize_or((global * Vector3::from(n).extend(0.0)).truncate()))
            .collect(),
        None => flat_normals(&positions, &indices),
    };

    let colors: Option<Vec<[f32; 4]>> = reader
        .read_colors(0)
        .map(|colors| colors.into_rgba_f32().collect());

    // Flat base color stands in when the mesh carries no vertex colors
    let base_color = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_factor();

    let offset = builder.vertices.len() as u32;

    for (i, position) in positions.iter().enumerate() {
        let point = [position.x, position.y, position.z];
        builder.bounds.extend(point);

        let normal = normals.get(i).copied().unwrap_or(Vector3::unit_y());
        let color = colors
            .as_ref()
            .and_then(|c| c.get(i).copied())
            .unwrap_or(base_color);

        builder.vertices.push(MeshVertex {
            position: point,
            normal: [normal.x, normal.y, normal.z],
            color,
        });
    }

    builder.indices.extend(indices.iter().map(|index| offset + index));
}

/// Per-vertex normals accumulated from face normals
fn flat_normals(positions: &[Vector3<f32>], indices: &[u32]) -> Vec<Vector3<f32>> {
    let mut accumulated = vec![Vector3::new(0.0, 0.0, 0.0); positions.len()];

    for triangle in indices.chunks_exact(3) {
        let a = triangle[0] as usize;
        let b = triangle[1] as usize;
        let c = triangle[2] as usize;

        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }

        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        accumulated[a] += face;
        accumulated[b] += face;
        accumulated[c] += face;
    }

    accumulated.into_iter().map(normalize_or).collect()
}

/// Normalize, falling back to straight up for degenerate vectors
fn normalize_or(v: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() > 1e-12 {
        v.normalize()
    } else {
        Vector3::unit_y()
    }
}

/// The 100x100 ground reference plane under the model
pub fn ground_plane() -> (Vec<MeshVertex>, Vec<u32>) {
    let corners = [
        [-GROUND_HALF, GROUND_Y, -GROUND_HALF],
        [GROUND_HALF, GROUND_Y, -GROUND_HALF],
        [GROUND_HALF, GROUND_Y, GROUND_HALF],
        [-GROUND_HALF, GROUND_Y, GROUND_HALF],
    ];

    let vertices = corners
        .iter()
        .map(|&position| MeshVertex {
            position,
            normal: [0.0, 1.0, 0.0],
            color: GROUND_COLOR,
        })
        .collect();

    (vertices, vec![0, 2, 1, 0, 3, 2])
}

/// Unit wireframe cube shown while a world downloads
pub fn placeholder_cube() -> (Vec<LineVertex>, Vec<u32>) {
    let h = 0.5;
    let corners = [
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
    ];

    let vertices = corners
        .iter()
        .map(|&position| LineVertex { position })
        .collect();

    // 12 edges: bottom square, top square, verticals
    let indices = vec![
        0, 1, 1, 2, 2, 3, 3, 0,
        4, 5, 5, 6, 6, 7, 7, 4,
        0, 4, 1, 5, 2, 6, 3, 7,
    ];

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal GLB holding one triangle with the given extents
    fn tiny_glb(width: f32, height: f32) -> Vec<u8> {
        let positions: [f32; 9] = [0.0, 0.0, 0.0, width, 0.0, 0.0, 0.0, height, 0.0];
        let bin: Vec<u8> = positions.iter().flat_map(|f| f.to_le_bytes()).collect();

        let json = format!(
            concat!(
                r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],"#,
                r#""nodes":[{{"mesh":0}}],"#,
                r#""meshes":[{{"primitives":[{{"attributes":{{"POSITION":0}}}}]}}],"#,
                r#""accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","#,
                r#""min":[0.0,0.0,0.0],"max":[{w},{h},0.0]}}],"#,
                r#""bufferViews":[{{"buffer":0,"byteOffset":0,"byteLength":{len}}}],"#,
                r#""buffers":[{{"byteLength":{len}}}]}}"#
            ),
            w = width,
            h = height,
            len = bin.len(),
        );

        let mut json_bytes = json.into_bytes();
        while json_bytes.len() % 4 != 0 {
            json_bytes.push(b' ');
        }

        let total = 12 + 8 + json_bytes.len() + 8 + bin.len();

        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(&0x46546C67u32.to_le_bytes()); // "glTF"
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());

        glb.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
        glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes()); // "JSON"
        glb.extend_from_slice(&json_bytes);

        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(&0x004E4942u32.to_le_bytes()); // "BIN\0"
        glb.extend_from_slice(&bin);

        glb
    }

    #[test]
    fn test_oversized_model_is_shrunk_to_span_cap() {
        let mesh = decode_glb(&tiny_glb(120.0, 10.0)).unwrap();

        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert!((mesh.scale - 50.0 / 120.0).abs() < 1e-6);
        assert_eq!(mesh.center, [60.0, 5.0, 0.0]);
    }

    #[test]
    fn test_small_model_keeps_its_size() {
        let mesh = decode_glb(&tiny_glb(10.0, 4.0)).unwrap();
        assert_eq!(mesh.scale, 1.0);
    }

    #[test]
    fn test_fit_transform_rule() {
        let mut bounds = Aabb::empty();
        bounds.extend([0.0, 0.0, 0.0]);
        bounds.extend([120.0, 10.0, 10.0]);
        let (_, scale) = fit_transform(&bounds);
        assert!((scale - 50.0 / 120.0).abs() < 1e-6);

        let mut bounds = Aabb::empty();
        bounds.extend([-5.0, -5.0, -5.0]);
        bounds.extend([5.0, 5.0, 5.0]);
        let (center, scale) = fit_transform(&bounds);
        assert_eq!(scale, 1.0);
        assert_eq!(center, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_model_matrix_centers_the_bounds() {
        let mesh = decode_glb(&tiny_glb(120.0, 10.0)).unwrap();
        let matrix = mesh.model_matrix();

        let center = Vector3::new(60.0, 5.0, 0.0);
        let moved = (matrix * center.extend(1.0)).truncate();

        assert!(moved.magnitude() < 1e-4);
    }

    #[test]
    fn test_missing_normals_are_generated() {
        let mesh = decode_glb(&tiny_glb(10.0, 4.0)).unwrap();

        for vertex in &mesh.vertices {
            let n = Vector3::from(vertex.normal);
            assert!((n.magnitude() - 1.0).abs() < 1e-4);
            // The test triangle lies in the XY plane
            assert!(n.z.abs() > 0.99);
        }
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let err = decode_glb(b"not a mesh at all").unwrap_err();
        assert!(matches!(err, MeshError::Decode(_)));
    }

    #[test]
    fn test_aabb_accumulates() {
        let mut bounds = Aabb::empty();
        assert!(bounds.is_empty());

        bounds.extend([1.0, -2.0, 3.0]);
        bounds.extend([-1.0, 4.0, 0.0]);

        assert!(!bounds.is_empty());
        assert_eq!(bounds.min, [-1.0, -2.0, 0.0]);
        assert_eq!(bounds.max, [1.0, 4.0, 3.0]);
        assert_eq!(bounds.largest_dimension(), 6.0);
        assert_eq!(bounds.center(), [0.0, 1.0, 1.5]);
    }

    #[test]
    fn test_ground_plane_shape() {
        let (vertices, indices) = ground_plane();

        assert_eq!(vertices.len(), 4);
        assert_eq!(indices.len(), 6);
        for vertex in &vertices {
            assert_eq!(vertex.position[1], -0.1);
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_placeholder_cube_has_twelve_edges() {
        let (vertices, indices) = placeholder_cube();

        assert_eq!(vertices.len(), 8);
        assert_eq!(indices.len(), 24);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }
}
