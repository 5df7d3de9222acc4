/// GPU-accelerated 3D world rendering module
///
/// This module renders generated GLB worlds using wgpu and custom
/// WGSL shaders, embedded in the UI through iced's shader widget.
///
/// Architecture:
/// - `camera.rs` - orbit camera math (yaw/pitch/distance around a target)
/// - `mesh.rs` - GLB decoding into flat vertex/index buffers
/// - `shaders.rs` - WGSL shader source code
/// - `scene.rs` - wgpu pipelines, buffers, and the render pass

pub mod camera;
pub mod mesh;
pub mod scene;
pub mod shaders;

pub use camera::OrbitCamera;
pub use mesh::WorldMesh;
pub use scene::{SceneContent, SceneFrame, SceneRenderer};
