/// UI widgets and view components
///
/// Architecture:
/// - `panorama.rs` - 2D canvas rendering the wrapped 360° panorama strip
/// - `world.rs` - shader widget hosting the wgpu 3D world scene
/// - `controls.rs` - scenario picker and generation triggers
/// - `gallery.rs` - sidebar lists of panoramas and worlds
///
/// Every component here is a pure view over orchestrator state: widgets
/// emit `Message`s and the orchestrator in `main.rs` does the rest.

pub mod controls;
pub mod gallery;
pub mod panorama;
pub mod world;
