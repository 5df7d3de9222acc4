use iced::advanced::Shell;
use iced::event;
use iced::mouse::{self, Cursor};
use iced::touch;
use iced::widget::shader::{self, Event, Viewport};
use iced::{Point, Rectangle};

use iced_wgpu::wgpu;

use crate::gpu::{OrbitCamera, SceneContent, SceneFrame, SceneRenderer};
use crate::Message;

/// A camera gesture reported by the 3D viewport
///
/// Deltas are in surface pixels; the orchestrator feeds them to the
/// orbit camera it owns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraMotion {
    Orbit { dx: f32, dy: f32 },
    Pan { dx: f32, dy: f32 },
    Zoom(f32),
}

/// Shader widget program for the 3D world scene
///
/// Rebuilt each view pass from orchestrator state; the heavy GPU
/// resources live in the widget's storage, keyed by mesh revision.
#[derive(Debug)]
pub struct WorldViewport {
    pub camera: OrbitCamera,
    pub content: SceneContent,
}

/// State for orbit/pan drag interactions
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraDrag {
    pub orbiting: bool,
    pub panning: bool,
    pub last: Option<Point>,
    pub finger: Option<touch::Finger>,
}

impl shader::Program<Message> for WorldViewport {
    type State = CameraDrag;
    type Primitive = WorldPrimitive;

    fn draw(&self, _state: &Self::State, _cursor: Cursor, bounds: Rectangle) -> Self::Primitive {
        let aspect = bounds.width / bounds.height.max(1.0);
        let eye = self.camera.eye();

        WorldPrimitive {
            frame: SceneFrame {
                view_proj: self.camera.view_proj(aspect).into(),
                camera_pos: [eye.x, eye.y, eye.z],
                content: self.content.clone(),
            },
        }
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: Event,
        bounds: Rectangle,
        cursor: Cursor,
        _shell: &mut Shell<'_, Message>,
    ) -> (event::Status, Option<Message>) {
        match event {
            // Left drag orbits, right drag pans
            Event::Mouse(mouse::Event::ButtonPressed(button)) => {
                if let Some(pos) = cursor.position_over(bounds) {
                    match button {
                        mouse::Button::Left => state.orbiting = true,
                        mouse::Button::Right => state.panning = true,
                        _ => return (event::Status::Ignored, None),
                    }
                    state.last = Some(pos);
                    return (event::Status::Captured, None);
                }
            }

            Event::Mouse(mouse::Event::ButtonReleased(button)) => {
                let released = match button {
                    mouse::Button::Left if state.orbiting => {
                        state.orbiting = false;
                        true
                    }
                    mouse::Button::Right if state.panning => {
                        state.panning = false;
                        true
                    }
                    _ => false,
                };
                if released {
                    if !state.orbiting && !state.panning {
                        state.last = None;
                    }
                    return (event::Status::Captured, None);
                }
            }

            Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if state.orbiting || state.panning {
                    if let (Some(pos), Some(last)) = (cursor.position(), state.last) {
                        let dx = pos.x - last.x;
                        let dy = pos.y - last.y;
                        state.last = Some(pos);

                        let motion = if state.orbiting {
                            CameraMotion::Orbit { dx, dy }
                        } else {
                            CameraMotion::Pan { dx, dy }
                        };
                        return (
                            event::Status::Captured,
                            Some(Message::WorldCamera(motion)),
                        );
                    }
                }
            }

            Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.is_over(bounds) {
                    let lines = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y,
                        mouse::ScrollDelta::Pixels { y, .. } => y * 0.1,
                    };
                    return (
                        event::Status::Captured,
                        Some(Message::WorldCamera(CameraMotion::Zoom(lines))),
                    );
                }
            }

            // Single-finger touch orbits
            Event::Touch(touch::Event::FingerPressed { id, position }) => {
                if state.finger.is_none() && bounds.contains(position) {
                    state.finger = Some(id);
                    state.orbiting = true;
                    state.last = Some(position);
                    return (event::Status::Captured, None);
                }
            }

            Event::Touch(touch::Event::FingerMoved { id, position }) => {
                if state.finger == Some(id) {
                    if let Some(last) = state.last {
                        let dx = position.x - last.x;
                        let dy = position.y - last.y;
                        state.last = Some(position);
                        return (
                            event::Status::Captured,
                            Some(Message::WorldCamera(CameraMotion::Orbit { dx, dy })),
                        );
                    }
                }
            }

            Event::Touch(touch::Event::FingerLifted { id, .. })
            | Event::Touch(touch::Event::FingerLost { id, .. }) => {
                if state.finger == Some(id) {
                    state.finger = None;
                    state.orbiting = false;
                    state.last = None;
                    return (event::Status::Captured, None);
                }
            }

            _ => {}
        }

        (event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.orbiting || state.panning {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

/// Everything the render thread needs for one frame of the 3D scene
#[derive(Debug)]
pub struct WorldPrimitive {
    frame: SceneFrame,
}

impl shader::Primitive for WorldPrimitive {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        storage: &mut shader::Storage,
        bounds: &Rectangle,
        viewport: &Viewport,
    ) {
        if !storage.has::<SceneRenderer>() {
            storage.store(SceneRenderer::new(device, format));
        }

        let Some(renderer) = storage.get_mut::<SceneRenderer>() else {
            return;
        };

        // Widget bounds in physical pixels become the render viewport
        let scale = viewport.scale_factor() as f32;
        let bounds_px = (
            bounds.x * scale,
            bounds.y * scale,
            (bounds.width * scale).max(1.0),
            (bounds.height * scale).max(1.0),
        );

        let physical = viewport.physical_size();
        renderer.prepare(
            device,
            queue,
            &self.frame,
            bounds_px,
            (physical.width, physical.height),
        );
    }

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        storage: &shader::Storage,
        target: &wgpu::TextureView,
        clip_bounds: &Rectangle<u32>,
    ) {
        let Some(renderer) = storage.get::<SceneRenderer>() else {
            return;
        };

        renderer.render(
            encoder,
            target,
            (
                clip_bounds.x,
                clip_bounds.y,
                clip_bounds.width,
                clip_bounds.height,
            ),
        );
    }
}
