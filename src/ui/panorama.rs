use iced::mouse::{self, Cursor};
use iced::touch;
use iced::widget::canvas::{self, Program};
use iced::widget::image;
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::Message;

/// Pixels of drift added per animation tick while nobody is dragging
const AUTO_SPIN: f32 = 0.5;

/// Backdrop behind the panorama strip
const BACKDROP: Color = Color::from_rgb(0.066, 0.082, 0.11);

/// Accumulated horizontal rotation of the panorama, in surface pixels
///
/// Dragging accumulates cursor deltas; when idle the orchestrator's
/// animation tick adds a slow ambient drift. The raw value grows without
/// bound and is wrapped against the scaled image width at draw time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanoramaRotation {
    offset: f32,
    dragging: bool,
}

impl PanoramaRotation {
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Accumulate a horizontal drag delta
    pub fn apply_drag(&mut self, delta_x: f32) {
        self.offset += delta_x;
    }

    /// Ambient drift, applied only while no drag is active
    pub fn tick(&mut self) {
        if !self.dragging {
            self.offset += AUTO_SPIN;
        }
    }
}

/// Wrap an unbounded rotation into [0, span)
///
/// Keeps the two-draw seam math simple: the strip is drawn at -offset
/// and again one span to the right.
pub fn wrap_offset(rotation: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    rotation.rem_euclid(span)
}

/// Canvas program that renders one equirectangular image as an endless
/// horizontally wrapping strip
///
/// Built fresh each view pass; the handle clone is cheap (ref-counted).
#[derive(Debug)]
pub struct PanoramaStrip {
    pub handle: image::Handle,
    pub image_size: (f32, f32),
    pub rotation: f32,
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
    pub last_x: Option<f32>,
    pub finger: Option<touch::Finger>,
}

impl Program<Message> for PanoramaStrip {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        frame.fill_rectangle(Point::ORIGIN, frame.size(), BACKDROP);

        let (image_w, image_h) = self.image_size;
        if image_w > 0.0 && image_h > 0.0 {
            // Scale so the image height fills the surface; width follows
            // the native aspect ratio
            let scale = bounds.height / image_h;
            let scaled_w = image_w * scale;
            let offset = wrap_offset(self.rotation, scaled_w);

            // Two draws, one scaled width apart, hide the wrap seam
            frame.draw_image(
                Rectangle::new(Point::new(-offset, 0.0), Size::new(scaled_w, bounds.height)),
                &self.handle,
            );
            frame.draw_image(
                Rectangle::new(
                    Point::new(scaled_w - offset, 0.0),
                    Size::new(scaled_w, bounds.height),
                ),
                &self.handle,
            );
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Mouse button press - start dragging
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_over(bounds) {
                    state.is_dragging = true;
                    state.last_x = Some(pos.x);
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::PanoramaDragStarted),
                    );
                }
            }

            // Mouse button release - stop dragging
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    state.is_dragging = false;
                    state.last_x = None;
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::PanoramaDragEnded),
                    );
                }
            }

            // Mouse move - rotate if dragging
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if state.is_dragging {
                    if let (Some(pos), Some(last_x)) = (cursor.position(), state.last_x) {
                        let delta_x = pos.x - last_x;
                        state.last_x = Some(pos.x);
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::PanoramaDragged(delta_x)),
                        );
                    }
                }
            }

            // Touch mirrors the mouse path, tracking a single finger
            canvas::Event::Touch(touch::Event::FingerPressed { id, position }) => {
                if state.finger.is_none() && bounds.contains(position) {
                    state.finger = Some(id);
                    state.is_dragging = true;
                    state.last_x = Some(position.x);
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::PanoramaDragStarted),
                    );
                }
            }

            canvas::Event::Touch(touch::Event::FingerMoved { id, position }) => {
                if state.finger == Some(id) {
                    if let Some(last_x) = state.last_x {
                        let delta_x = position.x - last_x;
                        state.last_x = Some(position.x);
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::PanoramaDragged(delta_x)),
                        );
                    }
                }
            }

            canvas::Event::Touch(touch::Event::FingerLifted { id, .. })
            | canvas::Event::Touch(touch::Event::FingerLost { id, .. }) => {
                if state.finger == Some(id) {
                    state.finger = None;
                    state.is_dragging = false;
                    state.last_x = None;
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::PanoramaDragEnded),
                    );
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.is_dragging {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_is_invertible() {
        let mut rotation = PanoramaRotation::default();
        rotation.begin_drag();
        rotation.apply_drag(42.5);
        rotation.apply_drag(-42.5);
        rotation.end_drag();
        assert_eq!(rotation.offset(), 0.0);
    }

    #[test]
    fn test_auto_spin_pauses_during_drag() {
        let mut rotation = PanoramaRotation::default();
        rotation.begin_drag();
        rotation.tick();
        rotation.tick();
        assert_eq!(rotation.offset(), 0.0);

        rotation.end_drag();
        rotation.tick();
        assert_eq!(rotation.offset(), AUTO_SPIN);
    }

    #[test]
    fn test_drag_deltas_accumulate() {
        let mut rotation = PanoramaRotation::default();
        rotation.begin_drag();
        rotation.apply_drag(10.0);
        rotation.apply_drag(15.0);
        assert_eq!(rotation.offset(), 25.0);
    }

    #[test]
    fn test_wrap_offset_stays_in_span() {
        assert_eq!(wrap_offset(250.0, 100.0), 50.0);
        assert_eq!(wrap_offset(-10.0, 100.0), 90.0);
        assert_eq!(wrap_offset(0.0, 100.0), 0.0);
    }

    #[test]
    fn test_wrap_offset_handles_degenerate_span() {
        assert_eq!(wrap_offset(123.0, 0.0), 0.0);
        assert_eq!(wrap_offset(123.0, -5.0), 0.0);
    }
}
