/// Orbit camera for the 3D world viewer
///
/// Spherical coordinates around a focal target: yaw around the Y axis,
/// pitch as elevation above the horizon, distance along the boom. The
/// pitch floor keeps the camera from diving under the ground plane and
/// the ceiling stops it just short of straight down to avoid the pole.
use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, Vector3};

/// Closest the camera can get to the target
pub const MIN_DISTANCE: f32 = 2.0;
/// Farthest the camera can pull back
pub const MAX_DISTANCE: f32 = 100.0;
/// Elevation limits (radians): horizon up to just short of overhead
const MIN_PITCH: f32 = 0.0;
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.017;

/// Radians of yaw/pitch per pixel of drag
const ROTATE_SPEED: f32 = 0.005;
/// Target-space units per pixel of drag, scaled by distance
const PAN_SPEED: f32 = 0.001;
/// Exponential zoom factor per scroll line
const ZOOM_SPEED: f32 = 0.15;

const FOV_Y_DEG: f32 = 60.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 1000.0;

/// Remaps OpenGL clip-space depth [-1, 1] to wgpu's [0, 1]
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    /// Rotation around the Y axis, radians
    pub yaw: f32,
    /// Elevation above the horizon, radians
    pub pitch: f32,
    /// Boom length from target to eye
    pub distance: f32,
    /// Focal point the camera orbits
    pub target: Point3<f32>,
}

impl Default for OrbitCamera {
    /// Matches the original scene: eye near (0, 2, 10) looking at the origin
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.197,
            distance: 10.2,
            target: Point3::new(0.0, 0.0, 0.0),
        }
    }
}

impl OrbitCamera {
    /// Rotate around the target by a drag delta in pixels
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * ROTATE_SPEED;
        self.pitch = (self.pitch + dy * ROTATE_SPEED).clamp(MIN_PITCH, MAX_PITCH);
    }

    /// Slide the target in the view plane by a drag delta in pixels
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let eye = self.eye();
        let forward = (self.target - eye).normalize();
        let right = forward.cross(Vector3::unit_y()).normalize();
        let up = right.cross(forward);

        let step = self.distance * PAN_SPEED;
        self.target += right * (-dx * step) + up * (dy * step);
    }

    /// Zoom by scroll lines: positive moves in, negative pulls back
    pub fn zoom(&mut self, lines: f32) {
        self.distance = (self.distance * (-lines * ZOOM_SPEED).exp())
            .clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Eye position in world space
    pub fn eye(&self) -> Point3<f32> {
        let offset = Vector3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        ) * self.distance;

        self.target + offset
    }

    /// Combined view-projection matrix for a wgpu target
    pub fn view_proj(&self, aspect: f32) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(self.eye(), self.target, Vector3::unit_y());
        let proj = perspective(Deg(FOV_Y_DEG), aspect.max(0.01), Z_NEAR, Z_FAR);

        OPENGL_TO_WGPU_MATRIX * proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::EuclideanSpace;

    #[test]
    fn test_default_matches_original_viewpoint() {
        let camera = OrbitCamera::default();
        let eye = camera.eye();

        // Roughly (0, 2, 10)
        assert!(eye.x.abs() < 0.01);
        assert!((eye.y - 2.0).abs() < 0.05);
        assert!((eye.z - 10.0).abs() < 0.05);
    }

    #[test]
    fn test_zoom_respects_distance_range() {
        let mut camera = OrbitCamera::default();

        for _ in 0..100 {
            camera.zoom(5.0);
        }
        assert_eq!(camera.distance, MIN_DISTANCE);

        for _ in 0..100 {
            camera.zoom(-5.0);
        }
        assert_eq!(camera.distance, MAX_DISTANCE);
    }

    #[test]
    fn test_pitch_never_leaves_its_band() {
        let mut camera = OrbitCamera::default();

        camera.orbit(0.0, 10_000.0);
        assert!(camera.pitch <= MAX_PITCH);

        camera.orbit(0.0, -10_000.0);
        assert!(camera.pitch >= MIN_PITCH);
    }

    #[test]
    fn test_eye_sits_at_boom_length() {
        let mut camera = OrbitCamera::default();
        camera.orbit(123.0, -41.0);
        camera.zoom(1.5);

        let boom = camera.eye() - camera.target;
        assert!((boom.magnitude() - camera.distance).abs() < 1e-4);
    }

    #[test]
    fn test_pan_moves_target_not_boom() {
        let mut camera = OrbitCamera::default();
        let before = camera.target;

        camera.pan(40.0, -25.0);

        assert!((camera.target - before).magnitude() > 0.0);
        let boom = camera.eye() - camera.target;
        assert!((boom.magnitude() - camera.distance).abs() < 1e-4);
    }

    #[test]
    fn test_view_proj_is_finite() {
        let camera = OrbitCamera::default();
        let matrix: [[f32; 4]; 4] = camera.view_proj(16.0 / 9.0).into();

        for column in matrix {
            for value in column {
                assert!(value.is_finite());
            }
        }
    }

    #[test]
    fn test_orbit_is_invertible_in_yaw() {
        let mut camera = OrbitCamera::default();
        let yaw_before = camera.yaw;

        camera.orbit(250.0, 0.0);
        camera.orbit(-250.0, 0.0);

        assert!((camera.yaw - yaw_before).abs() < 1e-6);
    }

    #[test]
    fn test_target_starts_at_origin() {
        let camera = OrbitCamera::default();
        assert_eq!(camera.target.to_vec(), Vector3::new(0.0, 0.0, 0.0));
    }
}
