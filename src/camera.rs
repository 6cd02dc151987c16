use std::f32::consts::TAU;

/// Translation per frame for each held movement key.
pub const MOVE_SPEED: f32 = 0.015;
/// Yaw change per frame for each held turn key.
pub const TURN_SPEED: f32 = 0.03;

/// Camera-local movement axis.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Axis {
    /// Local X, positive to the right.
    Strafe,
    /// Local Z, positive in the facing direction.
    Forward,
}

impl Axis {
    pub fn unit(self) -> uv::Vec3 {
        match self {
            Axis::Strafe => uv::Vec3::unit_x(),
            Axis::Forward => uv::Vec3::unit_z(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub pos: uv::Vec3,
    yaw: f32,
    /// Per-frame translation in camera-local axes.
    pub velocity: uv::Vec3,
    /// Per-frame yaw change.
    pub angular_velocity: f32,
}

impl Camera {
    pub fn new(pos: uv::Vec3, yaw: f32) -> Self {
        Self {
            pos,
            yaw: wrap_angle(yaw),
            velocity: uv::Vec3::zero(),
            angular_velocity: 0.0,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Adds `sign * MOVE_SPEED` along `axis`. A key release passes the negated
    /// sign of its press so the pair cancels exactly.
    pub fn apply_movement_input(&mut self, axis: Axis, sign: f32) {
        self.velocity += axis.unit() * (sign * MOVE_SPEED)
    }

    pub fn apply_turn_input(&mut self, sign: f32) {
        self.angular_velocity += sign * TURN_SPEED
    }

    /// Integrates one frame of motion. The yaw is advanced first, then the
    /// local velocity is rotated by the negated yaw into world space so that
    /// forward follows the current facing.
    pub fn update(&mut self) {
        self.yaw = wrap_angle(self.yaw + self.angular_velocity);
        self.pos += crate::math::rotate_yaw(self.velocity, -self.yaw)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(uv::Vec3::zero(), 0.0)
    }
}

/// Wraps into `[0, TAU)`. `rem_euclid` alone can round up to `TAU` for tiny
/// negative inputs.
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn press_and_release_cancel() {
        let mut camera = Camera::default();
        camera.apply_movement_input(Axis::Forward, 1.0);
        assert_eq!(camera.velocity, uv::Vec3::new(0.0, 0.0, MOVE_SPEED));
        camera.apply_movement_input(Axis::Forward, -1.0);
        assert_eq!(camera.velocity, uv::Vec3::zero());

        camera.apply_turn_input(-1.0);
        camera.apply_turn_input(1.0);
        assert_eq!(camera.angular_velocity, 0.0);
    }

    #[test]
    fn held_keys_compose() {
        let mut camera = Camera::default();
        camera.apply_movement_input(Axis::Forward, 1.0);
        camera.apply_movement_input(Axis::Strafe, -1.0);
        camera.apply_movement_input(Axis::Forward, -1.0);
        assert_eq!(camera.velocity, uv::Vec3::new(-MOVE_SPEED, 0.0, 0.0));
        camera.apply_movement_input(Axis::Strafe, 1.0);
        camera.apply_movement_input(Axis::Forward, 1.0);
        camera.apply_movement_input(Axis::Forward, -1.0);
        assert_eq!(camera.velocity, uv::Vec3::zero());
    }

    #[test]
    fn yaw_returns_after_full_turn() {
        let mut camera = Camera::new(uv::Vec3::zero(), 1.0);
        camera.angular_velocity = TAU / 100.0;
        for _ in 0..100 {
            camera.update();
            assert!(camera.yaw() >= 0.0 && camera.yaw() < TAU);
        }
        let diff = (camera.yaw() - 1.0).abs();
        assert!(diff.min(TAU - diff) < 1e-4);
    }

    #[test]
    fn yaw_wraps_below_zero() {
        let mut camera = Camera::default();
        camera.apply_turn_input(-1.0);
        camera.update();
        assert_abs_diff_eq!(camera.yaw(), TAU - TURN_SPEED, epsilon = 1e-5);
        assert_eq!(wrap_angle(-1e-9), 0.0);
        assert_eq!(wrap_angle(TAU), 0.0);
    }

    #[test]
    fn forward_follows_facing() {
        let mut camera = Camera::new(uv::Vec3::zero(), FRAC_PI_2);
        camera.velocity = uv::Vec3::new(0.0, 0.0, 0.5);
        camera.update();
        assert_abs_diff_eq!(camera.pos.x, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(camera.pos.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(camera.pos.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn turn_is_applied_before_moving() {
        let mut camera = Camera::default();
        camera.angular_velocity = FRAC_PI_2;
        camera.velocity = uv::Vec3::new(0.0, 0.0, 1.0);
        camera.update();
        assert_abs_diff_eq!(camera.pos.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(camera.pos.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn strafe_at_rest_moves_along_world_x() {
        let mut camera = Camera::default();
        camera.apply_movement_input(Axis::Strafe, 1.0);
        camera.update();
        camera.update();
        assert_abs_diff_eq!(camera.pos.x, 2.0 * MOVE_SPEED, epsilon = 1e-7);
        assert_eq!(camera.pos.z, 0.0);
    }
}
