use crate::camera::Camera;
use crate::scene::Point;
use num_traits::ToPrimitive;

/// Perspective and viewport constants.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub focal_scale: f32,
    pub half_width: f32,
    pub half_height: f32,
    /// Circle radius of a point at depth 1.
    pub base_size: f32,
}

impl Viewport {
    pub const BASE_SIZE: f32 = 6.0;

    pub fn for_size(width: u32, height: u32) -> Self {
        Self {
            focal_scale: width as f32 / 2.0,
            half_width: width as f32 / 2.0,
            half_height: height as f32 / 2.0,
            base_size: Self::BASE_SIZE,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::for_size(800, 600)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Projection {
    /// On or behind the camera plane.
    Culled,
    Projected { x: f32, y: f32, radius: f32 },
}

/// Integer circle handed to the draw primitive.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PixelCircle {
    pub x: i32,
    pub y: i32,
    pub radius: i32,
}

impl Projection {
    /// Truncates toward zero. `None` when culled or when a coordinate does not
    /// fit in an `i32`, which only happens for points grazing the camera plane.
    pub fn pixel(&self) -> Option<PixelCircle> {
        match *self {
            Projection::Culled => None,
            Projection::Projected { x, y, radius } => Some(PixelCircle {
                x: x.to_i32()?,
                y: y.to_i32()?,
                radius: radius.to_i32()?,
            }),
        }
    }

    #[cfg(test)]
    pub fn is_culled(&self) -> bool {
        *self == Projection::Culled
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Projector {
    viewport: Viewport,
}

impl Projector {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    /// Translates by the camera position, then rotates by `+yaw` so the facing
    /// direction becomes `+Z`.
    pub fn to_camera_space(position: uv::Vec3, camera: &Camera) -> uv::Vec3 {
        crate::math::rotate_yaw(position - camera.pos, camera.yaw())
    }

    pub fn project(&self, point: &Point, camera: &Camera) -> Projection {
        let rotated = Self::to_camera_space(point.position, camera);
        if rotated.z <= 0.0 {
            return Projection::Culled;
        }
        let viewport = &self.viewport;
        Projection::Projected {
            x: (rotated.x / rotated.z) * viewport.focal_scale + viewport.half_width,
            y: -(rotated.y / rotated.z) * viewport.focal_scale + viewport.half_height,
            radius: viewport.base_size / rotated.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Color;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn point(x: f32, y: f32, z: f32) -> Point {
        Point {
            position: uv::Vec3::new(x, y, z),
            color: Color::WHITE,
        }
    }

    fn project(p: Point, camera: &Camera) -> Projection {
        Projector::default().project(&p, camera)
    }

    fn projected(projection: Projection) -> (f32, f32, f32) {
        match projection {
            Projection::Projected { x, y, radius } => (x, y, radius),
            Projection::Culled => panic!("point was culled"),
        }
    }

    #[test]
    fn default_viewport_constants() {
        let viewport = Viewport::default();
        assert_eq!(viewport.focal_scale, 400.0);
        assert_eq!(viewport.half_width, 400.0);
        assert_eq!(viewport.half_height, 300.0);
        assert_eq!(viewport.base_size, 6.0);
    }

    #[test]
    fn point_straight_ahead_hits_center() {
        let projection = project(point(0.0, 0.0, 1.0), &Camera::default());
        assert_eq!(
            projection,
            Projection::Projected {
                x: 400.0,
                y: 300.0,
                radius: 6.0
            }
        );
    }

    #[test]
    fn corner_point_pixels() {
        let projection = project(point(0.2, 0.2, 1.0), &Camera::default());
        assert_eq!(
            projection.pixel(),
            Some(PixelCircle {
                x: 480,
                y: 220,
                radius: 6
            })
        );
        let far = project(point(-0.2, -0.2, 1.4), &Camera::default());
        assert_eq!(
            far.pixel(),
            Some(PixelCircle {
                x: 342,
                y: 357,
                radius: 4
            })
        );
    }

    #[test]
    fn depth_sign_decides_culling() {
        let camera = Camera::default();
        assert!(project(point(0.0, 0.0, 0.0), &camera).is_culled());
        assert!(project(point(1.0, 1.0, 0.0), &camera).is_culled());
        assert!(project(point(0.0, 0.0, -0.5), &camera).is_culled());
        assert!(!project(point(0.0, 0.0, 1e-3), &camera).is_culled());
        assert_eq!(project(point(0.0, 0.0, -2.0), &camera).pixel(), None);
    }

    #[test]
    fn doubling_depth_halves_radius_only() {
        let camera = Camera::default();
        let (x1, y1, r1) = projected(project(point(0.3, -0.1, 1.2), &camera));
        let (x2, y2, r2) = projected(project(point(0.6, -0.2, 2.4), &camera));
        assert_abs_diff_eq!(x1, x2, epsilon = 1e-3);
        assert_abs_diff_eq!(y1, y2, epsilon = 1e-3);
        assert_abs_diff_eq!(r1, 2.0 * r2, epsilon = 1e-5);
    }

    #[test]
    fn camera_position_is_subtracted() {
        let camera = Camera::new(uv::Vec3::new(1.0, 2.0, 3.0), 0.0);
        let projection = project(point(1.0, 2.0, 5.0), &camera);
        assert_eq!(projected(projection), (400.0, 300.0, 3.0));
    }

    #[test]
    fn turned_camera_sees_along_world_x() {
        let camera = Camera::new(uv::Vec3::zero(), FRAC_PI_2);
        let (x, y, radius) = projected(project(point(2.0, 0.0, 0.0), &camera));
        assert_abs_diff_eq!(x, 400.0, epsilon = 1e-3);
        assert_abs_diff_eq!(y, 300.0, epsilon = 1e-3);
        assert_abs_diff_eq!(radius, 3.0, epsilon = 1e-5);
        assert!(project(point(0.0, 0.0, 1.0), &camera).is_culled());
    }

    #[test]
    fn turning_around_culls_the_scene() {
        let camera = Camera::new(uv::Vec3::zero(), PI);
        assert!(project(point(0.2, 0.2, 1.0), &camera).is_culled());
        assert!(!project(point(0.0, 0.0, -1.0), &camera).is_culled());
    }

    #[test]
    fn moving_forward_keeps_target_centered() {
        // movement and projection use opposite yaw signs; a sign slip on
        // either side pushes the target off center
        let mut camera = Camera::new(uv::Vec3::zero(), 0.0);
        camera.angular_velocity = 0.9;
        camera.update();
        camera.angular_velocity = 0.0;
        let ahead = crate::math::rotate_yaw(uv::Vec3::unit_z(), -camera.yaw()) * 4.0;
        let target = point(ahead.x, ahead.y, ahead.z);

        let (_, _, before) = projected(project(target, &camera));
        camera.velocity = uv::Vec3::new(0.0, 0.0, 1.0);
        camera.update();
        let (x, y, after) = projected(project(target, &camera));
        assert_abs_diff_eq!(x, 400.0, epsilon = 1e-3);
        assert_abs_diff_eq!(y, 300.0, epsilon = 1e-3);
        assert_abs_diff_eq!(before, 1.5, epsilon = 1e-5);
        assert_abs_diff_eq!(after, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn tiny_depth_does_not_overflow_pixels() {
        let projection = project(point(1.0, 0.0, 1e-30), &Camera::default());
        assert!(!projection.is_culled());
        assert_eq!(projection.pixel(), None);
    }
}
