/// Rotation about the vertical axis by `angle` radians:
///
/// ```text
/// [ cos, 0, -sin ]
/// [  0,  1,   0  ]
/// [ sin, 0,  cos ]
/// ```
///
/// World points are brought into camera space with `yaw_matrix(yaw)`, camera-local
/// movement is brought into world space with `yaw_matrix(-yaw)`. The two are
/// inverse transforms and must stay that way.
pub fn yaw_matrix(angle: f32) -> uv::Mat3 {
    let (sin, cos) = angle.sin_cos();
    // ultraviolet stores columns
    uv::Mat3::new(
        uv::Vec3::new(cos, 0.0, sin),
        uv::Vec3::new(0.0, 1.0, 0.0),
        uv::Vec3::new(-sin, 0.0, cos),
    )
}

pub fn rotate_yaw(v: uv::Vec3, angle: f32) -> uv::Vec3 {
    yaw_matrix(angle) * v
}
