#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const ORANGE: Self = Self::rgb(255, 165, 0);
    pub const CYAN: Self = Self::rgb(0, 255, 255);
    pub const PURPLE: Self = Self::rgb(160, 32, 240);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_unorm(self) -> [f32; 3] {
        [self.r, self.g, self.b].map(|c| c as f32 / 255.0)
    }

    /// Decodes the sRGB bytes into linear intensities, for writing into an
    /// sRGB-encoded attachment that re-applies the transfer function.
    pub fn to_linear(self) -> [f32; 3] {
        self.to_unorm().map(|c| {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Point {
    pub position: uv::Vec3,
    pub color: Color,
}

/// Static set of colored points. Order carries no meaning for rendering.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    points: Vec<Point>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two 0.4-wide squares facing the origin, one at depth 1.0 and one at 1.4.
    pub fn two_squares() -> Self {
        let mut scene = Self::new();
        scene.push(uv::Vec3::new(0.2, 0.2, 1.0), Color::RED);
        scene.push(uv::Vec3::new(0.2, 0.2, 1.4), Color::BLUE);
        scene.push(uv::Vec3::new(-0.2, 0.2, 1.0), Color::GREEN);
        scene.push(uv::Vec3::new(-0.2, 0.2, 1.4), Color::YELLOW);

        scene.push(uv::Vec3::new(0.2, -0.2, 1.0), Color::WHITE);
        scene.push(uv::Vec3::new(0.2, -0.2, 1.4), Color::ORANGE);
        scene.push(uv::Vec3::new(-0.2, -0.2, 1.0), Color::CYAN);
        scene.push(uv::Vec3::new(-0.2, -0.2, 1.4), Color::PURPLE);
        scene
    }

    pub fn push(&mut self, position: uv::Vec3, color: Color) {
        self.points.push(Point { position, color })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
