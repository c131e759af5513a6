use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    _padding: f32,
}

impl Vec3 {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            _padding: 0.0,
        }
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[must_use]
    pub const fn up() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    #[must_use]
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[must_use]
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[must_use]
    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Returns the zero vector unchanged.
    #[must_use]
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > f32::EPSILON {
            *self * (1.0 / len)
        } else {
            *self
        }
    }

    #[must_use]
    pub const fn to_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    #[must_use]
    pub const fn from_vec3(v: Vec3, w: f32) -> Self {
        Self::new(v.x, v.y, v.z, w)
    }

    fn get(&self, i: usize) -> f32 {
        match i {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => self.w,
        }
    }
}

/// Column-major 4x4 matrix, laid out the way Metal's `float4x4` expects.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub columns: [[f32; 4]; 4],
}

impl Mat4 {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            columns: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[must_use]
    pub fn translation(offset: Vec3) -> Self {
        let mut m = Self::identity();
        m.columns[3] = [offset.x, offset.y, offset.z, 1.0];
        m
    }

    /// Right-handed perspective projection with a 0..1 depth range.
    #[must_use]
    pub fn perspective(fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        let y_scale = 1.0 / (fov_y * 0.5).tan();
        let x_scale = y_scale / aspect_ratio;
        let z_range = near - far;

        Self {
            columns: [
                [x_scale, 0.0, 0.0, 0.0],
                [0.0, y_scale, 0.0, 0.0],
                [0.0, 0.0, far / z_range, -1.0],
                [0.0, 0.0, near * far / z_range, 0.0],
            ],
        }
    }

    /// Right-handed view matrix looking from `eye` towards `target`.
    #[must_use]
    pub fn look_at(eye: &Vec3, target: &Vec3, up: &Vec3) -> Self {
        let forward = (*target - *eye).normalize();
        let right = forward.cross(up).normalize();
        let true_up = right.cross(&forward);

        Self {
            columns: [
                [right.x, true_up.x, -forward.x, 0.0],
                [right.y, true_up.y, -forward.y, 0.0],
                [right.z, true_up.z, -forward.z, 0.0],
                [-right.dot(eye), -true_up.dot(eye), forward.dot(eye), 1.0],
            ],
        }
    }

    /// `self * other`
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let mut columns = [[0.0; 4]; 4];
        for (col, out) in columns.iter_mut().enumerate() {
            for (row, value) in out.iter_mut().enumerate() {
                *value = (0..4)
                    .map(|k| self.columns[k][row] * other.columns[col][k])
                    .sum();
            }
        }
        Self { columns }
    }

    #[must_use]
    pub fn multiply_vec4(&self, v: &Vec4) -> Vec4 {
        let row = |r: usize| (0..4).map(|k| self.columns[k][r] * v.get(k)).sum::<f32>();
        Vec4::new(row(0), row(1), row(2), row(3))
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_cross_product() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(&y), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_normalize() {
        let v = Vec3::new(3.0, 0.0, 4.0).normalize();
        assert!(approx(v.length(), 1.0));
        assert_eq!(Vec3::zero().normalize(), Vec3::zero());
    }

    #[test]
    fn test_translation_moves_points() {
        let m = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        let p = m.multiply_vec4(&Vec4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(p, Vec4::new(2.0, 3.0, 4.0, 1.0));
    }

    #[test]
    fn test_identity_multiply() {
        let m = Mat4::translation(Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(m.multiply(&Mat4::identity()), m);
        assert_eq!(Mat4::identity().multiply(&m), m);
    }

    #[test]
    fn test_look_at_puts_target_on_negative_z() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let view = Mat4::look_at(&eye, &Vec3::zero(), &Vec3::up());
        let p = view.multiply_vec4(&Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert!(approx(p.x, 0.0));
        assert!(approx(p.y, 0.0));
        assert!(approx(p.z, -5.0));
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);

        let near = proj.multiply_vec4(&Vec4::new(0.0, 0.0, -0.1, 1.0));
        assert!(approx(near.z / near.w, 0.0));

        let far = proj.multiply_vec4(&Vec4::new(0.0, 0.0, -100.0, 1.0));
        assert!(approx(far.z / far.w, 1.0));
    }
}
