//! Camera definitions, projection and the camera uniform.
//!
//! The scene is viewed through a camera embedded in the asset. Its node supplies
//! the view transform (and may be animated), while [`Projection`] holds the
//! perspective parameters that the scene overrides and that follow the canvas size.

use cgmath::{Matrix4, Rad, SquareMatrix};

use crate::data_structures::instance::Instance;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Far plane used when the asset leaves it open.
pub const DEFAULT_ZFAR: f32 = 2_000.0;

/// A perspective camera definition as stored in the asset.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraDesc {
    pub name: String,
    /// Vertical field of view in radians.
    pub yfov: f32,
    pub aspect: Option<f32>,
    pub znear: f32,
    pub zfar: Option<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn from_desc(desc: &CameraDesc, fallback_aspect: f32) -> Self {
        Self {
            aspect: desc.aspect.unwrap_or(fallback_aspect),
            fovy: Rad(desc.yfov),
            znear: desc.znear,
            zfar: desc.zfar.unwrap_or(DEFAULT_ZFAR),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn set_fovy<F: Into<Rad<f32>>>(&mut self, fovy: F) {
        self.fovy = fovy.into();
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// View matrix of a camera node: the inverse of its world transform, ignoring scale.
pub fn view_matrix(world: &Instance) -> Matrix4<f32> {
    let rotation = Matrix4::from(world.rotation);
    let transform = Matrix4::from_translation(world.position) * rotation;
    transform.invert().unwrap_or_else(Matrix4::identity)
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            view: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, world: &Instance, projection: &Projection) {
        let view = view_matrix(world);
        self.view_position = world.position.extend(1.0).into();
        self.view_proj = (projection.calc_matrix() * view).into();
        self.view = view.into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Vector3, Vector4};

    use super::*;

    #[test]
    fn view_moves_the_world_opposite_to_the_camera() {
        let camera = Instance::from(Vector3::new(0.0, 2.0, 5.0));
        let view = view_matrix(&camera);
        let origin = view * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.y + 2.0).abs() < 1e-6);
        assert!((origin.z + 5.0).abs() < 1e-6);
    }

    #[test]
    fn projection_keeps_desc_aspect_until_resized() {
        let desc = CameraDesc {
            name: "Camera".into(),
            yfov: 0.5,
            aspect: Some(1.5),
            znear: 0.1,
            zfar: None,
        };
        let mut projection = Projection::from_desc(&desc, 2.0);
        assert_eq!(projection.aspect(), 1.5);
        projection.set_fovy(Deg(35.0));
        projection.resize(1600, 900);
        assert!((projection.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }
}
