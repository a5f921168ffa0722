use std::{ops::{Deref, DerefMut}, path::Path};

use nalgebra::Matrix4;

use crate::graphics::{error::ShaderError, gfx::{GlBackend, NativeGl}, location::{AttribDecl, UniformDecl}, shader::{ShaderFlavor, ShaderProgram}, uniform::UniformKind};

use super::{MODELVIEW_MATRIX, MULTICOLOR1, MULTICOLOR2, PROJECTION_MATRIX, VERTEX_POS2D};

/// 2D geometry blending two per-vertex colors.
pub struct MultiColorFlavor;

impl ShaderFlavor for MultiColorFlavor {
    const NAME: &'static str = "double multicolor 2D";
    const VERTEX_PATH: &'static str = "doublemulticolorpp2d.vert";
    const FRAGMENT_PATH: &'static str = "doublemulticolorpp2d.frag";

    const ATTRIBUTES: &'static [AttribDecl] = &[
        AttribDecl::new(VERTEX_POS2D, 2),
        AttribDecl::new(MULTICOLOR1, 4),
        AttribDecl::new(MULTICOLOR2, 4),
    ];

    const UNIFORMS: &'static [UniformDecl] = &[
        UniformDecl::new(PROJECTION_MATRIX, UniformKind::Mat4),
        UniformDecl::new(MODELVIEW_MATRIX, UniformKind::Mat4),
    ];
}

pub struct MultiColorProgram<G: GlBackend = NativeGl> {
    program: ShaderProgram<MultiColorFlavor, G>,
    pub projection_matrix: Matrix4<f32>,
    pub modelview_matrix: Matrix4<f32>,
}

impl<G: GlBackend> MultiColorProgram<G> {
    pub fn new(gl: G) -> MultiColorProgram<G> {
        MultiColorProgram {
            program: ShaderProgram::new(gl),
            projection_matrix: Matrix4::identity(),
            modelview_matrix: Matrix4::identity(),
        }
    }

    pub fn load(self: &mut Self, vertex_src: &str, fragment_src: &str) -> Result<(), ShaderError> {
        self.reset_mirrors();
        self.program.load(vertex_src, fragment_src)
    }

    pub fn load_from_files(self: &mut Self, shader_dir: &Path) -> Result<(), ShaderError> {
        self.reset_mirrors();
        self.program.load_from_files(shader_dir)
    }

    pub fn update_projection_matrix(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.mat4(PROJECTION_MATRIX, &self.projection_matrix);
        Ok(())
    }

    pub fn update_modelview_matrix(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.mat4(MODELVIEW_MATRIX, &self.modelview_matrix);
        Ok(())
    }

    pub fn set_vertex_pointer(self: &Self, stride: i32, offset: usize) -> Result<(), ShaderError> {
        self.program.set_attrib_pointer(VERTEX_POS2D, stride, offset)
    }

    pub fn set_multicolor1_pointer(self: &Self, stride: i32, offset: usize) -> Result<(), ShaderError> {
        self.program.set_attrib_pointer(MULTICOLOR1, stride, offset)
    }

    pub fn set_multicolor2_pointer(self: &Self, stride: i32, offset: usize) -> Result<(), ShaderError> {
        self.program.set_attrib_pointer(MULTICOLOR2, stride, offset)
    }

    fn reset_mirrors(self: &mut Self) {
        self.projection_matrix = Matrix4::identity();
        self.modelview_matrix = Matrix4::identity();
    }
}

impl<G: GlBackend> Deref for MultiColorProgram<G> {
    type Target = ShaderProgram<MultiColorFlavor, G>;

    fn deref(&self) -> &Self::Target {
        &self.program
    }
}

impl<G: GlBackend> DerefMut for MultiColorProgram<G> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.program
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;
    use crate::graphics::headless::{GlCall, HeadlessGl, UniformData};

    const VERT: &str = "#version 330 core
in vec2 vertex_pos2d;
in vec4 multicolor1;
in vec4 multicolor2;
uniform mat4 projection_matrix;
uniform mat4 modelview_matrix;
out vec4 color;
void main() { color = multicolor1 * multicolor2; gl_Position = projection_matrix * modelview_matrix * vec4(vertex_pos2d, 0.0, 1.0); }
";
    const FRAG: &str = "#version 330 core
in vec4 color;
out vec4 frag_color;
void main() { frag_color = color; }
";

    #[test]
    fn updates_before_load_are_refused() {
        let program = MultiColorProgram::new(HeadlessGl::new());
        assert!(matches!(program.update_projection_matrix(), Err(ShaderError::NotReady)));
    }

    #[test]
    fn matrix_updates_push_their_mirrors() {
        let gl = HeadlessGl::new();
        let mut program = MultiColorProgram::new(gl.clone());
        program.load(VERT, FRAG).unwrap();
        program.bind().unwrap();
        gl.clear_calls();

        program.modelview_matrix = Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0));
        program.update_projection_matrix().unwrap();
        program.update_modelview_matrix().unwrap();

        let id = program.handle().unwrap().get();
        assert_eq!(gl.calls(), vec![
            GlCall::Uniform { program: id, location: program.uniform(PROJECTION_MATRIX).raw(), value: UniformData::Mat4(Matrix4::identity()) },
            GlCall::Uniform { program: id, location: program.uniform(MODELVIEW_MATRIX).raw(), value: UniformData::Mat4(Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0))) },
        ]);
        program.destroy();
    }

    #[test]
    fn reload_resets_mirrors() {
        let gl = HeadlessGl::new();
        let mut program = MultiColorProgram::new(gl.clone());
        program.load(VERT, FRAG).unwrap();
        program.projection_matrix = Matrix4::new_scaling(2.0);

        program.load(VERT, FRAG).unwrap();

        assert_eq!(program.projection_matrix, Matrix4::identity());
        assert_eq!(gl.live_programs(), 1);
        program.destroy();
    }
}
