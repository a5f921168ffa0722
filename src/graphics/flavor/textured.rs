use std::{ops::{Deref, DerefMut}, path::Path};

use nalgebra::{Matrix4, Vector4};

use crate::graphics::{error::ShaderError, gfx::{GlBackend, NativeGl}, location::{AttribDecl, UniformDecl}, shader::{ShaderFlavor, ShaderProgram}, uniform::UniformKind};

use super::{MODEL_MATRIX, PROJECTION_MATRIX, TEXCOORD, TEXTURE_COLOR, TEXTURE_SAMPLER, VERTEX_POS2D, VIEW_MATRIX};

/// Textured 2D quads, tinted by a constant color.
pub struct TexturedFlavor;

impl ShaderFlavor for TexturedFlavor {
    const NAME: &'static str = "textured 2D";
    const VERTEX_PATH: &'static str = "texturedpp2d.vert";
    const FRAGMENT_PATH: &'static str = "texturedpp2d.frag";

    const ATTRIBUTES: &'static [AttribDecl] = &[
        AttribDecl::new(VERTEX_POS2D, 2),
        AttribDecl::new(TEXCOORD, 2),
    ];

    const UNIFORMS: &'static [UniformDecl] = &[
        UniformDecl::new(PROJECTION_MATRIX, UniformKind::Mat4),
        UniformDecl::new(VIEW_MATRIX, UniformKind::Mat4),
        UniformDecl::new(MODEL_MATRIX, UniformKind::Mat4),
        UniformDecl::new(TEXTURE_SAMPLER, UniformKind::Sampler),
        UniformDecl::new(TEXTURE_COLOR, UniformKind::Vec4),
    ];
}

pub struct TexturedProgram<G: GlBackend = NativeGl> {
    program: ShaderProgram<TexturedFlavor, G>,
    pub projection_matrix: Matrix4<f32>,
    pub view_matrix: Matrix4<f32>,
    pub model_matrix: Matrix4<f32>,
    pub texture_color: Vector4<f32>,
}

impl<G: GlBackend> TexturedProgram<G> {
    pub fn new(gl: G) -> TexturedProgram<G> {
        TexturedProgram {
            program: ShaderProgram::new(gl),
            projection_matrix: Matrix4::identity(),
            view_matrix: Matrix4::identity(),
            model_matrix: Matrix4::identity(),
            texture_color: Vector4::new(1.0, 1.0, 1.0, 1.0),
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

    pub fn update_view_matrix(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.mat4(VIEW_MATRIX, &self.view_matrix);
        Ok(())
    }

    pub fn update_model_matrix(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.mat4(MODEL_MATRIX, &self.model_matrix);
        Ok(())
    }

    pub fn update_texture_color(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.vec4(TEXTURE_COLOR, &self.texture_color);
        Ok(())
    }

    /// Points `texture_sampler` at a texture unit (0 for `TEXTURE0`).
    pub fn set_texture_sampler(self: &Self, unit: u32) -> Result<(), ShaderError> {
        self.program.uploader()?.sampler(TEXTURE_SAMPLER, unit);
        Ok(())
    }

    pub fn set_vertex_pointer(self: &Self, stride: i32, offset: usize) -> Result<(), ShaderError> {
        self.program.set_attrib_pointer(VERTEX_POS2D, stride, offset)
    }

    pub fn set_texcoord_pointer(self: &Self, stride: i32, offset: usize) -> Result<(), ShaderError> {
        self.program.set_attrib_pointer(TEXCOORD, stride, offset)
    }

    fn reset_mirrors(self: &mut Self) {
        self.projection_matrix = Matrix4::identity();
        self.view_matrix = Matrix4::identity();
        self.model_matrix = Matrix4::identity();
        self.texture_color = Vector4::new(1.0, 1.0, 1.0, 1.0);
    }
}

impl<G: GlBackend> Deref for TexturedProgram<G> {
    type Target = ShaderProgram<TexturedFlavor, G>;

    fn deref(&self) -> &Self::Target {
        &self.program
    }
}

impl<G: GlBackend> DerefMut for TexturedProgram<G> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::headless::{HeadlessGl, UniformData};

    const VERT: &str = "#version 330 core
in vec2 vertex_pos2d;
in vec2 texcoord;
uniform mat4 projection_matrix;
uniform mat4 view_matrix;
uniform mat4 model_matrix;
out vec2 uv;
void main() { uv = texcoord; gl_Position = projection_matrix * view_matrix * model_matrix * vec4(vertex_pos2d, 0.0, 1.0); }
";
    const FRAG: &str = "#version 330 core
in vec2 uv;
uniform sampler2D texture_sampler;
uniform vec4 texture_color;
out vec4 frag_color;
void main() { frag_color = texture(texture_sampler, uv) * texture_color; }
";

    #[test]
    fn sampler_and_color_reach_the_program() {
        let gl = HeadlessGl::new();
        let mut program = TexturedProgram::new(gl.clone());
        program.load(VERT, FRAG).unwrap();
        program.bind().unwrap();

        program.texture_color = Vector4::new(1.0, 0.0, 0.0, 0.5);
        program.set_texture_sampler(0).unwrap();
        program.update_texture_color().unwrap();

        let id = program.handle().unwrap().get();
        assert_eq!(gl.uniform_value(id, TEXTURE_SAMPLER), Some(UniformData::Int(0)));
        assert_eq!(gl.uniform_value(id, TEXTURE_COLOR), Some(UniformData::Vec4(Vector4::new(1.0, 0.0, 0.0, 0.5))));
        assert!(gl.errors().is_empty());
        program.destroy();
    }
}
