use std::{ops::{Deref, DerefMut}, path::Path};

use nalgebra::{Matrix4, Vector4};

use crate::graphics::{error::ShaderError, gfx::{GlBackend, NativeGl}, location::{AttribDecl, UniformDecl}, shader::{ShaderFlavor, ShaderProgram}, uniform::UniformKind};

use super::{MODEL_MATRIX, PROJECTION_MATRIX, TEXCOORD, TEXTURE_SAMPLER, TEXT_COLOR, VERTEX_POS2D, VIEW_MATRIX};

/// Glyph quads sampled from a single-channel atlas.
pub struct FontFlavor;

impl ShaderFlavor for FontFlavor {
    const NAME: &'static str = "font 2D";
    const VERTEX_PATH: &'static str = "fontpp2d.vert";
    const FRAGMENT_PATH: &'static str = "fontpp2d.frag";

    const ATTRIBUTES: &'static [AttribDecl] = &[
        AttribDecl::new(VERTEX_POS2D, 2),
        AttribDecl::new(TEXCOORD, 2),
    ];

    const UNIFORMS: &'static [UniformDecl] = &[
        UniformDecl::new(PROJECTION_MATRIX, UniformKind::Mat4),
        UniformDecl::new(VIEW_MATRIX, UniformKind::Mat4),
        UniformDecl::new(MODEL_MATRIX, UniformKind::Mat4),
        UniformDecl::new(TEXTURE_SAMPLER, UniformKind::Sampler),
        UniformDecl::new(TEXT_COLOR, UniformKind::Vec4),
    ];
}

pub struct FontProgram<G: GlBackend = NativeGl> {
    program: ShaderProgram<FontFlavor, G>,
    pub projection_matrix: Matrix4<f32>,
    pub view_matrix: Matrix4<f32>,
    pub model_matrix: Matrix4<f32>,
    pub text_color: Vector4<f32>,
}

impl<G: GlBackend> FontProgram<G> {
    pub fn new(gl: G) -> FontProgram<G> {
        FontProgram {
            program: ShaderProgram::new(gl),
            projection_matrix: Matrix4::identity(),
            view_matrix: Matrix4::identity(),
            model_matrix: Matrix4::identity(),
            text_color: Vector4::new(1.0, 1.0, 1.0, 1.0),
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

    pub fn update_text_color(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.vec4(TEXT_COLOR, &self.text_color);
        Ok(())
    }

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
        self.text_color = Vector4::new(1.0, 1.0, 1.0, 1.0);
    }
}

impl<G: GlBackend> Deref for FontProgram<G> {
    type Target = ShaderProgram<FontFlavor, G>;

    fn deref(&self) -> &Self::Target {
        &self.program
    }
}

impl<G: GlBackend> DerefMut for FontProgram<G> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.program
    }
}
