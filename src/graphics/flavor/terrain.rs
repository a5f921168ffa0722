use std::{ops::{Deref, DerefMut}, path::Path};

use nalgebra::{Matrix4, Vector3};

use crate::{graphics::{error::ShaderError, gfx::{GlBackend, NativeGl}, light::{LightArray, MAX_LIGHTS}, location::{AttribDecl, UniformDecl}, shader::{ShaderFlavor, ShaderProgram}, uniform::{UniformKind, LIGHT_ATTENUATION, LIGHT_COLOR, LIGHT_NUM, LIGHT_POSITION}}, misc::Material};

use super::{MODEL_MATRIX, NORMAL, PROJECTION_MATRIX, TEXCOORD, TEXTURE_SAMPLER, VERTEX_POS3D, VIEW_MATRIX};

pub const MULTITEXTURE_ENABLED: &str = "multitexture_enabled";
pub const MULTITEXTURE_TEXTURE_R: &str = "multitexture_texture_r";
pub const MULTITEXTURE_TEXTURE_G: &str = "multitexture_texture_g";
pub const MULTITEXTURE_TEXTURE_B: &str = "multitexture_texture_b";
pub const MULTITEXTURE_BLENDMAP: &str = "multitexture_blendmap";
pub const SHINE_DAMPER: &str = "shine_damper";
pub const REFLECTIVITY: &str = "reflectivity";
pub const TEXCOORD_REPEAT: &str = "texcoord_repeat";
pub const AMBIENT_COLOR: &str = "ambient_color";
pub const FOG_ENABLED: &str = "fog_enabled";
pub const FOG_DENSITY: &str = "fog_density";
pub const FOG_GRADIENT: &str = "fog_gradient";
pub const SKY_COLOR: &str = "sky_color";

pub const DEFAULT_FOG_DENSITY: f32 = 0.0035;
pub const DEFAULT_FOG_GRADIENT: f32 = 5.0;

/// Lit, fogged 3D terrain with optional blendmap multitexturing.
pub struct TerrainFlavor;

impl ShaderFlavor for TerrainFlavor {
    const NAME: &'static str = "terrain 3D";
    const VERTEX_PATH: &'static str = "terrain3d.vert";
    const FRAGMENT_PATH: &'static str = "terrain3d.frag";

    const ATTRIBUTES: &'static [AttribDecl] = &[
        AttribDecl::new(VERTEX_POS3D, 3),
        AttribDecl::new(TEXCOORD, 2),
        AttribDecl::new(NORMAL, 3),
    ];

    const UNIFORMS: &'static [UniformDecl] = &[
        UniformDecl::new(TEXTURE_SAMPLER, UniformKind::Sampler),
        UniformDecl::new(MULTITEXTURE_ENABLED, UniformKind::Bool),
        UniformDecl::new(MULTITEXTURE_TEXTURE_R, UniformKind::Sampler),
        UniformDecl::new(MULTITEXTURE_TEXTURE_G, UniformKind::Sampler),
        UniformDecl::new(MULTITEXTURE_TEXTURE_B, UniformKind::Sampler),
        UniformDecl::new(MULTITEXTURE_BLENDMAP, UniformKind::Sampler),
        UniformDecl::new(PROJECTION_MATRIX, UniformKind::Mat4),
        UniformDecl::new(VIEW_MATRIX, UniformKind::Mat4),
        UniformDecl::new(MODEL_MATRIX, UniformKind::Mat4),
        UniformDecl::array(LIGHT_POSITION, UniformKind::Vec3, MAX_LIGHTS),
        UniformDecl::array(LIGHT_COLOR, UniformKind::Vec3, MAX_LIGHTS),
        UniformDecl::array(LIGHT_ATTENUATION, UniformKind::Float, MAX_LIGHTS),
        UniformDecl::new(LIGHT_NUM, UniformKind::Int),
        UniformDecl::new(SHINE_DAMPER, UniformKind::Float),
        UniformDecl::new(REFLECTIVITY, UniformKind::Float),
        UniformDecl::new(TEXCOORD_REPEAT, UniformKind::Float),
        UniformDecl::new(AMBIENT_COLOR, UniformKind::Vec3),
        UniformDecl::new(FOG_ENABLED, UniformKind::Bool),
        UniformDecl::new(FOG_DENSITY, UniformKind::Float),
        UniformDecl::new(FOG_GRADIENT, UniformKind::Float),
        UniformDecl::new(SKY_COLOR, UniformKind::Vec3),
    ];
}

pub struct TerrainProgram<G: GlBackend = NativeGl> {
    program: ShaderProgram<TerrainFlavor, G>,

    pub projection_matrix: Matrix4<f32>,
    pub view_matrix: Matrix4<f32>,
    pub model_matrix: Matrix4<f32>,

    pub lights: LightArray,

    pub shine_damper: f32,
    pub reflectivity: f32,
    pub texcoord_repeat: f32,
    pub ambient_color: Vector3<f32>,

    pub fog_enabled: bool,
    pub fog_density: f32,
    pub fog_gradient: f32,
    pub sky_color: Vector3<f32>,

    /// When set, the r/g/b textures are blended by the blendmap instead of
    /// sampling `texture_sampler` alone.
    pub multitexture_enabled: bool,
}

impl<G: GlBackend> TerrainProgram<G> {
    pub fn new(gl: G) -> TerrainProgram<G> {
        TerrainProgram {
            program: ShaderProgram::new(gl),
            projection_matrix: Matrix4::identity(),
            view_matrix: Matrix4::identity(),
            model_matrix: Matrix4::identity(),
            lights: LightArray::new(),
            shine_damper: 1.0,
            reflectivity: 0.0,
            texcoord_repeat: 1.0,
            ambient_color: Vector3::zeros(),
            fog_enabled: false,
            fog_density: DEFAULT_FOG_DENSITY,
            fog_gradient: DEFAULT_FOG_GRADIENT,
            sky_color: Vector3::new(0.5, 0.5, 0.5),
            multitexture_enabled: false,
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

    /// Pushes light slots `0..count` and sets `light_num` to match. `Some`
    /// never goes past the lights actually held; `None` pushes every slot,
    /// used or not. Returns the count the shader will use.
    pub fn update_lights(self: &Self, count: Option<usize>) -> Result<usize, ShaderError> {
        let uploader = self.program.uploader()?;
        let used = match count {
            Some(n) => uploader.lights(&self.lights.slots()[..self.lights.len()], n),
            None => uploader.lights(self.lights.slots(), MAX_LIGHTS),
        };
        Ok(used)
    }

    /// Copies a material into the shininess mirrors. Push with
    /// `update_shininess`.
    pub fn set_material(self: &mut Self, material: &Material) {
        self.shine_damper = material.shine_damper;
        self.reflectivity = material.reflectivity;
    }

    pub fn update_shininess(self: &Self) -> Result<(), ShaderError> {
        let uploader = self.program.uploader()?;
        uploader.float(SHINE_DAMPER, self.shine_damper);
        uploader.float(REFLECTIVITY, self.reflectivity);
        Ok(())
    }

    pub fn update_texcoord_repeat(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.float(TEXCOORD_REPEAT, self.texcoord_repeat);
        Ok(())
    }

    pub fn update_ambient_color(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.vec3(AMBIENT_COLOR, &self.ambient_color);
        Ok(())
    }

    pub fn update_fog_enabled(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.bool(FOG_ENABLED, self.fog_enabled);
        Ok(())
    }

    pub fn update_fog_density(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.float(FOG_DENSITY, self.fog_density);
        Ok(())
    }

    pub fn update_fog_gradient(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.float(FOG_GRADIENT, self.fog_gradient);
        Ok(())
    }

    pub fn update_sky_color(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.vec3(SKY_COLOR, &self.sky_color);
        Ok(())
    }

    pub fn update_multitexture_enabled(self: &Self) -> Result<(), ShaderError> {
        self.program.uploader()?.bool(MULTITEXTURE_ENABLED, self.multitexture_enabled);
        Ok(())
    }

    pub fn set_texture_sampler(self: &Self, unit: u32) -> Result<(), ShaderError> {
        self.program.uploader()?.sampler(TEXTURE_SAMPLER, unit);
        Ok(())
    }

    pub fn set_multitexture_texture_r_sampler(self: &Self, unit: u32) -> Result<(), ShaderError> {
        self.program.uploader()?.sampler(MULTITEXTURE_TEXTURE_R, unit);
        Ok(())
    }

    pub fn set_multitexture_texture_g_sampler(self: &Self, unit: u32) -> Result<(), ShaderError> {
        self.program.uploader()?.sampler(MULTITEXTURE_TEXTURE_G, unit);
        Ok(())
    }

    pub fn set_multitexture_texture_b_sampler(self: &Self, unit: u32) -> Result<(), ShaderError> {
        self.program.uploader()?.sampler(MULTITEXTURE_TEXTURE_B, unit);
        Ok(())
    }

    pub fn set_multitexture_blendmap_sampler(self: &Self, unit: u32) -> Result<(), ShaderError> {
        self.program.uploader()?.sampler(MULTITEXTURE_BLENDMAP, unit);
        Ok(())
    }

    pub fn set_vertex_pointer(self: &Self, stride: i32, offset: usize) -> Result<(), ShaderError> {
        self.program.set_attrib_pointer(VERTEX_POS3D, stride, offset)
    }

    pub fn set_texcoord_pointer(self: &Self, stride: i32, offset: usize) -> Result<(), ShaderError> {
        self.program.set_attrib_pointer(TEXCOORD, stride, offset)
    }

    pub fn set_normal_pointer(self: &Self, stride: i32, offset: usize) -> Result<(), ShaderError> {
        self.program.set_attrib_pointer(NORMAL, stride, offset)
    }

    fn reset_mirrors(self: &mut Self) {
        self.projection_matrix = Matrix4::identity();
        self.view_matrix = Matrix4::identity();
        self.model_matrix = Matrix4::identity();
        self.lights = LightArray::new();
        self.shine_damper = 1.0;
        self.reflectivity = 0.0;
        self.texcoord_repeat = 1.0;
        self.ambient_color = Vector3::zeros();
        self.fog_enabled = false;
        self.fog_density = DEFAULT_FOG_DENSITY;
        self.fog_gradient = DEFAULT_FOG_GRADIENT;
        self.sky_color = Vector3::new(0.5, 0.5, 0.5);
        self.multitexture_enabled = false;
    }
}

impl<G: GlBackend> Deref for TerrainProgram<G> {
    type Target = ShaderProgram<TerrainFlavor, G>;

    fn deref(&self) -> &Self::Target {
        &self.program
    }
}

impl<G: GlBackend> DerefMut for TerrainProgram<G> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{headless::{GlCall, HeadlessGl, UniformData}, light::LightEntry};

    const VERT: &str = "#version 330 core
in vec3 vertex_pos3d;
in vec2 texcoord;
in vec3 normal;
uniform mat4 projection_matrix;
uniform mat4 view_matrix;
uniform mat4 model_matrix;
uniform vec3 light_position[8];
uniform float texcoord_repeat;
void main() { gl_Position = projection_matrix * view_matrix * model_matrix * vec4(vertex_pos3d + normal * texcoord.x * texcoord_repeat, 1.0); }
";
    const FRAG: &str = "#version 330 core
uniform vec3 light_color[8];
uniform float light_attenuation[8];
uniform int light_num;
uniform bool fog_enabled;
uniform float fog_density;
out vec4 frag_color;
void main() { frag_color = vec4(light_color[0] * light_attenuation[0] * float(light_num), 1.0); }
";

    #[test]
    fn mirrors_start_at_documented_defaults() {
        let program = TerrainProgram::new(HeadlessGl::new());
        assert_eq!(program.fog_density, 0.0035);
        assert_eq!(program.fog_gradient, 5.0);
        assert_eq!(program.sky_color, Vector3::new(0.5, 0.5, 0.5));
        assert_eq!(program.shine_damper, 1.0);
        assert!(!program.fog_enabled);
        assert!(!program.multitexture_enabled);
    }

    #[test]
    fn lights_default_to_every_slot() {
        let gl = HeadlessGl::new();
        let mut program = TerrainProgram::new(gl.clone());
        program.load(VERT, FRAG).unwrap();
        program.bind().unwrap();
        program.lights.push(LightEntry::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(1.0, 1.0, 1.0), 0.5)).unwrap();

        assert_eq!(program.update_lights(None).unwrap(), MAX_LIGHTS);
        assert_eq!(program.update_lights(Some(1)).unwrap(), 1);

        let id = program.handle().unwrap().get();
        assert_eq!(gl.uniform_value(id, LIGHT_NUM), Some(UniformData::Int(1)));
        assert_eq!(gl.uniform_value(id, "light_position[0]"), Some(UniformData::Vec3(Vector3::new(1.0, 2.0, 3.0))));
        program.destroy();
    }

    #[test]
    fn explicit_light_count_stops_at_held_lights() {
        let gl = HeadlessGl::new();
        let mut program = TerrainProgram::new(gl.clone());
        program.load(VERT, FRAG).unwrap();
        program.bind().unwrap();
        let id = program.handle().unwrap().get();

        program.lights.push(LightEntry::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0), 0.5)).unwrap();
        assert_eq!(program.update_lights(Some(5)).unwrap(), 1);
        assert_eq!(gl.uniform_value(id, LIGHT_NUM), Some(UniformData::Int(1)));
        assert_eq!(gl.uniform_value(id, "light_position[1]"), None);

        program.lights.clear();
        gl.clear_calls();
        assert_eq!(program.update_lights(Some(3)).unwrap(), 0);
        assert_eq!(gl.uniform_value(id, LIGHT_NUM), Some(UniformData::Int(0)));
        // only the count went out
        assert_eq!(gl.calls().len(), 1);
        program.destroy();
    }

    #[test]
    fn names_missing_from_the_shader_are_skipped() {
        let gl = HeadlessGl::new();
        let mut program = TerrainProgram::new(gl.clone());
        program.load(VERT, FRAG).unwrap();
        program.bind().unwrap();
        gl.clear_calls();

        // none of these are declared by the sources above
        program.update_sky_color().unwrap();
        program.update_ambient_color().unwrap();
        program.update_shininess().unwrap();
        program.set_multitexture_blendmap_sampler(4).unwrap();
        assert!(gl.calls().is_empty());

        program.update_fog_density().unwrap();
        let id = program.handle().unwrap().get();
        assert_eq!(gl.calls(), vec![GlCall::Uniform {
            program: id,
            location: program.uniform(FOG_DENSITY).raw(),
            value: UniformData::Float(DEFAULT_FOG_DENSITY),
        }]);
        program.destroy();
    }
}
