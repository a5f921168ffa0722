use nalgebra::{Matrix4, Vector3, Vector4};

use super::{error::ShaderError, gfx::GlBackend, light::{LightEntry, MAX_LIGHTS}, location::{element_name, Location, LocationTable}};

pub const LIGHT_POSITION: &str = "light_position";
pub const LIGHT_COLOR: &str = "light_color";
pub const LIGHT_ATTENUATION: &str = "light_attenuation";
pub const LIGHT_NUM: &str = "light_num";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Mat4,
    Vec3,
    Vec4,
    Float,
    Int,
    Bool,
    Sampler,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Mat4(Matrix4<f32>),
    Vec3(Vector3<f32>),
    Vec4(Vector4<f32>),
    Float(f32),
    Int(i32),
    Bool(bool),
    /// Texture unit index
    Sampler(u32),
}

impl UniformValue {
    pub fn kind(self: &Self) -> UniformKind {
        match self {
            UniformValue::Mat4(_) => UniformKind::Mat4,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Bool(_) => UniformKind::Bool,
            UniformValue::Sampler(_) => UniformKind::Sampler,
        }
    }
}

// Every upload below targets the currently bound program and silently skips
// unresolved locations.

pub fn upload_mat4<G: GlBackend + ?Sized>(gl: &G, location: Location, value: &Matrix4<f32>) {
    if location.is_resolved() {
        gl.uniform_mat4(location.raw(), value);
    }
}

pub fn upload_vec3<G: GlBackend + ?Sized>(gl: &G, location: Location, value: &Vector3<f32>) {
    if location.is_resolved() {
        gl.uniform_vec3(location.raw(), value);
    }
}

pub fn upload_vec4<G: GlBackend + ?Sized>(gl: &G, location: Location, value: &Vector4<f32>) {
    if location.is_resolved() {
        gl.uniform_vec4(location.raw(), value);
    }
}

pub fn upload_float<G: GlBackend + ?Sized>(gl: &G, location: Location, value: f32) {
    if location.is_resolved() {
        gl.uniform_float(location.raw(), value);
    }
}

pub fn upload_int<G: GlBackend + ?Sized>(gl: &G, location: Location, value: i32) {
    if location.is_resolved() {
        gl.uniform_int(location.raw(), value);
    }
}

pub fn upload_bool<G: GlBackend + ?Sized>(gl: &G, location: Location, value: bool) {
    upload_int(gl, location, value as i32);
}

pub fn upload_sampler<G: GlBackend + ?Sized>(gl: &G, location: Location, unit: u32) {
    upload_int(gl, location, unit as i32);
}

pub fn upload_value<G: GlBackend + ?Sized>(gl: &G, location: Location, value: &UniformValue) {
    match value {
        UniformValue::Mat4(v) => upload_mat4(gl, location, v),
        UniformValue::Vec3(v) => upload_vec3(gl, location, v),
        UniformValue::Vec4(v) => upload_vec4(gl, location, v),
        UniformValue::Float(v) => upload_float(gl, location, *v),
        UniformValue::Int(v) => upload_int(gl, location, *v),
        UniformValue::Bool(v) => upload_bool(gl, location, *v),
        UniformValue::Sampler(v) => upload_sampler(gl, location, *v),
    }
}

/// Uploads the first `count` lights and then the active light count, so the
/// shader never iterates past the data it was given. Slots from `count`
/// onward keep whatever the program held before. Returns the count used.
pub fn upload_lights<G: GlBackend + ?Sized>(gl: &G, table: &LocationTable, lights: &[LightEntry], count: usize) -> usize {
    let count = count.min(lights.len()).min(MAX_LIGHTS);

    for (i, light) in lights[..count].iter().enumerate() {
        upload_vec3(gl, table.uniform(&element_name(LIGHT_POSITION, i)), &light.position);
        upload_vec3(gl, table.uniform(&element_name(LIGHT_COLOR, i)), &light.color);
        upload_float(gl, table.uniform(&element_name(LIGHT_ATTENUATION, i)), light.attenuation_factor);
    }

    upload_int(gl, table.uniform(LIGHT_NUM), count as i32);
    count
}

/// Name-addressed uploads against one program's location table. Handed out
/// by a ready `ShaderProgram`; the program must already be bound.
pub struct Uploader<'a, G: GlBackend + ?Sized> {
    gl: &'a G,
    locations: &'a LocationTable,
}

impl<'a, G: GlBackend + ?Sized> Uploader<'a, G> {
    pub fn new(gl: &'a G, locations: &'a LocationTable) -> Uploader<'a, G> {
        Uploader { gl, locations }
    }

    pub fn mat4(self: &Self, name: &str, value: &Matrix4<f32>) {
        upload_mat4(self.gl, self.locations.uniform(name), value);
    }

    pub fn vec3(self: &Self, name: &str, value: &Vector3<f32>) {
        upload_vec3(self.gl, self.locations.uniform(name), value);
    }

    pub fn vec4(self: &Self, name: &str, value: &Vector4<f32>) {
        upload_vec4(self.gl, self.locations.uniform(name), value);
    }

    pub fn float(self: &Self, name: &str, value: f32) {
        upload_float(self.gl, self.locations.uniform(name), value);
    }

    pub fn int(self: &Self, name: &str, value: i32) {
        upload_int(self.gl, self.locations.uniform(name), value);
    }

    pub fn bool(self: &Self, name: &str, value: bool) {
        upload_bool(self.gl, self.locations.uniform(name), value);
    }

    pub fn sampler(self: &Self, name: &str, unit: u32) {
        upload_sampler(self.gl, self.locations.uniform(name), unit);
    }

    pub fn lights(self: &Self, lights: &[LightEntry], count: usize) -> usize {
        upload_lights(self.gl, self.locations, lights, count)
    }

    /// Kind-checked upload. Names the flavor never declared are skipped like
    /// any other unresolved uniform.
    pub fn value(self: &Self, name: &str, value: &UniformValue) -> Result<(), ShaderError> {
        if let Some(expected) = self.locations.uniform_kind(name) {
            let found = value.kind();
            if expected != found {
                return Err(ShaderError::UniformKind { name: name.to_owned(), expected, found });
            }
        }

        upload_value(self.gl, self.locations.uniform(name), value);
        Ok(())
    }
}
