use std::{ffi::{CStr, CString}, fs, num::NonZeroU32, path::Path, ptr::null_mut};

use log::error;
use nalgebra::{Matrix4, Vector3, Vector4};

use super::error::ShaderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self: &Self) -> u32 {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Linked GPU program id. Never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(NonZeroU32);

impl ProgramHandle {
    pub fn new(id: u32) -> Option<ProgramHandle> {
        NonZeroU32::new(id).map(ProgramHandle)
    }

    pub fn get(self: &Self) -> u32 {
        self.0.get()
    }
}

/// The slice of the GL API the shader layer talks to.
///
/// All calls happen on the thread that owns the GL context. Object ids of
/// zero mean "creation failed", locations of -1 mean "not found", exactly as
/// the driver reports them.
pub trait GlBackend {
    fn create_shader(&self, stage: ShaderStage) -> u32;
    fn shader_source(&self, shader: u32, source: &str);
    /// Compiles and returns the compile status.
    fn compile_shader(&self, shader: u32) -> bool;
    fn shader_info_log(&self, shader: u32) -> String;
    fn delete_shader(&self, shader: u32);

    fn create_program(&self) -> u32;
    /// Attaches and returns false if the driver raised an error.
    fn attach_shader(&self, program: u32, shader: u32) -> bool;
    /// Links and returns the link status.
    fn link_program(&self, program: u32) -> bool;
    fn program_info_log(&self, program: u32) -> String;
    fn delete_program(&self, program: u32);
    fn use_program(&self, program: u32);

    fn attrib_location(&self, program: u32, name: &CStr) -> i32;
    fn uniform_location(&self, program: u32, name: &CStr) -> i32;

    fn uniform_mat4(&self, location: i32, value: &Matrix4<f32>);
    fn uniform_vec3(&self, location: i32, value: &Vector3<f32>);
    fn uniform_vec4(&self, location: i32, value: &Vector4<f32>);
    fn uniform_float(&self, location: i32, value: f32);
    fn uniform_int(&self, location: i32, value: i32);

    fn enable_attrib(&self, index: u32);
    fn disable_attrib(&self, index: u32);
    fn attrib_pointer(&self, index: u32, components: i32, stride: i32, offset: usize);
}

/// Backend issuing real calls through the loaded `gl` function pointers.
/// `gl::load_with` must have run on the current context first.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeGl;

fn read_info_log(len: i32, fill: impl FnOnce(i32, *mut gl::types::GLchar)) -> String {
    if len <= 0 {
        return String::new();
    }

    let mut log_str = vec![0u8; len as usize];
    fill(len, log_str.as_mut_ptr() as *mut _);

    // drop the trailing nul
    while log_str.last() == Some(&0) {
        log_str.pop();
    }

    String::from_utf8_lossy(&log_str).into_owned()
}

impl GlBackend for NativeGl {
    fn create_shader(&self, stage: ShaderStage) -> u32 {
        unsafe { gl::CreateShader(stage.gl_enum()) }
    }

    fn shader_source(&self, shader: u32, source: &str) {
        let str_len = source.len() as i32;
        let src_ptr = source.as_ptr() as *const gl::types::GLchar;
        unsafe {
            gl::ShaderSource(shader, 1, &src_ptr, &str_len);
        }
    }

    fn compile_shader(&self, shader: u32) -> bool {
        let mut compile_status = 0;
        unsafe {
            gl::CompileShader(shader);
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut compile_status);
        }
        compile_status != 0
    }

    fn shader_info_log(&self, shader: u32) -> String {
        let mut log_length = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut log_length);
        }
        read_info_log(log_length, |len, buf| unsafe {
            gl::GetShaderInfoLog(shader, len, null_mut(), buf);
        })
    }

    fn delete_shader(&self, shader: u32) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&self) -> u32 {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: u32, shader: u32) -> bool {
        unsafe {
            // flush stale errors so only the attach is checked
            while gl::GetError() != gl::NO_ERROR {}
            gl::AttachShader(program, shader);
            gl::GetError() == gl::NO_ERROR
        }
    }

    fn link_program(&self, program: u32) -> bool {
        let mut link_status = 0;
        unsafe {
            gl::LinkProgram(program);
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut link_status);
        }
        link_status != 0
    }

    fn program_info_log(&self, program: u32) -> String {
        let mut log_length = 0;
        unsafe {
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut log_length);
        }
        read_info_log(log_length, |len, buf| unsafe {
            gl::GetProgramInfoLog(program, len, null_mut(), buf);
        })
    }

    fn delete_program(&self, program: u32) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn use_program(&self, program: u32) {
        unsafe { gl::UseProgram(program) }
    }

    fn attrib_location(&self, program: u32, name: &CStr) -> i32 {
        unsafe { gl::GetAttribLocation(program, name.as_ptr()) }
    }

    fn uniform_location(&self, program: u32, name: &CStr) -> i32 {
        unsafe { gl::GetUniformLocation(program, name.as_ptr()) }
    }

    fn uniform_mat4(&self, location: i32, value: &Matrix4<f32>) {
        // nalgebra storage is column-major, which is what GL expects untransposed
        unsafe { gl::UniformMatrix4fv(location, 1, gl::FALSE, value.as_ptr()) }
    }

    fn uniform_vec3(&self, location: i32, value: &Vector3<f32>) {
        unsafe { gl::Uniform3f(location, value.x, value.y, value.z) }
    }

    fn uniform_vec4(&self, location: i32, value: &Vector4<f32>) {
        unsafe { gl::Uniform4f(location, value.x, value.y, value.z, value.w) }
    }

    fn uniform_float(&self, location: i32, value: f32) {
        unsafe { gl::Uniform1f(location, value) }
    }

    fn uniform_int(&self, location: i32, value: i32) {
        unsafe { gl::Uniform1i(location, value) }
    }

    fn enable_attrib(&self, index: u32) {
        unsafe { gl::EnableVertexAttribArray(index) }
    }

    fn disable_attrib(&self, index: u32) {
        unsafe { gl::DisableVertexAttribArray(index) }
    }

    fn attrib_pointer(&self, index: u32, components: i32, stride: i32, offset: usize) {
        unsafe {
            gl::VertexAttribPointer(index, components, gl::FLOAT, gl::FALSE, stride, offset as *const _);
        }
    }
}

/// A compiled shader object. Deleting happens on drop, which after a
/// successful attach only flags it; the driver frees it with the program.
pub struct CompiledShader<'gl, G: GlBackend + ?Sized> {
    gl: &'gl G,
    handle: u32,
    stage: ShaderStage,
}

impl<'gl, G: GlBackend + ?Sized> CompiledShader<'gl, G> {
    pub fn handle(self: &Self) -> u32 {
        self.handle
    }

    pub fn stage(self: &Self) -> ShaderStage {
        self.stage
    }
}

impl<'gl, G: GlBackend + ?Sized> Drop for CompiledShader<'gl, G> {
    fn drop(&mut self) {
        self.gl.delete_shader(self.handle);
    }
}

/// Program object that has not finished linking yet. Deleted on drop
/// unless released.
struct PendingProgram<'gl, G: GlBackend + ?Sized> {
    gl: &'gl G,
    handle: u32,
}

impl<'gl, G: GlBackend + ?Sized> PendingProgram<'gl, G> {
    fn release(self: Self) -> u32 {
        let handle = self.handle;
        std::mem::forget(self);
        handle
    }
}

impl<'gl, G: GlBackend + ?Sized> Drop for PendingProgram<'gl, G> {
    fn drop(&mut self) {
        self.gl.delete_program(self.handle);
    }
}

pub fn compile_shader<'gl, G: GlBackend + ?Sized>(gl: &'gl G, stage: ShaderStage, source: &str) -> Result<CompiledShader<'gl, G>, ShaderError> {
    let handle = gl.create_shader(stage);
    if handle == 0 {
        return Err(ShaderError::CreateFailed("shader"));
    }

    let shader = CompiledShader { gl, handle, stage };

    gl.shader_source(handle, source);
    if !gl.compile_shader(handle) {
        let log = gl.shader_info_log(handle);
        error!("=== {} SHADER COMPILE FAILED ===\n{}", stage, log);
        return Err(ShaderError::Compile { stage, log });
    }

    Ok(shader)
}

pub fn load_shader_from_file<'gl, G: GlBackend + ?Sized>(gl: &'gl G, stage: ShaderStage, path: &Path) -> Result<CompiledShader<'gl, G>, ShaderError> {
    let source = read_source(path)?;
    compile_shader(gl, stage, &source)
}

pub fn read_source(path: &Path) -> Result<String, ShaderError> {
    fs::read_to_string(path).map_err(|e| {
        error!("Unable to read shader source {}: {}", path.display(), e);
        ShaderError::Io { path: path.to_path_buf(), source: e }
    })
}

/// Attaches both stages, links, and hands back the program. Any failure
/// deletes the partially built program; the shader objects are deleted
/// (or flagged, once attached) in every case when they drop.
pub fn link_program<G: GlBackend + ?Sized>(gl: &G, vertex: CompiledShader<'_, G>, fragment: CompiledShader<'_, G>) -> Result<ProgramHandle, ShaderError> {
    let program_id = gl.create_program();
    if program_id == 0 {
        return Err(ShaderError::CreateFailed("program"));
    }

    let program = PendingProgram { gl, handle: program_id };

    for shader in [&vertex, &fragment] {
        if !gl.attach_shader(program.handle, shader.handle()) {
            let log = gl.shader_info_log(shader.handle());
            error!("Error attaching {} shader\n{}", shader.stage(), log);
            return Err(ShaderError::Attach { stage: shader.stage(), log });
        }
    }

    if !gl.link_program(program.handle) {
        let log = gl.program_info_log(program.handle);
        error!("=== SHADER LINK FAILED ===\n{}", log);
        return Err(ShaderError::Link { log });
    }

    let handle = program.release();
    ProgramHandle::new(handle).ok_or(ShaderError::CreateFailed("program"))
}

pub fn link_program_from_files<G: GlBackend + ?Sized>(gl: &G, vertex_path: &Path, fragment_path: &Path) -> Result<ProgramHandle, ShaderError> {
    let vertex = load_shader_from_file(gl, ShaderStage::Vertex, vertex_path)?;
    let fragment = load_shader_from_file(gl, ShaderStage::Fragment, fragment_path)?;
    link_program(gl, vertex, fragment)
}

pub fn to_cstring(name: &str) -> Result<CString, ShaderError> {
    Ok(CString::new(name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::headless::HeadlessGl;

    const VERT: &str = "#version 330 core\nin vec2 vertex_pos2d;\nuniform mat4 projection_matrix;\nvoid main() { gl_Position = projection_matrix * vec4(vertex_pos2d, 0.0, 1.0); }\n";
    const FRAG: &str = "#version 330 core\nout vec4 frag_color;\nvoid main() { frag_color = vec4(1.0); }\n";

    #[test]
    fn compile_failure_releases_the_shader_object() {
        let gl = HeadlessGl::new();
        let result = compile_shader(&gl, ShaderStage::Fragment, "#version 330 core\nvoid main() {\n");

        match result {
            Err(ShaderError::Compile { stage, log }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            _ => panic!("expected a compile error"),
        }
        assert_eq!(gl.live_shaders(), 0);
        assert!(gl.errors().is_empty());
    }

    #[test]
    fn successful_link_flags_both_shaders_for_deletion() {
        let gl = HeadlessGl::new();
        let vs = compile_shader(&gl, ShaderStage::Vertex, VERT).unwrap();
        let fs = compile_shader(&gl, ShaderStage::Fragment, FRAG).unwrap();

        let program = link_program(&gl, vs, fs).unwrap();

        assert_ne!(program.get(), 0);
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_programs(), 1);
    }

    #[test]
    fn link_failure_releases_program_and_shaders() {
        let gl = HeadlessGl::new();
        gl.fail_next_link("undefined reference to main");
        let vs = compile_shader(&gl, ShaderStage::Vertex, VERT).unwrap();
        let fs = compile_shader(&gl, ShaderStage::Fragment, FRAG).unwrap();

        match link_program(&gl, vs, fs) {
            Err(ShaderError::Link { log }) => assert!(log.contains("undefined reference")),
            _ => panic!("expected a link error"),
        }
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_programs(), 0);
        assert!(gl.errors().is_empty());
    }

    #[test]
    fn attach_failure_stops_before_linking() {
        let gl = HeadlessGl::new();
        gl.fail_next_attach();
        let vs = compile_shader(&gl, ShaderStage::Vertex, VERT).unwrap();
        let fs = compile_shader(&gl, ShaderStage::Fragment, FRAG).unwrap();

        match link_program(&gl, vs, fs) {
            Err(ShaderError::Attach { stage, .. }) => assert_eq!(stage, ShaderStage::Vertex),
            _ => panic!("expected an attach error"),
        }
        assert_eq!(gl.link_attempts(), 0);
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_programs(), 0);
    }

    #[test]
    fn missing_source_file_is_an_io_error() {
        let gl = HeadlessGl::new();
        let result = link_program_from_files(&gl, Path::new("does/not/exist.vert"), Path::new("does/not/exist.frag"));

        assert!(matches!(result, Err(ShaderError::Io { .. })));
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_programs(), 0);
    }
}
