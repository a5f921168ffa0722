//! A `GlBackend` that runs without a driver.
//!
//! It "compiles" GLSL by scanning declarations, hands out object ids and
//! locations the way a driver would, and records every state change and
//! uniform upload so callers can inspect exactly what reached the GPU side.
//! Misuse that a real driver would reject (deleting unknown objects, uploads
//! with no program bound, uploads to foreign locations) is collected in
//! `errors()` instead of panicking.

use std::{cell::RefCell, collections::HashMap, ffi::CStr, rc::Rc};

use lazy_static::lazy_static;
use nalgebra::{Matrix4, Vector3, Vector4};
use regex::Regex;

use super::gfx::{GlBackend, ShaderStage};

lazy_static! {
    static ref ATTRIBUTE_DECL: Regex = Regex::new(r"(?m)^\s*(?:layout\s*\([^)]*\)\s*)?(?:in|attribute)\s+(?:(?:lowp|mediump|highp)\s+)?\w+\s+(\w+)\s*;").unwrap();
    static ref UNIFORM_DECL: Regex = Regex::new(r"(?m)^\s*uniform\s+(?:(?:lowp|mediump|highp)\s+)?\w+\s+(\w+)\s*(?:\[\s*(\d+)\s*\])?\s*;").unwrap();
    static ref ERROR_DIRECTIVE: Regex = Regex::new(r"(?m)^[ \t]*#error\b(.*)$").unwrap();
    static ref MAIN_DECL: Regex = Regex::new(r"\bvoid\s+main\s*\(").unwrap();
}

#[derive(Clone, Debug, PartialEq)]
pub enum UniformData {
    Mat4(Matrix4<f32>),
    Vec3(Vector3<f32>),
    Vec4(Vector4<f32>),
    Float(f32),
    Int(i32),
}

#[derive(Clone, Debug, PartialEq)]
pub enum GlCall {
    UseProgram(u32),
    Uniform { program: u32, location: i32, value: UniformData },
    EnableAttrib(u32),
    DisableAttrib(u32),
    AttribPointer { index: u32, components: i32, stride: i32, offset: usize },
}

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

struct AttachedShader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<AttachedShader>,
    linked: bool,
    log: String,
    attributes: HashMap<String, i32>,
    uniforms: HashMap<String, i32>,
    values: HashMap<i32, UniformData>,
}

#[derive(Default)]
struct HeadlessState {
    next_id: u32,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    bound: u32,
    calls: Vec<GlCall>,
    errors: Vec<String>,
    fail_next_link: Option<String>,
    fail_next_attach: bool,
    link_attempts: usize,
}

impl HeadlessState {
    fn alloc_id(self: &mut Self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn store_uniform(self: &mut Self, location: i32, value: UniformData) {
        let bound = self.bound;
        let program = match self.programs.get_mut(&bound) {
            Some(p) if bound != 0 => p,
            _ => {
                self.errors.push(format!("uniform upload to location {} with no program bound", location));
                return;
            }
        };

        if !program.uniforms.values().any(|l| *l == location) {
            self.errors.push(format!("uniform upload to location {} not owned by program {}", location, bound));
            return;
        }

        program.values.insert(location, value.clone());
        self.calls.push(GlCall::Uniform { program: bound, location, value });
    }
}

fn line_of(source: &str, byte_offset: usize) -> usize {
    source[..byte_offset].matches('\n').count() + 1
}

fn check_source(source: &str) -> Result<(), String> {
    if let Some(caps) = ERROR_DIRECTIVE.captures(source) {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or(0);
        let msg = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        return Err(format!("ERROR: 0:{}: '#error' : {}", line_of(source, whole), msg));
    }

    let mut depth: i64 = 0;
    for (offset, ch) in source.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("ERROR: 0:{}: '}}' : syntax error", line_of(source, offset)));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(format!("ERROR: 0:{}: '' : syntax error: unexpected end of file", line_of(source, source.len())));
    }

    if !MAIN_DECL.is_match(source) {
        return Err("ERROR: 0:1: 'main' : function not defined".to_owned());
    }

    Ok(())
}

/// Recording backend. Cloning shares the same simulated driver state.
#[derive(Clone, Default)]
pub struct HeadlessGl {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessGl {
    pub fn new() -> HeadlessGl {
        HeadlessGl::default()
    }

    pub fn calls(self: &Self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(self: &Self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn take_calls(self: &Self) -> Vec<GlCall> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    pub fn errors(self: &Self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    pub fn live_shaders(self: &Self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(self: &Self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn bound_program(self: &Self) -> u32 {
        self.state.borrow().bound
    }

    pub fn link_attempts(self: &Self) -> usize {
        self.state.borrow().link_attempts
    }

    /// Makes the next link report failure with the given log.
    pub fn fail_next_link(self: &Self, log: &str) {
        self.state.borrow_mut().fail_next_link = Some(log.to_owned());
    }

    /// Makes the next attach raise a driver error.
    pub fn fail_next_attach(self: &Self) {
        self.state.borrow_mut().fail_next_attach = true;
    }

    pub fn uniform_location_of(self: &Self, program: u32, name: &str) -> Option<i32> {
        let state = self.state.borrow();
        state.programs.get(&program).and_then(|p| p.uniforms.get(name).copied())
    }

    pub fn attrib_location_of(self: &Self, program: u32, name: &str) -> Option<i32> {
        let state = self.state.borrow();
        state.programs.get(&program).and_then(|p| p.attributes.get(name).copied())
    }

    /// Last value uploaded to `name` on `program`, if any.
    pub fn uniform_value(self: &Self, program: u32, name: &str) -> Option<UniformData> {
        let state = self.state.borrow();
        let program = state.programs.get(&program)?;
        let location = program.uniforms.get(name)?;
        program.values.get(location).cloned()
    }
}

impl GlBackend for HeadlessGl {
    fn create_shader(&self, stage: ShaderStage) -> u32 {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let id = state.alloc_id();
        state.shaders.insert(id, ShaderObject { stage, source: String::new(), compiled: false, log: String::new() });
        id
    }

    fn shader_source(&self, shader: u32, source: &str) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        match state.shaders.get_mut(&shader) {
            Some(s) => s.source = source.to_owned(),
            None => state.errors.push(format!("glShaderSource on unknown shader {}", shader)),
        }
    }

    fn compile_shader(&self, shader: u32) -> bool {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(s) = state.shaders.get_mut(&shader) else {
            state.errors.push(format!("glCompileShader on unknown shader {}", shader));
            return false;
        };

        match check_source(&s.source) {
            Ok(()) => {
                s.compiled = true;
                s.log.clear();
            }
            Err(log) => {
                s.compiled = false;
                s.log = log;
            }
        }
        s.compiled
    }

    fn shader_info_log(&self, shader: u32) -> String {
        let state = self.state.borrow();
        state.shaders.get(&shader).map(|s| s.log.clone()).unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.shaders.remove(&shader).is_none() {
            state.errors.push(format!("glDeleteShader on unknown shader {}", shader));
        }
    }

    fn create_program(&self) -> u32 {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let id = state.alloc_id();
        state.programs.insert(id, ProgramObject::default());
        id
    }

    fn attach_shader(&self, program: u32, shader: u32) -> bool {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.fail_next_attach {
            state.fail_next_attach = false;
            return false;
        }

        let attached = match state.shaders.get(&shader) {
            Some(s) => AttachedShader { stage: s.stage, source: s.source.clone(), compiled: s.compiled },
            None => {
                state.errors.push(format!("glAttachShader with unknown shader {}", shader));
                return false;
            }
        };

        match state.programs.get_mut(&program) {
            Some(p) => {
                p.attached.push(attached);
                true
            }
            None => {
                state.errors.push(format!("glAttachShader to unknown program {}", program));
                false
            }
        }
    }

    fn link_program(&self, program: u32) -> bool {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.link_attempts += 1;
        let forced_failure = state.fail_next_link.take();

        let Some(p) = state.programs.get_mut(&program) else {
            state.errors.push(format!("glLinkProgram on unknown program {}", program));
            return false;
        };

        p.linked = false;
        p.attributes.clear();
        p.uniforms.clear();
        p.values.clear();

        if let Some(log) = forced_failure {
            p.log = log;
            return false;
        }

        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            if !p.attached.iter().any(|s| s.stage == stage && s.compiled) {
                p.log = format!("ERROR: no compiled {} shader attached", stage);
                return false;
            }
        }

        let mut next_attrib = 0;
        let mut next_uniform = 0;
        for shader in &p.attached {
            if shader.stage == ShaderStage::Vertex {
                for caps in ATTRIBUTE_DECL.captures_iter(&shader.source) {
                    let name = caps[1].to_owned();
                    if !p.attributes.contains_key(&name) {
                        p.attributes.insert(name, next_attrib);
                        next_attrib += 1;
                    }
                }
            }

            for caps in UNIFORM_DECL.captures_iter(&shader.source) {
                let name = caps[1].to_owned();
                let array_len = caps.get(2).and_then(|m| m.as_str().parse::<usize>().ok());

                let names = match array_len {
                    Some(n) => (0..n).map(|i| format!("{}[{}]", name, i)).collect::<Vec<_>>(),
                    None => vec![name.clone()],
                };

                for element in names {
                    if !p.uniforms.contains_key(&element) {
                        p.uniforms.insert(element, next_uniform);
                        next_uniform += 1;
                    }
                }

                // the bare array name aliases element zero
                if array_len.is_some() {
                    if let Some(first) = p.uniforms.get(&format!("{}[0]", name)).copied() {
                        p.uniforms.entry(name).or_insert(first);
                    }
                }
            }
        }

        p.log.clear();
        p.linked = true;
        true
    }

    fn program_info_log(&self, program: u32) -> String {
        let state = self.state.borrow();
        state.programs.get(&program).map(|p| p.log.clone()).unwrap_or_default()
    }

    fn delete_program(&self, program: u32) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.programs.remove(&program).is_none() {
            state.errors.push(format!("glDeleteProgram on unknown program {}", program));
        }
        if state.bound == program {
            state.bound = 0;
        }
    }

    fn use_program(&self, program: u32) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if program != 0 && !state.programs.get(&program).map(|p| p.linked).unwrap_or(false) {
            state.errors.push(format!("glUseProgram on unlinked program {}", program));
            return;
        }

        state.bound = program;
        state.calls.push(GlCall::UseProgram(program));
    }

    fn attrib_location(&self, program: u32, name: &CStr) -> i32 {
        let state = self.state.borrow();
        let name = name.to_string_lossy();
        state.programs.get(&program)
            .filter(|p| p.linked)
            .and_then(|p| p.attributes.get(name.as_ref()).copied())
            .unwrap_or(-1)
    }

    fn uniform_location(&self, program: u32, name: &CStr) -> i32 {
        let state = self.state.borrow();
        let name = name.to_string_lossy();
        state.programs.get(&program)
            .filter(|p| p.linked)
            .and_then(|p| p.uniforms.get(name.as_ref()).copied())
            .unwrap_or(-1)
    }

    fn uniform_mat4(&self, location: i32, value: &Matrix4<f32>) {
        self.state.borrow_mut().store_uniform(location, UniformData::Mat4(*value));
    }

    fn uniform_vec3(&self, location: i32, value: &Vector3<f32>) {
        self.state.borrow_mut().store_uniform(location, UniformData::Vec3(*value));
    }

    fn uniform_vec4(&self, location: i32, value: &Vector4<f32>) {
        self.state.borrow_mut().store_uniform(location, UniformData::Vec4(*value));
    }

    fn uniform_float(&self, location: i32, value: f32) {
        self.state.borrow_mut().store_uniform(location, UniformData::Float(value));
    }

    fn uniform_int(&self, location: i32, value: i32) {
        self.state.borrow_mut().store_uniform(location, UniformData::Int(value));
    }

    fn enable_attrib(&self, index: u32) {
        self.state.borrow_mut().calls.push(GlCall::EnableAttrib(index));
    }

    fn disable_attrib(&self, index: u32) {
        self.state.borrow_mut().calls.push(GlCall::DisableAttrib(index));
    }

    fn attrib_pointer(&self, index: u32, components: i32, stride: i32, offset: usize) {
        self.state.borrow_mut().calls.push(GlCall::AttribPointer { index, components, stride, offset });
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::CString;

    use super::*;

    fn cstr(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    #[test]
    fn error_directive_fails_compilation_with_line_number() {
        let gl = HeadlessGl::new();
        let shader = gl.create_shader(ShaderStage::Fragment);
        gl.shader_source(shader, "#version 330 core\n#error intentionally broken\nvoid main() {}\n");

        assert!(!gl.compile_shader(shader));
        assert_eq!(gl.shader_info_log(shader), "ERROR: 0:2: '#error' : intentionally broken");
    }

    #[test]
    fn link_assigns_locations_to_declarations() {
        let gl = HeadlessGl::new();
        let vs = gl.create_shader(ShaderStage::Vertex);
        gl.shader_source(vs, "in vec2 vertex_pos2d;\nlayout(location = 1) in vec4 multicolor1;\nuniform highp mat4 projection_matrix;\nuniform float weights[2];\nvoid main() {}\n");
        let fs = gl.create_shader(ShaderStage::Fragment);
        gl.shader_source(fs, "in vec4 color;\nuniform mat4 projection_matrix;\nvoid main() {}\n");
        assert!(gl.compile_shader(vs) && gl.compile_shader(fs));

        let program = gl.create_program();
        assert!(gl.attach_shader(program, vs));
        assert!(gl.attach_shader(program, fs));
        assert!(gl.link_program(program));

        assert_eq!(gl.attrib_location(program, &cstr("vertex_pos2d")), 0);
        assert_eq!(gl.attrib_location(program, &cstr("multicolor1")), 1);
        // fragment inputs are not vertex attributes
        assert_eq!(gl.attrib_location(program, &cstr("color")), -1);
        assert_eq!(gl.uniform_location(program, &cstr("projection_matrix")), 0);
        assert_eq!(gl.uniform_location(program, &cstr("weights[1]")), 2);
        assert_eq!(gl.uniform_location(program, &cstr("weights")), 1);
    }

    #[test]
    fn uploads_without_a_bound_program_are_errors() {
        let gl = HeadlessGl::new();
        gl.uniform_float(0, 1.0);

        assert!(gl.calls().is_empty());
        assert_eq!(gl.errors().len(), 1);
    }

    #[test]
    fn double_delete_is_caught() {
        let gl = HeadlessGl::new();
        let program = gl.create_program();
        gl.delete_program(program);
        gl.delete_program(program);

        assert_eq!(gl.live_programs(), 0);
        assert_eq!(gl.errors(), vec![format!("glDeleteProgram on unknown program {}", program)]);
    }
}
