use std::{marker::PhantomData, path::Path};

use log::{error, info, warn};

use super::{error::ShaderError, gfx::{compile_shader, link_program, read_source, GlBackend, NativeGl, ProgramHandle, ShaderStage}, location::{AttribDecl, Location, LocationTable, UniformDecl}, uniform::Uploader};

/// Declarative description of one shader flavor: where its sources live and
/// which semantic names its GLSL must declare.
pub trait ShaderFlavor {
    const NAME: &'static str;
    /// Vertex source file name, relative to the shader directory.
    const VERTEX_PATH: &'static str;
    /// Fragment source file name, relative to the shader directory.
    const FRAGMENT_PATH: &'static str;
    const ATTRIBUTES: &'static [AttribDecl];
    const UNIFORMS: &'static [UniformDecl];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramState {
    Unloaded,
    Loading,
    Ready,
    Destroyed,
}

/// Owns one GPU program built from flavor `F`, plus its location table.
///
/// The program object is deleted exactly once: by `destroy`, by a reload
/// replacing it, or on drop.
pub struct ShaderProgram<F: ShaderFlavor, G: GlBackend = NativeGl> {
    gl: G,
    handle: Option<ProgramHandle>,
    locations: LocationTable,
    state: ProgramState,
    _flavor: PhantomData<F>,
}

impl<F: ShaderFlavor, G: GlBackend> ShaderProgram<F, G> {
    pub fn new(gl: G) -> ShaderProgram<F, G> {
        ShaderProgram {
            gl,
            handle: None,
            locations: LocationTable::default(),
            state: ProgramState::Unloaded,
            _flavor: PhantomData,
        }
    }

    pub fn state(self: &Self) -> ProgramState {
        self.state
    }

    pub fn is_ready(self: &Self) -> bool {
        self.state == ProgramState::Ready
    }

    pub fn handle(self: &Self) -> Option<ProgramHandle> {
        self.handle
    }

    pub fn gl(self: &Self) -> &G {
        &self.gl
    }

    pub fn locations(self: &Self) -> &LocationTable {
        &self.locations
    }

    pub fn attribute(self: &Self, name: &str) -> Location {
        self.locations.attribute(name)
    }

    pub fn uniform(self: &Self, name: &str) -> Location {
        self.locations.uniform(name)
    }

    /// Builds the program from source text. Any previous program is released
    /// first; on failure the program is left unloaded with nothing allocated.
    pub fn load(self: &mut Self, vertex_src: &str, fragment_src: &str) -> Result<(), ShaderError> {
        self.release();
        self.state = ProgramState::Loading;

        match build::<G>(&self.gl, vertex_src, fragment_src, F::ATTRIBUTES, F::UNIFORMS) {
            Ok((handle, locations)) => {
                info!("Loaded {} shader program ({})", F::NAME, handle.get());
                self.handle = Some(handle);
                self.locations = locations;
                self.state = ProgramState::Ready;
                Ok(())
            }
            Err(e) => {
                error!("Error loading {} shader program: {}", F::NAME, e);
                self.state = ProgramState::Unloaded;
                Err(e)
            }
        }
    }

    /// Loads the flavor's fixed source files from `shader_dir`.
    pub fn load_from_files(self: &mut Self, shader_dir: &Path) -> Result<(), ShaderError> {
        let sources = read_source(&shader_dir.join(F::VERTEX_PATH))
            .and_then(|vs| read_source(&shader_dir.join(F::FRAGMENT_PATH)).map(|fs| (vs, fs)));

        match sources {
            Ok((vs, fs)) => self.load(&vs, &fs),
            Err(e) => {
                error!("Error loading {} shader program: {}", F::NAME, e);
                self.release();
                self.state = ProgramState::Unloaded;
                Err(e)
            }
        }
    }

    pub fn bind(self: &Self) -> Result<(), ShaderError> {
        let handle = self.ready_handle()?;
        self.gl.use_program(handle.get());
        Ok(())
    }

    pub fn unbind(self: &Self) -> Result<(), ShaderError> {
        self.ready_handle()?;
        self.gl.use_program(0);
        Ok(())
    }

    /// Uniform uploads for this program. The caller binds it beforehand.
    pub fn uploader(self: &Self) -> Result<Uploader<'_, G>, ShaderError> {
        self.ready_handle()?;
        Ok(Uploader::new(&self.gl, &self.locations))
    }

    /// Points a declared attribute at interleaved float data in the bound
    /// vertex buffer. Unresolved attributes are skipped.
    pub fn set_attrib_pointer(self: &Self, name: &str, stride: i32, offset: usize) -> Result<(), ShaderError> {
        self.ready_handle()?;
        if let (Some(index), Some(components)) = (self.locations.attribute(name).index(), self.locations.attribute_components(name)) {
            self.gl.attrib_pointer(index, components, stride, offset);
        }
        Ok(())
    }

    pub fn enable_attrib_pointers(self: &Self) -> Result<(), ShaderError> {
        self.ready_handle()?;
        for index in self.locations.attribute_indices() {
            self.gl.enable_attrib(index);
        }
        Ok(())
    }

    pub fn disable_attrib_pointers(self: &Self) -> Result<(), ShaderError> {
        self.ready_handle()?;
        for index in self.locations.attribute_indices() {
            self.gl.disable_attrib(index);
        }
        Ok(())
    }

    /// Releases the GPU program. Use reports `Destroyed` until the next
    /// successful load.
    pub fn destroy(self: &mut Self) {
        self.release();
        self.state = ProgramState::Destroyed;
    }

    fn ready_handle(self: &Self) -> Result<ProgramHandle, ShaderError> {
        match (self.state, self.handle) {
            (ProgramState::Ready, Some(handle)) => Ok(handle),
            (ProgramState::Destroyed, _) => Err(ShaderError::Destroyed),
            _ => Err(ShaderError::NotReady),
        }
    }

    fn release(self: &mut Self) {
        if let Some(handle) = self.handle.take() {
            self.gl.delete_program(handle.get());
        }
        self.locations = LocationTable::default();
    }
}

impl<F: ShaderFlavor, G: GlBackend> Drop for ShaderProgram<F, G> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!("{} shader program dropped without destroy", F::NAME);
        }
        self.release();
    }
}

fn build<G: GlBackend>(gl: &G, vertex_src: &str, fragment_src: &str, attributes: &[AttribDecl], uniforms: &[UniformDecl]) -> Result<(ProgramHandle, LocationTable), ShaderError> {
    let vertex = compile_shader(gl, ShaderStage::Vertex, vertex_src)?;
    let fragment = compile_shader(gl, ShaderStage::Fragment, fragment_src)?;
    let handle = link_program(gl, vertex, fragment)?;

    match LocationTable::resolve(gl, handle, attributes, uniforms) {
        Ok(locations) => Ok((handle, locations)),
        Err(e) => {
            gl.delete_program(handle.get());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{headless::HeadlessGl, uniform::UniformKind};

    struct TestFlavor;

    impl ShaderFlavor for TestFlavor {
        const NAME: &'static str = "test";
        const VERTEX_PATH: &'static str = "test.vert";
        const FRAGMENT_PATH: &'static str = "test.frag";
        const ATTRIBUTES: &'static [AttribDecl] = &[AttribDecl::new("vertex_pos2d", 2)];
        const UNIFORMS: &'static [UniformDecl] = &[UniformDecl::new("projection_matrix", UniformKind::Mat4)];
    }

    const VERT: &str = "#version 330 core
in vec2 vertex_pos2d;
uniform mat4 projection_matrix;
void main() { gl_Position = projection_matrix * vec4(vertex_pos2d, 0.0, 1.0); }
";
    const FRAG: &str = "#version 330 core
out vec4 frag_color;
void main() { frag_color = vec4(1.0); }
";
    const BROKEN_FRAG: &str = "#version 330 core
#error intentionally broken
void main() {}
";

    #[test]
    fn starts_unloaded_and_refuses_use() {
        let program = ShaderProgram::<TestFlavor, _>::new(HeadlessGl::new());
        assert_eq!(program.state(), ProgramState::Unloaded);
        assert!(matches!(program.bind(), Err(ShaderError::NotReady)));
        assert!(matches!(program.uploader(), Err(ShaderError::NotReady)));
    }

    #[test]
    fn failed_reload_leaves_nothing_behind() {
        let gl = HeadlessGl::new();
        let mut program = ShaderProgram::<TestFlavor, _>::new(gl.clone());
        program.load(VERT, FRAG).unwrap();
        assert_eq!(gl.live_programs(), 1);

        assert!(program.load(VERT, BROKEN_FRAG).is_err());

        assert_eq!(program.state(), ProgramState::Unloaded);
        assert!(program.handle().is_none());
        assert!(program.locations().is_empty());
        assert_eq!(gl.live_programs(), 0);
        assert_eq!(gl.live_shaders(), 0);
    }

    #[test]
    fn destroyed_programs_refuse_use_until_reloaded() {
        let gl = HeadlessGl::new();
        let mut program = ShaderProgram::<TestFlavor, _>::new(gl.clone());
        program.load(VERT, FRAG).unwrap();
        program.destroy();

        assert_eq!(gl.live_programs(), 0);
        assert_eq!(program.state(), ProgramState::Destroyed);
        assert!(matches!(program.bind(), Err(ShaderError::Destroyed)));
        assert!(matches!(program.uploader(), Err(ShaderError::Destroyed)));

        program.load(VERT, FRAG).unwrap();
        assert!(program.is_ready());
        assert_eq!(gl.live_programs(), 1);

        drop(program);
        assert!(gl.errors().is_empty());
    }

    #[test]
    fn drop_deletes_a_loaded_program_once() {
        let gl = HeadlessGl::new();
        {
            let mut program = ShaderProgram::<TestFlavor, _>::new(gl.clone());
            program.load(VERT, FRAG).unwrap();
        }
        assert_eq!(gl.live_programs(), 0);
        assert!(gl.errors().is_empty());
    }

    #[test]
    fn attribute_pointers_follow_declarations() {
        let gl = HeadlessGl::new();
        let mut program = ShaderProgram::<TestFlavor, _>::new(gl.clone());
        program.load(VERT, FRAG).unwrap();
        gl.clear_calls();

        program.set_attrib_pointer("vertex_pos2d", 8, 0).unwrap();
        program.set_attrib_pointer("not_declared", 8, 0).unwrap();
        program.enable_attrib_pointers().unwrap();

        use crate::graphics::headless::GlCall;
        assert_eq!(gl.calls(), vec![
            GlCall::AttribPointer { index: 0, components: 2, stride: 8, offset: 0 },
            GlCall::EnableAttrib(0),
        ]);
    }

    #[test]
    fn missing_files_fail_the_load() {
        let gl = HeadlessGl::new();
        let mut program = ShaderProgram::<TestFlavor, _>::new(gl.clone());

        let result = program.load_from_files(Path::new("no/such/dir"));

        assert!(matches!(result, Err(ShaderError::Io { .. })));
        assert_eq!(program.state(), ProgramState::Unloaded);
    }
}
