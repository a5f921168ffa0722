use std::path::PathBuf;

use korori::graphics::{
    error::ShaderError,
    flavor::{FontFlavor, FontProgram, MultiColorFlavor, MultiColorProgram, TerrainFlavor, TerrainProgram, TexturedFlavor, TexturedProgram, MODELVIEW_MATRIX, PROJECTION_MATRIX},
    headless::{GlCall, HeadlessGl, UniformData},
    light::{LightEntry, MAX_LIGHTS},
    location::element_name,
    shader::{ProgramState, ShaderFlavor},
    uniform::{LIGHT_COLOR, LIGHT_NUM, LIGHT_POSITION},
};
use nalgebra::{Matrix4, Vector3};

fn shader_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("res").join("shaders")
}

#[test]
fn every_flavor_loads_from_the_bundled_sources() {
    let gl = HeadlessGl::new();

    let mut multicolor = MultiColorProgram::new(gl.clone());
    let mut textured = TexturedProgram::new(gl.clone());
    let mut font = FontProgram::new(gl.clone());
    let mut terrain = TerrainProgram::new(gl.clone());

    multicolor.load_from_files(&shader_dir()).unwrap();
    textured.load_from_files(&shader_dir()).unwrap();
    font.load_from_files(&shader_dir()).unwrap();
    terrain.load_from_files(&shader_dir()).unwrap();

    for (state, handle, unresolved) in [
        (multicolor.state(), multicolor.handle(), multicolor.locations().unresolved()),
        (textured.state(), textured.handle(), textured.locations().unresolved()),
        (font.state(), font.handle(), font.locations().unresolved()),
        (terrain.state(), terrain.handle(), terrain.locations().unresolved()),
    ] {
        assert_eq!(state, ProgramState::Ready);
        assert!(handle.map(|h| h.get() != 0).unwrap_or(false));
        assert!(unresolved.is_empty(), "unresolved names: {:?}", unresolved);
    }

    // linked programs keep no shader objects alive
    assert_eq!(gl.live_shaders(), 0);
    assert_eq!(gl.live_programs(), 4);

    terrain.destroy();
    font.destroy();
    textured.destroy();
    multicolor.destroy();

    assert_eq!(gl.live_programs(), 0);
    assert!(gl.errors().is_empty(), "{:?}", gl.errors());
}

const BROKEN_FRAGMENT: &str = "#version 330 core\nvoid main() {\n";

fn vertex_source(path: &str) -> String {
    std::fs::read_to_string(shader_dir().join(path)).unwrap()
}

fn assert_compile_error(result: Result<(), ShaderError>) {
    assert!(matches!(result, Err(ShaderError::Compile { .. })), "{:?}", result);
}

#[test]
fn broken_fragment_shader_leaves_nothing_allocated() {
    let gl = HeadlessGl::new();

    let mut multicolor = MultiColorProgram::new(gl.clone());
    let mut textured = TexturedProgram::new(gl.clone());
    let mut font = FontProgram::new(gl.clone());
    let mut terrain = TerrainProgram::new(gl.clone());

    assert_compile_error(multicolor.load(&vertex_source(MultiColorFlavor::VERTEX_PATH), BROKEN_FRAGMENT));
    assert_compile_error(textured.load(&vertex_source(TexturedFlavor::VERTEX_PATH), BROKEN_FRAGMENT));
    assert_compile_error(font.load(&vertex_source(FontFlavor::VERTEX_PATH), BROKEN_FRAGMENT));
    assert_compile_error(terrain.load(&vertex_source(TerrainFlavor::VERTEX_PATH), BROKEN_FRAGMENT));

    for (state, handle) in [
        (multicolor.state(), multicolor.handle()),
        (textured.state(), textured.handle()),
        (font.state(), font.handle()),
        (terrain.state(), terrain.handle()),
    ] {
        assert_eq!(state, ProgramState::Unloaded);
        assert!(handle.is_none());
    }

    assert_eq!(gl.live_shaders(), 0);
    assert_eq!(gl.live_programs(), 0);

    assert!(matches!(multicolor.update_projection_matrix(), Err(ShaderError::NotReady)));
    assert!(matches!(textured.update_projection_matrix(), Err(ShaderError::NotReady)));
    assert!(matches!(font.update_text_color(), Err(ShaderError::NotReady)));
    assert!(matches!(terrain.update_lights(None), Err(ShaderError::NotReady)));
}

#[test]
fn destroy_then_reload_succeeds() {
    let gl = HeadlessGl::new();
    let mut font = FontProgram::new(gl.clone());

    font.load_from_files(&shader_dir()).unwrap();
    font.destroy();
    assert!(matches!(font.bind(), Err(ShaderError::Destroyed)));

    font.load_from_files(&shader_dir()).unwrap();
    assert!(font.is_ready());
    font.bind().unwrap();
    font.update_text_color().unwrap();
    font.unbind().unwrap();

    font.destroy();
    assert_eq!(gl.live_programs(), 0);
    assert!(gl.errors().is_empty(), "{:?}", gl.errors());
}

#[test]
fn multicolor_scene_uploads_exactly_two_matrices() {
    let gl = HeadlessGl::new();
    let mut multicolor = MultiColorProgram::new(gl.clone());
    multicolor.load_from_files(&shader_dir()).unwrap();
    let id = multicolor.handle().map(|h| h.get()).unwrap();

    multicolor.projection_matrix = Matrix4::identity();
    multicolor.modelview_matrix = Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0));

    multicolor.bind().unwrap();
    gl.clear_calls();
    multicolor.update_projection_matrix().unwrap();
    multicolor.update_modelview_matrix().unwrap();

    let projection = gl.uniform_location_of(id, PROJECTION_MATRIX).unwrap();
    let modelview = gl.uniform_location_of(id, MODELVIEW_MATRIX).unwrap();
    assert_eq!(gl.take_calls(), vec![
        GlCall::Uniform { program: id, location: projection, value: UniformData::Mat4(Matrix4::identity()) },
        GlCall::Uniform {
            program: id,
            location: modelview,
            value: UniformData::Mat4(Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0))),
        },
    ]);

    multicolor.destroy();
}

#[test]
fn partial_light_upload_leaves_upper_slots_alone() {
    let gl = HeadlessGl::new();
    let mut terrain = TerrainProgram::new(gl.clone());
    terrain.load_from_files(&shader_dir()).unwrap();
    let id = terrain.handle().map(|h| h.get()).unwrap();

    let dim = Vector3::new(0.1, 0.1, 0.1);
    for i in 0..MAX_LIGHTS {
        terrain.lights.push(LightEntry::new(Vector3::new(i as f32, 0.0, 0.0), dim, 0.5)).unwrap();
    }

    terrain.bind().unwrap();
    assert_eq!(terrain.update_lights(None).unwrap(), MAX_LIGHTS);

    for i in 0..MAX_LIGHTS {
        terrain.lights.set(i, LightEntry::new(Vector3::new(0.0, i as f32, 0.0), Vector3::new(1.0, 1.0, 1.0), 1.0));
    }
    assert_eq!(terrain.update_lights(Some(3)).unwrap(), 3);

    assert_eq!(gl.uniform_value(id, LIGHT_NUM), Some(UniformData::Int(3)));
    for i in 0..3 {
        assert_eq!(gl.uniform_value(id, &element_name(LIGHT_POSITION, i)), Some(UniformData::Vec3(Vector3::new(0.0, i as f32, 0.0))));
    }
    for i in 3..MAX_LIGHTS {
        assert_eq!(gl.uniform_value(id, &element_name(LIGHT_POSITION, i)), Some(UniformData::Vec3(Vector3::new(i as f32, 0.0, 0.0))));
        assert_eq!(gl.uniform_value(id, &element_name(LIGHT_COLOR, i)), Some(UniformData::Vec3(dim)));
    }

    terrain.destroy();
}

#[test]
fn reload_replaces_the_program_and_resets_mirrors() {
    let gl = HeadlessGl::new();
    let mut terrain = TerrainProgram::new(gl.clone());
    terrain.load_from_files(&shader_dir()).unwrap();

    terrain.fog_enabled = true;
    terrain.sky_color = Vector3::new(1.0, 0.0, 0.0);
    terrain.load_from_files(&shader_dir()).unwrap();

    assert!(!terrain.fog_enabled);
    assert_eq!(terrain.sky_color, Vector3::new(0.5, 0.5, 0.5));
    assert_eq!(gl.live_programs(), 1);

    terrain.destroy();
}
