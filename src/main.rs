use std::{cell::{Cell, RefCell}, error::Error, ffi::CStr, mem::{offset_of, size_of}, process::ExitCode, ptr::null, rc::Rc};

use clap::Parser;
use log::{error, info, warn};
use nalgebra::{Matrix4, Vector3};
use sdl2::{event::Event, keyboard::Keycode};

use korori::{
    config::{Cli, Config, ConfigSource},
    frametimer::{FrameClock, Step},
    graphics::{
        buffer::{Buffer, BufferTarget, VertexArray},
        flavor::{FontProgram, MultiColorProgram, TerrainProgram, TexturedProgram},
        gfx::NativeGl,
        texture::{Texture, TexturedQuad},
    },
    logging,
    misc::{Color4, MultiColor2D, VertexPos2D},
    ui::button::{Button, ButtonState},
    viewport::{ViewAdapter, ViewTransforms},
    window::Window,
};

const CHECKER_SIZE: i32 = 64;
const CHECKER_CELL: i32 = 8;

struct Programs {
    multicolor: MultiColorProgram,
    textured: TexturedProgram,
    font: FontProgram,
    terrain: TerrainProgram,
}

impl Programs {
    fn load(config: &Config) -> Result<Programs, Box<dyn Error>> {
        let dir = &config.shaders.dir;

        let mut multicolor = MultiColorProgram::new(NativeGl);
        multicolor.load_from_files(dir)?;
        let mut textured = TexturedProgram::new(NativeGl);
        textured.load_from_files(dir)?;
        let mut font = FontProgram::new(NativeGl);
        font.load_from_files(dir)?;
        let mut terrain = TerrainProgram::new(NativeGl);
        terrain.load_from_files(dir)?;

        Ok(Programs { multicolor, textured, font, terrain })
    }

    /// Pushes the current projection and base model transforms to every
    /// program.
    fn apply_view(self: &mut Self, transforms: &ViewTransforms) -> Result<(), Box<dyn Error>> {
        self.multicolor.projection_matrix = transforms.ui_projection;
        self.multicolor.modelview_matrix = transforms.base_ui_model;
        self.multicolor.bind()?;
        self.multicolor.update_projection_matrix()?;
        self.multicolor.update_modelview_matrix()?;
        self.multicolor.unbind()?;

        self.textured.projection_matrix = transforms.ui_projection;
        self.textured.model_matrix = transforms.base_ui_model;
        self.textured.bind()?;
        self.textured.update_projection_matrix()?;
        self.textured.update_view_matrix()?;
        self.textured.update_model_matrix()?;
        self.textured.update_texture_color()?;
        self.textured.set_texture_sampler(0)?;
        self.textured.unbind()?;

        self.font.projection_matrix = transforms.ui_projection;
        self.font.model_matrix = transforms.base_ui_model;
        self.font.bind()?;
        self.font.update_projection_matrix()?;
        self.font.update_view_matrix()?;
        self.font.update_model_matrix()?;
        self.font.update_text_color()?;
        self.font.set_texture_sampler(0)?;
        self.font.unbind()?;

        self.terrain.projection_matrix = transforms.projection;
        self.terrain.bind()?;
        self.terrain.update_projection_matrix()?;
        self.terrain.update_view_matrix()?;
        self.terrain.update_model_matrix()?;
        self.terrain.update_lights(None)?;
        self.terrain.update_shininess()?;
        self.terrain.update_ambient_color()?;
        self.terrain.update_fog_enabled()?;
        self.terrain.update_sky_color()?;
        self.terrain.unbind()?;

        unsafe {
            let (x, y, w, h) = transforms.viewport();
            gl::Viewport(x, y, w, h);

            match transforms.scissor() {
                Some((x, y, w, h)) => {
                    gl::Enable(gl::SCISSOR_TEST);
                    gl::Scissor(x, y, w, h);
                }
                None => gl::Disable(gl::SCISSOR_TEST),
            }
        }

        Ok(())
    }

    fn destroy(self: &mut Self) {
        self.terrain.destroy();
        self.font.destroy();
        self.textured.destroy();
        self.multicolor.destroy();
    }
}

/// A two-tone quad drawn with the multicolor program.
struct ColorQuad {
    vao: VertexArray,
    _vertices: Buffer,
    _indices: Buffer,
}

impl ColorQuad {
    fn new(program: &MultiColorProgram, w: f32, h: f32) -> Result<ColorQuad, Box<dyn Error>> {
        let vertex = |x: f32, y: f32, color1: Color4, color2: Color4| MultiColor2D { pos: VertexPos2D { x, y }, color1, color2 };
        let red = Color4::new(1.0, 0.2, 0.2, 1.0);
        let blue = Color4::new(0.2, 0.3, 1.0, 1.0);
        let vertices = [
            vertex(0.0, 0.0, red, Color4::WHITE),
            vertex(w, 0.0, blue, Color4::WHITE),
            vertex(w, h, red, blue),
            vertex(0.0, h, blue, red),
        ];
        let indices: [u32; 6] = [0, 1, 2, 0, 2, 3];

        let vao = VertexArray::new()?;
        vao.bind();
        let vertex_buffer = Buffer::new(BufferTarget::Vertex, &vertices)?;
        let index_buffer = Buffer::new(BufferTarget::Index, &indices)?;

        let stride = size_of::<MultiColor2D>() as i32;
        let result = program.set_vertex_pointer(stride, offset_of!(MultiColor2D, pos))
            .and_then(|_| program.set_multicolor1_pointer(stride, offset_of!(MultiColor2D, color1)))
            .and_then(|_| program.set_multicolor2_pointer(stride, offset_of!(MultiColor2D, color2)))
            .and_then(|_| program.enable_attrib_pointers());
        vao.unbind();
        result?;

        Ok(ColorQuad { vao, _vertices: vertex_buffer, _indices: index_buffer })
    }

    fn render(self: &Self, program: &MultiColorProgram) -> Result<(), Box<dyn Error>> {
        program.update_modelview_matrix()?;
        self.vao.bind();
        unsafe {
            gl::DrawElements(gl::TRIANGLES, 6, gl::UNSIGNED_INT, null());
        }
        self.vao.unbind();
        Ok(())
    }
}

fn checkerboard() -> Vec<u8> {
    let mut pixels = Vec::with_capacity((CHECKER_SIZE * CHECKER_SIZE * 4) as usize);
    for y in 0..CHECKER_SIZE {
        for x in 0..CHECKER_SIZE {
            let v = if (x / CHECKER_CELL + y / CHECKER_CELL) % 2 == 0 { 255 } else { 64 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    pixels
}

fn gl_string(name: u32) -> String {
    let ptr = unsafe { gl::GetString(name) };
    if ptr.is_null() {
        return String::from("unknown");
    }
    unsafe { CStr::from_ptr(ptr as *const _) }.to_string_lossy().into_owned()
}

fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    let sdl = sdl2::init()?;
    let sdl_video = sdl.video()?;
    let sdl_timer = sdl.timer()?;

    {
        let gl_attr = sdl_video.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(3, 3);
        gl_attr.set_double_buffer(true);
    }

    let wc = &config.window;
    let mut window = Window::new(&sdl_video, &wc.title, wc.screen_width, wc.screen_height, wc.fullscreen)?;

    let _gl_context = window.sdl_window().gl_create_context()?;
    gl::load_with(|s| sdl_video.gl_get_proc_address(s) as *const _);
    info!("{} (GL: {})", gl_string(gl::RENDERER), gl_string(gl::VERSION));

    if wc.vsync {
        if let Err(e) = sdl_video.gl_set_swap_interval(1) {
            warn!("Unable to enable vsync: {}", e);
        }
    }

    unsafe {
        gl::Enable(gl::BLEND);
        gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
        gl::ClearColor(0.0, 0.0, 0.0, 1.0);
    }

    let adapter = Rc::new(RefCell::new(ViewAdapter::new(
        wc.screen_width as i32,
        wc.screen_height as i32,
        wc.logical_width as i32,
        wc.logical_height as i32,
    )));
    let view_dirty = Rc::new(Cell::new(true));
    {
        let adapter = adapter.clone();
        let view_dirty = view_dirty.clone();
        window.set_resize_callback(move |id, w, h| {
            adapter.borrow_mut().set_screen_dimension(id, w, h);
            view_dirty.set(true);
        });
    }
    if wc.fullscreen {
        let (w, h) = window.size();
        adapter.borrow_mut().go_fullscreen(w, h);
    }

    let mut programs = Programs::load(config)?;
    let color_quad = ColorQuad::new(&programs.multicolor, 128.0, 96.0)?;
    let checker = Texture::from_rgba8(CHECKER_SIZE, CHECKER_SIZE, &checkerboard())?;
    let checker_quad = TexturedQuad::new(&programs.textured, &checker, None)?;

    let (logical_w, logical_h) = adapter.borrow().logical_size();
    let color_pos = Vector3::new(logical_w as f32 * 0.25 - 64.0, logical_h as f32 * 0.5 - 48.0, 0.0);
    let checker_pos = Vector3::new(logical_w as f32 * 0.75 - 32.0, logical_h as f32 * 0.5 - 32.0, 0.0);
    let mut color_button = Button::new();

    let mut clock = FrameClock::with_target_fps(wc.target_fps);
    let mut prev_tick = sdl_timer.performance_counter();
    let timer_freq = 1.0 / (sdl_timer.performance_frequency() as f64);
    let mut spin = 0.0f32;

    let mut event_pump = sdl.event_pump()?;
    'main: loop {
        let cur_tick = sdl_timer.performance_counter();
        let dt = ((cur_tick - prev_tick) as f64 * timer_freq) as f32;
        prev_tick = cur_tick;

        if let Step::Fixed(delta) = clock.advance(dt) {
            for event in event_pump.poll_iter() {
                match event {
                    Event::Quit { .. } | Event::KeyDown { keycode: Some(Keycode::Escape), .. } => break 'main,
                    Event::KeyDown { keycode: Some(Keycode::Return), repeat: false, .. } => {
                        let fullscreen = !window.state().fullscreen;
                        window.set_fullscreen(fullscreen)?;
                        if fullscreen {
                            let (w, h) = window.size();
                            adapter.borrow_mut().go_fullscreen(w, h);
                        } else {
                            adapter.borrow_mut().go_windowed();
                        }
                        view_dirty.set(true);
                    }
                    _ => {}
                }

                window.handle_event(&event);

                let rect = {
                    let adapter = adapter.borrow();
                    let t = adapter.transforms();
                    let lb = &t.letterbox;
                    let x = lb.offset_x + (color_pos.x * lb.scale_x) as i32;
                    let y = lb.offset_y + (color_pos.y * lb.scale_y) as i32;
                    sdl2::rect::Rect::new(x, y, (128.0 * lb.scale_x) as u32, (96.0 * lb.scale_y) as u32)
                };
                if color_button.handle_event(&event, rect) == ButtonState::MouseUp {
                    info!("Average FPS: {:.1}", clock.average_fps());
                }
            }

            spin += delta;
        }

        if view_dirty.replace(false) {
            let transforms = *adapter.borrow().transforms();
            programs.apply_view(&transforms)?;
        }

        if window.state().minimized {
            continue;
        }

        let base = adapter.borrow().transforms().base_ui_model;
        unsafe {
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }

        programs.multicolor.bind()?;
        programs.multicolor.modelview_matrix = base * Matrix4::new_translation(&color_pos);
        color_quad.render(&programs.multicolor)?;
        programs.multicolor.unbind()?;

        let pulse = 0.75 + 0.25 * spin.sin();
        programs.textured.bind()?;
        programs.textured.texture_color = Color4::new(pulse, pulse, 1.0, 1.0).into();
        programs.textured.update_texture_color()?;
        programs.textured.model_matrix = base * Matrix4::new_translation(&checker_pos);
        checker_quad.render(&programs.textured, &checker)?;
        programs.textured.unbind()?;

        window.sdl_window().gl_swap_window();
    }

    drop(checker_quad);
    drop(checker);
    drop(color_quad);
    programs.destroy();

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut config, source) = match Config::load(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    config.apply_cli(&cli);

    if let Err(e) = logging::init(config.log_level.0) {
        eprintln!("Unable to install logger: {}", e);
    }

    if source == ConfigSource::Defaults {
        info!("No config at {}, using defaults", cli.config.display());
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
