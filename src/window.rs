use log::info;
use sdl2::{event::{Event, WindowEvent}, video::{FullscreenType, Window as SdlWindow, WindowBuildError}, VideoSubsystem};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window could not be created: {0}")]
    Build(#[from] WindowBuildError),
    #[error("SDL error: {0}")]
    Sdl(String),
}

/// Window flags tracked from SDL window events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowState {
    pub width: i32,
    pub height: i32,
    pub mouse_focus: bool,
    pub keyboard_focus: bool,
    pub minimized: bool,
    pub shown: bool,
    pub fullscreen: bool,
}

impl WindowState {
    pub fn new(width: i32, height: i32, fullscreen: bool) -> WindowState {
        WindowState {
            width,
            height,
            mouse_focus: true,
            keyboard_focus: true,
            minimized: false,
            shown: true,
            fullscreen,
        }
    }

    /// Folds one event into the state. Returns the new size when the window
    /// was resized.
    pub fn apply(self: &mut Self, event: &WindowEvent) -> Option<(i32, i32)> {
        match event {
            WindowEvent::SizeChanged(w, h) => {
                self.width = *w;
                self.height = *h;
                return Some((*w, *h));
            }
            WindowEvent::Shown => self.shown = true,
            WindowEvent::Hidden => self.shown = false,
            WindowEvent::Enter => self.mouse_focus = true,
            WindowEvent::Leave => self.mouse_focus = false,
            WindowEvent::FocusGained => self.keyboard_focus = true,
            WindowEvent::FocusLost => self.keyboard_focus = false,
            WindowEvent::Minimized => self.minimized = true,
            WindowEvent::Maximized | WindowEvent::Restored => self.minimized = false,
            _ => {}
        }

        None
    }
}

pub type ResizeCallback = Box<dyn FnMut(u32, i32, i32)>;

/// OpenGL-capable SDL window.
pub struct Window {
    window: SdlWindow,
    state: WindowState,
    on_resize: Option<ResizeCallback>,
}

impl Window {
    pub fn new(video: &VideoSubsystem, title: &str, width: u32, height: u32, fullscreen: bool) -> Result<Window, WindowError> {
        let mut window = video
            .window(title, width, height)
            .opengl()
            .position_centered()
            .resizable()
            .build()?;

        if fullscreen {
            window.set_fullscreen(FullscreenType::Desktop).map_err(WindowError::Sdl)?;
        }

        let (w, h) = window.size();
        info!("Created window {} ({}x{})", window.id(), w, h);

        Ok(Window {
            window,
            state: WindowState::new(w as i32, h as i32, fullscreen),
            on_resize: None,
        })
    }

    /// Called with `(window_id, width, height)` whenever the window size
    /// changes, before the next frame renders.
    pub fn set_resize_callback<F>(self: &mut Self, callback: F) where F : FnMut(u32, i32, i32) + 'static {
        self.on_resize = Some(Box::new(callback));
    }

    pub fn handle_event(self: &mut Self, event: &Event) {
        if let Event::Window { window_id, win_event, .. } = event {
            if *window_id != self.window.id() {
                return;
            }

            if let WindowEvent::Close = win_event {
                self.window.hide();
            }

            if let Some((w, h)) = self.state.apply(win_event) {
                if let Some(callback) = self.on_resize.as_mut() {
                    callback(*window_id, w, h);
                }
            }
        }
    }

    pub fn set_fullscreen(self: &mut Self, fullscreen: bool) -> Result<(), WindowError> {
        let mode = if fullscreen { FullscreenType::Desktop } else { FullscreenType::Off };
        self.window.set_fullscreen(mode).map_err(WindowError::Sdl)?;
        self.state.fullscreen = fullscreen;
        Ok(())
    }

    pub fn focus(self: &mut Self) {
        if !self.state.shown {
            self.window.show();
        }
        self.window.raise();
    }

    pub fn size(self: &Self) -> (i32, i32) {
        let (w, h) = self.window.size();
        (w as i32, h as i32)
    }

    pub fn id(self: &Self) -> u32 {
        self.window.id()
    }

    pub fn state(self: &Self) -> &WindowState {
        &self.state
    }

    pub fn sdl_window(self: &Self) -> &SdlWindow {
        &self.window
    }
}
