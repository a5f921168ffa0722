use std::f32::consts::FRAC_PI_4;

use nalgebra::{Matrix4, Vector3};

pub const UI_NEAR: f32 = -300.0;
pub const UI_FAR: f32 = 600.0;
pub const FOVY: f32 = FRAC_PI_4;
pub const PERSPECTIVE_NEAR: f32 = 0.01;
pub const PERSPECTIVE_FAR: f32 = 10000.0;

/// Placement of the logical view inside the physical window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    pub offset_x: i32,
    pub offset_y: i32,
    pub view_width: i32,
    pub view_height: i32,
    /// Resolution-independent scale from logical to view pixels.
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Letterbox {
    /// The view covers the whole window at 1:1.
    pub fn full(width: i32, height: i32) -> Letterbox {
        Letterbox {
            offset_x: 0,
            offset_y: 0,
            view_width: width,
            view_height: height,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Largest rectangle of the logical aspect ratio that fits the physical
    /// size, centred.
    pub fn fit(physical_width: i32, physical_height: i32, logical_width: i32, logical_height: i32) -> Letterbox {
        let (pw, ph) = (physical_width as i64, physical_height as i64);
        let (lw, lh) = (logical_width as i64, logical_height as i64);

        let (view_w, view_h) = if pw * lh > ph * lw {
            // window is wider than logical, bars left and right
            (((ph * lw) / lh).max(1), ph)
        }
        else {
            (pw, ((pw * lh) / lw).max(1))
        };

        Letterbox {
            offset_x: ((pw - view_w) / 2) as i32,
            offset_y: ((ph - view_h) / 2) as i32,
            view_width: view_w as i32,
            view_height: view_h as i32,
            scale_x: view_w as f32 / logical_width as f32,
            scale_y: view_h as f32 / logical_height as f32,
        }
    }
}

/// Everything derived from the window size and mode. Always rebuilt as a
/// whole so scale and matrices never disagree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransforms {
    pub letterbox: Letterbox,
    /// Restrict drawing to the letterboxed area.
    pub clip: bool,
    pub ui_projection: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub base_ui_model: Matrix4<f32>,
}

impl ViewTransforms {
    fn build(letterbox: Letterbox, clip: bool) -> ViewTransforms {
        let w = letterbox.view_width as f32;
        let h = letterbox.view_height as f32;

        ViewTransforms {
            letterbox,
            clip,
            ui_projection: Matrix4::new_orthographic(0.0, w, h, 0.0, UI_NEAR, UI_FAR),
            projection: Matrix4::new_perspective(w / h, FOVY, PERSPECTIVE_NEAR, PERSPECTIVE_FAR),
            base_ui_model: Matrix4::new_nonuniform_scaling(&Vector3::new(letterbox.scale_x, letterbox.scale_y, 1.0)),
        }
    }

    /// `(x, y, width, height)` for `glViewport`.
    pub fn viewport(self: &Self) -> (i32, i32, i32, i32) {
        let lb = &self.letterbox;
        (lb.offset_x, lb.offset_y, lb.view_width, lb.view_height)
    }

    /// Scissor rectangle, when clipping is on.
    pub fn scissor(self: &Self) -> Option<(i32, i32, i32, i32)> {
        if self.clip { Some(self.viewport()) } else { None }
    }
}

/// Keeps the view transforms in step with fullscreen toggles and resizes.
#[derive(Clone, Debug)]
pub struct ViewAdapter {
    screen_width: i32,
    screen_height: i32,
    logical_width: i32,
    logical_height: i32,
    /// Window size to restore when leaving fullscreen.
    windowed_size: (i32, i32),
    fullscreen: bool,
    transforms: ViewTransforms,
}

impl ViewAdapter {
    pub fn new(screen_width: i32, screen_height: i32, logical_width: i32, logical_height: i32) -> ViewAdapter {
        let screen_width = screen_width.max(1);
        let screen_height = screen_height.max(1);

        ViewAdapter {
            screen_width,
            screen_height,
            logical_width: logical_width.max(1),
            logical_height: logical_height.max(1),
            windowed_size: (screen_width, screen_height),
            fullscreen: false,
            transforms: ViewTransforms::build(Letterbox::full(screen_width, screen_height), false),
        }
    }

    pub fn go_fullscreen(self: &mut Self, physical_width: i32, physical_height: i32) -> &ViewTransforms {
        if !self.fullscreen {
            self.windowed_size = (self.screen_width, self.screen_height);
        }
        self.screen_width = physical_width.max(1);
        self.screen_height = physical_height.max(1);
        self.fullscreen = true;
        self.recompute()
    }

    pub fn go_windowed(self: &mut Self) -> &ViewTransforms {
        if self.fullscreen {
            (self.screen_width, self.screen_height) = self.windowed_size;
        }
        self.fullscreen = false;
        self.recompute()
    }

    /// Resize callback. Takes effect immediately in the current mode.
    pub fn set_screen_dimension(self: &mut Self, _window_id: u32, width: i32, height: i32) -> &ViewTransforms {
        self.screen_width = width.max(1);
        self.screen_height = height.max(1);
        self.recompute()
    }

    pub fn is_fullscreen(self: &Self) -> bool {
        self.fullscreen
    }

    pub fn screen_size(self: &Self) -> (i32, i32) {
        (self.screen_width, self.screen_height)
    }

    pub fn logical_size(self: &Self) -> (i32, i32) {
        (self.logical_width, self.logical_height)
    }

    pub fn transforms(self: &Self) -> &ViewTransforms {
        &self.transforms
    }

    fn recompute(self: &mut Self) -> &ViewTransforms {
        self.transforms = if self.fullscreen {
            ViewTransforms::build(Letterbox::fit(self.screen_width, self.screen_height, self.logical_width, self.logical_height), true)
        }
        else {
            ViewTransforms::build(Letterbox::full(self.screen_width, self.screen_height), false)
        };

        &self.transforms
    }
}
