extern crate sdl2;
extern crate gl;

pub mod config;
pub mod frametimer;
pub mod graphics;
pub mod logging;
pub mod misc;
pub mod ui;
pub mod viewport;
pub mod window;
