pub mod buffer;
pub mod error;
pub mod flavor;
pub mod gfx;
pub mod headless;
pub mod light;
pub mod location;
pub mod shader;
pub mod texture;
pub mod uniform;
