//! Typed wrappers around [`ShaderProgram`](super::shader::ShaderProgram), one
//! per shader family. Each holds CPU-side mirrors of its uniforms; mutate a
//! mirror, then call the matching `update_*` while the program is bound.

pub mod font;
pub mod multicolor;
pub mod terrain;
pub mod textured;

pub use font::{FontFlavor, FontProgram};
pub use multicolor::{MultiColorFlavor, MultiColorProgram};
pub use terrain::{TerrainFlavor, TerrainProgram};
pub use textured::{TexturedFlavor, TexturedProgram};

// attribute names
pub const VERTEX_POS2D: &str = "vertex_pos2d";
pub const VERTEX_POS3D: &str = "vertex_pos3d";
pub const TEXCOORD: &str = "texcoord";
pub const NORMAL: &str = "normal";
pub const MULTICOLOR1: &str = "multicolor1";
pub const MULTICOLOR2: &str = "multicolor2";

// uniform names
pub const PROJECTION_MATRIX: &str = "projection_matrix";
pub const VIEW_MATRIX: &str = "view_matrix";
pub const MODEL_MATRIX: &str = "model_matrix";
pub const MODELVIEW_MATRIX: &str = "modelview_matrix";
pub const TEXTURE_SAMPLER: &str = "texture_sampler";
pub const TEXTURE_COLOR: &str = "texture_color";
pub const TEXT_COLOR: &str = "text_color";
