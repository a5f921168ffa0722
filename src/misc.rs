use nalgebra::{Vector3, Vector4};

// Plain vertex and color layouts shared with the GPU. All #[repr(C)] so
// `size_of` and `offset_of!` give the stride and offsets for attribute
// pointers.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect { x, y, w, h }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Size {
    pub w: f32,
    pub h: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct TexCoord2D {
    pub s: f32,
    pub t: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct VertexPos2D {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct VertexPos3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Normal {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct VertexTex2D {
    pub position: VertexPos2D,
    pub texcoord: TexCoord2D,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct VertexTexNorm3D {
    pub position: VertexPos3D,
    pub texcoord: TexCoord2D,
    pub normal: Normal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Color3 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color3 {
    pub fn new(r: f32, g: f32, b: f32) -> Color3 {
        Color3 { r, g, b }
    }
}

impl From<Color3> for Vector3<f32> {
    fn from(c: Color3) -> Self {
        Vector3::new(c.r, c.g, c.b)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Color4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4 {
    pub const WHITE: Color4 = Color4 { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Color4 {
        Color4 { r, g, b, a }
    }
}

impl From<Color4> for Vector4<f32> {
    fn from(c: Color4) -> Self {
        Vector4::new(c.r, c.g, c.b, c.a)
    }
}

/// One vertex of the double multicolor shader.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct MultiColor2D {
    pub pos: VertexPos2D,
    pub color1: Color4,
    pub color2: Color4,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub shine_damper: f32,
    pub reflectivity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Material { shine_damper: 1.0, reflectivity: 0.0 }
    }
}
