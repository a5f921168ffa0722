use std::{fs, io, mem::{offset_of, size_of}, path::{Path, PathBuf}, ptr::null};

use log::info;
use thiserror::Error;

use crate::misc::{Rect, TexCoord2D, VertexPos2D, VertexTex2D};

use super::{buffer::{Buffer, BufferTarget, CreateFailed, VertexArray}, error::ShaderError, flavor::TexturedProgram, gfx::GlBackend};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("unable to read texture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to decode QOI image: {0}")]
    Decode(#[from] qoi::Error),
    #[error("expected {expected} bytes of pixel data, got {found}")]
    DataSize { expected: usize, found: usize },
    #[error(transparent)]
    CreateFailed(#[from] CreateFailed),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    RGB565,
    RGBA4444,
    RGBA8888,
}

impl TextureFormat {
    /// `(internal format, format, type)` for `glTexImage2D`.
    fn gl_format(self: &Self) -> (u32, u32, u32) {
        match self {
            TextureFormat::RGB565 => (gl::RGB, gl::RGB, gl::UNSIGNED_SHORT_5_6_5),
            TextureFormat::RGBA4444 => (gl::RGBA, gl::RGBA, gl::UNSIGNED_SHORT_4_4_4_4),
            TextureFormat::RGBA8888 => (gl::RGBA, gl::RGBA, gl::UNSIGNED_BYTE),
        }
    }

    pub fn bytes_per_pixel(self: &Self) -> usize {
        match self {
            TextureFormat::RGB565 | TextureFormat::RGBA4444 => 2,
            TextureFormat::RGBA8888 => 4,
        }
    }
}

/// RGBA8 pixels decoded from an image file.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decodes a QOI image, expanding RGB sources to RGBA.
pub fn decode_qoi(bytes: &[u8]) -> Result<Image, TextureError> {
    let (header, pixels) = qoi::decode_to_vec(bytes)?;

    let rgba = match header.channels {
        qoi::Channels::Rgba => pixels,
        qoi::Channels::Rgb => pixels.chunks_exact(3).flat_map(|p| [p[0], p[1], p[2], 255]).collect(),
    };

    Ok(Image { width: header.width, height: header.height, rgba })
}

/// Normalized texture coordinates of a pixel clip rectangle:
/// `(left, right, top, bottom)`.
pub fn clip_texcoords(clip: &Rect, texture_width: i32, texture_height: i32) -> (f32, f32, f32, f32) {
    let w = texture_width.max(1) as f32;
    let h = texture_height.max(1) as f32;

    (clip.x / w, (clip.x + clip.w) / w, clip.y / h, (clip.y + clip.h) / h)
}

/// GL 2D texture, deleted on drop.
pub struct Texture {
    fmt: TextureFormat,
    w: i32,
    h: i32,
    handle: u32,
}

impl Texture {
    pub fn new(fmt: TextureFormat, w: i32, h: i32) -> Result<Texture, TextureError> {
        let mut handle = 0;
        unsafe {
            gl::GenTextures(1, &mut handle);
        }

        if handle == 0 {
            return Err(CreateFailed("texture").into());
        }

        let (internal_fmt, gl_fmt, gl_type) = fmt.gl_format();
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, handle);
            gl::TexImage2D(gl::TEXTURE_2D, 0, internal_fmt as i32, w, h, 0, gl_fmt, gl_type, null());
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as i32);
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }

        Ok(Texture { fmt, w, h, handle })
    }

    pub fn from_rgba8(w: i32, h: i32, pixels: &[u8]) -> Result<Texture, TextureError> {
        let mut texture = Texture::new(TextureFormat::RGBA8888, w, h)?;
        texture.set_texture_data(pixels)?;
        Ok(texture)
    }

    pub fn load_qoi(path: &Path) -> Result<Texture, TextureError> {
        let bytes = fs::read(path).map_err(|e| TextureError::Io { path: path.to_path_buf(), source: e })?;
        let image = decode_qoi(&bytes)?;
        info!("Loaded texture {} ({}x{})", path.display(), image.width, image.height);

        Texture::from_rgba8(image.width as i32, image.height as i32, &image.rgba)
    }

    /// Replaces the whole image. `data` is raw texels in this texture's
    /// format.
    pub fn set_texture_data(self: &mut Self, data: &[u8]) -> Result<(), TextureError> {
        let expected = self.w.max(0) as usize * self.h.max(0) as usize * self.fmt.bytes_per_pixel();
        if data.len() != expected {
            return Err(TextureError::DataSize { expected, found: data.len() });
        }

        let (_, gl_fmt, gl_type) = self.fmt.gl_format();
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, self.handle);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexSubImage2D(gl::TEXTURE_2D, 0, 0, 0, self.w, self.h, gl_fmt, gl_type, data.as_ptr() as *const _);
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }

        Ok(())
    }

    /// Binds to texture unit `unit` (the value given to a sampler uniform).
    pub fn bind(self: &Self, unit: u32) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl::TEXTURE_2D, self.handle);
        }
    }

    pub fn width(self: &Self) -> i32 {
        self.w
    }

    pub fn height(self: &Self) -> i32 {
        self.h
    }

    pub fn format(self: &Self) -> TextureFormat {
        self.fmt
    }

    pub fn handle(self: &Self) -> u32 {
        self.handle
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteTextures(1, &self.handle);
        }
    }
}

/// Quad geometry for drawing a texture, or a clipped region of one, with
/// its top-left corner at the model origin.
pub struct TexturedQuad {
    vao: VertexArray,
    _vertices: Buffer,
    _indices: Buffer,
    width: f32,
    height: f32,
}

impl TexturedQuad {
    /// Builds the quad and records the textured program's attribute layout
    /// in its vertex array.
    pub fn new<G: GlBackend>(program: &TexturedProgram<G>, texture: &Texture, clip: Option<Rect>) -> Result<TexturedQuad, QuadError> {
        let clip = clip.unwrap_or(Rect::new(0.0, 0.0, texture.width() as f32, texture.height() as f32));
        let (left, right, top, bottom) = clip_texcoords(&clip, texture.width(), texture.height());

        let vertex = |x: f32, y: f32, s: f32, t: f32| VertexTex2D { position: VertexPos2D { x, y }, texcoord: TexCoord2D { s, t } };
        let vertices = [
            vertex(0.0, 0.0, left, top),
            vertex(clip.w, 0.0, right, top),
            vertex(clip.w, clip.h, right, bottom),
            vertex(0.0, clip.h, left, bottom),
        ];
        let indices: [u32; 6] = [0, 1, 2, 0, 2, 3];

        let vao = VertexArray::new().map_err(TextureError::from)?;
        vao.bind();
        let vertex_buffer = Buffer::new(BufferTarget::Vertex, &vertices).map_err(TextureError::from)?;
        let index_buffer = Buffer::new(BufferTarget::Index, &indices).map_err(TextureError::from)?;

        let stride = size_of::<VertexTex2D>() as i32;
        let result = program.set_vertex_pointer(stride, offset_of!(VertexTex2D, position))
            .and_then(|_| program.set_texcoord_pointer(stride, offset_of!(VertexTex2D, texcoord)))
            .and_then(|_| program.enable_attrib_pointers());
        vao.unbind();
        result?;

        Ok(TexturedQuad { vao, _vertices: vertex_buffer, _indices: index_buffer, width: clip.w, height: clip.h })
    }

    pub fn size(self: &Self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Draws with the program's current model matrix. The program must be
    /// bound and its sampler pointed at unit 0.
    pub fn render<G: GlBackend>(self: &Self, program: &TexturedProgram<G>, texture: &Texture) -> Result<(), ShaderError> {
        program.update_model_matrix()?;
        texture.bind(0);
        self.vao.bind();
        unsafe {
            gl::DrawElements(gl::TRIANGLES, 6, gl::UNSIGNED_INT, null());
        }
        self.vao.unbind();
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum QuadError {
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_images_expand_to_rgba() {
        let encoded = qoi::encode_to_vec([255u8, 0, 0, 0, 255, 0], 2, 1).unwrap();
        let image = decode_qoi(&encoded).unwrap();

        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.rgba, vec![255, 0, 0, 255, 0, 255, 0, 255]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(decode_qoi(b"not an image"), Err(TextureError::Decode(_))));
    }

    #[test]
    fn clip_rect_maps_to_normalized_coordinates() {
        let (left, right, top, bottom) = clip_texcoords(&Rect::new(320.0, 0.0, 64.0, 64.0), 512, 256);

        assert_eq!((left, right), (0.625, 0.75));
        assert_eq!((top, bottom), (0.0, 0.25));
    }
}
