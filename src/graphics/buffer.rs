use std::mem::size_of_val;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("driver failed to create a {0} object")]
pub struct CreateFailed(pub &'static str);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferTarget {
    Vertex,
    Index,
}

impl BufferTarget {
    fn gl_enum(self: &Self) -> u32 {
        match self {
            BufferTarget::Vertex => gl::ARRAY_BUFFER,
            BufferTarget::Index => gl::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// GL buffer object holding a fixed slice of vertex or index data. The
/// contents are set once at creation; build a new buffer to change them.
pub struct Buffer {
    handle: u32,
    target: BufferTarget,
}

impl Buffer {
    pub fn new<T>(target: BufferTarget, data: &[T]) -> Result<Buffer, CreateFailed> {
        let mut handle = 0;
        let size = size_of_val(data) as isize;
        unsafe {
            gl::GenBuffers(1, &mut handle);

            if handle == 0 {
                return Err(CreateFailed("buffer"));
            }

            gl::BindBuffer(target.gl_enum(), handle);
            gl::BufferData(target.gl_enum(), size, data.as_ptr() as *const _, gl::STATIC_DRAW);
        }

        Ok(Buffer { handle, target })
    }

    pub fn bind(self: &Self) {
        unsafe {
            gl::BindBuffer(self.target.gl_enum(), self.handle);
        }
    }

    pub fn handle(self: &Self) -> u32 {
        self.handle
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteBuffers(1, &self.handle);
        }
    }
}

/// Vertex array object. Records attribute pointers and the bound index
/// buffer while it is bound.
pub struct VertexArray {
    handle: u32,
}

impl VertexArray {
    pub fn new() -> Result<VertexArray, CreateFailed> {
        let mut handle = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut handle);
        }

        if handle == 0 {
            return Err(CreateFailed("vertex array"));
        }

        Ok(VertexArray { handle })
    }

    pub fn bind(self: &Self) {
        unsafe {
            gl::BindVertexArray(self.handle);
        }
    }

    pub fn unbind(self: &Self) {
        unsafe {
            gl::BindVertexArray(0);
        }
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteVertexArrays(1, &self.handle);
        }
    }
}
