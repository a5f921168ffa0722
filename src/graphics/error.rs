use std::{ffi::NulError, io, path::PathBuf};

use thiserror::Error;

use super::{gfx::ShaderStage, uniform::UniformKind};

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("unable to read shader source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("error attaching {stage} shader:\n{log}")]
    Attach { stage: ShaderStage, log: String },
    #[error("program failed to link:\n{log}")]
    Link { log: String },
    #[error("driver failed to create a {0} object")]
    CreateFailed(&'static str),
    #[error("shader program is not loaded")]
    NotReady,
    #[error("shader program has been destroyed")]
    Destroyed,
    #[error("uniform {name} is declared as {expected:?} but got a {found:?} value")]
    UniformKind { name: String, expected: UniformKind, found: UniformKind },
    #[error("invalid semantic name: {0}")]
    InvalidName(#[from] NulError),
}
