use std::{fs, io, path::{Path, PathBuf}, str::FromStr};

use clap::Parser;
use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Command line overrides for the config file.
#[derive(Debug, Parser)]
#[command(name = "korori", about = "Korori OpenGL framework demo")]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "korori.toml")]
    pub config: PathBuf,

    /// Start in desktop fullscreen
    #[arg(long)]
    pub fullscreen: bool,

    /// Window width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Directory holding the shader sources
    #[arg(long)]
    pub shader_dir: Option<PathBuf>,

    /// One of off, error, warn, info, debug, trace
    #[arg(long)]
    pub log_level: Option<LevelFilter>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevel(pub LevelFilter);

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel(LevelFilter::Info)
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: serde::Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        match LevelFilter::from_str(&s) {
            Ok(v) => Ok(LogLevel(v)),
            Err(_) => Err(serde::de::Error::custom(format!("Failed parsing log level '{}'", s)))
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Resolution the UI is authored against; letterboxed in fullscreen.
    pub logical_width: u32,
    pub logical_height: u32,
    pub fullscreen: bool,
    pub vsync: bool,
    pub target_fps: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "Korori - Test".to_owned(),
            screen_width: 640,
            screen_height: 480,
            logical_width: 640,
            logical_height: 480,
            fullscreen: false,
            vsync: true,
            target_fps: 60,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShaderConfig {
    pub dir: PathBuf,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        ShaderConfig { dir: PathBuf::from("res/shaders") }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub shaders: ShaderConfig,
    pub log_level: LogLevel,
}

/// Where a loaded config came from. Logged by the caller once logging is up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Defaults,
}

impl Config {
    /// Reads `path`, falling back to the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<(Config, ConfigSource), ConfigError> {
        if !path.exists() {
            return Ok((Config::default(), ConfigSource::Defaults));
        }

        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io { path: path.to_path_buf(), source: e })?;
        Ok((Config::parse(&text)?, ConfigSource::File))
    }

    pub fn parse(text: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_cli(self: &mut Self, cli: &Cli) {
        if cli.fullscreen {
            self.window.fullscreen = true;
        }
        if let Some(w) = cli.width {
            self.window.screen_width = w;
        }
        if let Some(h) = cli.height {
            self.window.screen_height = h;
        }
        if let Some(dir) = &cli.shader_dir {
            self.shaders.dir = dir.clone();
        }
        if let Some(level) = cli.log_level {
            self.log_level = LogLevel(level);
        }
    }
}
