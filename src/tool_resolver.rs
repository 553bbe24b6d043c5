//! # Tool Path Resolver
//!
//! Finds the external codec binary (ffmpeg) once at startup:
//! - Explicit path from the configuration or `--ffmpeg`
//! - Tools directory from `FLAC_CONVERTER_TOOLS_DIR`
//! - `tools/` next to the executable
//! - System `PATH`
//!
//! The resolved path is stored in `Config::ffmpeg_path` and never changes
//! during a run.

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ConvertError;

/// Environment variable pointing at a directory of bundled tools
pub const TOOLS_DIR_ENV: &str = "FLAC_CONVERTER_TOOLS_DIR";

/// Tool path resolver for different deployment environments
pub struct ToolPathResolver {
    /// Directory where tools may be bundled
    tools_dir: Option<PathBuf>,
}

impl ToolPathResolver {
    /// Create a resolver, reading the bundled tools location from the environment
    pub fn new() -> Self {
        Self {
            tools_dir: Self::detect_bundled_tools_dir(),
        }
    }

    /// Create a resolver that only looks in `tools_dir` and `PATH`
    pub fn with_tools_dir(tools_dir: Option<PathBuf>) -> Self {
        Self { tools_dir }
    }

    fn detect_bundled_tools_dir() -> Option<PathBuf> {
        if let Some(dir) = env::var_os(TOOLS_DIR_ENV) {
            let tools_path = PathBuf::from(dir);
            debug!("Checking {}: {:?}", TOOLS_DIR_ENV, tools_path);
            if tools_path.is_dir() {
                return Some(tools_path);
            }
            warn!("{} is set but {:?} is not a directory", TOOLS_DIR_ENV, tools_path);
        }

        let exe_path = env::current_exe().ok()?;
        let tools_path = exe_path.parent()?.join("tools");
        if tools_path.is_dir() {
            debug!("Found tools directory next to executable: {:?}", tools_path);
            return Some(tools_path);
        }

        None
    }

    /// Resolve `tool_name`, preferring `explicit` when it names an existing file.
    ///
    /// A bare command name in `explicit` (e.g. `ffmpeg7`) is looked up under
    /// that name in the tools directory and `PATH`.
    pub fn resolve(&self, tool_name: &str, explicit: Option<&Path>) -> Result<PathBuf, ConvertError> {
        if let Some(path) = explicit {
            if path.components().count() > 1 || path.is_absolute() {
                if path.is_file() {
                    debug!("Using configured {}: {:?}", tool_name, path);
                    return Ok(path.to_path_buf());
                }
                return Err(ConvertError::MissingDependency(format!(
                    "{} not found at configured path {}",
                    tool_name,
                    path.display()
                )));
            }

            let command = path.to_string_lossy();
            if command != tool_name {
                return self.resolve_tool(&command).ok_or_else(|| {
                    ConvertError::MissingDependency(format!(
                        "configured {} command {} not found in the tools directory or PATH",
                        tool_name, command
                    ))
                });
            }
        }

        self.resolve_tool(tool_name).ok_or_else(|| {
            ConvertError::MissingDependency(format!(
                "{} is required for audio conversion. {}",
                tool_name,
                Self::install_instructions(tool_name)
            ))
        })
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        if let Some(ref tools_dir) = self.tools_dir {
            let bundled_path = tools_dir.join(Self::executable_name(tool_name));
            if bundled_path.is_file() {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled_path);
                return Some(bundled_path);
            }
        }

        let system_path = Self::find_in_system_path(tool_name);
        if system_path.is_none() {
            warn!("Tool not found: {}", tool_name);
        }
        system_path
    }

    fn executable_name(tool_name: &str) -> String {
        if cfg!(windows) {
            format!("{}.exe", tool_name)
        } else {
            tool_name.to_string()
        }
    }

    /// Find tool in system PATH
    fn find_in_system_path(tool_name: &str) -> Option<PathBuf> {
        let executable = Self::executable_name(tool_name);
        env::split_paths(&env::var_os("PATH")?)
            .map(|dir| dir.join(&executable))
            .find(|path| path.is_file())
    }

    fn install_instructions(tool_name: &str) -> String {
        if cfg!(target_os = "linux") {
            format!("Install it with: sudo apt-get install {}", tool_name)
        } else if cfg!(target_os = "macos") {
            format!("Install it with: brew install {}", tool_name)
        } else {
            format!(
                "Install it and add it to PATH, or set {} to a directory containing {}",
                TOOLS_DIR_ENV,
                Self::executable_name(tool_name)
            )
        }
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_tool_preferred() {
        let temp_dir = TempDir::new().unwrap();
        let fake = temp_dir.path().join(ToolPathResolver::executable_name("fakecodec"));
        std::fs::write(&fake, b"").unwrap();

        let resolver = ToolPathResolver::with_tools_dir(Some(temp_dir.path().to_path_buf()));
        assert_eq!(resolver.resolve_tool("fakecodec"), Some(fake.clone()));
        assert_eq!(resolver.resolve("fakecodec", None).unwrap(), fake);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let resolver = ToolPathResolver::with_tools_dir(None);
        let err = resolver
            .resolve("ffmpeg", Some(Path::new("/definitely/not/here/ffmpeg")))
            .unwrap_err();
        assert!(matches!(err, ConvertError::MissingDependency(_)));
    }

    #[test]
    fn test_explicit_existing_file_wins() {
        let temp_dir = TempDir::new().unwrap();
        let custom = temp_dir.path().join("my-ffmpeg");
        std::fs::write(&custom, b"").unwrap();

        let resolver = ToolPathResolver::with_tools_dir(None);
        assert_eq!(resolver.resolve("ffmpeg", Some(&custom)).unwrap(), custom);
    }

    #[test]
    fn test_explicit_command_name_is_looked_up() {
        let temp_dir = TempDir::new().unwrap();
        let renamed = temp_dir.path().join(ToolPathResolver::executable_name("ffmpeg7"));
        std::fs::write(&renamed, b"").unwrap();

        let resolver = ToolPathResolver::with_tools_dir(Some(temp_dir.path().to_path_buf()));
        assert_eq!(resolver.resolve("ffmpeg", Some(Path::new("ffmpeg7"))).unwrap(), renamed);

        let err = resolver
            .resolve("ffmpeg", Some(Path::new("ffmpeg-not-installed-xyz")))
            .unwrap_err();
        assert!(err.to_string().contains("ffmpeg-not-installed-xyz"));
    }

    #[test]
    fn test_missing_tool_reports_dependency() {
        let resolver = ToolPathResolver::with_tools_dir(None);
        let err = resolver
            .resolve("no-such-codec-binary-xyz", None)
            .unwrap_err();
        assert!(err.to_string().contains("no-such-codec-binary-xyz"));
    }
}
