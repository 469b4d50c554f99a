//! Persistent renderer settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::util::Result;

/// Renderer settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Texture atlas
    pub texture_width: u32,
    pub texture_height: u32,

    // Dispatch
    pub workgroup_size: [u32; 2],
    pub resolve_rows: u32, // Y size of the geometry resolution grid

    // Camera
    pub fov_degrees: f32,
    pub near_plane: f32,

    // WGSL trace kernel; nothing is traced without one
    pub trace_kernel: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            texture_width: 512,
            texture_height: 512,
            workgroup_size: [8, 8],
            resolve_rows: 32,
            fov_degrees: 45.0,
            near_plane: 0.1,
            trace_kernel: None,
        }
    }
}

impl Settings {
    /// Default settings file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("rtscene");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), %err, "ignoring unreadable settings");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Load settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        Ok(settings.validated())
    }

    /// Save settings as pretty JSON, creating parent directories
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Save to the default location
    pub fn save(&self) -> Result<()> {
        match Self::path() {
            Some(path) => self.save_to(path),
            None => Ok(()),
        }
    }

    /// Clamp values the dispatch math divides by
    pub fn validated(mut self) -> Self {
        self.workgroup_size = self.workgroup_size.map(|n| n.max(1));
        self.resolve_rows = self.resolve_rows.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            texture_width: 256,
            fov_degrees: 60.0,
            trace_kernel: Some(PathBuf::from("kernels/trace.wgsl")),
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "resolve_rows": 0, "workgroup_size": [16, 0] }"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.resolve_rows, 1);
        assert_eq!(settings.workgroup_size, [16, 1]);
        assert_eq!(settings.texture_width, 512);
        assert_eq!(settings.trace_kernel, None);
    }

    #[test]
    fn test_validation_keeps_empty_atlas() {
        let settings = Settings {
            texture_width: 0,
            texture_height: 0,
            workgroup_size: [0, 4],
            resolve_rows: 0,
            ..Default::default()
        }
        .validated();
        assert_eq!((settings.texture_width, settings.texture_height), (0, 0));
        assert_eq!(settings.workgroup_size, [1, 4]);
        assert_eq!(settings.resolve_rows, 1);
    }

    #[test]
    fn test_default_path() {
        if let Some(path) = Settings::path() {
            assert!(path.ends_with("rtscene/settings.json"));
        }
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(crate::util::Error::Settings(_))));
        assert!(matches!(
            Settings::load_from(dir.path().join("missing.json")),
            Err(crate::util::Error::Io(_))
        ));
    }
}
