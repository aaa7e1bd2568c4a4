use bevy::prelude::*;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::grid::MAX_GRID_DEPTH;

/// Largest generated heightmap edge, in texels.
pub const MAX_PERLIN_RESOLUTION: u32 = 8192;

// --- Config ---

#[derive(Resource, Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Cells along one edge of the terrain grid.
    pub depth: i32,
    /// World-space edge length of the terrain square.
    pub extent: f32,
    pub height_scale: f32,
    pub height_offset: f32,
    pub color_srgb: (f32, f32, f32),
    pub heightmap: HeightmapSource,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            depth: 128,
            extent: 4.0,
            height_scale: 1.5,
            height_offset: -0.8,
            color_srgb: (0.5, 0.5, 0.5),
            heightmap: HeightmapSource::Flat,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub enum HeightmapSource {
    /// Single black texel, so every vertex sits at `height_offset`.
    Flat,
    /// Image asset path, relative to the asset folder.
    Image { path: String },
    Perlin(PerlinSettings),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerlinSettings {
    pub seed: u64,
    pub resolution: u32,
    /// Noise frequency in cycles per texel.
    pub base_frequency: f64,
    pub octaves: u32,
    pub persistence: f64,
}

impl Default for PerlinSettings {
    fn default() -> Self {
        Self {
            seed: 12345,
            resolution: 256,
            base_frequency: 0.02,
            octaves: 4,
            persistence: 0.5,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read terrain config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse terrain config ron: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid terrain config: {0}")]
    Invalid(String),
}

impl TerrainConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: TerrainConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth <= 0 || self.depth > MAX_GRID_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "depth must be in 1..={MAX_GRID_DEPTH}, got {}",
                self.depth
            )));
        }
        if !self.extent.is_finite() || self.extent <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "extent must be finite and positive, got {}",
                self.extent
            )));
        }
        if !self.height_scale.is_finite() || !self.height_offset.is_finite() {
            return Err(ConfigError::Invalid(
                "height_scale and height_offset must be finite".to_string(),
            ));
        }

        match &self.heightmap {
            HeightmapSource::Flat => {}
            HeightmapSource::Image { path } => {
                if path.trim().is_empty() {
                    return Err(ConfigError::Invalid(
                        "heightmap image path is empty".to_string(),
                    ));
                }
            }
            HeightmapSource::Perlin(p) => {
                if p.resolution == 0 || p.resolution > MAX_PERLIN_RESOLUTION {
                    return Err(ConfigError::Invalid(format!(
                        "perlin resolution must be in 1..={MAX_PERLIN_RESOLUTION}, got {}",
                        p.resolution
                    )));
                }
                if p.octaves == 0 {
                    return Err(ConfigError::Invalid(
                        "perlin octaves must be at least 1".to_string(),
                    ));
                }
                if !p.base_frequency.is_finite() || !p.persistence.is_finite() {
                    return Err(ConfigError::Invalid(
                        "perlin frequency and persistence must be finite".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

// --- Components ---

#[derive(Component)]
pub struct Terrain;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(TerrainConfig::default().validate().is_ok());
        let perlin = TerrainConfig {
            heightmap: HeightmapSource::Perlin(PerlinSettings::default()),
            ..default()
        };
        assert!(perlin.validate().is_ok());
    }

    #[test]
    fn partial_ron_keeps_defaults() {
        let config = TerrainConfig::from_ron_str(
            "(depth: 16, heightmap: Perlin((seed: 7, octaves: 2)))",
        )
        .unwrap();
        assert_eq!(config.depth, 16);
        assert_eq!(config.extent, 4.0);
        let HeightmapSource::Perlin(p) = config.heightmap else {
            panic!("expected perlin source");
        };
        assert_eq!(p.seed, 7);
        assert_eq!(p.octaves, 2);
        assert_eq!(p.resolution, 256);
    }

    #[test]
    fn image_source_parses() {
        let config =
            TerrainConfig::from_ron_str(r#"(heightmap: Image(path: "heightmap.png"))"#).unwrap();
        assert_eq!(
            config.heightmap,
            HeightmapSource::Image {
                path: "heightmap.png".to_string()
            }
        );
    }

    #[test]
    fn rejects_bad_values() {
        for text in [
            "(depth: 0)",
            "(depth: 65535)",
            "(extent: -1.0)",
            r#"(heightmap: Image(path: ""))"#,
            "(heightmap: Perlin((resolution: 0)))",
            "(heightmap: Perlin((resolution: 4000000000)))",
            "(heightmap: Perlin((octaves: 0)))",
        ] {
            assert!(
                matches!(TerrainConfig::from_ron_str(text), Err(ConfigError::Invalid(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn malformed_ron_is_a_parse_error() {
        assert!(matches!(
            TerrainConfig::from_ron_str("(depth: "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            TerrainConfig::from_ron_file("does/not/exist.ron"),
            Err(ConfigError::Io { .. })
        ));
    }
}
