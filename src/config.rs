use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::FixedOffset;
use serde::Deserialize;

use crate::color::DEFAULT_FALLBACK_COLOR;
use crate::error::{FleetError, Result};
use crate::record::normalize_id;

/// Top-level pipeline configuration, usually read from a TOML file.
///
/// ```toml
/// [palette]
/// policy = "static"
/// fallback = "#999"
/// colors = { L07 = "#e41a1c", L08 = "#377eb8" }
///
/// [display]
/// utc_offset_minutes = 480
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub palette: PaletteConfig,
    pub display: DisplayConfig,
}

/// How facility colors are populated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PaletteConfig {
    /// Fixed id→color table; unknown ids get `fallback`.
    Static {
        #[serde(default)]
        colors: HashMap<String, String>,
        #[serde(default = "default_fallback")]
        fallback: String,
    },
    /// Random color per new id. Seed for reproducible runs.
    Random {
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Colors from `colors` in order, wrapping.
    Cycle { colors: Vec<String> },
}

impl PaletteConfig {
    /// Reject palettes whose meaning would depend on iteration order or that
    /// cannot produce a color.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Static { colors, .. } => {
                let mut seen: HashMap<String, &str> = HashMap::new();
                for id in colors.keys() {
                    if id.trim().is_empty() {
                        return Err(FleetError::Config(
                            "static palette ids must not be blank".to_string(),
                        ));
                    }
                    if let Some(other) = seen.insert(normalize_id(id), id) {
                        return Err(FleetError::Config(format!(
                            "static palette ids '{other}' and '{id}' name the same facility"
                        )));
                    }
                }
                Ok(())
            }
            Self::Cycle { colors } if colors.is_empty() => Err(FleetError::Config(
                "cycle palette needs at least one color".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self::Random { seed: None }
    }
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK_COLOR.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Fixed offset popup timestamps are shown in
    pub utc_offset_minutes: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 8 * 60,
        }
    }
}

impl DisplayConfig {
    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                FleetError::Config(format!(
                    "utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                ))
            })
    }
}

impl PipelineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FleetError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.palette.validate()?;
        config.display.offset()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config.palette, PaletteConfig::Random { seed: None });
        assert_eq!(config.display.utc_offset_minutes, 480);
    }

    #[test]
    fn parses_static_palette() {
        let config = PipelineConfig::from_toml_str(
            r##"
            [palette]
            policy = "static"
            colors = { L07 = "#e41a1c" }
            "##,
        )
        .unwrap();
        match config.palette {
            PaletteConfig::Static { colors, fallback } => {
                assert_eq!(colors.get("L07").map(String::as_str), Some("#e41a1c"));
                assert_eq!(fallback, "#999");
            }
            other => panic!("unexpected palette: {other:?}"),
        }
    }

    #[test]
    fn parses_cycle_and_display() {
        let config = PipelineConfig::from_toml_str(
            r##"
            [palette]
            policy = "cycle"
            colors = ["#111111", "#222222"]

            [display]
            utc_offset_minutes = 0
            "##,
        )
        .unwrap();
        assert_eq!(
            config.palette,
            PaletteConfig::Cycle {
                colors: vec!["#111111".into(), "#222222".into()]
            }
        );
        assert_eq!(config.display.offset().unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let err = PipelineConfig::from_toml_str("[display]\nutc_offset_minutes = 100000\n");
        assert!(matches!(err, Err(FleetError::Config(_))));
    }

    #[test]
    fn rejects_offset_that_overflows_seconds() {
        let err = PipelineConfig::from_toml_str("[display]\nutc_offset_minutes = 100000000\n");
        assert!(matches!(err, Err(FleetError::Config(_))));
        let err = PipelineConfig::from_toml_str("[display]\nutc_offset_minutes = -2147483648\n");
        assert!(matches!(err, Err(FleetError::Config(_))));
    }

    #[test]
    fn rejects_static_ids_that_normalize_alike() {
        let err = PipelineConfig::from_toml_str(
            r##"
            [palette]
            policy = "static"
            colors = { l07 = "#e41a1c", " L07" = "#377eb8" }
            "##,
        );
        assert!(matches!(err, Err(FleetError::Config(_))));
    }

    #[test]
    fn rejects_empty_cycle() {
        let err = PipelineConfig::from_toml_str("[palette]\npolicy = \"cycle\"\ncolors = []\n");
        assert!(matches!(err, Err(FleetError::Config(_))));
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = PipelineConfig::from_toml_str("[palette]\npolicy = \"rainbow\"\n");
        assert!(matches!(err, Err(FleetError::Toml(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[palette]\npolicy = \"random\"\nseed = 42").unwrap();
        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.palette, PaletteConfig::Random { seed: Some(42) });
    }
}
