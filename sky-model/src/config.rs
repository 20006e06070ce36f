//! JSON configuration for building a [`ForwardModel`](crate::ForwardModel).

use crate::error::{ModelError, Result};
use crate::wavelet::WaveletFamily;
use log::debug;
use serde::{Deserialize, Serialize};
use sky_array::NumericArray;
use std::path::{Path, PathBuf};

/// Which components of the source vector reach the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelModes {
    pub apply_wavelet: bool,
    pub apply_spline: bool,
    pub include_point_source: bool,
}

impl Default for ModelModes {
    fn default() -> Self {
        Self {
            apply_wavelet: true,
            apply_spline: true,
            include_point_source: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveletConfig {
    pub family: WaveletFamily,
    pub coarsest_level: usize,
}

impl Default for WaveletConfig {
    fn default() -> Self {
        Self {
            family: WaveletFamily::Daubechies4,
            coarsest_level: 2,
        }
    }
}

/// King PSF parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurConfig {
    /// Fraction of the peak below which the kernel is cut.
    pub threshold: f64,
    /// Core radius in pixels.
    pub r0: f64,
    /// Power-law slope.
    pub alpha: f64,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            threshold: 0.01,
            r0: 1.5,
            alpha: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardModelConfig {
    /// Side of the square image in pixels.
    pub pic_size: usize,
    pub wavelet: WaveletConfig,
    pub blur: BlurConfig,
    #[serde(default)]
    pub modes: ModelModes,
    /// Degree of parallelism for every operator.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Raw binary exposure map of `pic_size²` values. All ones when absent.
    #[serde(default)]
    pub sensitivity: Option<PathBuf>,
    /// Raw binary scaling of the `2 * pic_size + pic_size²` source vector.
    /// All ones when absent.
    #[serde(default)]
    pub standardization: Option<PathBuf>,
}

fn default_workers() -> usize {
    1
}

impl Default for ForwardModelConfig {
    fn default() -> Self {
        Self {
            pic_size: 64,
            wavelet: WaveletConfig::default(),
            blur: BlurConfig::default(),
            modes: ModelModes::default(),
            workers: default_workers(),
            sensitivity: None,
            standardization: None,
        }
    }
}

impl ForwardModelConfig {
    /// Length of the source vector the model consumes.
    pub fn source_len(&self) -> usize {
        2 * self.pic_size + self.pic_size * self.pic_size
    }

    /// Length of the image the model produces.
    pub fn image_len(&self) -> usize {
        self.pic_size * self.pic_size
    }

    /// Check the values that do not depend on any file.
    pub fn validate(&self) -> Result<()> {
        if !self.pic_size.is_power_of_two() || self.pic_size < 2 {
            return Err(ModelError::Config(format!(
                "pic_size must be a power of two of at least 2, got {}",
                self.pic_size
            )));
        }
        let levels = self.pic_size.trailing_zeros() as usize;
        if self.wavelet.coarsest_level >= levels {
            return Err(ModelError::Config(format!(
                "wavelet.coarsest_level must be below {levels}, got {}",
                self.wavelet.coarsest_level
            )));
        }
        let BlurConfig {
            threshold,
            r0,
            alpha,
        } = self.blur;
        if !(0.0..1.0).contains(&threshold) {
            return Err(ModelError::Config(format!(
                "blur.threshold must lie in [0, 1), got {threshold}"
            )));
        }
        if !(r0.is_finite() && r0 > 0.0 && alpha.is_finite() && alpha > 0.0) {
            return Err(ModelError::Config(format!(
                "blur.r0 and blur.alpha must be positive, got {r0} and {alpha}"
            )));
        }
        Ok(())
    }

    /// Save to a JSON file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ModelError::Config(format!("could not serialize config: {e}")))?;
        std::fs::write(path, json).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| ModelError::Config(format!("{}: {e}", path.display())))?;
        debug!("loaded forward model config from {}", path.display());
        Ok(config)
    }

    /// Sensitivity column, read from disk or all ones.
    pub fn load_sensitivity(&self) -> Result<NumericArray<f64>> {
        load_correction(self.sensitivity.as_deref(), self.image_len())
    }

    /// Standardization column, read from disk or all ones.
    pub fn load_standardization(&self) -> Result<NumericArray<f64>> {
        load_correction(self.standardization.as_deref(), self.source_len())
    }
}

fn load_correction(path: Option<&Path>, len: usize) -> Result<NumericArray<f64>> {
    match path {
        Some(path) => Ok(NumericArray::read_binary(path, len, 1)?),
        None => Ok(NumericArray::filled(1.0, len, 1)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_helpers::output_path;

    #[test]
    fn test_default_is_valid() {
        let config = ForwardModelConfig::default();
        config.validate().unwrap();
        assert_eq!(config.source_len(), 2 * 64 + 64 * 64);
    }

    #[test]
    fn test_json_round_trip() {
        let config = ForwardModelConfig {
            pic_size: 16,
            modes: ModelModes {
                apply_spline: false,
                ..ModelModes::default()
            },
            workers: 3,
            sensitivity: Some(PathBuf::from("exposure.bin")),
            ..ForwardModelConfig::default()
        };
        let path = output_path("forward_model_config.json");

        config.save_to_file(&path).unwrap();
        let loaded = ForwardModelConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "pic_size": 8,
            "wavelet": { "family": "haar", "coarsest_level": 0 },
            "blur": { "threshold": 0.1, "r0": 1.0, "alpha": 2.0 }
        }"#;
        let config: ForwardModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.modes, ModelModes::default());
        assert_eq!(config.workers, 1);
        assert!(config.sensitivity.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_size = ForwardModelConfig {
            pic_size: 12,
            ..ForwardModelConfig::default()
        };
        assert!(matches!(bad_size.validate(), Err(ModelError::Config(_))));

        let bad_level = ForwardModelConfig {
            pic_size: 8,
            wavelet: WaveletConfig {
                family: WaveletFamily::Haar,
                coarsest_level: 3,
            },
            ..ForwardModelConfig::default()
        };
        assert!(bad_level.validate().is_err());

        let mut bad_blur = ForwardModelConfig::default();
        bad_blur.blur.r0 = 0.0;
        assert!(bad_blur.validate().is_err());
    }

    #[test]
    fn test_missing_corrections_are_ones() {
        let config = ForwardModelConfig {
            pic_size: 4,
            wavelet: WaveletConfig {
                family: WaveletFamily::Haar,
                coarsest_level: 0,
            },
            ..ForwardModelConfig::default()
        };
        let standardization = config.load_standardization().unwrap();
        assert_eq!(standardization.shape(), (24, 1));
        assert!(standardization.as_slice().iter().all(|&v| v == 1.0));
        assert_eq!(config.load_sensitivity().unwrap().len(), 16);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ForwardModelConfig::load_from_file(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(ModelError::Io { .. })));
    }
}
