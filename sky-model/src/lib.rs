//! sky-model - Linear operators for sky image reconstruction
//!
//! Every stage of the forward model is a [`LinearOperator`] with an exact
//! adjoint:
//!
//! - **Convolution** - zero-padded same-size correlation with an odd kernel
//! - **AbelTransform** - projection of a symmetric radial profile to an image
//! - **Wavelet** - orthonormal periodized wavelet synthesis basis
//! - **Spline** - King-profile spline basis
//! - **Blur** - King PSF convolution
//! - **ForwardModel** - the composite map from a source vector to an image,
//!   built by hand or from a [`ForwardModelConfig`] JSON file
//!
//! # Example
//!
//! ```
//! use sky_array::NumericArray;
//! use sky_model::{ForwardModel, ForwardModelConfig, LinearOperator};
//!
//! let config = ForwardModelConfig {
//!     pic_size: 8,
//!     ..ForwardModelConfig::default()
//! };
//! let mut model = ForwardModel::from_config(&config)?;
//!
//! let source = NumericArray::filled(1.0, model.width(), 1)?;
//! let image = model.apply(source.view())?;
//! assert_eq!(image.len(), 64);
//!
//! model.transpose()?;
//! let back = model.apply(image.view())?;
//! assert_eq!(back.len(), source.len());
//! # Ok::<(), sky_model::ModelError>(())
//! ```

pub mod abel;
pub mod blur;
pub mod config;
pub mod convolution;
pub mod error;
pub mod forward_model;
pub mod matmult;
pub mod operator;
pub mod spline;
pub mod wavelet;

pub use abel::AbelTransform;
pub use blur::Blur;
pub use config::{BlurConfig, ForwardModelConfig, ModelModes, WaveletConfig};
pub use convolution::Convolution;
pub use error::{ModelError, Result};
pub use forward_model::ForwardModel;
pub use matmult::MatMult;
pub use operator::LinearOperator;
pub use spline::Spline;
pub use wavelet::{Wavelet, WaveletFamily};
