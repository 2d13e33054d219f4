//! # telemine-wavelet
//!
//! Decimated wavelet transforms for telemetry denoising and energy-based
//! change detection.
//!
//! ## Analysis Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["TimeSeries::mean_filled(values)?"] -->|"fill gaps"| B["TimeSeries"]
//!     B -->|"wavedec(&ts, filter, level)?"| C["DwtCoeffs"]
//!     C -->|"waverec(&coeffs)?"| B
//!     B -->|"denoise(&ts, &config)?"| D["Vec&lt;f64&gt;"]
//!     B -->|"detail_energy(&ts, &config, window)?"| E["energy"]
//!     E -->|"change_points(&energy, k)"| F["indices"]
//! ```
//!
//! ## Supported Filters
//!
//! | Filter | Length | Family |
//! |--------|--------|--------|
//! | [`WaveletFilter::Haar`] | 2 | Haar |
//! | [`WaveletFilter::D4`] | 4 | Daubechies |
//! | [`WaveletFilter::D6`] | 6 | Daubechies |
//! | [`WaveletFilter::D8`] | 8 | Daubechies |
//! | [`WaveletFilter::La8`] | 8 | Least Asymmetric |
//!
//! ## Quick Start
//!
//! ```ignore
//! use telemine_wavelet::{DwtConfig, TimeSeries, denoise};
//!
//! let ts = TimeSeries::mean_filled(&pressure)?;
//! let clean = denoise(&ts, &DwtConfig::default())?;
//! assert_eq!(clean.len(), pressure.len());
//! ```

mod denoise;
mod dwt;
mod energy;
mod error;
mod filter;
mod series;

pub use denoise::{denoise, noise_sigma, soft_threshold, universal_threshold};
pub use dwt::{DwtCoeffs, DwtConfig, max_dwt_level, wavedec, waverec};
pub use energy::{DEFAULT_THRESHOLD_SIGMA, change_points, detail_energy};
pub use error::WaveletError;
pub use filter::WaveletFilter;
pub use series::TimeSeries;
