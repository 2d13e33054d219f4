//! Orthogonal wavelet filter banks.

use crate::error::WaveletError;

static HAAR: [f64; 2] = [std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2];

static DB2: [f64; 4] = [
    0.482_962_913_144_690_25,
    0.836_516_303_737_469,
    0.224_143_868_041_857_35,
    -0.129_409_522_550_921_45,
];

static DB3: [f64; 6] = [
    0.332_670_552_950_956_9,
    0.806_891_509_313_338_8,
    0.459_877_502_119_331_3,
    -0.135_011_020_010_390_84,
    -0.085_441_273_882_241_49,
    0.035_226_291_882_100_656,
];

static DB4: [f64; 8] = [
    0.230_377_813_308_855_23,
    0.714_846_570_552_541_5,
    0.630_880_767_929_590_4,
    -0.027_983_769_416_983_85,
    -0.187_034_811_718_881_14,
    0.030_841_381_835_986_965,
    0.032_883_011_666_982_945,
    -0.010_597_401_784_997_278,
];

static SYM4: [f64; 8] = [
    0.032_223_100_604_042_7,
    -0.012_603_967_262_037_833,
    -0.099_219_543_576_847_22,
    0.297_857_795_605_277_36,
    0.803_738_751_805_916_1,
    0.497_618_667_632_015_45,
    -0.029_635_527_645_998_51,
    -0.075_765_714_789_273_33,
];

/// Supported orthogonal wavelet filters for the decimated transform.
///
/// | Variant | Taps | Also known as |
/// |---------|------|---------------|
/// | [`WaveletFilter::Haar`] | 2 | `db1` |
/// | [`WaveletFilter::D4`] | 4 | `db2` |
/// | [`WaveletFilter::D6`] | 6 | `db3` |
/// | [`WaveletFilter::D8`] | 8 | `db4` |
/// | [`WaveletFilter::La8`] | 8 | `sym4` |
///
/// # Example
///
/// ```ignore
/// use telemine_wavelet::WaveletFilter;
///
/// let filter = WaveletFilter::from_name("db4")?;
/// assert_eq!(filter, WaveletFilter::D8);
/// assert_eq!(filter.length(), 8);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaveletFilter {
    /// Haar wavelet (length 2).
    Haar,
    /// Daubechies D4 wavelet (length 4).
    D4,
    /// Daubechies D6 wavelet (length 6).
    D6,
    /// Daubechies D8 wavelet (length 8).
    D8,
    /// Least Asymmetric LA(8) wavelet (length 8).
    La8,
}

impl Default for WaveletFilter {
    /// Returns `WaveletFilter::D8`, the 8-tap Daubechies filter.
    fn default() -> Self {
        Self::D8
    }
}

impl WaveletFilter {
    /// Returns the filter length (number of coefficients).
    pub fn length(&self) -> usize {
        self.scaling_coeffs().len()
    }

    /// Returns the reconstruction low-pass (scaling) coefficients.
    ///
    /// The coefficients sum to `sqrt(2)` and have unit energy.
    pub fn scaling_coeffs(&self) -> &'static [f64] {
        match self {
            Self::Haar => &HAAR,
            Self::D4 => &DB2,
            Self::D6 => &DB3,
            Self::D8 => &DB4,
            Self::La8 => &SYM4,
        }
    }

    /// Returns the reconstruction high-pass (wavelet) coefficients.
    ///
    /// Derived from the scaling coefficients via the quadrature mirror
    /// relationship `g[k] = (-1)^k h[L-1-k]`.
    pub fn wavelet_coeffs(&self) -> Vec<f64> {
        let h = self.scaling_coeffs();
        let l = h.len();
        (0..l)
            .map(|k| {
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                sign * h[l - 1 - k]
            })
            .collect()
    }

    /// Returns the decomposition low-pass filter (time-reversed scaling filter).
    pub fn dec_lo(&self) -> Vec<f64> {
        self.scaling_coeffs().iter().rev().copied().collect()
    }

    /// Returns the decomposition high-pass filter (time-reversed wavelet filter).
    pub fn dec_hi(&self) -> Vec<f64> {
        let mut g = self.wavelet_coeffs();
        g.reverse();
        g
    }

    /// Parses a wavelet filter from a case-insensitive name string.
    ///
    /// Both the length-based names (`d8`, `la8`) and the vanishing-moment
    /// names (`db4`, `sym4`) are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`WaveletError::UnsupportedFilter`] if the name is not recognized.
    pub fn from_name(name: &str) -> Result<Self, WaveletError> {
        match name.to_lowercase().as_str() {
            "haar" | "db1" => Ok(Self::Haar),
            "d4" | "db2" => Ok(Self::D4),
            "d6" | "db3" => Ok(Self::D6),
            "d8" | "db4" => Ok(Self::D8),
            "la8" | "sym4" => Ok(Self::La8),
            _ => Err(WaveletError::UnsupportedFilter(name.to_string())),
        }
    }
}

impl std::str::FromStr for WaveletFilter {
    type Err = WaveletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ALL: [WaveletFilter; 5] = [
        WaveletFilter::Haar,
        WaveletFilter::D4,
        WaveletFilter::D6,
        WaveletFilter::D8,
        WaveletFilter::La8,
    ];

    #[test]
    fn filter_lengths() {
        assert_eq!(WaveletFilter::Haar.length(), 2);
        assert_eq!(WaveletFilter::D4.length(), 4);
        assert_eq!(WaveletFilter::D6.length(), 6);
        assert_eq!(WaveletFilter::D8.length(), 8);
        assert_eq!(WaveletFilter::La8.length(), 8);
    }

    #[test]
    fn filter_default_is_d8() {
        assert_eq!(WaveletFilter::default(), WaveletFilter::D8);
    }

    #[test]
    fn scaling_coeffs_sum_to_sqrt2() {
        for filter in ALL {
            let sum: f64 = filter.scaling_coeffs().iter().sum();
            assert_abs_diff_eq!(sum, std::f64::consts::SQRT_2, epsilon = 1e-6);
        }
    }

    #[test]
    fn scaling_coeffs_unit_energy() {
        for filter in ALL {
            let energy: f64 = filter.scaling_coeffs().iter().map(|h| h * h).sum();
            assert_abs_diff_eq!(energy, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn wavelet_coeffs_sum_to_zero() {
        for filter in ALL {
            let sum: f64 = filter.wavelet_coeffs().iter().sum();
            assert_abs_diff_eq!(sum, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn haar_wavelet_coeffs() {
        let g = WaveletFilter::Haar.wavelet_coeffs();
        assert_abs_diff_eq!(g[0], std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-15);
        assert_abs_diff_eq!(g[1], -std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-15);
    }

    #[test]
    fn decomposition_filters_are_reversed() {
        let f = WaveletFilter::D4;
        let mut lo = f.dec_lo();
        lo.reverse();
        assert_eq!(lo, f.scaling_coeffs());
    }

    #[test]
    fn from_name_aliases() {
        assert_eq!(WaveletFilter::from_name("haar").unwrap(), WaveletFilter::Haar);
        assert_eq!(WaveletFilter::from_name("DB1").unwrap(), WaveletFilter::Haar);
        assert_eq!(WaveletFilter::from_name("db2").unwrap(), WaveletFilter::D4);
        assert_eq!(WaveletFilter::from_name("D6").unwrap(), WaveletFilter::D6);
        assert_eq!(WaveletFilter::from_name("db4").unwrap(), WaveletFilter::D8);
        assert_eq!(WaveletFilter::from_name("Sym4").unwrap(), WaveletFilter::La8);
        assert_eq!("la8".parse::<WaveletFilter>().unwrap(), WaveletFilter::La8);
    }

    #[test]
    fn from_name_invalid() {
        let err = WaveletFilter::from_name("coif4").unwrap_err();
        assert!(matches!(err, WaveletError::UnsupportedFilter(ref s) if s == "coif4"));
    }
}
