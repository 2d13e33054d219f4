//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Context, Result, bail};

use crate::config::*;

use telemine_events::{DispatchOptions, WaveletConfig, WaveletFilter};
use telemine_io::{Compression, ReaderConfig, WriterConfig};

/// Parses a single-byte CSV delimiter. `\t` and `tab` select a tab.
pub fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => bail!("delimiter must be a single ASCII character, got {s:?}"),
    }
}

/// Builds a [`ReaderConfig`] from the TOML I/O configuration.
pub fn build_reader_config(io: &IoToml) -> Result<ReaderConfig> {
    let mut cfg = ReaderConfig::default()
        .with_time_column(&io.time_column)
        .with_delimiter(parse_delimiter(&io.delimiter)?);
    if let Some(ref channels) = io.channels {
        cfg = cfg.with_channels(channels.iter().cloned());
    }
    cfg.validate().context("invalid [io] reader settings")?;
    Ok(cfg)
}

/// Builds a [`WriterConfig`] from the TOML I/O configuration.
pub fn build_writer_config(io: &IoToml) -> Result<WriterConfig> {
    let compression = Compression::from_name(&io.compression).context("invalid [io].compression")?;
    Ok(WriterConfig::default()
        .with_compression(compression)
        .with_row_group_size(io.row_group_size))
}

/// Builds a [`WaveletConfig`] from the TOML wavelet configuration.
pub fn build_wavelet_config(wavelet: &WaveletToml) -> Result<WaveletConfig> {
    let filter: WaveletFilter = wavelet.filter.parse().context("invalid [wavelet].filter")?;
    let mut cfg = WaveletConfig::default().with_filter(filter);
    match (wavelet.max_level, wavelet.level) {
        (true, _) | (false, None) => cfg = cfg.with_max_level(),
        (false, Some(0)) => bail!("[wavelet].level must be at least 1"),
        (false, Some(level)) => cfg = cfg.with_level(level),
    }
    if let Some(window) = wavelet.energy_window {
        if window == 0 {
            bail!("[wavelet].energy_window must be at least 1");
        }
        cfg = cfg.with_energy_window(window);
    }
    Ok(cfg)
}

/// Builds [`DispatchOptions`]; `parallel_flag` comes from the command line.
pub fn build_dispatch_options(dispatch: &DispatchToml, parallel_flag: bool) -> DispatchOptions {
    DispatchOptions::default().with_parallel(dispatch.parallel || parallel_flag)
}
