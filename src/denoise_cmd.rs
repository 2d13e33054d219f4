//! Denoise command: write wavelet-denoised copies of selected channels.

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, info_span};

use telemine_events::WaveletEngine;
use telemine_io::{read_telemetry, write_channels};

use crate::cli::DenoiseArgs;
use crate::config::TelemineConfig;
use crate::convert;

/// Run the denoising pipeline.
pub fn run(args: DenoiseArgs) -> Result<()> {
    let _cmd = info_span!("denoise").entered();
    let config = TelemineConfig::load(&args.config)?;

    let input = args
        .input
        .as_ref()
        .or(config.io.input.as_ref())
        .ok_or_else(|| anyhow!("no input path: set [io].input in config or use --input"))?;

    let reader_cfg = convert::build_reader_config(&config.io)?;
    let writer_cfg = convert::build_writer_config(&config.io)?;
    let wavelet_cfg = convert::build_wavelet_config(&config.wavelet)?;

    info!(path = %input.display(), "reading telemetry");
    let frame = read_telemetry(input, &reader_cfg)
        .with_context(|| format!("failed to read telemetry: {}", input.display()))?;

    let engine = WaveletEngine::new(&frame, wavelet_cfg);
    let denoised = engine
        .denoise_all(args.channels.as_slice())
        .context("wavelet denoising failed")?;
    if denoised.n_channels() == 0 {
        bail!("none of the requested channels exist in {}", input.display());
    }

    write_channels(&args.output, &denoised, &config.io.time_column, &writer_cfg)
        .with_context(|| format!("failed to write channels: {}", args.output.display()))?;
    println!(
        "{} channel(s) denoised -> {}",
        denoised.n_channels(),
        args.output.display()
    );
    Ok(())
}
