//! Extract command: telemetry in, tagged event log out.

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span, warn};

use telemine_events::{WaveletEngine, dispatch_raw};
use telemine_io::{read_telemetry, write_event_log};

use crate::cli::ExtractArgs;
use crate::config::TelemineConfig;
use crate::convert;

/// Run the extraction pipeline.
pub fn run(args: ExtractArgs) -> Result<()> {
    let _cmd = info_span!("extract").entered();
    let config = TelemineConfig::load(&args.config)?;

    let input = args
        .input
        .as_ref()
        .or(config.io.input.as_ref())
        .ok_or_else(|| anyhow!("no input path: set [io].input in config or use --input"))?;
    let output = args
        .output
        .as_ref()
        .or(config.io.output.as_ref())
        .ok_or_else(|| anyhow!("no output path: set [io].output in config or use --output"))?;

    let reader_cfg = convert::build_reader_config(&config.io)?;
    let writer_cfg = convert::build_writer_config(&config.io)?;
    let wavelet_cfg = convert::build_wavelet_config(&config.wavelet)?;
    let options = convert::build_dispatch_options(&config.dispatch, args.parallel);

    info!(path = %input.display(), "reading telemetry");
    let frame = read_telemetry(input, &reader_cfg)
        .with_context(|| format!("failed to read telemetry: {}", input.display()))?;

    let engine = config
        .wavelet
        .enabled
        .then(|| WaveletEngine::new(&frame, wavelet_cfg));
    let out = dispatch_raw(&frame, &config.rules, engine.as_ref(), &options);

    let (activations, recoveries) = out.log.transition_counts();
    info!(
        events = out.log.len(),
        activations,
        recoveries,
        skipped = out.diagnostics.len(),
        "rules dispatched"
    );

    write_event_log(output, &out.log, &writer_cfg)
        .with_context(|| format!("failed to write event log: {}", output.display()))?;

    if let Some(ref path) = args.diagnostics {
        let json = serde_json::to_string_pretty(&out.diagnostics)
            .context("failed to serialize diagnostics")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write diagnostics: {}", path.display()))?;
        info!(path = %path.display(), "diagnostics written");
    }

    println!(
        "{} events from {} rules ({} activation, {} recovery) -> {}",
        out.log.len(),
        config.rules.len(),
        activations,
        recoveries,
        output.display()
    );
    if !out.diagnostics.is_empty() {
        warn!(count = out.diagnostics.len(), "some rules were skipped");
        println!("{} rule(s) skipped:", out.diagnostics.len());
        for diagnostic in &out.diagnostics {
            println!("  {diagnostic}");
        }
    }
    Ok(())
}
