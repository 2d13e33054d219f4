//! Check command: validate configuration and rules offline.

use anyhow::{Result, bail};
use tracing::info_span;

use telemine_events::{RawRule, Rule};

use crate::cli::CheckArgs;
use crate::config::TelemineConfig;
use crate::convert;

/// Validate every section of the configuration and report each rule.
pub fn run(args: CheckArgs) -> Result<()> {
    let _cmd = info_span!("check").entered();
    let config = TelemineConfig::load(&args.config)?;

    convert::build_reader_config(&config.io)?;
    convert::build_writer_config(&config.io)?;
    convert::build_wavelet_config(&config.wavelet)?;

    let mut invalid = 0usize;
    for (i, entry) in config.rules.iter().enumerate() {
        match Rule::from_entry(entry) {
            Ok(rule) => println!(
                "ok     #{i} {} / {} [{}]",
                rule.subsystem,
                rule.label(),
                rule.channels().join(", ")
            ),
            Err(e) => {
                invalid += 1;
                let (subsystem, label) = RawRule::describe_entry(entry);
                println!("error  #{i} {subsystem} / {label}: {e}");
            }
        }
    }

    if invalid > 0 {
        bail!("{invalid} of {} rule(s) are invalid", config.rules.len());
    }
    println!("{} rule(s) valid", config.rules.len());
    Ok(())
}
