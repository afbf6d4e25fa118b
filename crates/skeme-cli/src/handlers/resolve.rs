//! Resolve handler: load a document and print it with every `$ref` replaced

use super::utils::{base_url, build_options, input_to_url};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{redaction, timing::Timer};
use crate::output::{OutputFormatter, OutputWriter};
use skeme_core::ReferenceResolver;
use std::fs;
use tracing::{debug, info, instrument};

/// Resolve the document named on the command line
#[instrument(skip_all, fields(input = %redaction::redact_sensitive(cli.target().unwrap_or_default())))]
pub async fn handle_resolve(cli: &Cli, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let input = cli
        .target()
        .ok_or_else(|| Error::invalid_args("no URL given; pass it as an argument or with --url"))?;

    let base_url = base_url(cli, config)?;
    let target = input_to_url(input, base_url.is_some())?;
    let timer = Timer::with_details("resolve", &redaction::redact_sensitive(&target));

    let resolver = ReferenceResolver::new(build_options(cli, config, base_url)?);

    output.info(&format!("loading schema from: {}", target))?;
    let spinner = output.spinner("Resolving references...");
    let result = resolver.resolve(&target).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let schema = result?;

    let elapsed = timer.finish();
    info!(duration_ms = elapsed.as_millis() as u64, "Resolved document");

    if let Some(path) = &cli.save_to {
        if path.exists() {
            output.warning(&format!("Overwriting {}", path.display()))?;
        }
        debug!("Writing resolved document to {}", path.display());
        fs::write(path, output.format().format(&schema)?)?;
        output.success(&format!("✓ Resolved document saved to {}", path.display()))?;
    } else {
        output.data(&schema)?;
    }

    if output.is_verbose() {
        if let Some(cache) = resolver.cache() {
            let stats = cache.stats();
            output.section("Cache")?;
            output.info(&format!("  • Documents: {}", stats.entries))?;
            output.info(&format!("  • Hits: {}", stats.hits))?;
            output.info(&format!("  • Misses: {}", stats.misses))?;
            output.info(&format!("  • Hit ratio: {:.1}%", stats.hit_ratio()))?;
        }
        output.info(&format!("  • Resolved in {:.2}s", elapsed.as_secs_f64()))?;
    }

    Ok(())
}
