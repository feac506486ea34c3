use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use tracing::info;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rating_processor::{
    args::Args,
    error::ProcessorError,
    model::{seeding::SiblingHistory, structures::namespace::Namespace},
    pipeline::{run_namespace, write_outputs, NamespaceConfig},
    source::loader::load_namespace_inputs
};

fn main() -> Result<(), ProcessorError> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let indicatif_layer = IndicatifLayer::new();
    tracing_subscriber::registry()
        .with(EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();

    let seed_boundary = parse_boundary(&args.seed_boundary)?;

    // The classic pass is temporally authoritative and runs first.
    let classic_inputs = load_namespace_inputs(&args.input_dir, Namespace::Classic)?;
    let classic = run_namespace(&classic_inputs, &NamespaceConfig::new(Namespace::Classic, seed_boundary), None);
    write_outputs(&classic, &classic_inputs.tables, &args.output_dir)?;

    if !args.classic_only {
        // The sequel pass reads the classic result only through this
        // finalized view; nothing flows the other way.
        let sibling = SiblingHistory::from_finalized(&classic.registry, &classic.histories);

        let sequel_inputs = load_namespace_inputs(&args.input_dir, Namespace::Sequel)?;
        let sequel = run_namespace(
            &sequel_inputs,
            &NamespaceConfig::new(Namespace::Sequel, seed_boundary),
            Some(&sibling)
        );
        write_outputs(&sequel, &sequel_inputs.tables, &args.output_dir)?;
    }

    info!("processing complete");
    Ok(())
}

fn parse_boundary(raw: &str) -> Result<DateTime<Utc>, ProcessorError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ProcessorError::InvalidBoundaryDate(raw.to_string()))
}
