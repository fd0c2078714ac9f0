use anyhow::{Context, Result};
use clap::Parser;
use fare_features::{FeatureSchema, FeatureVectorBuilder, ModelMeta, Variant};
use std::{fs::File, io::BufWriter, path::PathBuf};
use tracing_subscriber::EnvFilter;

mod prepare;

/// Turn a historical trip export into a model-ready feature matrix.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Trip CSV (fare_amount, pickup_datetime, coordinates, passenger_count)
    #[arg(short, long)]
    input: PathBuf,

    /// Feature matrix CSV to write
    #[arg(short, long, default_value = "features.csv")]
    output: PathBuf,

    /// Metadata sidecar pinning the column order
    #[arg(short, long, default_value = "meta.json")]
    meta: PathBuf,

    /// surge, temporal or basic
    #[arg(short, long, default_value = "basic")]
    variant: String,

    /// Override the variant's columns, e.g. `distance,passenger_count`
    #[arg(long, value_delimiter = ',')]
    features: Option<Vec<String>>,
}

fn schema_for(args: &Args, variant: Variant) -> Result<FeatureSchema> {
    let schema = match &args.features {
        Some(names) => FeatureSchema::from_names(names)?,
        None => variant.default_schema(),
    };
    schema.ensure_derivable(variant.request_fields())?;
    Ok(schema)
}

fn run(args: &Args) -> Result<()> {
    let variant: Variant = args.variant.parse()?;
    let schema = schema_for(args, variant)?;
    tracing::info!("variant={} features[{}]: {}", variant, schema.len(), schema);

    let input = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let output = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let builder = FeatureVectorBuilder::new(schema.clone());
    let stats = prepare::prepare(input, BufWriter::new(output), &builder)?;
    tracing::info!(
        "read={} kept={} dropped={} (missing={} malformed={} out_of_range={} bad_fare={} bad_datetime={})",
        stats.read,
        stats.kept,
        stats.dropped(),
        stats.missing,
        stats.malformed,
        stats.out_of_range,
        stats.bad_fare,
        stats.bad_datetime
    );
    if stats.kept == 0 {
        tracing::warn!("no usable rows in {}", args.input.display());
    }

    let meta = ModelMeta::for_schema(&schema, Some(variant.as_str()));
    let meta_file = File::create(&args.meta)
        .with_context(|| format!("failed to create {}", args.meta.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(meta_file), &meta)
        .with_context(|| format!("failed to write {}", args.meta.display()))?;
    tracing::info!("wrote {} and {}", args.output.display(), args.meta.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run(&Args::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fare_features::ConfigurationError;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["fare_dataset", "--input", "trips.csv"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let a = args(&[]);
        assert_eq!(a.variant, "basic");
        assert_eq!(a.output, PathBuf::from("features.csv"));
        let schema = schema_for(&a, Variant::Basic).unwrap();
        assert_eq!(schema, Variant::Basic.default_schema());
    }

    #[test]
    fn test_feature_override() {
        let a = args(&["--variant", "temporal", "--features", "distance,hour"]);
        let schema = schema_for(&a, Variant::Temporal).unwrap();
        assert_eq!(schema.names(), ["distance", "hour"]);

        // surge requests never carry a timestamp, so neither may its training set
        let err = schema_for(&a, Variant::Surge).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::UnderivableFeature { .. })
        ));
    }

    #[test]
    fn test_run_writes_matrix_and_meta() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trips.csv");
        std::fs::write(
            &input,
            "fare_amount,pickup_datetime,pickup_longitude,pickup_latitude,dropoff_longitude,dropoff_latitude,passenger_count\n\
             12.5,2015-05-07 19:52:06 UTC,-73.98,40.75,-73.78,40.64,1\n",
        )
        .unwrap();

        let a = Args {
            input,
            output: dir.path().join("features.csv"),
            meta: dir.path().join("meta.json"),
            variant: "surge".into(),
            features: None,
        };
        run(&a).unwrap();

        let meta: ModelMeta =
            serde_json::from_str(&std::fs::read_to_string(&a.meta).unwrap()).unwrap();
        assert_eq!(meta.variant.as_deref(), Some("surge"));
        assert!(Variant::Surge
            .default_schema()
            .ensure_matches(&meta.feat_list)
            .is_ok());

        let matrix = std::fs::read_to_string(&a.output).unwrap();
        assert_eq!(matrix.lines().count(), 2);
        assert!(matrix.starts_with("distance,"));
    }
}
