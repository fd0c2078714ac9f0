use anyhow::{Context, Result};
use fare_features::{
    coordinates_in_range, FareError, FeatureVectorBuilder, LatLon, TripRequest, ValidationError,
};
use serde::Deserialize;
use std::io::{Read, Write};

/// One row of the historical trip export. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct TripRecord {
    key: Option<String>,
    fare_amount: Option<String>,
    pickup_datetime: Option<String>,
    pickup_longitude: Option<f64>,
    pickup_latitude: Option<f64>,
    dropoff_longitude: Option<f64>,
    dropoff_latitude: Option<f64>,
    passenger_count: Option<i64>,
}

struct CompleteRecord {
    fare: String,
    trip: TripRequest,
}

impl TripRecord {
    fn complete(self) -> Option<CompleteRecord> {
        // exports without a key column are fine; an empty key is not
        if matches!(self.key.as_deref(), Some("")) {
            return None;
        }
        let pickup = LatLon::new(self.pickup_latitude?, self.pickup_longitude?);
        let dropoff = LatLon::new(self.dropoff_latitude?, self.dropoff_longitude?);
        let trip = TripRequest::new(pickup, dropoff, self.passenger_count?)
            .with_pickup_datetime(self.pickup_datetime.filter(|s| !s.is_empty())?);
        Some(CompleteRecord {
            fare: self.fare_amount.filter(|s| !s.is_empty())?,
            trip,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrepareStats {
    pub read: usize,
    pub kept: usize,
    /// rows with an empty field
    pub missing: usize,
    /// rows the CSV reader could not decode
    pub malformed: usize,
    pub out_of_range: usize,
    pub bad_fare: usize,
    pub bad_datetime: usize,
}

impl PrepareStats {
    pub fn dropped(&self) -> usize {
        self.read - self.kept
    }
}

/// Stream `input` CSV rows into a feature matrix on `output`.
///
/// The header is the builder's schema followed by `fare_amount`; each row is
/// built by the same `FeatureVectorBuilder` the service uses.
pub fn prepare<R: Read, W: Write>(
    input: R,
    output: W,
    builder: &FeatureVectorBuilder,
) -> Result<PrepareStats> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    let mut wtr = csv::Writer::from_writer(output);

    let mut header: Vec<&str> = builder.schema().names();
    header.push("fare_amount");
    wtr.write_record(&header).context("failed to write header")?;

    let mut stats = PrepareStats::default();
    let mut row = Vec::with_capacity(header.len());

    for result in rdr.deserialize::<TripRecord>() {
        stats.read += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("skipping row {}: {}", stats.read, e);
                stats.malformed += 1;
                continue;
            }
        };
        let Some(CompleteRecord { fare, trip }) = record.complete() else {
            stats.missing += 1;
            continue;
        };
        if !coordinates_in_range(trip.pickup()) || !coordinates_in_range(trip.dropoff()) {
            stats.out_of_range += 1;
            continue;
        }
        let fare = match fare.parse::<f64>() {
            Ok(f) if f.is_finite() && f > 0.0 => f,
            _ => {
                stats.bad_fare += 1;
                continue;
            }
        };

        let features = match builder.build(&trip) {
            Ok(v) => v,
            Err(FareError::Validation(ValidationError::MalformedDatetime { .. })) => {
                stats.bad_datetime += 1;
                continue;
            }
            Err(e) => return Err(e).context("feature schema cannot be built from trip records"),
        };

        row.clear();
        row.extend(features.values().iter().map(|v| v.to_string()));
        row.push(fare.to_string());
        wtr.write_record(&row)
            .with_context(|| format!("failed to write row {}", stats.read))?;
        stats.kept += 1;
    }

    wtr.flush().context("failed to flush feature matrix")?;
    Ok(stats)
}
