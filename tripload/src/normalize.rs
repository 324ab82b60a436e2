//! Coercing timestamp-like columns to a single date-time type.
//!
//! The trip files have renamed their timestamp columns several times over the
//! years (`tpep_pickup_datetime`, `lpep_pickup_datetime`, `pickup_datetime`,
//! `dropOff_datetime`, ...), so we pick them out with a loose name match
//! rather than a fixed list.

use std::sync::Arc;

use arrow::{
    compute::{cast_with_options, CastOptions},
    datatypes::{DataType, Schema, TimeUnit},
    record_batch::RecordBatch,
};

use crate::common::*;

/// Name fragments which mark a column as holding timestamps.
const TIMESTAMP_NAME_FRAGMENTS: &[&str] = &["datetime", "pickup", "dropoff"];

/// Should the column `name` be normalized to a timestamp?
pub fn is_timestamp_column(name: &str) -> bool {
    let name = name.to_lowercase();
    TIMESTAMP_NAME_FRAGMENTS
        .iter()
        .any(|fragment| name.contains(fragment))
}

/// The type we convert timestamp columns of type `data_type` to.
fn normalized_type(data_type: &DataType) -> DataType {
    let tz = match data_type {
        DataType::Timestamp(_, tz) => tz.clone(),
        _ => None,
    };
    DataType::Timestamp(TimeUnit::Microsecond, tz)
}

/// Convert every timestamp-like column in `batch` to microsecond timestamps.
///
/// If any non-null value cannot be converted, the entire batch fails. Nulls
/// remain null, and other columns are passed through untouched.
pub fn normalize_timestamps(batch: RowBatch) -> Result<RowBatch> {
    let data = batch.into_record_batch();
    let schema = data.schema();
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };

    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns = Vec::with_capacity(data.num_columns());
    for (field, column) in schema.fields().iter().zip(data.columns()) {
        if !is_timestamp_column(field.name()) {
            fields.push(field.clone());
            columns.push(column.clone());
            continue;
        }
        let to_type = normalized_type(field.data_type());
        trace!(
            "normalizing column {:?} from {} to {}",
            field.name(),
            field.data_type(),
            to_type,
        );
        let converted =
            cast_with_options(column, &to_type, &options).with_context(|| {
                format!(
                    "cannot convert column {:?} of type {} to a timestamp",
                    field.name(),
                    field.data_type(),
                )
            })?;
        fields.push(Arc::new(field.as_ref().clone().with_data_type(to_type)));
        columns.push(converted);
    }

    let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    Ok(RowBatch::new(RecordBatch::try_new(schema, columns)?))
}

#[cfg(test)]
mod tests {
    use arrow::array::{
        Array, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
        TimestampNanosecondArray,
    };
    use arrow::datatypes::Field;

    use super::*;

    #[test]
    fn timestamp_columns_are_matched_loosely() {
        let matching = &[
            "tpep_pickup_datetime",
            "lpep_dropoff_datetime",
            "Pickup_DateTime",
            "dropOff_datetime",
            "PICKUP",
            "request_datetime",
        ];
        for name in matching {
            assert!(is_timestamp_column(name), "{}", name);
        }
        let other = &["VendorID", "PULocationID", "trip_distance", "drop", "date"];
        for name in other {
            assert!(!is_timestamp_column(name), "{}", name);
        }
    }

    fn trip_batch(pickups: Vec<Option<&str>>) -> RowBatch {
        let len = pickups.len();
        let schema = Arc::new(Schema::new(vec![
            Field::new("VendorID", DataType::Int64, true),
            Field::new("tpep_pickup_datetime", DataType::Utf8, true),
            Field::new("trip_distance", DataType::Float64, true),
        ]));
        let vendors = Int64Array::from_iter_values((0..len as i64).map(|i| i % 2 + 1));
        let pickups = StringArray::from(pickups);
        let distances = Float64Array::from_iter_values((0..len).map(|i| i as f64 * 0.5));
        RowBatch::new(
            RecordBatch::try_new(
                schema,
                vec![Arc::new(vendors), Arc::new(pickups), Arc::new(distances)],
            )
            .unwrap(),
        )
    }

    #[test]
    fn strings_become_timestamps() {
        let batch = trip_batch(vec![Some("2024-01-01 00:57:55"), None]);
        let normalized = normalize_timestamps(batch.clone()).unwrap();

        let types = normalized
            .column_types()
            .map(|(_, ty)| ty.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            types,
            vec![
                DataType::Int64,
                DataType::Timestamp(TimeUnit::Microsecond, None),
                DataType::Float64,
            ]
        );
        let pickups = normalized.columns()[1]
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        assert_eq!(pickups.value(0), 1_704_070_675_000_000);
        assert!(pickups.is_null(1));

        // Other columns are the same arrays we started with.
        assert_eq!(&normalized.columns()[0], &batch.columns()[0]);
        assert_eq!(&normalized.columns()[2], &batch.columns()[2]);
    }

    #[test]
    fn unparseable_value_fails_the_batch() {
        let batch = trip_batch(vec![Some("2024-01-01 00:57:55"), Some("not a time")]);
        let err = normalize_timestamps(batch).unwrap_err();
        assert!(
            format!("{:#}", err).contains("tpep_pickup_datetime"),
            "{:#}",
            err
        );
    }

    #[test]
    fn existing_timestamps_keep_their_zone() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "pickup_datetime",
            DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
            true,
        )]));
        let values = TimestampNanosecondArray::from(vec![1_704_070_675_000_000_123])
            .with_timezone("UTC");
        let batch = RowBatch::new(
            RecordBatch::try_new(schema, vec![Arc::new(values)]).unwrap(),
        );
        let normalized = normalize_timestamps(batch).unwrap();
        let (_, ty) = normalized.column_types().next().unwrap();
        assert_eq!(
            ty,
            &DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
        );
        let values = normalized.columns()[0]
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        assert_eq!(values.value(0), 1_704_070_675_000_000);
    }

    #[test]
    fn numeric_pickup_columns_are_read_as_epoch_microseconds() {
        // Older files have `pickup_longitude` and friends, which match by
        // name but hold coordinates.
        let schema = Arc::new(Schema::new(vec![
            Field::new("pickup_longitude", DataType::Float64, true),
            Field::new("trip_distance", DataType::Float64, true),
        ]));
        let batch = RowBatch::new(
            RecordBatch::try_new(
                schema,
                vec![
                    Arc::new(Float64Array::from(vec![Some(-74.0), None])),
                    Arc::new(Float64Array::from(vec![Some(1.5), Some(2.0)])),
                ],
            )
            .unwrap(),
        );
        let normalized = normalize_timestamps(batch).unwrap();
        let types = normalized
            .column_types()
            .map(|(_, ty)| ty.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            types,
            vec![
                DataType::Timestamp(TimeUnit::Microsecond, None),
                DataType::Float64,
            ]
        );
        let longitudes = normalized.columns()[0]
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        assert_eq!(longitudes.value(0), -74);
        assert!(longitudes.is_null(1));
    }
}
