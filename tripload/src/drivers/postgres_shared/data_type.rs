//! PostgreSQL data types.

use std::fmt;

use arrow::datatypes::{DataType, TimeUnit};

use crate::common::*;

/// The PostgreSQL column types we create tables with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub(crate) enum PgScalarDataType {
    Boolean,
    Date,
    Numeric,
    Real,
    DoublePrecision,
    Smallint,
    Int,
    Bigint,
    Text,
    TimestampWithoutTimeZone,
    TimestampWithTimeZone,
}

impl PgScalarDataType {
    /// Given an Arrow `DataType`, try to find a corresponding
    /// `PgScalarDataType`.
    ///
    /// Unsigned integers get the next larger signed type, so every value
    /// fits.
    pub(crate) fn from_arrow(ty: &DataType) -> Result<PgScalarDataType> {
        match ty {
            DataType::Boolean => Ok(PgScalarDataType::Boolean),
            DataType::Int8 | DataType::Int16 => Ok(PgScalarDataType::Smallint),
            DataType::Int32 | DataType::UInt8 | DataType::UInt16 => {
                Ok(PgScalarDataType::Int)
            }
            DataType::Int64 | DataType::UInt32 => Ok(PgScalarDataType::Bigint),
            DataType::UInt64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => Ok(PgScalarDataType::Numeric),
            DataType::Float16 | DataType::Float32 => Ok(PgScalarDataType::Real),
            DataType::Float64 => Ok(PgScalarDataType::DoublePrecision),
            // A column with no values at all. Text will accept whatever shows
            // up in it later.
            DataType::Null
            | DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Utf8View => Ok(PgScalarDataType::Text),
            DataType::Date32 | DataType::Date64 => Ok(PgScalarDataType::Date),
            DataType::Timestamp(_, None) => {
                Ok(PgScalarDataType::TimestampWithoutTimeZone)
            }
            DataType::Timestamp(_, Some(_)) => {
                Ok(PgScalarDataType::TimestampWithTimeZone)
            }
            other => Err(format_err!(
                "cannot store columns of type {} in PostgreSQL",
                other
            )),
        }
    }
}

impl PgScalarDataType {
    /// The name of this type in `CREATE TABLE`.
    pub(crate) fn sql_name(self) -> &'static str {
        use PgScalarDataType as T;
        match self {
            T::Boolean => "boolean",
            T::Date => "date",
            T::Numeric => "numeric",
            T::Real => "real",
            T::DoublePrecision => "double precision",
            T::Smallint => "smallint",
            T::Int => "int",
            T::Bigint => "bigint",
            T::Text => "text",
            T::TimestampWithoutTimeZone => "timestamp without time zone",
            T::TimestampWithTimeZone => "timestamp with time zone",
        }
    }
}

impl fmt::Display for PgScalarDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

#[test]
fn trip_record_types_have_postgres_equivalents() {
    let examples = &[
        (DataType::Int32, "int"),
        (DataType::Int64, "bigint"),
        (DataType::UInt32, "bigint"),
        (DataType::Float64, "double precision"),
        (DataType::Utf8, "text"),
        (DataType::LargeUtf8, "text"),
        (DataType::Null, "text"),
        (DataType::Boolean, "boolean"),
        (DataType::Date32, "date"),
        (
            DataType::Timestamp(TimeUnit::Microsecond, None),
            "timestamp without time zone",
        ),
        (
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            "timestamp with time zone",
        ),
        (DataType::Decimal128(10, 2), "numeric"),
    ];
    for (arrow_ty, pg_ty) in examples {
        assert_eq!(
            PgScalarDataType::from_arrow(arrow_ty).unwrap().to_string(),
            *pg_ty
        );
    }
}

#[test]
fn unsupported_types_are_rejected() {
    let ty = DataType::Duration(TimeUnit::Second);
    assert!(PgScalarDataType::from_arrow(&ty).is_err());
}
