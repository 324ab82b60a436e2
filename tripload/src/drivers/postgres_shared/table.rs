//! PostgreSQL table declarations.

use std::fmt;

use arrow::datatypes::Schema;

use super::{PgColumn, PgName};
use crate::common::*;

/// A `CREATE TABLE` statement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PgCreateTable {
    /// The name of the table.
    pub(crate) name: PgName,
    /// The columns in the table.
    pub(crate) columns: Vec<PgColumn>,
    /// Only create the table if it doesn't already exist.
    pub(crate) if_not_exists: bool,
}

impl PgCreateTable {
    /// Declare a table named `name` with columns matching `schema`.
    pub(crate) fn from_arrow_schema(
        name: PgName,
        schema: &Schema,
        if_not_exists: bool,
    ) -> Result<PgCreateTable> {
        if schema.fields().is_empty() {
            return Err(format_err!(
                "cannot create table {} with no columns",
                name.quoted()
            ));
        }
        let columns = schema
            .fields()
            .iter()
            .map(|field| PgColumn::from_field(field))
            .collect::<Result<Vec<_>>>()?;
        Ok(PgCreateTable {
            name,
            columns,
            if_not_exists,
        })
    }
}

impl fmt::Display for PgCreateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE TABLE")?;
        if self.if_not_exists {
            write!(f, " IF NOT EXISTS")?;
        }
        writeln!(f, " {} (", self.name.quoted())?;
        for (idx, col) in self.columns.iter().enumerate() {
            write!(f, "    {}", col)?;
            if idx + 1 == self.columns.len() {
                writeln!(f)?;
            } else {
                writeln!(f, ",")?;
            }
        }
        writeln!(f, ");")?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use arrow::datatypes::{DataType, Field, TimeUnit};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn create_table_sql() {
        let schema = Schema::new(vec![
            Field::new("VendorID", DataType::Int32, true),
            Field::new(
                "tpep_pickup_datetime",
                DataType::Timestamp(TimeUnit::Microsecond, None),
                true,
            ),
            Field::new("trip_distance", DataType::Float64, false),
            Field::new("store_and_fwd_flag", DataType::Utf8, true),
        ]);
        let name = "yellow_taxi_trips".parse::<PgName>().unwrap();
        let table = PgCreateTable::from_arrow_schema(name, &schema, true).unwrap();
        assert_eq!(
            table.to_string(),
            r#"CREATE TABLE IF NOT EXISTS "yellow_taxi_trips" (
    "VendorID" int,
    "tpep_pickup_datetime" timestamp without time zone,
    "trip_distance" double precision NOT NULL,
    "store_and_fwd_flag" text
);
"#
        );
    }

    #[test]
    fn unsupported_column_names_the_column() {
        let schema = Schema::new(vec![Field::new(
            "trip_time",
            DataType::Duration(TimeUnit::Second),
            true,
        )]);
        let name = "trips".parse::<PgName>().unwrap();
        let err = PgCreateTable::from_arrow_schema(name, &schema, true).unwrap_err();
        assert!(format!("{:#}", err).contains("trip_time"));
    }
}
