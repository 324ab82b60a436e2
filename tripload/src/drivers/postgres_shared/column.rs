//! PostgreSQL columns.

use std::fmt;

use arrow::datatypes::Field;

use super::{Ident, PgScalarDataType};
use crate::common::*;

/// A column in a PostgreSQL table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PgColumn {
    /// The name of this column.
    pub(crate) name: String,
    /// The type of data stored in this column.
    pub(crate) data_type: PgScalarDataType,
    /// Can this column be `NULL`?
    pub(crate) is_nullable: bool,
}

impl PgColumn {
    /// Given an Arrow `Field`, construct a `PgColumn`.
    pub(crate) fn from_field(field: &Field) -> Result<PgColumn> {
        let data_type = PgScalarDataType::from_arrow(field.data_type())
            .with_context(|| format!("cannot create column {:?}", field.name()))?;
        Ok(PgColumn {
            name: field.name().to_owned(),
            data_type,
            is_nullable: field.is_nullable(),
        })
    }
}

impl fmt::Display for PgColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", Ident(&self.name), self.data_type)?;
        if !self.is_nullable {
            write!(f, " NOT NULL")?;
        }
        Ok(())
    }
}
