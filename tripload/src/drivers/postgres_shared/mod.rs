//! Connections, names and DDL shared by our PostgreSQL code.

use std::{fmt, str::FromStr};
pub use tokio_postgres::Client;
use tokio_postgres::Config;
use tokio_postgres_rustls::MakeRustlsConnect;

use crate::common::*;
use crate::tls::rustls_client_config;

mod column;
mod data_type;
mod table;

pub(crate) use self::column::PgColumn;
pub(crate) use self::data_type::PgScalarDataType;
pub(crate) use self::table::PgCreateTable;

/// Open a connection, using TLS when the server supports it.
///
/// The returned client only works while `ctx`'s workers are being polled.
#[instrument(level = "trace", skip(ctx))]
pub(crate) async fn connect(
    ctx: &Context,
    url: &UrlWithHiddenPassword,
) -> Result<Client> {
    let config = Config::from_str(url.with_password().as_str())
        .context("could not configure PostgreSQL connection")?;

    let tls = MakeRustlsConnect::new(rustls_client_config()?);
    let (client, connection) = config
        .connect(tls)
        .await
        .with_context(|| format!("could not connect to PostgreSQL at {}", url))?;

    // The connection object does the actual I/O, so it must run in the
    // background.
    ctx.spawn_worker(
        debug_span!("postgres connection"),
        connection.map_err(|err| Error::new(err).context("PostgreSQL connection failed")),
    );

    Ok(client)
}

/// A PostgreSQL identifier. This is always quoted, so it never clashes with a
/// keyword and keeps its case.
pub(crate) struct Ident<'a>(pub(crate) &'a str);

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0.replace('"', "\"\""))
    }
}

/// A table name, optionally qualified by a schema, as in `staging.trips`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct PgName {
    schema: Option<String>,
    name: String,
}

impl PgName {
    /// The schema, if the name was qualified.
    pub(crate) fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// The table name without its schema.
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// The name as the user wrote it, without quotes.
    pub(crate) fn unquoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// The name with every part quoted, ready to splice into SQL.
    pub(crate) fn quoted(&self) -> TableNameQuoted<'_> {
        TableNameQuoted(self)
    }
}

impl FromStr for PgName {
    type Err = Error;

    /// Split on the first `.`. Anything after it, dots included, is the table
    /// name.
    fn from_str(s: &str) -> Result<Self> {
        let (schema, name) = match s.split_once('.') {
            Some((schema, name)) => (Some(schema), name),
            None => (None, s),
        };
        if name.is_empty() || schema == Some("") {
            return Err(format_err!("cannot parse PostgreSQL table name {:?}", s));
        }
        Ok(PgName {
            schema: schema.map(str::to_owned),
            name: name.to_owned(),
        })
    }
}

/// Displays a [`PgName`] as quoted SQL.
pub(crate) struct TableNameQuoted<'a>(&'a PgName);

impl fmt::Display for TableNameQuoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = self.0.schema() {
            write!(f, "{}.", Ident(schema))?;
        }
        write!(f, "{}", Ident(self.0.name()))
    }
}

#[test]
fn table_names_are_quoted() {
    let plain = "yellow_taxi_trips".parse::<PgName>().unwrap();
    assert_eq!(plain.quoted().to_string(), r#""yellow_taxi_trips""#);
    assert_eq!(plain.schema(), None);

    let qualified = "staging.Zones".parse::<PgName>().unwrap();
    assert_eq!(qualified.quoted().to_string(), r#""staging"."Zones""#);
    assert_eq!(qualified.unquoted(), "staging.Zones");

    let awkward = r#"taxi.trips."2024""#.parse::<PgName>().unwrap();
    assert_eq!(awkward.schema(), Some("taxi"));
    assert_eq!(awkward.quoted().to_string(), r#""taxi"."trips.""2024""""#);
}

#[test]
fn empty_table_names_are_rejected() {
    for bad in &["", ".trips", "public."] {
        assert!(bad.parse::<PgName>().is_err(), "{:?}", bad);
    }
}
