//! The `config` subcommand.

use anyhow::Result;
use clap::Parser;
use tripload::config::{Configuration, Key};

/// Configuration-editing arguments.
#[derive(Debug, Parser)]
pub(crate) struct Opt {
    /// The command to perform on the configuration key.
    #[clap(subcommand)]
    command: Command,
}

/// Shared options that specify a key.
#[derive(Debug, Parser)]
pub(crate) struct KeyOpt {
    /// The configuration key to operate on [values: bucket, project, year,
    /// color, base_url, staging_dir, prefix, months].
    key: String,
}

impl KeyOpt {
    /// Get our configuration key.
    fn to_key(&self) -> Result<Key<'static>> {
        Key::from_name(&self.key)
    }
}

/// A command that we can perform on a config key.
#[derive(Debug, Parser)]
pub(crate) enum Command {
    /// Add the specified value to a list key if it isn't already there.
    #[clap(name = "add")]
    Add {
        #[clap(flatten)]
        key: KeyOpt,

        /// The value to add.
        value: String,
    },

    /// Remove the specified value from a list key.
    #[clap(name = "rm")]
    Remove {
        #[clap(flatten)]
        key: KeyOpt,

        /// The value to remove.
        value: String,
    },

    /// Set a single-valued key, replacing any previous value.
    #[clap(name = "set")]
    Set {
        #[clap(flatten)]
        key: KeyOpt,

        /// The new value.
        value: String,
    },
}

/// Edit our config file.
pub(crate) async fn run(opt: Opt) -> Result<()> {
    let mut config = Configuration::try_default()?;
    match &opt.command {
        Command::Add { key, value } => {
            config.add_to_string_array(&key.to_key()?, value)?;
        }
        Command::Remove { key, value } => {
            config.remove_from_string_array(&key.to_key()?, value)?;
        }
        Command::Set { key, value } => {
            config.set_string(&key.to_key()?, value)?;
        }
    }
    tokio::task::spawn_blocking(move || config.write()).await?
}
