//! Configuration file support.
//!
//! `tripload sync` has no command-line flags. It runs with the defaults in
//! [`ArchiveConfig::default`], overridden by whatever keys are present in
//! `tripload.toml`.

use std::{
    env, fmt,
    fs::{create_dir_all, File},
    io::{self, Read, Write},
};
use toml_edit::{Array, DocumentMut, Item, Value};

use crate::common::*;

/// Find the path to our configuration directory.
pub fn config_dir() -> Result<PathBuf> {
    // Use `var_os` instead of `var`, because if it returns a non-Unicode path,
    // we can hand it off directly to `PathBuf`.
    match env::var_os("TRIPLOAD_CONFIG_DIR") {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(dirs::config_dir()
            .ok_or_else(|| format_err!("could not find user config dir"))?
            .join("tripload")),
    }
}

/// Find the path to our configuration file.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("tripload.toml"))
}

/// What kind of value a configuration key holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    /// A single string.
    String,
    /// An array of strings.
    StringArray,
}

/// A configuration file key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Key<'a> {
    /// The key in the TOML file.
    key: &'a str,
    /// The type of value stored under this key.
    kind: KeyKind,
}

/// Every key we understand.
static KNOWN_KEYS: &[Key<'static>] = &[
    Key::string("bucket"),
    Key::string("project"),
    Key::string("year"),
    Key::string("color"),
    Key::string("base_url"),
    Key::string("staging_dir"),
    Key::string("prefix"),
    Key::string_array("months"),
];

impl Key<'static> {
    /// Look up one of our known keys by name.
    pub fn from_name(name: &str) -> Result<Key<'static>> {
        KNOWN_KEYS
            .iter()
            .find(|key| key.key == name)
            .copied()
            .ok_or_else(|| format_err!("unknown configuration key {:?}", name))
    }

    /// The list of months to archive.
    pub fn months() -> Key<'static> {
        Key::string_array("months")
    }
}

impl<'a> Key<'a> {
    const fn string(key: &'a str) -> Self {
        Key {
            key,
            kind: KeyKind::String,
        }
    }

    const fn string_array(key: &'a str) -> Self {
        Key {
            key,
            kind: KeyKind::StringArray,
        }
    }

    /// What kind of value this key holds.
    pub fn kind(&self) -> KeyKind {
        self.kind
    }
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}

/// Our `tripload.toml` configuration file.
#[derive(Debug)]
pub struct Configuration {
    /// The path from which we read this file.
    path: PathBuf,
    /// Our raw configuration data.
    doc: DocumentMut,
}

// We use `toml_edit` rather than `serde` so that `tripload config` can edit
// the file without losing the user's comments or layout.
impl Configuration {
    /// Load our default configuration.
    pub fn try_default() -> Result<Self> {
        Self::from_path(&config_file()?)
    }

    /// Load the configuration file at `path`. A missing file is treated as
    /// empty.
    pub fn from_path(path: &Path) -> Result<Self> {
        match File::open(path) {
            Ok(rdr) => Ok(Self::from_reader(path.to_owned(), rdr)
                .with_context(|| format!("could not read file {}", path.display()))?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self {
                path: path.to_owned(),
                doc: DocumentMut::default(),
            }),
            Err(err) => {
                Err(err).context(format!("could not open file {}", path.display()))
            }
        }
    }

    /// Load a configuration file from the specified reader.
    fn from_reader<R>(path: PathBuf, mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut buf = String::new();
        rdr.read_to_string(&mut buf)?;
        let doc = buf.parse::<DocumentMut>()?;
        Ok(Self { path, doc })
    }

    /// Write the configuration file to disk.
    pub fn write(&self) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            format_err!("cannot find parent directory of {}", self.path.display())
        })?;
        create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
        let data = self.doc.to_string();
        let mut f = File::create(&self.path)
            .with_context(|| format!("cannot create {}", self.path.display()))?;
        f.write_all(data.as_bytes())
            .with_context(|| format!("error writing to {}", self.path.display()))?;
        f.flush()
            .with_context(|| format!("error writing to {}", self.path.display()))?;
        Ok(())
    }

    /// Get a string value, if present.
    pub fn string(&self, key: &Key<'_>) -> Result<Option<String>> {
        match self.doc.as_table().get(key.key) {
            None => Ok(None),
            Some(raw_value) => match raw_value.as_str() {
                Some(s) => Ok(Some(s.to_owned())),
                None => Err(format_err!(
                    "expected string for {}, found {:?} in {}",
                    key,
                    raw_value,
                    self.path.display(),
                )),
            },
        }
    }

    /// Get an array of strings, if present.
    pub fn string_array(&self, key: &Key<'_>) -> Result<Option<Vec<String>>> {
        let raw_value = match self.doc.as_table().get(key.key) {
            None => return Ok(None),
            Some(raw_value) => raw_value,
        };
        let raw_array = raw_value.as_array().ok_or_else(|| {
            format_err!(
                "expected array for {}, found {:?} in {}",
                key,
                raw_value,
                self.path.display(),
            )
        })?;
        let mut values = vec![];
        for raw_item in raw_array.iter() {
            if let Some(value) = raw_item.as_str() {
                values.push(value.to_owned());
            } else {
                return Err(format_err!(
                    "expected string, found {:?} in {}",
                    raw_item,
                    self.path.display(),
                ));
            }
        }
        Ok(Some(values))
    }

    /// Set a string value, replacing any existing one.
    pub fn set_string(&mut self, key: &Key<'_>, value: &str) -> Result<()> {
        if key.kind != KeyKind::String {
            return Err(format_err!("{} is a list; use `add` or `rm`", key));
        }
        self.doc[key.key] = toml_edit::value(value);
        Ok(())
    }

    /// Get our an array of strings in mutable form.
    fn raw_string_array_mut<'a>(&'a mut self, key: &Key<'_>) -> Result<&'a mut Array> {
        if key.kind != KeyKind::StringArray {
            return Err(format_err!("{} is not a list; use `set`", key));
        }
        let array_value = self
            .doc
            .as_table_mut()
            .entry(key.key)
            .or_insert(Item::Value(Value::Array(Array::default())));
        match array_value.as_array_mut() {
            Some(array) => Ok(array),
            None => Err(format_err!(
                "expected array for {} in {}",
                key,
                self.path.display(),
            )),
        }
    }

    /// Add a new value to an array of strings, if it's not already there.
    pub fn add_to_string_array(&mut self, key: &Key<'_>, value: &str) -> Result<()> {
        let raw_array = self.raw_string_array_mut(key)?;
        if raw_array.iter().any(|raw_item| raw_item.as_str() == Some(value)) {
            return Ok(());
        }
        raw_array.push(value);
        raw_array.fmt();
        Ok(())
    }

    /// Remove every copy of a value from an array of strings.
    pub fn remove_from_string_array(
        &mut self,
        key: &Key<'_>,
        value: &str,
    ) -> Result<()> {
        let raw_array = self.raw_string_array_mut(key)?;
        raw_array.retain(|raw_item| raw_item.as_str() != Some(value));
        raw_array.fmt();
        Ok(())
    }
}

/// Settings for an archive sync run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// The Cloud Storage bucket to upload into.
    pub bucket: String,
    /// The Google Cloud project to bill requests to.
    pub project: Option<String>,
    /// The four-digit year of the monthly files.
    pub year: String,
    /// The taxi color in the file names (`yellow`, `green`, ...).
    pub color: String,
    /// Two-digit months, processed in this order.
    pub months: Vec<String>,
    /// The CDN directory containing the monthly files.
    pub base_url: String,
    /// Where downloads are staged before upload.
    pub staging_dir: PathBuf,
    /// Prefix for destination object keys, and for the final listing.
    pub prefix: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            bucket: "nytaxi-485607-yellow_taxi".to_owned(),
            project: Some("nytaxi-485607".to_owned()),
            year: "2024".to_owned(),
            color: "yellow".to_owned(),
            months: ["01", "02", "03", "04", "05", "06"]
                .iter()
                .map(|&m| m.to_owned())
                .collect(),
            base_url: "https://d37ci6vzurychx.cloudfront.net/trip-data".to_owned(),
            staging_dir: PathBuf::from("data/yellow_taxi"),
            prefix: "raw/".to_owned(),
        }
    }
}

impl ArchiveConfig {
    /// Apply any overrides in `config` to our defaults, and validate the
    /// result.
    pub fn from_configuration(config: &Configuration) -> Result<Self> {
        let mut archive = ArchiveConfig::default();
        let get = |name: &str| config.string(&Key::from_name(name)?);
        if let Some(bucket) = get("bucket")? {
            archive.bucket = bucket;
        }
        if let Some(project) = get("project")? {
            // An empty project disables the billing header.
            archive.project = Some(project).filter(|p| !p.is_empty());
        }
        if let Some(year) = get("year")? {
            archive.year = year;
        }
        if let Some(color) = get("color")? {
            archive.color = color;
        }
        if let Some(base_url) = get("base_url")? {
            archive.base_url = base_url;
        }
        if let Some(staging_dir) = get("staging_dir")? {
            archive.staging_dir = PathBuf::from(staging_dir);
        }
        if let Some(prefix) = get("prefix")? {
            archive.prefix = prefix;
        }
        if let Some(months) = config.string_array(&Key::months())? {
            archive.months = months;
        }
        archive.validate()?;
        Ok(archive)
    }

    /// Check that this configuration can produce sensible URLs and keys.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(format_err!("bucket must not be empty"));
        }
        if self.color.is_empty() {
            return Err(format_err!("color must not be empty"));
        }
        if self.year.len() != 4 || !self.year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format_err!("year must be four digits, found {:?}", self.year));
        }
        for month in &self.months {
            validate_month(month)?;
        }
        self.base_url
            .parse::<Url>()
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        Ok(())
    }
}

/// Months are two-digit strings from `01` to `12`.
fn validate_month(month: &str) -> Result<()> {
    let valid = month.len() == 2
        && month.bytes().all(|b| b.is_ascii_digit())
        && matches!(month.parse::<u8>(), Ok(1..=12));
    if valid {
        Ok(())
    } else {
        Err(format_err!("month must be \"01\" through \"12\", found {:?}", month))
    }
}
