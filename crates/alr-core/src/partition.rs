//! Partition keys derived from source filenames.
//!
//! The upstream delivery stream names its objects
//! `<stream-name>-<version>-YYYY-MM-DD-HH-MM-SS-<suffix>`. The date
//! components sit at fixed positions, and those positions are what a
//! [`FilenameConvention`] pins down.

use crate::error::{RelayError, Result};
use chrono::{NaiveDate, NaiveTime};
use std::fmt;
use std::path::Path;

/// Hive-style output prefix, e.g. `dt=2024-01-15-10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Destination key for a local file published under this partition.
    pub fn object_key(&self, file: &Path) -> String {
        format!("{}/{}", self.0, base_name(file))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Positional layout of a source filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameConvention {
    pub name: String,
    pub separator: char,
    /// Indices of year, month, day and hour after splitting the base name.
    pub positions: [usize; 4],
    /// Reject components that do not form a calendar date and hour.
    pub check_calendar: bool,
}

impl FilenameConvention {
    /// Six-word stream name, one version token, then `YYYY-MM-DD-HH`.
    pub fn v1() -> Self {
        Self {
            name: "v1".into(),
            separator: '-',
            positions: [7, 8, 9, 10],
            check_calendar: true,
        }
    }

    /// Same layout as `v1` without the calendar check.
    pub fn unchecked() -> Self {
        Self {
            name: "v1-unchecked".into(),
            check_calendar: false,
            ..Self::v1()
        }
    }

    /// Minimum number of separator-delimited components a name must have.
    pub fn min_components(&self) -> usize {
        self.positions.iter().copied().max().unwrap_or(0) + 1
    }

    /// Derive the partition key from `path`. Only the base name is used.
    pub fn parse(&self, path: impl AsRef<Path>) -> Result<PartitionKey> {
        let filename = base_name(path.as_ref());
        let parts: Vec<&str> = filename.split(self.separator).collect();
        let required = self.min_components();
        if parts.len() < required {
            return Err(self.reject(
                &filename,
                format!("expected at least {required} components, found {}", parts.len()),
            ));
        }

        let [y, m, d, h] = self.positions.map(|i| parts[i]);
        if self.check_calendar {
            self.check_date_hour(&filename, y, m, d, h)?;
        }
        Ok(PartitionKey(format!("dt={y}-{m}-{d}-{h}")))
    }

    fn check_date_hour(&self, filename: &str, y: &str, m: &str, d: &str, h: &str) -> Result<()> {
        let numbers = (
            y.parse::<i32>(),
            m.parse::<u32>(),
            d.parse::<u32>(),
            h.parse::<u32>(),
        );
        let (Ok(year), Ok(month), Ok(day), Ok(hour)) = numbers else {
            return Err(self.reject(
                filename,
                format!("non-numeric date components {y}-{m}-{d}-{h}"),
            ));
        };
        if NaiveDate::from_ymd_opt(year, month, day).is_none()
            || NaiveTime::from_hms_opt(hour, 0, 0).is_none()
        {
            return Err(self.reject(
                filename,
                format!("{y}-{m}-{d}-{h} is not a valid date and hour"),
            ));
        }
        Ok(())
    }

    fn reject(&self, filename: &str, reason: String) -> RelayError {
        RelayError::FilenameConvention {
            filename: filename.to_string(),
            convention: self.name.clone(),
            reason,
        }
    }
}

impl Default for FilenameConvention {
    fn default() -> Self {
        Self::v1()
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
