//! Field extraction: one delimited audit line into a [`NormalizedRecord`].
//!
//! Layout of an audit line (comma separated):
//!
//! ```text
//! 0 timestamp, 1 host, 2 user, 3 client, 4 connection id, 5 query id,
//! 6 command, 7 database, 8.. query (may contain commas), last: return code
//! ```

use alr_core::{MalformedRecord, NormalizedRecord};

pub const FIELD_SEPARATOR: char = ',';
/// Fewest fields a line may have and still reach the query column.
pub const MIN_FIELDS: usize = 9;
const QUERY_FIELD: usize = 8;

/// Splits delimited audit lines and maps them onto the output schema.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    pub separator: char,
    /// Characters accepted as the query's wrapping delimiter.
    pub wrappers: Vec<char>,
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self {
            separator: FIELD_SEPARATOR,
            wrappers: vec!['\'', '"'],
        }
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_wrappers(mut self, wrappers: &[char]) -> Self {
        self.wrappers = wrappers.to_vec();
        self
    }

    /// Parse one raw message.
    pub fn extract(&self, message: &str) -> Result<NormalizedRecord, MalformedRecord> {
        let fields: Vec<&str> = message.split(self.separator).collect();
        if fields.len() < MIN_FIELDS {
            return Err(MalformedRecord::TooFewFields {
                found: fields.len(),
                required: MIN_FIELDS,
            });
        }

        let query = self.unwrap_query(&self.query_span(&fields))?;
        Ok(NormalizedRecord {
            timestamp: fields[0].to_string(),
            host: fields[1].to_string(),
            user: fields[2].to_string(),
            client: fields[3].to_string(),
            command: fields[6].to_string(),
            query,
        })
    }

    /// Rejoin the query pieces that splitting tore apart. The trailing
    /// return-code column is dropped when there is one.
    fn query_span(&self, fields: &[&str]) -> String {
        let end = if fields.len() > MIN_FIELDS { fields.len() - 1 } else { fields.len() };
        let mut buf = [0u8; 4];
        fields[QUERY_FIELD..end].join(&*self.separator.encode_utf8(&mut buf))
    }

    /// Strip exactly one matching wrapper from each end of the query.
    pub fn unwrap_query(&self, span: &str) -> Result<String, MalformedRecord> {
        let mut chars = span.chars();
        match (chars.next(), chars.next_back()) {
            (Some(open), Some(close)) if open == close && self.wrappers.contains(&open) => {
                Ok(chars.as_str().to_string())
            }
            _ => Err(MalformedRecord::UnwrappedQuery { query: span.to_string() }),
        }
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}
