use std::fmt;

use serde::Serialize;

use super::company::CompanyRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseOutcome {
    Valid,
    AutoFixed,
    Invalid,
}

impl fmt::Display for ParseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ParseOutcome::Valid => "valid",
            ParseOutcome::AutoFixed => "auto-fixed",
            ParseOutcome::Invalid => "invalid",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelPayload {
    Record(Box<CompanyRecord>),
    Raw(String),
}

/// A model response converted as far as it would go.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    pub payload: ModelPayload,
    pub outcome: ParseOutcome,
}

impl Normalization {
    pub fn record(&self) -> Option<&CompanyRecord> {
        match &self.payload {
            ModelPayload::Record(record) => Some(record.as_ref()),
            ModelPayload::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match &self.payload {
            ModelPayload::Record(_) => None,
            ModelPayload::Raw(text) => Some(text.as_str()),
        }
    }
}
