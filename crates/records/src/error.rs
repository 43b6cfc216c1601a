use thiserror::Error;

pub type Result<T> = std::result::Result<T, MalformedRecord>;

/// A raw fragment is missing its identifying field (or it has the wrong primitive kind).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed {entity} record: field '{field}' {problem}")]
pub struct MalformedRecord {
    pub entity: &'static str,
    pub field: &'static str,
    pub problem: &'static str,
}

impl MalformedRecord {
    pub(crate) fn missing(entity: &'static str, field: &'static str) -> Self {
        Self {
            entity,
            field,
            problem: "is missing",
        }
    }

    pub(crate) fn wrong_kind(entity: &'static str, field: &'static str) -> Self {
        Self {
            entity,
            field,
            problem: "has the wrong type",
        }
    }
}
