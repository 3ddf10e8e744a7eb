use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::normalize;

/// A student id in canonical string form. Roster and scan-log ids only ever compare equal through
/// this type, so both sides must be built with [`normalize::canonical_id`] (or parsed from text,
/// which applies the same normalization).
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StudentId {
    id: String,
}

impl StudentId {
    pub(crate) fn new(id: String) -> Self {
        Self { id }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyStudentId;

impl fmt::Display for EmptyStudentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("student id is empty")
    }
}

impl std::error::Error for EmptyStudentId {}

impl FromStr for StudentId {
    type Err = EmptyStudentId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize::canonical_text(s).ok_or(EmptyStudentId)
    }
}
