use std::fmt;

/// Identifies an image sequence as issued by the imagery provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceId(String);

impl SequenceId {
    pub fn new(id: impl Into<String>) -> Self {
        SequenceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Provider ids are never empty; an empty id matches nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SequenceId {
    fn from(s: &str) -> Self {
        SequenceId(s.to_string())
    }
}

impl From<String> for SequenceId {
    fn from(s: String) -> Self {
        SequenceId(s)
    }
}
