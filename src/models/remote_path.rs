// file: src/models/remote_path.rs
// description: validated directory path relative to the share root
// reference: internal data structures

use crate::error::Result;
use crate::utils::Validator;
use std::fmt;

/// Ordered directory segments below the share root.
///
/// Every segment is validated on construction, so rendering a path into a
/// transport command never needs escaping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RemotePath {
    segments: Vec<String>,
}

impl RemotePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses `a/b/c` (or `a\b\c`); empty segments are dropped, padded ones rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::from_segments(raw.split(['/', '\\']).filter(|s| !s.is_empty()))
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = segments
            .into_iter()
            .map(Into::into)
            .map(|segment: String| Validator::validate_share_segment(&segment).map(|_| segment))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// `a`, `a/b`, `a/b/c` for `a/b/c`, outermost first.
    pub fn prefixes(&self) -> impl Iterator<Item = RemotePath> + '_ {
        (1..=self.segments.len()).map(|end| RemotePath {
            segments: self.segments[..end].to_vec(),
        })
    }

    pub fn join(&self, name: &str) -> Result<Self> {
        Validator::validate_share_segment(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self { segments })
    }

    /// Backslash-rooted form understood by SMB clients, e.g. `\a\b\c`.
    pub fn to_share_path(&self) -> String {
        format!("\\{}", self.segments.join("\\"))
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.segments.join("/"))
        }
    }
}
