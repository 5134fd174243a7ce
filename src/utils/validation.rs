// file: src/utils/validation.rs
// description: input validation for names and values that reach the filesystem or the share
// reference: input validation patterns

use crate::error::{ArchiverError, Result};

/// Characters that would break out of a quoted smbclient argument or split its command list.
const SHARE_RESERVED: &[char] = &['"', ';'];

pub struct Validator;

impl Validator {
    /// A repository name becomes a local directory, an archive basename and a remote file name.
    pub fn validate_repository_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(ArchiverError::Validation(
                "Repository name is empty".to_string(),
            ));
        }

        if name == "." || name == ".." {
            return Err(ArchiverError::Validation(format!(
                "Repository name is not a valid basename: {}",
                name
            )));
        }

        if name.contains(['/', '\\']) {
            return Err(ArchiverError::Validation(format!(
                "Repository name contains a path separator: {}",
                name
            )));
        }

        Self::validate_share_argument(name, "repository name")
    }

    pub fn validate_share_segment(segment: &str) -> Result<()> {
        if segment.is_empty() {
            return Err(ArchiverError::Validation(
                "Remote path segment is empty".to_string(),
            ));
        }

        if segment.trim() != segment {
            return Err(ArchiverError::Validation(format!(
                "Remote path segment has leading or trailing whitespace: {:?}",
                segment
            )));
        }

        if segment == "." || segment == ".." {
            return Err(ArchiverError::Validation(format!(
                "Remote path segment may not be a relative reference: {}",
                segment
            )));
        }

        if segment.contains(['/', '\\']) {
            return Err(ArchiverError::Validation(format!(
                "Remote path segment contains a separator: {}",
                segment
            )));
        }

        Self::validate_share_argument(segment, "remote path segment")
    }

    pub fn validate_share_argument(value: &str, what: &str) -> Result<()> {
        if let Some(bad) = value
            .chars()
            .find(|c| SHARE_RESERVED.contains(c) || c.is_control())
        {
            return Err(ArchiverError::Validation(format!(
                "Invalid character {:?} in {}: {}",
                bad, what, value
            )));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ArchiverError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.to_string(),
        }
    }
}
