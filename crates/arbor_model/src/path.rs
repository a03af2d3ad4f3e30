//! Dotted model paths.

use crate::error::{ModelError, Result};
use core::fmt;
use core::str::FromStr;

/// A non-empty dotted path such as `components.main.binaries`.
///
/// Segments are non-empty and never contain a `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelPath {
    segments: Vec<String>,
}

impl ModelPath {
    /// Parses a dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidName`] if the path or any segment is
    /// empty.
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(ModelError::InvalidName {
                name: path.to_string(),
                reason: "paths must not be empty",
            });
        }
        let segments = path
            .split('.')
            .map(|segment| validate_segment(segment).map(|()| segment.to_string()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    /// Creates a single-segment path.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidName`] if `name` is not a valid segment.
    pub fn root(name: &str) -> Result<Self> {
        validate_segment(name)?;
        Ok(Self {
            segments: vec![name.to_string()],
        })
    }

    /// Returns the path of a direct child.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidName`] if `name` is not a valid segment.
    pub fn child(&self, name: &str) -> Result<Self> {
        validate_segment(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self { segments })
    }

    /// Returns the enclosing path, or `None` for a single-segment path.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        match self.segments.len() {
            0 | 1 => None,
            len => Some(Self {
                segments: self.segments[..len - 1].to_vec(),
            }),
        }
    }

    /// Returns the last segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Returns the segments from outermost to innermost.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if `self` is strictly below `other`.
    #[must_use]
    pub fn is_descendant_of(&self, other: &ModelPath) -> bool {
        self.segments.len() > other.segments.len() && self.segments.starts_with(&other.segments)
    }

    /// Returns `true` if `self` is exactly one level below `other`.
    #[must_use]
    pub fn is_direct_descendant_of(&self, other: &ModelPath) -> bool {
        self.segments.len() == other.segments.len() + 1 && self.is_descendant_of(other)
    }
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(ModelError::InvalidName {
            name: segment.to_string(),
            reason: "path segments must not be empty",
        });
    }
    if segment.contains('.') {
        return Err(ModelError::InvalidName {
            name: segment.to_string(),
            reason: "path segments must not contain '.'",
        });
    }
    Ok(())
}

impl fmt::Display for ModelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for ModelPath {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
