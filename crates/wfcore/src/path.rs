use serde::{Deserialize, Serialize};
use std::fmt;

/// One edge from a parent activity to a child: the port it sits in and its
/// position within that port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathSegment {
    pub port: String,
    pub ordinal: usize,
}

impl PathSegment {
    pub fn new(port: impl Into<String>, ordinal: usize) -> Self {
        Self {
            port: port.into(),
            ordinal,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.port, self.ordinal)
    }
}

/// Root-to-node sequence of port edges locating an activity in the authored
/// tree. The root has an empty path and renders as `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralPath(Vec<PathSegment>);

impl StructuralPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of a child reached through `port` at `ordinal`.
    pub fn child(&self, port: impl Into<String>, ordinal: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::new(port, ordinal));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl From<Vec<PathSegment>> for StructuralPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}
