use crate::{PathSegment, StructuralPath};
use serde::{Deserialize, Serialize};

/// Flattened view of one activity instance in the authored tree.
///
/// Nodes are produced in pre-order, so `index` doubles as the position of
/// the activity in any walk that follows the same port order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityNode {
    pub index: usize,
    pub parent: Option<usize>,
    /// Edge under which this node hangs from its parent
    pub segment: Option<PathSegment>,
    pub path: StructuralPath,
    pub activity_type: String,
    /// Identifier supplied by the author, if any
    pub explicit_id: Option<String>,
    pub is_variable_container: bool,
}

impl ActivityNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn depth(&self) -> usize {
        self.path.depth()
    }
}
