use crate::visitor::walk_mut;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use uuid::Uuid;
use wfcore::{Activity, ActivityNode, BuildError, StructuralPath};

/// Namespace used for derived activity ids unless a build overrides it.
pub const DEFAULT_IDENTITY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2d3e_9a4b_4c5d_8e7f_0a1b_2c3d_4e5f);

/// Final identifiers of a flattened graph, aligned with the node list
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    ids: Vec<String>,
    paths: Vec<StructuralPath>,
    by_path: HashMap<StructuralPath, usize>,
}

impl IdentityMap {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifier of the node at `index` in the flattened list
    pub fn id(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    pub fn get(&self, path: &StructuralPath) -> Option<&str> {
        self.by_path.get(path).and_then(|&index| self.id(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StructuralPath, &str)> {
        self.paths.iter().zip(self.ids.iter().map(String::as_str))
    }

    /// Id → path index kept by the finished workflow
    pub fn to_path_index(&self) -> BTreeMap<String, StructuralPath> {
        self.ids
            .iter()
            .cloned()
            .zip(self.paths.iter().cloned())
            .collect()
    }
}

/// Deterministic id for an activity without an explicit one.
///
/// Only the type tag and the structural path (which includes every sibling
/// ordinal on the way down) feed the derivation, so field values carried by
/// the activity never influence it. Names are length-prefixed in the key, so
/// a port name containing `/` or `[n]` cannot alias a deeper path.
pub fn derive_id(namespace: &Uuid, activity_type: &str, path: &StructuralPath) -> String {
    Uuid::new_v5(namespace, identity_key(activity_type, path).as_bytes())
        .simple()
        .to_string()
}

fn identity_key(activity_type: &str, path: &StructuralPath) -> String {
    let mut key = format!("{}:{}@", activity_type.len(), activity_type);
    for segment in path.segments() {
        let _ = write!(key, "/{}:{}#{}", segment.port.len(), segment.port, segment.ordinal);
    }
    key
}

/// Resolve the final identifier of every node.
///
/// Explicit ids are kept verbatim; the rest are derived. A final pass over
/// all identifiers rejects any duplicate, whether it comes from two
/// explicit ids or from a derived id colliding with another one.
pub fn assign_identities(
    nodes: &[ActivityNode],
    namespace: &Uuid,
) -> Result<IdentityMap, BuildError> {
    let ids: Vec<String> = nodes
        .iter()
        .map(|node| match &node.explicit_id {
            Some(id) => id.clone(),
            None => derive_id(namespace, &node.activity_type, &node.path),
        })
        .collect();

    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(ids.len());
    for (position, id) in ids.iter().enumerate() {
        if let Some(&first) = seen.get(id.as_str()) {
            return Err(BuildError::DuplicateIdentity {
                id: id.clone(),
                first: nodes[first].path.clone(),
                second: nodes[position].path.clone(),
            });
        }
        seen.insert(id.as_str(), position);
    }

    let paths: Vec<StructuralPath> = nodes.iter().map(|node| node.path.clone()).collect();
    let by_path = paths
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, path)| (path, index))
        .collect();

    tracing::debug!(
        "Assigned {} activity ids ({} explicit)",
        ids.len(),
        nodes.iter().filter(|node| node.explicit_id.is_some()).count()
    );

    Ok(IdentityMap { ids, paths, by_path })
}

/// Write the resolved identifiers back onto the activity tree.
pub fn apply_identities(root: &mut (dyn Activity + 'static), identities: &IdentityMap) {
    let visited = walk_mut(root, &mut |index, activity| {
        if let Some(id) = identities.id(index) {
            if activity.id() != Some(id) {
                activity.set_id(id.to_string());
            }
        }
    });
    debug_assert_eq!(visited, identities.len());
}
