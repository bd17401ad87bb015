use std::collections::{BTreeMap, HashSet};
use wfcore::{
    Activity, ActivityDescriptor, ActivityNode, PathSegment, PortContent, PortContentMut,
    PortDescriptor, PortKind, StructuralError, StructuralPath,
};

/// Flattened, pre-ordered view of an activity tree
#[derive(Debug, Clone, Default)]
pub struct ActivityGraph {
    nodes: Vec<ActivityNode>,
    descriptors: BTreeMap<String, ActivityDescriptor>,
}

impl ActivityGraph {
    pub fn nodes(&self) -> &[ActivityNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&ActivityNode> {
        self.nodes.first()
    }

    pub fn get(&self, index: usize) -> Option<&ActivityNode> {
        self.nodes.get(index)
    }

    /// Direct children of `index`, in port order
    pub fn children(&self, index: usize) -> impl Iterator<Item = &ActivityNode> {
        self.nodes
            .iter()
            .filter(move |node| node.parent == Some(index))
    }

    /// Distinct activity descriptors keyed by type name. When instances of
    /// one type report different descriptors, the first one seen is kept.
    pub fn descriptors(&self) -> &BTreeMap<String, ActivityDescriptor> {
        &self.descriptors
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    pub fn variable_containers(&self) -> impl Iterator<Item = &ActivityNode> {
        self.nodes.iter().filter(|node| node.is_variable_container)
    }
}

/// Walk `root` in pre-order and produce the flattened node list.
///
/// Children are visited in declared port order and, within a port, in
/// sequence order. Only declared ports are followed, so every authored
/// activity instance yields exactly one node.
pub fn flatten(root: &dyn Activity) -> Result<ActivityGraph, StructuralError> {
    let mut visitor = GraphVisitor::default();
    visitor.visit(root, None, None, StructuralPath::root())?;

    tracing::debug!(
        "Flattened {} activities of {} types",
        visitor.graph.nodes.len(),
        visitor.graph.descriptors.len()
    );

    Ok(visitor.graph)
}

#[derive(Default)]
struct GraphVisitor {
    graph: ActivityGraph,
}

impl GraphVisitor {
    fn visit(
        &mut self,
        activity: &dyn Activity,
        parent: Option<usize>,
        segment: Option<PathSegment>,
        path: StructuralPath,
    ) -> Result<(), StructuralError> {
        let descriptor = activity.descriptor();
        check_port_names(&descriptor)?;

        let index = self.graph.nodes.len();
        self.graph.nodes.push(ActivityNode {
            index,
            parent,
            segment,
            path: path.clone(),
            activity_type: activity.activity_type().to_string(),
            explicit_id: activity
                .id()
                .filter(|id| !id.trim().is_empty())
                .map(String::from),
            is_variable_container: activity.variable_container().is_some(),
        });

        if !self.graph.descriptors.contains_key(activity.activity_type()) {
            self.graph
                .descriptors
                .insert(activity.activity_type().to_string(), descriptor.clone());
        }

        for port in &descriptor.ports {
            let children = port_children(activity, port, &path)?;
            for (ordinal, child) in children {
                self.visit(
                    child,
                    Some(index),
                    Some(PathSegment::new(port.name.clone(), ordinal)),
                    path.child(port.name.clone(), ordinal),
                )?;
            }
        }

        Ok(())
    }
}

fn check_port_names(descriptor: &ActivityDescriptor) -> Result<(), StructuralError> {
    let mut seen = HashSet::new();
    for port in &descriptor.ports {
        if !seen.insert(port.name.as_str()) {
            return Err(StructuralError::DuplicatePort {
                activity_type: descriptor.type_name.clone(),
                port: port.name.clone(),
            });
        }
    }
    Ok(())
}

/// Validate one port's content against its declaration and return the
/// children with their ordinals.
fn port_children<'a>(
    activity: &'a dyn Activity,
    port: &PortDescriptor,
    path: &StructuralPath,
) -> Result<Vec<(usize, &'a dyn Activity)>, StructuralError> {
    match (port.kind, activity.port(&port.name)) {
        (PortKind::Single { .. }, Some(PortContent::Single(Some(child)))) => Ok(vec![(0, child)]),
        (PortKind::Single { required: false }, None | Some(PortContent::Single(None))) => {
            Ok(Vec::new())
        }
        (PortKind::Single { required: true }, None | Some(PortContent::Single(None))) => {
            Err(StructuralError::MissingRequiredPort {
                path: path.clone(),
                activity_type: activity.activity_type().to_string(),
                port: port.name.clone(),
            })
        }
        (PortKind::List, Some(PortContent::List(children))) => children
            .into_iter()
            .enumerate()
            .map(|(ordinal, child)| {
                child
                    .map(|child| (ordinal, child))
                    .ok_or_else(|| StructuralError::NullChild {
                        path: path.clone(),
                        activity_type: activity.activity_type().to_string(),
                        port: port.name.clone(),
                        ordinal,
                    })
            })
            .collect(),
        (kind, content) => Err(StructuralError::PortKindMismatch {
            path: path.clone(),
            activity_type: activity.activity_type().to_string(),
            port: port.name.clone(),
            expected: kind.label(),
            actual: content.as_ref().map_or("nothing", |content| content.label()),
        }),
    }
}

/// Mutable pre-order walk in the same order as [`flatten`]. The callback
/// receives the node index each activity had in the flattened list.
///
/// Only meaningful on a tree that `flatten` accepted; malformed entries are
/// skipped rather than reported. Returns the number of activities visited.
pub fn walk_mut<F>(root: &mut (dyn Activity + 'static), f: &mut F) -> usize
where
    F: FnMut(usize, &mut (dyn Activity + 'static)),
{
    let mut next = 0;
    walk_node(root, &mut next, f);
    next
}

fn walk_node<F>(activity: &mut (dyn Activity + 'static), next: &mut usize, f: &mut F)
where
    F: FnMut(usize, &mut (dyn Activity + 'static)),
{
    let index = *next;
    *next += 1;
    f(index, &mut *activity);

    let descriptor = activity.descriptor();
    for port in &descriptor.ports {
        match activity.port_mut(&port.name) {
            Some(PortContentMut::Single(Some(child))) => walk_node(child, next, f),
            Some(PortContentMut::List(children)) => {
                for child in children.into_iter().flatten() {
                    walk_node(child, next, f);
                }
            }
            _ => {}
        }
    }
}
