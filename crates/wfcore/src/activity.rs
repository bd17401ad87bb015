use crate::{StructuralPath, Variable, VariableContainer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Core trait implemented by every node of an authored workflow tree.
///
/// Composite activities expose their children through named ports declared
/// in their [`ActivityDescriptor`]. The graph builder only ever walks the
/// declared ports, so an activity that loops or breaks at execution time is
/// still a plain tree structurally.
pub trait Activity: Send + Sync + fmt::Debug {
    /// Type tag (e.g., "control.sequence", "console.write_line")
    fn activity_type(&self) -> &str;

    /// Per-type metadata, including the ordered list of ports
    fn descriptor(&self) -> ActivityDescriptor;

    /// Identifier, either supplied by the author or assigned by a build
    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: String);

    /// Content of a declared port. `None` means the activity does not
    /// expose anything under that name.
    fn port(&self, _name: &str) -> Option<PortContent<'_>> {
        None
    }

    fn port_mut(&mut self, _name: &str) -> Option<PortContentMut<'_>> {
        None
    }

    /// Optional variable-container capability
    fn variable_container(&self) -> Option<&dyn VariableContainer> {
        None
    }

    fn variable_container_mut(&mut self) -> Option<&mut dyn VariableContainer> {
        None
    }
}

/// Metadata about an activity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDescriptor {
    pub type_name: String,
    pub version: u32,
    pub category: String,
    pub description: String,
    pub ports: Vec<PortDescriptor>,
}

impl ActivityDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            version: 1,
            category: "general".to_string(),
            description: String::new(),
            ports: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_port(mut self, port: PortDescriptor) -> Self {
        self.ports.push(port);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescriptor {
    pub name: String,
    pub kind: PortKind,
}

impl PortDescriptor {
    pub fn list(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PortKind::List,
        }
    }

    pub fn single(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PortKind::Single { required: false },
        }
    }

    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PortKind::Single { required: true },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortKind {
    Single { required: bool },
    List,
}

impl PortKind {
    pub fn label(&self) -> &'static str {
        match self {
            PortKind::Single { .. } => "single",
            PortKind::List => "list",
        }
    }
}

/// Children held by one port. A `None` inside a list is an empty entry and
/// is rejected by the graph builder.
pub enum PortContent<'a> {
    Single(Option<&'a dyn Activity>),
    List(Vec<Option<&'a dyn Activity>>),
}

pub enum PortContentMut<'a> {
    Single(Option<&'a mut (dyn Activity + 'static)>),
    List(Vec<Option<&'a mut (dyn Activity + 'static)>>),
}

impl PortContent<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            PortContent::Single(_) => "single",
            PortContent::List(_) => "list",
        }
    }
}

/// Follow `path` down from `root`.
pub fn resolve_path<'a>(root: &'a dyn Activity, path: &StructuralPath) -> Option<&'a dyn Activity> {
    let mut current = root;
    for segment in path.segments() {
        current = match current.port(&segment.port)? {
            PortContent::Single(child) if segment.ordinal == 0 => child?,
            PortContent::Single(_) => return None,
            PortContent::List(children) => (*children.get(segment.ordinal)?)?,
        };
    }
    Some(current)
}

pub const EMPTY_COMPOSITE_TYPE: &str = "core.composite";

/// Composite with an `Activities` list and its own variables. Used as the
/// root of a workflow that was configured without one.
#[derive(Debug, Default)]
pub struct EmptyComposite {
    pub id: Option<String>,
    pub activities: Vec<Box<dyn Activity>>,
    pub variables: Vec<Variable>,
}

impl EmptyComposite {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Activity for EmptyComposite {
    fn activity_type(&self) -> &str {
        EMPTY_COMPOSITE_TYPE
    }

    fn descriptor(&self) -> ActivityDescriptor {
        ActivityDescriptor::new(EMPTY_COMPOSITE_TYPE)
            .with_category("core")
            .with_description("Composite root used when a workflow has none")
            .with_port(PortDescriptor::list("Activities"))
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn port(&self, name: &str) -> Option<PortContent<'_>> {
        match name {
            "Activities" => Some(PortContent::List(
                self.activities.iter().map(|a| Some(&**a)).collect(),
            )),
            _ => None,
        }
    }

    fn port_mut(&mut self, name: &str) -> Option<PortContentMut<'_>> {
        match name {
            "Activities" => Some(PortContentMut::List(
                self.activities.iter_mut().map(|a| Some(&mut **a)).collect(),
            )),
            _ => None,
        }
    }

    fn variable_container(&self) -> Option<&dyn VariableContainer> {
        Some(self)
    }

    fn variable_container_mut(&mut self) -> Option<&mut dyn VariableContainer> {
        Some(self)
    }
}

impl VariableContainer for EmptyComposite {
    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn variables_mut(&mut self) -> &mut [Variable] {
        &mut self.variables
    }
}
