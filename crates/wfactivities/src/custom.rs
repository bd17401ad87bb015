use wfcore::{
    Activity, ActivityDescriptor, PortContent, PortContentMut, PortDescriptor, Variable,
    VariableContainer,
};

/// Children held by one port of a [`CustomActivity`]
#[derive(Debug)]
pub enum CustomPort {
    Single(Option<Box<dyn Activity>>),
    /// Entries may be empty when loaded from a document with `null`s;
    /// the graph builder rejects those.
    List(Vec<Option<Box<dyn Activity>>>),
}

/// Activity whose type and ports are defined at authoring time rather than
/// in code. Owns a variable scope.
#[derive(Debug)]
pub struct CustomActivity {
    pub id: Option<String>,
    descriptor: ActivityDescriptor,
    ports: Vec<CustomPort>,
    pub variables: Vec<Variable>,
    /// Free-form settings; never part of the activity's structure
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl CustomActivity {
    pub fn new(activity_type: impl Into<String>) -> Self {
        Self {
            id: None,
            descriptor: ActivityDescriptor::new(activity_type).with_category("custom"),
            ports: Vec::new(),
            variables: Vec::new(),
            properties: serde_json::Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.descriptor.category = category.into();
        self
    }

    /// Declare a port together with its content. A `Single` port is
    /// declared optional unless `required` is set.
    pub fn with_port(mut self, name: impl Into<String>, required: bool, content: CustomPort) -> Self {
        let name = name.into();
        let declared = match content {
            CustomPort::Single(_) if required => PortDescriptor::required(name),
            CustomPort::Single(_) => PortDescriptor::single(name),
            CustomPort::List(_) => PortDescriptor::list(name),
        };
        self.descriptor.ports.push(declared);
        self.ports.push(content);
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.descriptor.ports.iter().position(|port| port.name == name)
    }
}

impl Activity for CustomActivity {
    fn activity_type(&self) -> &str {
        &self.descriptor.type_name
    }

    fn descriptor(&self) -> ActivityDescriptor {
        self.descriptor.clone()
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn port(&self, name: &str) -> Option<PortContent<'_>> {
        let content = match &self.ports[self.position(name)?] {
            CustomPort::Single(child) => PortContent::Single(child.as_deref()),
            CustomPort::List(children) => {
                PortContent::List(children.iter().map(|child| child.as_deref()).collect())
            }
        };
        Some(content)
    }

    fn port_mut(&mut self, name: &str) -> Option<PortContentMut<'_>> {
        let position = self.position(name)?;
        let content = match &mut self.ports[position] {
            CustomPort::Single(child) => PortContentMut::Single(child.as_deref_mut()),
            CustomPort::List(children) => PortContentMut::List(
                children.iter_mut().map(|child| child.as_deref_mut()).collect(),
            ),
        };
        Some(content)
    }

    fn variable_container(&self) -> Option<&dyn VariableContainer> {
        Some(self)
    }

    fn variable_container_mut(&mut self) -> Option<&mut dyn VariableContainer> {
        Some(self)
    }
}

impl VariableContainer for CustomActivity {
    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn variables_mut(&mut self) -> &mut [Variable] {
        &mut self.variables
    }
}
