use serde::{Deserialize, Serialize};
use wfcore::{
    Activity, ActivityDescriptor, PortContent, PortContentMut, PortDescriptor, Variable,
    VariableContainer,
};

pub const SEQUENCE: &str = "control.sequence";
pub const FORK: &str = "control.fork";
pub const IF: &str = "control.if";
pub const WHILE: &str = "control.while";
pub const BREAK: &str = "control.break";

/// Runs its activities one after the other. Owns a variable scope.
#[derive(Debug, Default)]
pub struct Sequence {
    pub id: Option<String>,
    pub activities: Vec<Box<dyn Activity>>,
    pub variables: Vec<Variable>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_activity(mut self, activity: impl Activity + 'static) -> Self {
        self.activities.push(Box::new(activity));
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }
}

impl Activity for Sequence {
    fn activity_type(&self) -> &str {
        SEQUENCE
    }

    fn descriptor(&self) -> ActivityDescriptor {
        ActivityDescriptor::new(SEQUENCE)
            .with_category("control")
            .with_description("Execute activities in order")
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

impl VariableContainer for Sequence {
    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn variables_mut(&mut self) -> &mut [Variable] {
        &mut self.variables
    }
}

/// How a fork decides it is done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    #[default]
    WaitAll,
    WaitAny,
}

/// Runs its branches in parallel
#[derive(Debug, Default)]
pub struct Fork {
    pub id: Option<String>,
    pub join_mode: JoinMode,
    pub branches: Vec<Box<dyn Activity>>,
}

impl Fork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_join_mode(mut self, join_mode: JoinMode) -> Self {
        self.join_mode = join_mode;
        self
    }

    pub fn with_branch(mut self, branch: impl Activity + 'static) -> Self {
        self.branches.push(Box::new(branch));
        self
    }
}

impl Activity for Fork {
    fn activity_type(&self) -> &str {
        FORK
    }

    fn descriptor(&self) -> ActivityDescriptor {
        ActivityDescriptor::new(FORK)
            .with_category("control")
            .with_description("Execute branches in parallel")
            .with_port(PortDescriptor::list("Branches"))
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn port(&self, name: &str) -> Option<PortContent<'_>> {
        match name {
            "Branches" => Some(PortContent::List(
                self.branches.iter().map(|b| Some(&**b)).collect(),
            )),
            _ => None,
        }
    }

    fn port_mut(&mut self, name: &str) -> Option<PortContentMut<'_>> {
        match name {
            "Branches" => Some(PortContentMut::List(
                self.branches.iter_mut().map(|b| Some(&mut **b)).collect(),
            )),
            _ => None,
        }
    }
}

/// Conditional with optional `Then` and `Else` branches
#[derive(Debug, Default)]
pub struct If {
    pub id: Option<String>,
    pub condition: String,
    pub then_branch: Option<Box<dyn Activity>>,
    pub else_branch: Option<Box<dyn Activity>>,
}

impl If {
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_then(mut self, activity: impl Activity + 'static) -> Self {
        self.then_branch = Some(Box::new(activity));
        self
    }

    pub fn with_else(mut self, activity: impl Activity + 'static) -> Self {
        self.else_branch = Some(Box::new(activity));
        self
    }
}

impl Activity for If {
    fn activity_type(&self) -> &str {
        IF
    }

    fn descriptor(&self) -> ActivityDescriptor {
        ActivityDescriptor::new(IF)
            .with_category("control")
            .with_description("Branch on a condition")
            .with_port(PortDescriptor::single("Then"))
            .with_port(PortDescriptor::single("Else"))
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn port(&self, name: &str) -> Option<PortContent<'_>> {
        match name {
            "Then" => Some(PortContent::Single(self.then_branch.as_deref())),
            "Else" => Some(PortContent::Single(self.else_branch.as_deref())),
            _ => None,
        }
    }

    fn port_mut(&mut self, name: &str) -> Option<PortContentMut<'_>> {
        match name {
            "Then" => Some(PortContentMut::Single(self.then_branch.as_deref_mut())),
            "Else" => Some(PortContentMut::Single(self.else_branch.as_deref_mut())),
            _ => None,
        }
    }
}

/// Loop over `Body` while the condition holds.
///
/// Looping back is execution-time behavior; structurally the body is an
/// ordinary child visited once.
#[derive(Debug, Default)]
pub struct While {
    pub id: Option<String>,
    pub condition: String,
    pub body: Option<Box<dyn Activity>>,
}

impl While {
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_body(mut self, body: impl Activity + 'static) -> Self {
        self.body = Some(Box::new(body));
        self
    }
}

impl Activity for While {
    fn activity_type(&self) -> &str {
        WHILE
    }

    fn descriptor(&self) -> ActivityDescriptor {
        ActivityDescriptor::new(WHILE)
            .with_category("control")
            .with_description("Repeat the body while a condition holds")
            .with_port(PortDescriptor::required("Body"))
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn port(&self, name: &str) -> Option<PortContent<'_>> {
        match name {
            "Body" => Some(PortContent::Single(self.body.as_deref())),
            _ => None,
        }
    }

    fn port_mut(&mut self, name: &str) -> Option<PortContentMut<'_>> {
        match name {
            "Body" => Some(PortContentMut::Single(self.body.as_deref_mut())),
            _ => None,
        }
    }
}

/// Exit the innermost loop
#[derive(Debug, Default)]
pub struct Break {
    pub id: Option<String>,
}

impl Break {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Activity for Break {
    fn activity_type(&self) -> &str {
        BREAK
    }

    fn descriptor(&self) -> ActivityDescriptor {
        ActivityDescriptor::new(BREAK)
            .with_category("control")
            .with_description("Exit the innermost loop")
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}
