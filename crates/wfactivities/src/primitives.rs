use wfcore::{Activity, ActivityDescriptor};

pub const SET_VARIABLE: &str = "primitives.set_variable";
pub const WRITE_LINE: &str = "console.write_line";

/// Assign a value to a named variable
#[derive(Debug, Clone, Default)]
pub struct SetVariable {
    pub id: Option<String>,
    pub variable: String,
    pub value: serde_json::Value,
}

impl SetVariable {
    pub fn new(variable: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            id: None,
            variable: variable.into(),
            value: value.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Activity for SetVariable {
    fn activity_type(&self) -> &str {
        SET_VARIABLE
    }

    fn descriptor(&self) -> ActivityDescriptor {
        ActivityDescriptor::new(SET_VARIABLE)
            .with_category("primitives")
            .with_description("Assign a value to a variable")
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

/// Write a line of text to the console
#[derive(Debug, Clone, Default)]
pub struct WriteLine {
    pub id: Option<String>,
    pub text: String,
}

impl WriteLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Activity for WriteLine {
    fn activity_type(&self) -> &str {
        WRITE_LINE
    }

    fn descriptor(&self) -> ActivityDescriptor {
        ActivityDescriptor::new(WRITE_LINE)
            .with_category("console")
            .with_description("Write a line of text")
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}
