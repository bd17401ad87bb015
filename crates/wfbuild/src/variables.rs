use crate::visitor::walk_mut;
use std::collections::HashSet;
use wfcore::{Activity, Variable};

pub const VARIABLE_NAME_PREFIX: &str = "Variable_";

pub fn generated_name(ordinal: usize) -> String {
    format!("{}{}", VARIABLE_NAME_PREFIX, ordinal)
}

/// Name every unnamed variable in declaration order, counting from zero
/// over the unnamed ones only. Explicitly named variables are left alone,
/// even when their name matches a generated one. Returns how many names
/// were generated.
pub fn name_variables(variables: &mut [Variable]) -> usize {
    let explicit: HashSet<String> = variables
        .iter()
        .filter(|variable| variable.is_named())
        .filter_map(|variable| variable.name.clone())
        .collect();

    let mut generated = 0;
    for variable in variables.iter_mut().filter(|variable| !variable.is_named()) {
        let name = generated_name(generated);
        if explicit.contains(&name) {
            tracing::warn!(
                "Generated variable name {} is also used by an explicitly named variable",
                name
            );
        }
        variable.name = Some(name);
        generated += 1;
    }
    generated
}

/// Name the variables of every variable container in the tree. Returns the
/// total number of generated names.
pub fn resolve_scopes(root: &mut (dyn Activity + 'static)) -> usize {
    let mut generated = 0;
    walk_mut(root, &mut |_, activity| {
        if let Some(container) = activity.variable_container_mut() {
            generated += name_variables(container.variables_mut());
        }
    });
    generated
}
