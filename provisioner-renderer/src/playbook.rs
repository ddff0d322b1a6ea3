//! Playbook document builder and serializer.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use provisioner_core::types::{Play, Playbook, Role};
use provisioner_core::ProvisionerConfig;

use crate::error::RenderError;

/// The user-supplied parts of the play.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybookInputs {
    pub roles: Option<Vec<Role>>,
    pub pre_tasks: Option<Vec<Value>>,
    pub post_tasks: Option<Vec<Value>>,
    pub tasks: Option<Vec<Value>>,
    pub vars: Option<Mapping>,
}

impl From<&ProvisionerConfig> for PlaybookInputs {
    fn from(config: &ProvisionerConfig) -> Self {
        Self {
            roles: config.roles.clone(),
            pre_tasks: config.pre_tasks.clone(),
            post_tasks: config.post_tasks.clone(),
            tasks: config.tasks.clone(),
            vars: config.vars.clone(),
        }
    }
}

/// Wrap the inputs into the one-play list run against `localhost` with
/// local connection and privilege escalation.
///
/// Role and task shapes are not validated; the tool does that at run time.
pub fn make_playbook_output(inputs: PlaybookInputs) -> Playbook {
    Playbook(vec![Play {
        hosts: "localhost".to_string(),
        connection: "local".to_string(),
        r#become: true,
        roles: inputs.roles.unwrap_or_default(),
        pre_tasks: inputs.pre_tasks,
        post_tasks: inputs.post_tasks,
        tasks: inputs.tasks,
        vars: inputs.vars,
    }])
}

/// Serialize any document (playbook, requirements) to YAML.
pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String, RenderError> {
    Ok(serde_yaml::to_string(value)?)
}
