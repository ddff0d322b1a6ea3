//! Provisioning plan: everything the remote steps need, computed locally.
//!
//! ## Steps
//!
//! 1. `<id>-init`: init script, re-run when its content changes.
//! 2. `<id>-roles-copy-<n>`: one directory push per role path.
//! 3. `<id>-run`: run script, re-run when the trigger sequence changes.

use chrono::{DateTime, Utc};
use serde_yaml::Value;

use provisioner_core::types::{Playbook, ProvisionId, RoleCopy, Sensitive, Trigger};
use provisioner_core::{ProvisionerConfig, SensitiveField};
use provisioner_renderer::{
    build_clean_command, build_file_write_command, build_remote_path_init_command,
    build_run_command, concat_commands, make_playbook_output, to_yaml, PlaybookInputs, RunCommand,
    BACKOFF_FUNCTION,
};

use crate::error::SyncError;
use crate::hasher::string_hash;
use crate::roles::{gather_roles_files, make_role_copies};
use crate::triggers::{make_triggers, TriggerInputs};

/// Knobs that do not come from the configuration file.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Inject a `forced-at:` token so the run step re-executes.
    pub force: bool,
    /// Identity of the init step; defaults to `<id>-init`.
    pub init_identity: Option<String>,
}

/// Computed provisioning plan for one configuration.
#[derive(Debug, Clone)]
pub struct Plan {
    pub id: ProvisionId,
    pub remote_path: String,
    pub playbook: Sensitive<Playbook>,
    pub playbook_yaml: Sensitive<String>,
    pub requirements: Option<Sensitive<Value>>,
    pub init_step: String,
    pub init_script: Sensitive<String>,
    pub role_copies: Vec<RoleCopy>,
    pub run_step: String,
    pub run_script: String,
    pub triggers: Vec<Trigger>,
    input_triggers: Option<Vec<Value>>,
    revision: Option<String>,
    forced_at: Option<DateTime<Utc>>,
}

impl Plan {
    /// Build the documents, scripts, role copies and the trigger sequence.
    ///
    /// Walks and hashes every role path; fails if one is missing.
    pub fn build(config: &ProvisionerConfig, options: &PlanOptions) -> Result<Plan, SyncError> {
        config.validate()?;
        let id = config.id.clone();
        let remote_path = config.remote_path.clone();

        let playbook = Sensitive::new(
            make_playbook_output(PlaybookInputs::from(config)),
            config.secrecy(SensitiveField::Playbook),
        );
        let playbook_yaml = Sensitive::new(to_yaml(playbook.expose())?, playbook.secrecy());
        let requirements = config.requirements.clone().map(|value| {
            Sensitive::new(value, config.secrecy(SensitiveField::Requirements))
        });

        let init_script = build_init_script(config, &playbook_yaml, requirements.as_ref())?;
        let role_copies = make_role_copies(&id, config.role_paths.as_slice())?;

        let run_script =
            build_run_command(&RunCommand::new(&remote_path, &id.0).with_backoff(true));

        let forced_at = options.force.then(Utc::now);
        if forced_at.is_some() {
            tracing::info!("{}: forcing re-run", id.run_step());
        }

        let mut plan = Plan {
            init_step: id.init_step(),
            run_step: id.run_step(),
            id,
            remote_path,
            playbook,
            playbook_yaml,
            requirements,
            init_script,
            role_copies,
            run_script,
            triggers: vec![],
            input_triggers: config.triggers.clone(),
            revision: config.revision.clone(),
            forced_at,
        };
        let identity = options
            .init_identity
            .clone()
            .unwrap_or_else(|| plan.init_step.clone());
        plan.triggers = plan.compose_triggers(&identity)?;
        Ok(plan)
    }

    /// Trigger sequence for a given init step identity.
    pub fn compose_triggers(&self, init_identity: &str) -> Result<Vec<Trigger>, SyncError> {
        make_triggers(&TriggerInputs {
            remote_path: &self.remote_path,
            input_triggers: self.input_triggers.as_deref(),
            requirements: self.requirements.as_ref().map(|r| r.as_ref()),
            document: self.playbook.as_ref(),
            init_identity,
            init_command: self.init_script.as_ref().map(String::as_str),
            role_copies: &self.role_copies,
            revision: self.revision.as_deref(),
            forced_at: self.forced_at,
        })
    }

    /// Content hash of the init script; never exposes the script itself.
    pub fn init_hash(&self) -> String {
        string_hash(self.init_script.expose())
    }

    /// Remote location of the serialized playbook.
    pub fn playbook_path(&self) -> String {
        format!("{}/{}", self.remote_path, self.id.playbook_file())
    }
}

/// Compose the init script from the configuration and the serialized
/// documents. Its secrecy is the join of every secret-capable input.
pub fn build_init_script(
    config: &ProvisionerConfig,
    playbook_yaml: &Sensitive<String>,
    requirements: Option<&Sensitive<Value>>,
) -> Result<Sensitive<String>, SyncError> {
    let remote_path = config.remote_path.as_str();
    let mut secrecy = playbook_yaml.secrecy();
    let mut fragments: Vec<Option<String>> =
        vec![Some(build_remote_path_init_command(remote_path))];

    if let Some(install) = &config.ansible_install_command {
        secrecy = secrecy.join(config.secrecy(SensitiveField::InstallCommand));
        fragments.push(Some(BACKOFF_FUNCTION.to_string()));
        fragments.push(Some(install.clone()));
    }

    if config.clean {
        let mut keep = vec![config.id.playbook_file()];
        if requirements.is_some() {
            keep.push("requirements.yml".to_string());
        }
        keep.extend(gather_roles_files(config.role_paths.as_slice())?.into_keys());
        tracing::debug!("clean step keeps {} file(s)", keep.len());
        fragments.push(Some(build_clean_command(remote_path, &keep)));
    }

    if let Some(requirements) = requirements {
        secrecy = secrecy.join(requirements.secrecy());
        let yaml = to_yaml(requirements.expose())?;
        fragments.push(Some(build_file_write_command(
            &format!("{remote_path}/requirements.yml"),
            &yaml,
        )));
    }

    fragments.push(Some(build_file_write_command(
        &format!("{remote_path}/{}", config.id.playbook_file()),
        playbook_yaml.expose(),
    )));

    Ok(Sensitive::new(concat_commands(fragments), secrecy))
}
