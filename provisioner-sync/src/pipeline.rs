//! Sequential apply of a [`Plan`] through the remote collaborators.
//!
//! Step order is fixed: init, then every role copy, then run. Each step is
//! skipped when the recorded state says its inputs did not change. The
//! caller persists the returned state, or [`SyncError::progress`] when a
//! later step fails.

use std::collections::BTreeMap;

use chrono::Utc;

use provisioner_core::{ConnectionConfig, RemoteCopy, RemoteExecutor};

use crate::diff::detect_changes;
use crate::error::SyncError;
use crate::plan::Plan;
use crate::state::TriggerState;

/// What happened to one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed,
    Unchanged,
}

/// Result of [`apply`].
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub init: StepOutcome,
    pub copies: Vec<(String, StepOutcome)>,
    pub run: StepOutcome,
    /// State to record for the next evaluation.
    pub state: TriggerState,
}

/// Apply `plan` against the host behind `connection`.
///
/// A step that exits non-zero stops the apply with
/// [`SyncError::RemoteExecution`]; nothing after it runs. Failures after
/// the init step are wrapped in [`SyncError::Interrupted`] together with
/// the state of the completed steps.
pub fn apply<E, C>(
    plan: &Plan,
    connection: &ConnectionConfig,
    previous: Option<&TriggerState>,
    executor: &E,
    copier: &C,
) -> Result<ApplyOutcome, SyncError>
where
    E: RemoteExecutor + ?Sized,
    C: RemoteCopy + ?Sized,
{
    let changes = detect_changes(plan, previous)?;

    let (init, init_identity) = match previous {
        Some(prev) if !changes.init.changed => {
            tracing::info!("{}: unchanged", plan.init_step);
            (StepOutcome::Unchanged, prev.init_identity.clone())
        }
        _ => {
            tracing::info!("{}: executing", plan.init_step);
            let execution = executor.run(connection, plan.init_script.expose())?;
            if !execution.success() {
                return Err(SyncError::RemoteExecution {
                    step: plan.init_step.clone(),
                    status: execution.exit_status,
                });
            }
            (StepOutcome::Executed, execution.identity)
        }
    };

    let mut recorded = previous.map(|p| p.copies.clone()).unwrap_or_default();
    let mut copies = Vec::with_capacity(plan.role_copies.len());
    for (copy, change) in plan.role_copies.iter().zip(&changes.copies) {
        if change.changed {
            tracing::info!(
                "{}: copying {} to {}",
                copy.resource_id,
                copy.role_path.display(),
                plan.remote_path
            );
            if let Err(e) = copier.copy(connection, &copy.role_path, &plan.remote_path) {
                return Err(interrupted(e.into(), plan, previous, &init_identity, recorded));
            }
            copies.push((copy.resource_id.clone(), StepOutcome::Executed));
        } else {
            copies.push((copy.resource_id.clone(), StepOutcome::Unchanged));
        }
        recorded.insert(copy.resource_id.clone(), copy.hash.clone());
    }

    let state = TriggerState::from_plan(plan, &init_identity)?;
    let run_changed = previous.map_or(true, |prev| prev.triggers != state.triggers);
    let run = if run_changed {
        tracing::info!("{}: executing", plan.run_step);
        let failure = match executor.run(connection, &plan.run_script) {
            Ok(execution) if execution.success() => None,
            Ok(execution) => Some(SyncError::RemoteExecution {
                step: plan.run_step.clone(),
                status: execution.exit_status,
            }),
            Err(e) => Some(e.into()),
        };
        if let Some(failure) = failure {
            return Err(interrupted(failure, plan, previous, &init_identity, recorded));
        }
        StepOutcome::Executed
    } else {
        tracing::info!("{}: unchanged", plan.run_step);
        StepOutcome::Unchanged
    };

    Ok(ApplyOutcome {
        init,
        copies,
        run,
        state,
    })
}

/// State after a partial apply: init and the finished copies are recorded,
/// the run fingerprint stays at its previous value so the run step re-runs.
fn interrupted(
    source: SyncError,
    plan: &Plan,
    previous: Option<&TriggerState>,
    init_identity: &str,
    copies: BTreeMap<String, String>,
) -> SyncError {
    tracing::warn!("{}: stopped, recording partial progress", plan.id);
    SyncError::Interrupted {
        source: Box::new(source),
        progress: Box::new(TriggerState {
            recorded_at: Utc::now(),
            init_identity: init_identity.to_string(),
            init_hash: plan.init_hash(),
            copies,
            triggers: previous.map(|p| p.triggers.clone()).unwrap_or_default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::path::{Path, PathBuf};

    use provisioner_core::{Execution, ProvisionerConfig, TransportError};
    use tempfile::TempDir;

    use crate::plan::PlanOptions;

    #[derive(Default)]
    struct RecordingExecutor {
        scripts: RefCell<Vec<String>>,
        fail_with: Option<i32>,
        /// 1-based call that fails; every call when unset.
        fail_on: Option<usize>,
    }

    impl RemoteExecutor for RecordingExecutor {
        fn run(
            &self,
            _connection: &ConnectionConfig,
            script: &str,
        ) -> Result<Execution, TransportError> {
            let mut scripts = self.scripts.borrow_mut();
            scripts.push(script.to_string());
            let call = scripts.len();
            let failed = self
                .fail_with
                .filter(|_| self.fail_on.map_or(true, |n| n == call));
            Ok(Execution {
                exit_status: failed.unwrap_or(0),
                identity: format!("exec-{}", scripts.len()),
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingCopy {
        copied: RefCell<Vec<(PathBuf, String)>>,
    }

    impl RemoteCopy for RecordingCopy {
        fn copy(
            &self,
            _connection: &ConnectionConfig,
            local: &Path,
            remote: &str,
        ) -> Result<(), TransportError> {
            self.copied
                .borrow_mut()
                .push((local.to_path_buf(), remote.to_string()));
            Ok(())
        }
    }

    fn setup() -> (TempDir, ProvisionerConfig) {
        let tmp = TempDir::new().unwrap();
        let role = tmp.path().join("web");
        fs::create_dir_all(role.join("tasks")).unwrap();
        fs::write(role.join("tasks/main.yml"), "- ping:\n").unwrap();
        let mut config = ProvisionerConfig::new("main");
        config.role_paths = vec![role];
        (tmp, config)
    }

    fn conn() -> ConnectionConfig {
        ConnectionConfig {
            host: "10.0.0.5".into(),
            ..Default::default()
        }
    }

    #[test]
    fn first_apply_runs_every_step_in_order() {
        let (_tmp, config) = setup();
        let plan = Plan::build(&config, &PlanOptions::default()).unwrap();
        let executor = RecordingExecutor::default();
        let copier = RecordingCopy::default();

        let outcome = apply(&plan, &conn(), None, &executor, &copier).unwrap();
        assert_eq!(outcome.init, StepOutcome::Executed);
        assert_eq!(outcome.run, StepOutcome::Executed);
        assert_eq!(outcome.copies[0].1, StepOutcome::Executed);

        let scripts = executor.scripts.borrow();
        assert_eq!(scripts.len(), 2);
        assert!(scripts[0].starts_with("sudo mkdir -p"));
        assert!(scripts[1].starts_with("set -eu\n"));
        assert_eq!(copier.copied.borrow()[0].1, "/var/ansible");

        assert_eq!(outcome.state.init_identity, "exec-1");
        assert!(outcome
            .state
            .triggers
            .contains(&provisioner_core::Trigger::Token("init-id:exec-1".into())));
    }

    #[test]
    fn second_apply_with_same_inputs_is_a_no_op() {
        let (_tmp, config) = setup();
        let plan = Plan::build(&config, &PlanOptions::default()).unwrap();
        let first = apply(
            &plan,
            &conn(),
            None,
            &RecordingExecutor::default(),
            &RecordingCopy::default(),
        )
        .unwrap();

        let executor = RecordingExecutor::default();
        let copier = RecordingCopy::default();
        let second =
            apply(&plan, &conn(), Some(&first.state), &executor, &copier).unwrap();
        assert_eq!(second.init, StepOutcome::Unchanged);
        assert_eq!(second.run, StepOutcome::Unchanged);
        assert_eq!(second.copies[0].1, StepOutcome::Unchanged);
        assert!(executor.scripts.borrow().is_empty());
        assert!(copier.copied.borrow().is_empty());
        assert_eq!(second.state.triggers, first.state.triggers);
    }

    #[test]
    fn forced_plan_reruns_run_step_only() {
        let (_tmp, config) = setup();
        let plan = Plan::build(&config, &PlanOptions::default()).unwrap();
        let first = apply(
            &plan,
            &conn(),
            None,
            &RecordingExecutor::default(),
            &RecordingCopy::default(),
        )
        .unwrap();

        let forced = Plan::build(
            &config,
            &PlanOptions {
                force: true,
                init_identity: None,
            },
        )
        .unwrap();
        let executor = RecordingExecutor::default();
        let outcome = apply(
            &forced,
            &conn(),
            Some(&first.state),
            &executor,
            &RecordingCopy::default(),
        )
        .unwrap();
        assert_eq!(outcome.init, StepOutcome::Unchanged);
        assert_eq!(outcome.run, StepOutcome::Executed);
        assert_eq!(executor.scripts.borrow().len(), 1);
    }

    #[test]
    fn failing_init_stops_before_copies() {
        let (_tmp, config) = setup();
        let plan = Plan::build(&config, &PlanOptions::default()).unwrap();
        let executor = RecordingExecutor {
            fail_with: Some(3),
            ..Default::default()
        };
        let copier = RecordingCopy::default();

        let err = apply(&plan, &conn(), None, &executor, &copier).unwrap_err();
        match err {
            SyncError::RemoteExecution { step, status } => {
                assert_eq!(step, "main-init");
                assert_eq!(status, 3);
            }
            other => panic!("expected remote execution failure, got {other:?}"),
        }
        assert!(copier.copied.borrow().is_empty());
        assert_eq!(executor.scripts.borrow().len(), 1);
    }

    #[test]
    fn failed_run_keeps_progress_of_completed_steps() {
        let (_tmp, config) = setup();
        let plan = Plan::build(&config, &PlanOptions::default()).unwrap();
        let executor = RecordingExecutor {
            fail_with: Some(2),
            fail_on: Some(2),
            ..Default::default()
        };

        let err = apply(&plan, &conn(), None, &executor, &RecordingCopy::default()).unwrap_err();
        match &err {
            SyncError::Interrupted { source, .. } => match source.as_ref() {
                SyncError::RemoteExecution { step, status } => {
                    assert_eq!(step, "main-run");
                    assert_eq!(*status, 2);
                }
                other => panic!("expected run failure, got {other:?}"),
            },
            other => panic!("expected interrupted apply, got {other:?}"),
        }
        let progress = err.progress().unwrap().clone();
        assert_eq!(progress.init_identity, "exec-1");
        assert_eq!(progress.init_hash, plan.init_hash());
        assert_eq!(
            progress.copies.get("main-roles-copy-0"),
            Some(&plan.role_copies[0].hash)
        );
        assert!(progress.triggers.is_empty());

        let retry = RecordingExecutor::default();
        let copier = RecordingCopy::default();
        let outcome = apply(&plan, &conn(), Some(&progress), &retry, &copier).unwrap();
        assert_eq!(outcome.init, StepOutcome::Unchanged);
        assert_eq!(outcome.copies[0].1, StepOutcome::Unchanged);
        assert_eq!(outcome.run, StepOutcome::Executed);
        assert_eq!(retry.scripts.borrow().len(), 1);
        assert!(copier.copied.borrow().is_empty());
        assert_eq!(outcome.state.init_identity, "exec-1");
    }
}
