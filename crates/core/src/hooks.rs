//! Lifecycle hooks.
//!
//! Applications attach hooks to the write lifecycle of a resource type:
//! around creation, update, save and destroy, plus one stage fired when a
//! fresh record is first materialized. Hooks registered for all types run
//! before hooks registered for the specific type, and within a bucket in
//! registration order. The first failing hook aborts the stage.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::resource::Resource;

/// The points in the write lifecycle a hook can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HookStage {
    /// A fresh record was materialized from a request document.
    AfterInitialize,
    /// About to create a record.
    BeforeCreate,
    /// A record was created.
    AfterCreate,
    /// About to update a record.
    BeforeUpdate,
    /// A record was updated.
    AfterUpdate,
    /// About to save (create or update).
    BeforeSave,
    /// A record was saved (create or update).
    AfterSave,
    /// About to destroy a record.
    BeforeDestroy,
    /// A record was destroyed.
    AfterDestroy,
}

/// A failed hook.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HookError {
    /// Explanation surfaced in the error response.
    pub message: String,
}

impl HookError {
    /// Creates a hook error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A lifecycle hook over the record being written.
pub type Hook = fn(&mut Resource) -> Result<(), HookError>;

/// Ordered hooks, bucketed by resource type and stage.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    global: BTreeMap<HookStage, Vec<Hook>>,
    typed: BTreeMap<String, BTreeMap<HookStage, Vec<Hook>>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook for one resource type.
    pub fn register(&mut self, type_name: impl Into<String>, stage: HookStage, hook: Hook) {
        self.typed
            .entry(type_name.into())
            .or_default()
            .entry(stage)
            .or_default()
            .push(hook);
    }

    /// Registers a hook that runs for every resource type, ahead of the
    /// type's own hooks.
    pub fn register_global(&mut self, stage: HookStage, hook: Hook) {
        self.global.entry(stage).or_default().push(hook);
    }

    /// Runs all hooks for `stage` against `resource`, stopping at the
    /// first failure.
    pub fn run(
        &self,
        type_name: &str,
        stage: HookStage,
        resource: &mut Resource,
    ) -> Result<(), HookError> {
        if let Some(hooks) = self.global.get(&stage) {
            for hook in hooks {
                hook(resource)?;
            }
        }
        if let Some(hooks) = self.typed.get(type_name).and_then(|stages| stages.get(&stage)) {
            for hook in hooks {
                hook(resource)?;
            }
        }
        Ok(())
    }
}
