//! Testing utilities for the Warden workspace
//!
//! Shared test doubles and fixtures.

#![allow(missing_docs)]

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use warden_authority::{AuthorityError, AuthorityGuard, Context, ExecutionOutcome, NonAction, Payload};

/// Fixed refusal timestamp used by scripted refusals
pub const SCRIPTED_TIMESTAMP: i64 = 1_700_000_000_000;

#[derive(Debug, Clone)]
enum Script {
    Succeed(Payload),
    Refuse(String),
    Raise(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub capability_name: String,
    pub context: Context,
}

/// Deterministic Authority Guard that records every invocation
///
/// Unscripted capabilities succeed with `{"capability": name, "call": n}`
/// and snapshot id `snap-{n}`, where `n` counts calls from zero.
#[derive(Debug, Default)]
pub struct ScriptedAuthorityGuard {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedAuthorityGuard {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn succeed_with(mut self, capability: &str, data: Value) -> Self {
        self.scripts
            .insert(capability.to_string(), Script::Succeed(payload(data)));
        self
    }

    #[must_use]
    pub fn refuse(mut self, capability: &str, reason: &str) -> Self {
        self.scripts
            .insert(capability.to_string(), Script::Refuse(reason.to_string()));
        self
    }

    #[must_use]
    pub fn raise(mut self, capability: &str, message: &str) -> Self {
        self.scripts
            .insert(capability.to_string(), Script::Raise(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn invoked(&self, capability: &str) -> bool {
        self.calls
            .lock()
            .iter()
            .any(|c| c.capability_name == capability)
    }
}

impl AuthorityGuard for ScriptedAuthorityGuard {
    fn execute(
        &self,
        capability_name: &str,
        context: &Context,
    ) -> Result<ExecutionOutcome, AuthorityError> {
        let n = {
            let mut calls = self.calls.lock();
            calls.push(RecordedCall {
                capability_name: capability_name.to_string(),
                context: context.clone(),
            });
            calls.len() - 1
        };

        match self.scripts.get(capability_name) {
            Some(Script::Succeed(data)) => Ok(ExecutionOutcome::success(data.clone(), format!("snap-{n}"))),
            Some(Script::Refuse(reason)) => Ok(ExecutionOutcome::refused(
                NonAction::new(reason.clone(), SCRIPTED_TIMESTAMP)
                    .with_detail("capability", capability_name),
            )),
            Some(Script::Raise(message)) => Err(AuthorityError::raised(message.clone())),
            None => {
                let mut data = Payload::new();
                data.insert("capability".to_string(), capability_name.into());
                data.insert("call".to_string(), n.into());
                Ok(ExecutionOutcome::success(data, format!("snap-{n}")))
            }
        }
    }
}

/// Build a map from a JSON object literal; non-objects yield an empty map
pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => Payload::new(),
    }
}

/// Build a [`Context`] from a JSON object literal
pub fn context(value: Value) -> Context {
    payload(value)
}

/// Context carrying the principal and grant identifiers the guards look for
pub fn principal_context(principal_id: &str, grant_id: &str) -> Context {
    context(serde_json::json!({
        "principal_id": principal_id,
        "grant_id": grant_id,
    }))
}
