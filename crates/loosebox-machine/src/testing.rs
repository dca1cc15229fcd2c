//! Recording inspector for unit tests.

use crate::inspect::{InspectError, Inspector};
use std::cell::RefCell;
use std::collections::HashMap;

/// Answers from canned output; anything not scripted fails with a non-zero exit.
#[derive(Debug, Default)]
pub(crate) struct MockInspector {
    inspect: HashMap<String, Vec<String>>,
    ids: Option<Vec<String>>,
    logs: Option<i32>,
    calls: RefCell<Vec<String>>,
}

impl MockInspector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_inspect(mut self, format: &str, lines: &[&str]) -> Self {
        self.inspect
            .insert(format.to_string(), lines.iter().map(|l| l.to_string()).collect());
        self
    }

    pub(crate) fn with_ids(mut self, ids: &[&str]) -> Self {
        self.ids = Some(ids.iter().map(|l| l.to_string()).collect());
        self
    }

    pub(crate) fn with_logs(mut self, code: i32) -> Self {
        self.logs = Some(code);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn failure(program: &str) -> InspectError {
        InspectError::Exit {
            program: program.to_string(),
            code: Some(1),
            output: vec!["Error: No such object".to_string()],
        }
    }
}

impl Inspector for MockInspector {
    fn inspect(&self, target: &str, format: &str) -> Result<Vec<String>, InspectError> {
        self.calls
            .borrow_mut()
            .push(format!("inspect {target} {format}"));
        self.inspect
            .get(format)
            .cloned()
            .ok_or_else(|| Self::failure("docker"))
    }

    fn list_ids(&self, filter: &str) -> Result<Vec<String>, InspectError> {
        self.calls.borrow_mut().push(format!("ps {filter}"));
        self.ids.clone().ok_or_else(|| Self::failure("docker"))
    }

    fn vm_logs(&self, name: &str) -> Result<i32, InspectError> {
        self.calls.borrow_mut().push(format!("logs {name}"));
        self.logs.ok_or_else(|| Self::failure("ignite"))
    }
}
