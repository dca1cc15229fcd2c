//! Public API tests for loosebox-machine using a scripted inspector.

use loosebox_machine::{
    host_port_format, BackendKind, InspectError, Inspector, Machine, MachineError, MachineSpec,
    NAME_FORMAT, RUNNING_FORMAT,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Inspector that replays fixed answers and counts queries.
#[derive(Default)]
struct ScriptedInspector {
    inspect: HashMap<String, Vec<String>>,
    ids: Vec<String>,
    logs: Option<i32>,
    inspect_calls: Cell<usize>,
    targets: RefCell<Vec<String>>,
}

impl ScriptedInspector {
    fn answer(mut self, format: &str, lines: &[&str]) -> Self {
        self.inspect
            .insert(format.into(), lines.iter().map(|s| s.to_string()).collect());
        self
    }
}

impl Inspector for ScriptedInspector {
    fn inspect(&self, target: &str, format: &str) -> Result<Vec<String>, InspectError> {
        self.inspect_calls.set(self.inspect_calls.get() + 1);
        self.targets.borrow_mut().push(target.to_string());
        self.inspect
            .get(format)
            .cloned()
            .ok_or_else(|| InspectError::Exit {
                program: "docker".into(),
                code: Some(1),
                output: vec![format!("Error: No such object: {target}")],
            })
    }

    fn list_ids(&self, _filter: &str) -> Result<Vec<String>, InspectError> {
        Ok(self.ids.clone())
    }

    fn vm_logs(&self, _name: &str) -> Result<i32, InspectError> {
        self.logs.ok_or_else(|| InspectError::Spawn {
            program: "ignite".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    }
}

fn container_spec() -> MachineSpec {
    MachineSpec::from_json(
        r#"{
            "name": "node%d",
            "image": "quay.io/footloose/centos7",
            "portMappings": [{"containerPort": 22}, {"containerPort": 8080}]
        }"#,
    )
    .expect("valid spec")
}

fn microvm_spec() -> MachineSpec {
    MachineSpec::from_json(
        r#"{
            "name": "vm%d",
            "image": "weaveworks/ignite-ubuntu",
            "backend": "ignite",
            "ignite": {"memory": "2GB"}
        }"#,
    )
    .expect("valid spec")
}

#[test]
fn test_host_port_memoized() {
    let spec = container_spec();
    let inspector = ScriptedInspector::default().answer(&host_port_format(8080), &["'32768'"]);
    let mut node = Machine::new(&spec, &inspector, "node0");

    assert_eq!(node.host_port(8080).unwrap(), 32768);
    assert_eq!(inspector.inspect_calls.get(), 1);

    assert_eq!(node.host_port(8080).unwrap(), 32768);
    assert_eq!(inspector.inspect_calls.get(), 1);
}

#[test]
fn test_host_port_per_port_queries() {
    let spec = container_spec();
    let inspector = ScriptedInspector::default()
        .answer(&host_port_format(22), &["'32769'"])
        .answer(&host_port_format(8080), &["'32768'"]);
    let mut node = Machine::new(&spec, &inspector, "node0");

    for pm in &spec.port_mappings {
        node.host_port(pm.container_port).unwrap();
    }
    assert_eq!(inspector.inspect_calls.get(), 2);
    assert_eq!(node.cached_ports().len(), 2);
    assert_eq!(node.cached_ports().get(22), Some(32769));
}

#[test]
fn test_cache_is_per_machine() {
    let spec = container_spec();
    let inspector = ScriptedInspector::default().answer(&host_port_format(22), &["'32769'"]);
    let mut first = Machine::new(&spec, &inspector, "node0");
    let mut second = Machine::new(&spec, &inspector, "node1");

    first.host_port(22).unwrap();
    second.host_port(22).unwrap();
    assert_eq!(inspector.inspect_calls.get(), 2);
    assert_eq!(*inspector.targets.borrow(), vec!["node0", "node1"]);
}

#[test]
fn test_host_port_errors() {
    let spec = container_spec();
    let inspector = ScriptedInspector::default()
        .answer(&host_port_format(80), &["'80'", "'81'"])
        .answer(&host_port_format(443), &["'abc'"]);
    let mut node = Machine::new(&spec, &inspector, "node0");

    assert!(matches!(
        node.host_port(80),
        Err(MachineError::UnexpectedResultShape { .. })
    ));
    assert!(matches!(
        node.host_port(443),
        Err(MachineError::MalformedPortValue { .. })
    ));

    let err = node.host_port(22).unwrap_err();
    assert!(matches!(err, MachineError::Query { .. }));
    assert!(err.to_string().contains("No such object: node0"));
    assert!(node.cached_ports().is_empty());
}

#[test]
fn test_container_lifecycle() {
    let spec = container_spec();
    let inspector = ScriptedInspector::default()
        .answer(NAME_FORMAT, &["'/node0'"])
        .answer(RUNNING_FORMAT, &["'true'"]);
    let node = Machine::new(&spec, &inspector, "node0");

    assert_eq!(node.backend_kind(), BackendKind::Container);
    assert_eq!(node.container_name(), "node0");
    assert!(node.is_created());
    assert!(node.is_started());

    let absent = ScriptedInspector::default();
    let node = Machine::new(&spec, &absent, "node1");
    assert!(!node.is_created());
    assert!(!node.is_started());
}

#[test]
fn test_microvm_lifecycle() {
    let spec = microvm_spec();

    let up = ScriptedInspector {
        logs: Some(0),
        ..Default::default()
    };
    let vm = Machine::new(&spec, &up, "vm0");
    assert!(vm.is_microvm());
    assert_eq!(vm.backend_kind(), BackendKind::MicroVm);
    assert!(vm.is_created());
    assert!(vm.is_started());

    let gone = ScriptedInspector {
        logs: Some(1),
        ..Default::default()
    };
    let vm = Machine::new(&spec, &gone, "vm0");
    assert!(!vm.is_created());
    assert!(!vm.is_started());

    let broken = ScriptedInspector::default();
    let vm = Machine::new(&spec, &broken, "vm0");
    assert!(!vm.is_created());
    assert!(!vm.is_started());
}

#[test]
fn test_microvm_container_name() {
    let spec = microvm_spec();
    let inspector = ScriptedInspector {
        ids: vec!["e3b0c442".into()],
        ..Default::default()
    }
    .answer(&host_port_format(22), &["'32770'"]);
    let mut vm = Machine::new(&spec, &inspector, "vm0");

    assert_eq!(vm.container_name(), "e3b0c442");
    assert_eq!(vm.host_port(22).unwrap(), 32770);
    assert_eq!(*inspector.targets.borrow(), vec!["e3b0c442"]);

    let unlabelled = ScriptedInspector::default();
    let vm = Machine::new(&spec, &unlabelled, "vm0");
    assert_eq!(vm.container_name(), "vm0");
}

#[test]
fn test_spec_validation_and_defaults() {
    let spec = microvm_spec();
    assert!(spec.validate().is_ok());

    let opts = spec.ignite_config();
    assert_eq!(opts.cpus, 2);
    assert_eq!(opts.memory, "2GB");
    assert_eq!(opts.disk, "4GB");
    assert_eq!(opts.kernel, "weaveworks/ignite-kernel:4.19.47");
    assert_eq!(spec.ignite.as_ref().unwrap().cpus, 0);

    let bad = MachineSpec::from_json(r#"{"name": "node", "image": "alpine"}"#).unwrap();
    let err: MachineError = bad.validate().unwrap_err().into();
    assert!(matches!(err, MachineError::Config(_)));
}
