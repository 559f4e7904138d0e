//! Port names survive a save/restore cycle through JSON

mod common;

use std::sync::Arc;

use patchbay_core::audio::MockBackend;
use patchbay_core::{BridgeConfig, BridgeInstance, Coordinator, InstanceState, Role};

#[test]
fn test_state_json_layout() {
    let state = InstanceState {
        port_names: vec!["kick".to_string(), "snare".to_string()],
    };
    let json = serde_json::to_string(&state).unwrap();
    assert_eq!(json, r#"{"port_names":["kick","snare"]}"#);

    let missing: InstanceState = serde_json::from_str("{}").unwrap();
    assert!(missing.port_names.is_empty());
}

#[test]
fn test_names_round_trip_through_file() {
    let coordinator = common::coordinator(128);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patch.json");

    {
        let mut instance = BridgeInstance::new(Arc::clone(&coordinator), Role::OutputOnly);
        instance.rename_port(0, "main L").unwrap();
        instance.rename_port(1, "main R").unwrap();
        let json = serde_json::to_string_pretty(&instance.save_state()).unwrap();
        std::fs::write(&path, json).unwrap();
    }
    assert_eq!(coordinator.backend().port_count(), 0);

    let state: InstanceState =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let mut restored = BridgeInstance::new(Arc::clone(&coordinator), Role::OutputOnly);
    // Saved generated names belong to the old instance and are restored verbatim
    assert_eq!(restored.restore_state(&state), 8);
    assert_eq!(restored.display_name(0), "main L");
    assert_eq!(restored.display_name(1), "main R");
    assert!(coordinator.backend().has_port("main L"));
    restored.with_ports(|ports| {
        assert_eq!(ports[1].as_ref().map(|p| p.name()), Some("main R"));
    });
}

#[test]
fn test_rejected_names_fall_back_to_generated() {
    let coordinator = common::coordinator(128);
    let mut instance = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);
    let generated = instance.display_name(3);

    coordinator.backend().set_fail_renames(true);
    let state = InstanceState {
        port_names: vec![String::new(), String::new(), String::new(), "fx send".to_string()],
    };
    assert_eq!(instance.restore_state(&state), 0);
    assert_eq!(instance.display_name(3), generated);
    assert_eq!(instance.save_state().port_names[3], generated);
}

#[test]
fn test_generated_names_are_stable_per_salt() {
    common::init_logging();
    let config = BridgeConfig::default().with_port_name_salt("studio A");
    let first = Coordinator::new(MockBackend::new(), config.clone()).unwrap();
    let second = Coordinator::new(MockBackend::new(), config).unwrap();

    let a = BridgeInstance::new(Arc::clone(&first), Role::Duplex);
    let b = BridgeInstance::new(Arc::clone(&second), Role::Duplex);
    assert_eq!(a.serial(), b.serial());
    assert_eq!(a.port_names(), b.port_names());
    for lane in 0..8 {
        assert!(a.display_name(lane).ends_with(&format!(":{lane}")));
    }
}

#[test]
fn test_offline_names_are_kept_for_saving() {
    common::init_logging();
    let coordinator = Coordinator::new(MockBackend::offline(), BridgeConfig::default()).unwrap();
    let mut instance = BridgeInstance::new(Arc::clone(&coordinator), Role::InputOnly);

    let state = InstanceState {
        port_names: vec!["mic".to_string()],
    };
    assert_eq!(instance.restore_state(&state), 1);
    assert_eq!(instance.save_state().port_names[0], "mic");
}
