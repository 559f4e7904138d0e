//! The hardware period never waits on a busy instance

mod common;

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use patchbay_core::audio::MockPeriod;
use patchbay_core::{BridgeInstance, HostPorts, PeriodStatus, Role, HOST_BUFFER_FRAMES};

const PERIOD: usize = 64;

#[test]
fn test_period_completes_while_ports_are_held() {
    let coordinator = common::coordinator(PERIOD);
    let mut instance = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);

    let mut ports = HostPorts::with_inputs(common::tagged_inputs());
    for _ in 0..HOST_BUFFER_FRAMES * 8 {
        instance.process(48_000, &mut ports);
    }
    assert_eq!(instance.occupancy().hardware_output, HOST_BUFFER_FRAMES * 8);

    let (done_tx, done_rx) = mpsc::channel();
    instance.with_ports(|_| {
        let coordinator = Arc::clone(&coordinator);
        thread::spawn(move || {
            let status = coordinator.process_period(&MockPeriod::new(PERIOD));
            let _ = done_tx.send(status);
        });
        assert_eq!(
            done_rx.recv_timeout(Duration::from_secs(5)),
            Ok(PeriodStatus::Continue),
            "hardware period waited for the port table"
        );
    });

    // The busy period ran with null handles: queued audio was consumed,
    // nothing reached the port buffers and silence was captured
    let occupancy = instance.occupancy();
    assert_eq!(occupancy.hardware_output, HOST_BUFFER_FRAMES * 8 - PERIOD);
    assert_eq!(occupancy.hardware_input, PERIOD);
    instance.with_ports(|ports| {
        let lane0 = ports[0].as_ref().and_then(|p| p.buffer()).unwrap();
        assert!(lane0.iter().all(|&s| s == 0.0));
    });

    coordinator.process_period(&MockPeriod::new(PERIOD));
    instance.with_ports(|ports| {
        let lane0 = ports[0].as_ref().and_then(|p| p.buffer()).unwrap();
        assert!(lane0.iter().all(|&s| s == 0.1));
    });
}

#[test]
fn test_period_completes_during_slow_rename() {
    let coordinator = common::coordinator(PERIOD);
    let mut instance = BridgeInstance::new(Arc::clone(&coordinator), Role::OutputOnly);
    coordinator
        .backend()
        .set_rename_delay(Duration::from_millis(500));

    let renamer = thread::spawn(move || {
        instance.rename_port(0, "slow").unwrap();
        instance
    });
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    assert_eq!(
        coordinator.process_period(&MockPeriod::new(PERIOD)),
        PeriodStatus::Continue
    );
    assert!(
        started.elapsed() < Duration::from_millis(250),
        "hardware period waited {:?} for a rename",
        started.elapsed()
    );

    let instance = renamer.join().unwrap();
    assert_eq!(instance.display_name(0), "slow");
    assert!(coordinator.backend().has_port("slow"));
    instance.with_ports(|ports| {
        assert_eq!(ports[0].as_ref().map(|p| p.name()), Some("slow"));
    });
}
