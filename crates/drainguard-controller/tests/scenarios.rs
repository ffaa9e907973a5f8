//! End-to-end lifecycle scenarios.
//!
//! Drives `Lifecycle::run` against scripted collaborators on a paused
//! clock, so interval ticks and the warm-up delay elapse instantly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use drainguard_controller::*;
use drainguard_core::mock::*;
use drainguard_core::{GuardError, HealthStatus, OperationStatus};
use drainguard_health::DeregisterReason;

const CLUSTER: &str = "arn:aws:ecs:eu-west-1:123456789012:cluster/prod";
const TASK_ARN: &str = "arn:aws:ecs:eu-west-1:123456789012:task/prod/0cc43cdb3c1a";
const DISCOVERY_ARN: &str = "arn:aws:servicediscovery:eu-west-1:123456789012:service/srv-7q2kx";

struct Harness {
    metadata: Arc<MockMetadata>,
    control_plane: Arc<MockControlPlane>,
    registry: Arc<MockRegistry>,
}

impl Harness {
    fn new(control_plane: MockControlPlane, registry: MockRegistry) -> Self {
        Self {
            metadata: Arc::new(
                MockMetadata::new().metadata_ret(Ok(task_metadata(CLUSTER, TASK_ARN))),
            ),
            control_plane: Arc::new(control_plane),
            registry: Arc::new(registry),
        }
    }

    fn lifecycle(&self, warmup: Duration) -> Lifecycle {
        Lifecycle::new(
            self.metadata.clone(),
            self.control_plane.clone(),
            self.registry.clone(),
            LifecycleSettings {
                warmup,
                controller: ControllerSettings::default(),
            },
        )
    }
}

fn task(health: &str, last_status: &str) -> drainguard_core::TaskRecord {
    task_record(TASK_ARN, "checkout", health, last_status)
}

#[tokio::test(start_paused = true)]
async fn healthy_running_task_keeps_polling() {
    let h = Harness::new(
        MockControlPlane::new()
            .task_ret(Ok(task("HEALTHY", "RUNNING")))
            .service_ret(Ok(service_with_registry("checkout", "checkout", DISCOVERY_ARN))),
        MockRegistry::accepting("op-1"),
    );
    let (_stop_tx, stop) = watch::channel(None);

    // One describe for identity, then samples at 0s, 5s and 10s.
    let result = tokio::time::timeout(
        Duration::from_millis(10_500),
        h.lifecycle(Duration::ZERO).run(stop),
    )
    .await;

    assert!(result.is_err(), "lifecycle should still be running");
    assert_eq!(h.control_plane.describe_task_calls(), 1 + 3);
    assert!(h.registry.deregister_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unhealthy_sample_deregisters_and_finishes() {
    let h = Harness::new(
        MockControlPlane::new()
            .task_ret(Ok(task("UNHEALTHY", "RUNNING")))
            .service_ret(Ok(service_with_registry("checkout", "checkout", DISCOVERY_ARN))),
        MockRegistry::accepting("op-1"),
    );
    let (_stop_tx, stop) = watch::channel(None);

    let outcome = h.lifecycle(Duration::ZERO).run(stop).await.unwrap();

    let Outcome::Deregistered(done) = outcome else {
        panic!("expected deregistration, got {outcome:?}");
    };
    assert_eq!(
        done.trigger,
        Trigger::Policy(DeregisterReason::NotHealthy(HealthStatus::Unhealthy))
    );
    assert_eq!(done.operation.status, OperationStatus::Success);
    assert_eq!(
        h.registry.deregister_calls(),
        vec![("0cc43cdb3c1a".to_string(), "srv-7q2kx".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn repeated_unhealthy_samples_issue_one_deregistration() {
    let h = Harness::new(
        MockControlPlane::new()
            .task_ret(Ok(task("UNHEALTHY", "STOPPING")))
            .service_ret(Ok(service_with_registry("checkout", "checkout", DISCOVERY_ARN))),
        MockRegistry::accepting("op-1"),
    );
    let (_stop_tx, stop) = watch::channel(None);

    h.lifecycle(Duration::ZERO).run(stop).await.unwrap();

    // Give any stray timer a chance to fire.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.registry.deregister_calls().len(), 1);
    assert_eq!(h.control_plane.describe_task_calls(), 1 + 1);
}

#[tokio::test(start_paused = true)]
async fn service_without_registry_exits_cleanly() {
    let h = Harness::new(
        MockControlPlane::new()
            .task_ret(Ok(task("HEALTHY", "RUNNING")))
            .service_ret(Ok(service_without_registry("checkout"))),
        MockRegistry::accepting("op-1"),
    );
    let (_stop_tx, stop) = watch::channel(None);

    let outcome = h.lifecycle(Duration::ZERO).run(stop).await.unwrap();

    assert_eq!(
        outcome,
        Outcome::NoRegistry {
            service: "checkout".to_string()
        }
    );
    assert!(h.registry.deregister_calls().is_empty());
    assert_eq!(h.registry.operation_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn standalone_task_exits_cleanly() {
    let h = Harness::new(
        MockControlPlane::new().task_ret(Ok(drainguard_core::TaskRecord {
            task_arn: TASK_ARN.to_string(),
            group: Some("family:batch".to_string()),
            health_status: Some("HEALTHY".to_string()),
            last_status: Some("RUNNING".to_string()),
        })),
        MockRegistry::accepting("op-1"),
    );
    let (_stop_tx, stop) = watch::channel(None);

    let outcome = h.lifecycle(Duration::ZERO).run(stop).await.unwrap();

    assert_eq!(outcome, Outcome::Standalone);
    assert_eq!(h.control_plane.describe_service_calls(), 0);
    assert!(h.registry.deregister_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn registry_failure_aborts_without_more_ticks() {
    let h = Harness::new(
        MockControlPlane::new()
            .task_ret(Ok(task("UNHEALTHY", "RUNNING")))
            .service_ret(Ok(service_with_registry("checkout", "checkout", DISCOVERY_ARN))),
        MockRegistry::new().deregister_ret(Err(GuardError::Registry("InstanceNotFound".into()))),
    );
    let (_stop_tx, stop) = watch::channel(None);

    let result = h.lifecycle(Duration::ZERO).run(stop).await;

    assert!(matches!(result, Err(GuardError::Registry(_))));
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.control_plane.describe_task_calls(), 1 + 1);
    assert_eq!(h.registry.deregister_calls().len(), 1);
    assert_eq!(h.registry.operation_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn signal_before_next_tick_deregisters_without_sampling() {
    let h = Harness::new(
        MockControlPlane::new()
            .task_ret(Ok(task("HEALTHY", "RUNNING")))
            .service_ret(Ok(service_with_registry("checkout", "checkout", DISCOVERY_ARN))),
        MockRegistry::accepting("op-1"),
    );
    let (stop_tx, stop) = watch::channel(None);

    let lifecycle = h.lifecycle(Duration::ZERO);
    let run = tokio::spawn(lifecycle.run(stop));

    // First sample lands at 0s, the next would be at 5s.
    tokio::time::sleep(Duration::from_secs(2)).await;
    stop_tx.send_replace(Some(StopSignal::Terminate));

    let outcome = run.await.unwrap().unwrap();
    let Outcome::Deregistered(done) = outcome else {
        panic!("expected deregistration, got {outcome:?}");
    };
    assert_eq!(done.trigger, Trigger::Signal(StopSignal::Terminate));
    assert_eq!(done.samples, 1);
    assert_eq!(h.control_plane.describe_task_calls(), 1 + 1);
    assert_eq!(h.registry.deregister_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn signal_during_warm_up_cuts_it_short() {
    let h = Harness::new(
        MockControlPlane::new()
            .task_ret(Ok(task("HEALTHY", "RUNNING")))
            .service_ret(Ok(service_with_registry("checkout", "checkout", DISCOVERY_ARN))),
        MockRegistry::accepting("op-1"),
    );
    let (stop_tx, stop) = watch::channel(None);

    let start = tokio::time::Instant::now();
    let run = tokio::spawn(h.lifecycle(Duration::from_secs(60)).run(stop));

    tokio::time::sleep(Duration::from_secs(3)).await;
    stop_tx.send_replace(Some(StopSignal::Interrupt));

    let outcome = run.await.unwrap().unwrap();
    assert!(start.elapsed() < Duration::from_secs(60));

    let Outcome::Deregistered(done) = outcome else {
        panic!("expected deregistration, got {outcome:?}");
    };
    assert_eq!(done.trigger, Trigger::Signal(StopSignal::Interrupt));
    assert_eq!(done.samples, 0);
    // Only the identity lookup touched the control plane.
    assert_eq!(h.control_plane.describe_task_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn warm_up_delays_first_contact() {
    let h = Harness::new(
        MockControlPlane::new()
            .task_ret(Ok(task("UNHEALTHY", "RUNNING")))
            .service_ret(Ok(service_with_registry("checkout", "checkout", DISCOVERY_ARN))),
        MockRegistry::accepting("op-1"),
    );
    let (_stop_tx, stop) = watch::channel(None);

    let run = tokio::spawn(h.lifecycle(Duration::from_secs(60)).run(stop));

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(h.metadata.calls(), 0);
    assert_eq!(h.control_plane.describe_task_calls(), 0);

    run.await.unwrap().unwrap();
    assert_eq!(h.metadata.calls(), 1);
    assert_eq!(h.registry.deregister_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_registry_call_times_out() {
    struct HangingRegistry;

    #[async_trait::async_trait]
    impl drainguard_core::Registry for HangingRegistry {
        async fn deregister_instance(&self, _: &str, _: &str) -> drainguard_core::GuardResult<String> {
            std::future::pending().await
        }

        async fn get_operation(
            &self,
            _: &str,
        ) -> drainguard_core::GuardResult<drainguard_core::DeregistrationOperation> {
            std::future::pending().await
        }
    }

    let metadata = Arc::new(MockMetadata::new().metadata_ret(Ok(task_metadata(CLUSTER, TASK_ARN))));
    let control_plane = Arc::new(
        MockControlPlane::new()
            .task_ret(Ok(task("UNHEALTHY", "RUNNING")))
            .service_ret(Ok(service_with_registry("checkout", "checkout", DISCOVERY_ARN))),
    );
    let (_stop_tx, stop) = watch::channel(None);

    let lifecycle = Lifecycle::new(
        metadata,
        control_plane,
        Arc::new(HangingRegistry),
        LifecycleSettings {
            warmup: Duration::ZERO,
            controller: ControllerSettings {
                call_timeout: Some(Duration::from_secs(30)),
                ..ControllerSettings::default()
            },
        },
    );

    match lifecycle.run(stop).await {
        Err(GuardError::Timeout { call, after }) => {
            assert_eq!(call, "DeregisterInstance");
            assert_eq!(after, Duration::from_secs(30));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn zero_poll_interval_fails_before_warm_up() {
    let h = Harness::new(MockControlPlane::new(), MockRegistry::new());
    let (_stop_tx, stop) = watch::channel(None);

    let lifecycle = Lifecycle::new(
        h.metadata.clone(),
        h.control_plane.clone(),
        h.registry.clone(),
        LifecycleSettings {
            warmup: Duration::from_secs(60),
            controller: ControllerSettings {
                poll_interval: Duration::ZERO,
                ..ControllerSettings::default()
            },
        },
    );

    let started = tokio::time::Instant::now();
    let result = lifecycle.run(stop).await;

    assert!(matches!(result, Err(GuardError::Config(_))));
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(h.metadata.calls(), 0);
    assert_eq!(h.control_plane.describe_task_calls(), 0);
}
