//! End-to-end failover demonstration through a health-checking balancer.

mod common;

use std::sync::Arc;
use std::time::Duration;

use todo_failover::demo::{DemoStep, FailoverCheck, FailoverDemo, HttpDemoClient, StressOutcome};
use todo_failover::resilience::RetryPolicy;
use todo_failover::store::MemoryStore;

use common::{spawn_instance, TestBalancer, TestInstance};

const A: usize = 0;
const B: usize = 1;

async fn cluster() -> (TestInstance, TestInstance, TestBalancer) {
    let kv = Arc::new(MemoryStore::new());
    let a = spawn_instance("A", kv.clone()).await;
    let b = spawn_instance("B", kv).await;
    let lb = TestBalancer::start(&[&a, &b]).await;
    (a, b, lb)
}

fn wizard(lb: &TestBalancer) -> FailoverDemo<HttpDemoClient> {
    let client = HttpDemoClient::new(&lb.api_url(), Duration::from_secs(5)).unwrap();
    FailoverDemo::new(client, RetryPolicy::immediate(5))
}

#[tokio::test]
async fn test_failover_demo() {
    let (a, b, lb) = cluster().await;
    let mut demo = wizard(&lb);

    // detect → A, stress → B (miss), clear → B, stress → A (hit)
    lb.plan(&[A, B, B, A]);

    assert_eq!(demo.detect_instance().await.unwrap(), "A");

    let outcome = demo.stress_target_instance().await.unwrap();
    match &outcome {
        StressOutcome::Hit { receipt, attempts } => {
            assert_eq!(receipt.instance, "A");
            assert_eq!(*attempts, 2);
        }
        other => panic!("expected hit, got {:?}", other),
    }
    assert_eq!(demo.step(), DemoStep::InstanceStressed);
    assert_eq!(a.stress_chunks(), 8);
    assert_eq!(b.stress_chunks(), 0, "miss must be cleared");

    // The balancer's health check now drops A.
    assert_eq!(lb.refresh_health().await, vec![false, true]);

    let check = demo.verify_failover().await.unwrap();
    assert_eq!(
        check,
        FailoverCheck::Confirmed {
            from: "A".into(),
            to: "B".into()
        }
    );
    assert_eq!(demo.step(), DemoStep::FailoverConfirmed);

    // Tasks written through the balancer survive the failover.
    let client = reqwest::Client::new();
    let created = client
        .post(format!("{}/todos", lb.api_url()))
        .json(&serde_json::json!({ "text": "still here" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);
    assert_eq!(a.state.tasks.list_tasks().await.unwrap().len(), 1);

    lb.plan(&[A, B]);
    assert_eq!(demo.reset().await, 2);
    assert_eq!(demo.step(), DemoStep::Idle);
    assert_eq!(a.stress_chunks(), 0);
    assert_eq!(lb.refresh_health().await, vec![true, true]);

    assert_eq!(lb.routed()[..4], [A, B, B, A]);
}

#[tokio::test]
async fn test_stress_exhaustion_leaves_no_stress_behind() {
    let (a, b, lb) = cluster().await;
    let mut demo = wizard(&lb);

    lb.plan(&[A]);
    demo.detect_instance().await.unwrap();

    // Five stress + clear pairs, all landing on B.
    lb.plan(&[B; 10]);
    let outcome = demo.stress_target_instance().await.unwrap();
    match outcome {
        StressOutcome::Exhausted {
            target,
            attempts,
            misses,
            ..
        } => {
            assert_eq!(target, "A");
            assert_eq!(attempts, 5);
            assert_eq!(misses, vec!["B"; 5]);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }

    assert_eq!(demo.step(), DemoStep::InstanceDetected);
    assert_eq!(a.stress_chunks(), 0);
    assert_eq!(b.stress_chunks(), 0);
}

#[tokio::test]
async fn test_verify_before_reroute() {
    let (a, _b, lb) = cluster().await;
    let mut demo = wizard(&lb);

    lb.plan(&[A, A]);
    demo.detect_instance().await.unwrap();
    assert!(demo.stress_target_instance().await.unwrap().is_hit());
    assert_eq!(a.stress_chunks(), 8);

    // Balancer has not noticed yet: the stressed instance still answers,
    // with its own 503 body.
    lb.plan(&[A]);
    let check = demo.verify_failover().await.unwrap();
    assert_eq!(
        check,
        FailoverCheck::SameInstance {
            instance: "A".into(),
            status: "UNHEALTHY".into()
        }
    );
    assert_eq!(demo.step(), DemoStep::InstanceStressed);

    lb.refresh_health().await;
    let check = demo.await_failover(3, Duration::ZERO).await.unwrap();
    assert!(check.is_confirmed());
}
