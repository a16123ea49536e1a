use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use veriflow_core::config::ServiceConfig;
use veriflow_core::poller::ResultPoller;
use veriflow_core::protocol::VerificationClient;
use veriflow_core::testing::MockTransport;

const VERIFICATION_ID: &str = "68c8e5a1f3b2d4a6e8f0c1b2";

fn poller_with(transport: &Arc<MockTransport>, interval: Duration) -> ResultPoller {
    let config = ServiceConfig {
        base_url: "https://services.example.com/rest/v2".to_string(),
        status_base_url: "https://my.example.com/rest/v2".to_string(),
        timeout_secs: 30,
        upload_timeout_secs: 60,
        locale: "en-US".to_string(),
    };
    let client = Arc::new(VerificationClient::new(transport.clone(), &config));
    ResultPoller::new(client, interval)
}

#[tokio::test(start_paused = true)]
async fn test_immediate_code_needs_no_sleep() {
    let transport = Arc::new(MockTransport::new());
    transport.push_response(
        200,
        json!({"currentStep": "success", "rewardCode": "TEACH-1234"}),
    );
    let poller = poller_with(&transport, Duration::from_secs(5));

    let started = tokio::time::Instant::now();
    let code = poller
        .poll_for_code(VERIFICATION_ID, Some(Duration::from_secs(20)))
        .await;

    assert_eq!(code.as_deref(), Some("TEACH-1234"));
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_nested_reward_code_is_found() {
    let transport = Arc::new(MockTransport::new());
    transport.push_response(
        200,
        json!({"currentStep": "success", "rewardData": {"rewardCode": "NEST-5678"}}),
    );
    let poller = poller_with(&transport, Duration::from_secs(5));

    let code = poller.poll_for_code(VERIFICATION_ID, None).await;
    assert_eq!(code.as_deref(), Some("NEST-5678"));
}

#[tokio::test(start_paused = true)]
async fn test_terminal_error_returns_immediately() {
    let transport = Arc::new(MockTransport::new());
    transport.push_response(200, json!({"currentStep": "error"}));
    let poller = poller_with(&transport, Duration::from_secs(5));

    let code = poller
        .poll_for_code(VERIFICATION_ID, Some(Duration::from_secs(20)))
        .await;

    assert_eq!(code, None);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_bounds_the_wait() {
    let transport = Arc::new(MockTransport::new());
    // Queries land at t = 0, 5, 10, 15, and 20 seconds.
    for _ in 0..5 {
        transport.push_response(200, json!({"currentStep": "pending"}));
    }
    let poller = poller_with(&transport, Duration::from_secs(5));

    let started = tokio::time::Instant::now();
    let code = poller
        .poll_for_code(VERIFICATION_ID, Some(Duration::from_secs(20)))
        .await;

    assert_eq!(code, None);
    assert_eq!(transport.requests().len(), 5);
    assert_eq!(started.elapsed(), Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_do_not_abort_polling() {
    let transport = Arc::new(MockTransport::new());
    transport.push_transport_error("connection reset");
    transport.push_response(
        200,
        json!({"currentStep": "success", "rewardCode": "RETRY-0001"}),
    );
    let poller = poller_with(&transport, Duration::from_secs(5));

    let code = poller
        .poll_for_code(VERIFICATION_ID, Some(Duration::from_secs(20)))
        .await;

    assert_eq!(code.as_deref(), Some("RETRY-0001"));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_success_without_code_keeps_polling() {
    let transport = Arc::new(MockTransport::new());
    transport.push_response(200, json!({"currentStep": "success"}));
    transport.push_response(
        200,
        json!({"currentStep": "success", "rewardCode": "LATE-9999"}),
    );
    let poller = poller_with(&transport, Duration::from_secs(5));

    let code = poller
        .poll_for_code(VERIFICATION_ID, Some(Duration::from_secs(20)))
        .await;

    assert_eq!(code.as_deref(), Some("LATE-9999"));
}
