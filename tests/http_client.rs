//! Member API client against an in-process admin API

mod common;

use axum::http::StatusCode;
use common::{dead_endpoint, member, MockCluster, RecordingSleeper};
use kvfab::cluster::membership::MEMBER_ADD_SETTLE_DELAY;
use kvfab::cluster::{ClusterState, HttpMemberClient, MemberApi, MembershipController};
use kvfab::common::NodeIdentity;
use kvfab::Error;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

fn client(endpoints: Vec<String>) -> HttpMemberClient {
    HttpMemberClient::new(endpoints, TIMEOUT, None).unwrap()
}

#[tokio::test]
async fn member_list_decodes_members() {
    let mock = MockCluster::with_members(vec![
        member("kv-z1-0", "http://10.0.0.5:7001"),
        member("kv-z1-1", "http://10.0.0.6:7001"),
    ]);
    let url = mock.spawn().await;

    let members = client(vec![url]).member_list().await.unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[1].name, "kv-z1-1");
    assert_eq!(members[1].peer_url(), Some("http://10.0.0.6:7001"));
}

#[tokio::test]
async fn member_add_registers_peer_url() {
    let mock = MockCluster::with_members(vec![member("kv-z1-0", "http://10.0.0.5:7001")]);
    let url = mock.spawn().await;

    let added = client(vec![url])
        .member_add("http://10.0.0.7:7001")
        .await
        .unwrap();

    assert!(!added.id.is_empty());
    assert_eq!(added.peer_urls, vec!["http://10.0.0.7:7001"]);
    assert_eq!(mock.added(), vec!["http://10.0.0.7:7001"]);
}

#[tokio::test]
async fn member_add_conflict_is_rejected() {
    let mock = MockCluster::with_members(vec![member("kv-z1-0", "http://10.0.0.5:7001")]);
    mock.fail_add(StatusCode::CONFLICT);
    let url = mock.spawn().await;

    let err = client(vec![url])
        .member_add("http://10.0.0.5:7001")
        .await
        .unwrap_err();
    match err {
        Error::MemberRejected { status, reason } => {
            assert_eq!(status, 409);
            assert!(reason.contains("rejected"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn falls_through_to_next_endpoint() {
    let broken = MockCluster::default();
    broken.fail_list(StatusCode::SERVICE_UNAVAILABLE);
    let broken_url = broken.spawn().await;

    let healthy = MockCluster::with_members(vec![member("kv-z1-0", "http://10.0.0.5:7001")]);
    let healthy_url = healthy.spawn().await;

    let members = client(vec![dead_endpoint().await, broken_url, healthy_url])
        .member_list()
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn all_endpoints_down_is_unavailable() {
    let broken = MockCluster::default();
    broken.fail_list(StatusCode::INTERNAL_SERVER_ERROR);
    let broken_url = broken.spawn().await;

    let err = client(vec![dead_endpoint().await, broken_url.clone()])
        .member_list()
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    match err {
        Error::ClusterUnavailable { endpoint, .. } => assert!(endpoint.starts_with(&broken_url)),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn keys_probe() {
    let serving = MockCluster::default();
    let url = serving.spawn().await;
    assert!(client(vec![url]).keys().await.is_ok());

    let starting = MockCluster::default();
    starting.fail_keys(StatusCode::SERVICE_UNAVAILABLE);
    let url = starting.spawn().await;
    assert!(client(vec![url]).keys().await.is_err());

    assert!(client(vec![dead_endpoint().await]).keys().await.is_err());
}

#[tokio::test]
async fn membership_joins_live_cluster() {
    let mock = MockCluster::with_members(vec![member("a", "http://h1:7001")]);
    let url = mock.spawn().await;
    let sleeper = Arc::new(RecordingSleeper::default());
    let identity = NodeIdentity {
        name: "b".into(),
        advertise_peer_url: "http://h2:7001".into(),
        advertise_client_url: "http://h2:4001".into(),
        listen_peer_url: "http://0.0.0.0:7001".into(),
        listen_client_url: "http://0.0.0.0:4001".into(),
    };

    let state = MembershipController::new(Arc::new(client(vec![url])), sleeper.clone(), identity)
        .get_initial_cluster_state()
        .await
        .unwrap();

    assert_eq!(state.state, ClusterState::Existing);
    assert_eq!(state.members, "a=http://h1:7001,b=http://h2:7001");
    assert_eq!(mock.added(), vec!["http://h2:7001"]);
    assert_eq!(mock.members().len(), 2);
    assert_eq!(*sleeper.calls.lock().unwrap(), vec![MEMBER_ADD_SETTLE_DELAY]);
}
