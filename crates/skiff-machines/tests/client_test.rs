// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! MachinesClient tests against a mocked control plane.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skiff_machines::{
    CreateMachineRequest, CreateVolumeRequest, GuestConfig, MachineConfig, MachineState,
    MachinesClient, MachinesConfig, MachinesError, RestartPolicy,
};

fn test_client(server: &MockServer) -> MachinesClient {
    let config = MachinesConfig::new("test-app", "tok_test")
        .with_api_base(format!("{}/v1", server.uri()))
        .with_request_timeout(Duration::from_millis(500));
    MachinesClient::new(config).unwrap()
}

fn machine_body(id: &str, state: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("ephemeral-u1-{}", id),
        "state": state,
        "region": "sjc",
        "created_at": "2025-06-01T12:00:00Z"
    })
}

#[tokio::test]
async fn test_get_machine_started() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/apps/test-app/machines/d89001"))
        .and(header("authorization", "Bearer tok_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(machine_body("d89001", "started")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let machine = client.get_machine("d89001").await.unwrap().unwrap();

    assert_eq!(machine.id, "d89001");
    assert!(machine.state.is_started());
}

#[tokio::test]
async fn test_get_machine_404_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/apps/test-app/machines/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let machine = client.get_machine("gone").await.unwrap();

    assert!(machine.is_none());
}

#[tokio::test]
async fn test_get_machine_server_error_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/apps/test-app/machines/d89001"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "internal error"})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.get_machine("d89001").await.unwrap_err();

    match err {
        MachinesError::Api { status, ref body } => {
            assert_eq!(status, 500);
            assert!(body.contains("internal error"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_get_machine_timeout_is_transient_transport() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/apps/test-app/machines/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(machine_body("slow", "started"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.get_machine("slow").await.unwrap_err();

    assert!(matches!(err, MachinesError::Transport(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_create_machine() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/apps/test-app/machines"))
        .and(header("authorization", "Bearer tok_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(machine_body("d89new", "started")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let request = CreateMachineRequest {
        name: "ephemeral-u1-1700000000000".to_string(),
        config: MachineConfig {
            image: "registry.fly.io/skiff:latest".to_string(),
            restart: RestartPolicy::no(),
            auto_destroy: true,
            guest: GuestConfig {
                cpu_kind: "shared".to_string(),
                cpus: 1,
                memory_mb: 2048,
            },
            env: Default::default(),
            mounts: vec![],
            services: vec![],
        },
    };

    let machine = client.create_machine(&request).await.unwrap();
    assert_eq!(machine.id, "d89new");
}

#[tokio::test]
async fn test_create_machine_quota_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/apps/test-app/machines"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"error": "machine quota exceeded"})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let request = CreateMachineRequest {
        name: "ephemeral-u1-1700000000001".to_string(),
        config: MachineConfig {
            image: "registry.fly.io/skiff:latest".to_string(),
            restart: RestartPolicy::no(),
            auto_destroy: true,
            guest: GuestConfig {
                cpu_kind: "shared".to_string(),
                cpus: 1,
                memory_mb: 2048,
            },
            env: Default::default(),
            mounts: vec![],
            services: vec![],
        },
    };

    let err = client.create_machine(&request).await.unwrap_err();
    match err {
        MachinesError::Api { status, body } => {
            assert_eq!(status, 422);
            assert!(body.contains("quota"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_machines() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/apps/test-app/machines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            machine_body("d89001", "started"),
            machine_body("d89002", "stopped"),
        ])))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let machines = client.list_machines().await.unwrap();

    assert_eq!(machines.len(), 2);
    assert_eq!(machines[0].state, MachineState::Started);
    assert_eq!(machines[1].state, MachineState::Stopped);
}

#[tokio::test]
async fn test_stop_machine_404_is_machine_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/apps/test-app/machines/gone/stop"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.stop_machine("gone").await.unwrap_err();

    assert!(matches!(err, MachinesError::MachineNotFound(id) if id == "gone"));
}

#[tokio::test]
async fn test_destroy_machine() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/apps/test-app/machines/d89001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.destroy_machine("d89001").await.unwrap();
}

#[tokio::test]
async fn test_create_volume_sends_exact_body() {
    let server = MockServer::start().await;

    let expected = json!({
        "name": "user-u1-1700000000000",
        "size_gb": 10,
        "region": "sjc"
    });

    Mock::given(method("POST"))
        .and(path("/v1/apps/test-app/volumes"))
        .and(body_json_string(expected.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "vol_8l524yj0ko347zmp",
            "name": "user-u1-1700000000000",
            "state": "created",
            "size_gb": 10,
            "region": "sjc",
            "encrypted": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let volume = client
        .create_volume(&CreateVolumeRequest {
            name: "user-u1-1700000000000".to_string(),
            size_gb: 10,
            region: "sjc".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(volume.id, "vol_8l524yj0ko347zmp");
}

#[tokio::test]
async fn test_list_volumes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/apps/test-app/volumes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "vol_1",
            "name": "user-u1-1700000000000",
            "size_gb": 10,
            "region": "sjc"
        }])))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let volumes = client.list_volumes().await.unwrap();

    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].name, "user-u1-1700000000000");
}
