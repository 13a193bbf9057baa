//! Non-disruptive checks of the framework against a live garden.

use shoot_operations::framework::credentials::parse_kubeconfig;
use shoot_operations::framework::secrets::{
    KUBECONFIG_DATA_KEY, KUBECONFIG_SECRET_SUFFIX, SSH_AUTHORIZED_KEYS_DATA_KEY,
    SSH_KEYPAIR_SECRET_SUFFIX, SSH_PRIVATE_KEY_DATA_KEY, project_resource_name,
};
use shoot_operations::{SampleWorkload, ShootLifecycle};

use crate::init_test;

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a garden cluster and a shoot"]
async fn test_refresh_shoot_reads_status() {
    let garden = init_test().await;
    let mut framework = garden.framework().await;

    framework.refresh_shoot().await.expect("Failed to refresh shoot");

    let shoot = framework.shoot();
    assert_eq!(
        shoot.metadata.name.as_deref(),
        Some(garden.config().shoot_name.as_str())
    );
    assert!(shoot.last_operation().is_some(), "shoot has no last operation");
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a garden cluster and a shoot"]
async fn test_ssh_keypair_secret_is_populated() {
    let garden = init_test().await;
    let framework = garden.framework().await;
    let secret = project_resource_name(&garden.config().shoot_name, SSH_KEYPAIR_SECRET_SUFFIX);

    for key in [SSH_PRIVATE_KEY_DATA_KEY, SSH_AUTHORIZED_KEYS_DATA_KEY] {
        let value = framework
            .secret_field(&secret, key)
            .await
            .unwrap_or_else(|e| panic!("Failed to read {}/{}: {}", secret, key, e));
        assert!(!value.is_empty());
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a garden cluster and a shoot with a static token kubeconfig"]
async fn test_static_kubeconfig_authenticates() {
    let garden = init_test().await;
    let framework = garden.framework().await;
    if !framework.shoot().static_token_kubeconfig_enabled() {
        eprintln!("static token kubeconfig disabled, nothing to check");
        return;
    }
    let secret = project_resource_name(&garden.config().shoot_name, KUBECONFIG_SECRET_SUFFIX);

    let kubeconfig = framework
        .secret_field(&secret, KUBECONFIG_DATA_KEY)
        .await
        .expect("Failed to read kubeconfig");
    parse_kubeconfig(&kubeconfig).expect("kubeconfig does not parse");

    let client = framework
        .credential_client(&kubeconfig)
        .await
        .expect("Failed to build client");
    let version = framework
        .server_version(&client)
        .await
        .expect("kubeconfig was rejected");
    assert!(version.starts_with('v'), "unexpected version {}", version);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a garden cluster and a running shoot"]
async fn test_guestbook_round_trip() {
    let garden = init_test().await;
    let framework = garden.framework().await;
    let mut guestbook = framework
        .sample_workload()
        .await
        .expect("Failed to prepare guestbook");

    let result = async {
        guestbook.deploy().await?;
        guestbook.verify().await
    }
    .await;
    let cleanup = guestbook.cleanup().await;

    result.expect("Guestbook did not work");
    cleanup.expect("Failed to clean up guestbook");
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a garden cluster and a shoot; hibernates and wakes it"]
async fn test_wake_up_sees_hibernation_done_by_another_handle() {
    let garden = init_test().await;
    // Fetched while the shoot is awake, never refreshed by this test
    let mut stale = garden.framework().await;
    let mut other = garden.framework().await;

    other.hibernate().await.expect("Failed to hibernate shoot");
    stale.wake_up().await.expect("Failed to wake up shoot");

    stale.refresh_shoot().await.expect("Failed to refresh shoot");
    assert!(!stale.shoot().hibernation_enabled());
    assert!(!stale.shoot().is_hibernated());
}
