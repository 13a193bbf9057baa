//! Guestbook manifests.
//!
//! The guestbook front end stores entries in redis. It writes through the
//! `redis-master` service and reads through `redis-slave`; both point at the
//! same single redis pod here.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::resources::common::{MANAGED_BY, cluster_ip_service, single_container_deployment};

/// Redis application label
pub const REDIS_APP: &str = "redis";
/// Redis write service and deployment name
pub const REDIS_MASTER: &str = "redis-master";
/// Redis read service name
pub const REDIS_SLAVE: &str = "redis-slave";
/// Redis port
pub const REDIS_PORT: u16 = 6379;

/// Guestbook application label, deployment and service name
pub const GUESTBOOK: &str = "guestbook";
/// Guestbook HTTP port
pub const GUESTBOOK_PORT: u16 = 3000;

/// Generate the namespace holding the workload
pub fn generate_namespace(name: &str) -> Namespace {
    let mut labels = BTreeMap::new();
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        MANAGED_BY.to_string(),
    );
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Generate the redis Deployment
pub fn generate_redis_deployment(namespace: &str, image: &str) -> Deployment {
    single_container_deployment(namespace, REDIS_MASTER, REDIS_APP, image, REDIS_PORT)
}

/// Generate the redis Services (write and read endpoints)
pub fn generate_redis_services(namespace: &str) -> Vec<Service> {
    [REDIS_MASTER, REDIS_SLAVE]
        .into_iter()
        .map(|name| cluster_ip_service(namespace, name, REDIS_APP, REDIS_PORT))
        .collect()
}

/// Generate the guestbook Deployment
pub fn generate_guestbook_deployment(namespace: &str, image: &str) -> Deployment {
    single_container_deployment(namespace, GUESTBOOK, GUESTBOOK, image, GUESTBOOK_PORT)
}

/// Generate the guestbook Service
pub fn generate_guestbook_service(namespace: &str) -> Service {
    cluster_ip_service(namespace, GUESTBOOK, GUESTBOOK, GUESTBOOK_PORT)
}
