//! Guestbook sample workload.
//!
//! A guestbook front end backed by an in-memory redis, deployed into its own
//! namespace of the shoot. Verification pushes a fresh entry through the
//! HTTP API and reads the list back, so it only succeeds if front end, redis
//! and pod networking all work.

use std::fmt::Debug;
use std::time::Duration;

use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Service};
use kube::api::{Api, DeleteParams, PostParams, PropagationPolicy};
use kube::{Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::framework::config::GuestbookConfig;
use crate::framework::error::{Error, Result};
use crate::framework::lifecycle::SampleWorkload;
use crate::framework::port_forward::PortForward;
use crate::framework::wait::{deployment_ready, wait_for_condition};
use crate::resources::guestbook::{
    GUESTBOOK, GUESTBOOK_PORT, REDIS_MASTER, generate_guestbook_deployment,
    generate_guestbook_service, generate_namespace, generate_redis_deployment,
    generate_redis_services,
};
use crate::resources::selector;

/// Redis key holding the guestbook entries
const GUESTBOOK_KEY: &str = "guestbook";

/// Attempts of the HTTP round trip while the front end connects to redis
const VERIFY_ATTEMPTS: u32 = 10;
const VERIFY_INTERVAL: Duration = Duration::from_secs(3);

fn short_id() -> String {
    Uuid::new_v4().simple().to_string().chars().take(8).collect()
}

/// Guestbook instance in one namespace of the shoot cluster.
pub struct Guestbook {
    client: Client,
    config: GuestbookConfig,
    namespace: String,
    http: reqwest::Client,
    deployed: bool,
}

impl Guestbook {
    /// Prepare a guestbook in a fresh `guestbook-<id>` namespace.
    pub fn new(client: Client, config: GuestbookConfig) -> Self {
        Self {
            client,
            config,
            namespace: format!("guestbook-{}", short_id()),
            http: reqwest::Client::new(),
            deployed: false,
        }
    }

    fn api<K>(&self) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    /// Create an object, treating "already exists" as success.
    async fn create<K>(api: &Api<K>, object: &K) -> Result<()>
    where
        K: Resource + Clone + DeserializeOwned + Serialize + Debug,
    {
        match api.create(&PostParams::default(), object).await {
            Ok(created) => {
                debug!(name = %created.name_any(), "Created workload resource");
                Ok(())
            }
            Err(kube::Error::Api(e)) if e.code == 409 => {
                debug!("Workload resource already exists");
                Ok(())
            }
            Err(e) => Err(Error::Kube(e)),
        }
    }

    async fn wait_for_deployment(&self, name: &str) -> Result<()> {
        let deployments: Api<Deployment> = self.api();
        wait_for_condition(
            &deployments,
            name,
            |d| Ok(deployment_ready(d)),
            self.config.ready_timeout(),
        )
        .await?;
        info!(namespace = %self.namespace, deployment = name, "Deployment ready");
        Ok(())
    }

    /// Push one entry and check it is listed afterwards.
    async fn round_trip(&self, base_url: &str, entry: &str) -> Result<()> {
        self.http
            .get(format!("{}/rpush/{}/{}", base_url, GUESTBOOK_KEY, entry))
            .send()
            .await?
            .error_for_status()?;

        let entries: Vec<String> = self
            .http
            .get(format!("{}/lrange/{}", base_url, GUESTBOOK_KEY))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if entries.iter().any(|e| e == entry) {
            Ok(())
        } else {
            Err(Error::Workload(format!(
                "entry {} missing from guestbook ({} entries listed)",
                entry,
                entries.len()
            )))
        }
    }
}

impl SampleWorkload for Guestbook {
    async fn deploy(&mut self) -> Result<()> {
        info!(namespace = %self.namespace, "Deploying guestbook");

        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        Self::create(&namespaces, &generate_namespace(&self.namespace)).await?;
        self.deployed = true;

        let deployments: Api<Deployment> = self.api();
        let services: Api<Service> = self.api();

        Self::create(
            &deployments,
            &generate_redis_deployment(&self.namespace, &self.config.redis_image),
        )
        .await?;
        for service in generate_redis_services(&self.namespace) {
            Self::create(&services, &service).await?;
        }
        Self::create(
            &deployments,
            &generate_guestbook_deployment(&self.namespace, &self.config.guestbook_image),
        )
        .await?;
        Self::create(&services, &generate_guestbook_service(&self.namespace)).await?;

        self.wait_until_ready().await
    }

    async fn wait_until_ready(&mut self) -> Result<()> {
        self.wait_for_deployment(REDIS_MASTER).await?;
        self.wait_for_deployment(GUESTBOOK).await
    }

    async fn verify(&mut self) -> Result<()> {
        let entry = format!("foobar-{}", short_id());
        let mut last_error = None;

        for attempt in 1..=VERIFY_ATTEMPTS {
            // Pods may have been replaced (e.g. after wake up), resolve each time
            let forward = PortForward::to_selector(
                self.client.clone(),
                &self.namespace,
                &selector(GUESTBOOK),
                GUESTBOOK_PORT,
            )
            .await;

            let result = match forward {
                Ok(forward) => self
                    .round_trip(&forward.base_url(), &entry)
                    .await
                    .map(|()| forward.pod_name().to_string()),
                Err(e) => Err(Error::PortForward(e)),
            };

            match result {
                Ok(pod) => {
                    info!(
                        namespace = %self.namespace,
                        pod = %pod,
                        entry = %entry,
                        "Guestbook verified"
                    );
                    return Ok(());
                }
                Err(e) => {
                    debug!(attempt = attempt, error = %e, "Guestbook not answering yet");
                    last_error = Some(e);
                    tokio::time::sleep(VERIFY_INTERVAL).await;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::Workload("guestbook verification did not run".to_string())))
    }

    async fn cleanup(&mut self) -> Result<()> {
        if !self.deployed {
            return Ok(());
        }

        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let params = DeleteParams {
            propagation_policy: Some(PropagationPolicy::Background),
            ..Default::default()
        };
        match namespaces
            .delete(&self.namespace, &params)
            .await
            .map_err(Error::Kube)
        {
            Ok(_) => {
                info!(namespace = %self.namespace, "Deleted guestbook namespace");
            }
            Err(e) if e.is_not_found() => {
                warn!(namespace = %self.namespace, "Guestbook namespace already gone");
            }
            Err(e) => return Err(e),
        }
        self.deployed = false;
        Ok(())
    }
}
