//! Local port forwarding into the shoot cluster.
//!
//! The sample workload is not exposed outside the shoot, so it is reached
//! through a kube-rs port-forward: a local listener on 127.0.0.1 whose
//! connections are tunnelled to a pod port. Forwarding stops when the
//! `PortForward` is dropped.

use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::{Api, Client};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Errors that can occur during port forwarding
#[derive(Error, Debug)]
pub enum PortForwardError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No running pod found for selector: {0}")]
    NoPodsFound(String),

    #[error("Pod {0} did not offer a stream for the forwarded port")]
    NoStream(String),

    #[error("Port forward join error: {0}")]
    Join(String),
}

/// Forwarding from a local port to one port of a pod.
pub struct PortForward {
    local_port: u16,
    pod_name: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl PortForward {
    /// Forward to `remote_port` of a running pod matching `selector`.
    pub async fn to_selector(
        client: Client,
        namespace: &str,
        selector: &str,
        remote_port: u16,
    ) -> Result<Self, PortForwardError> {
        let pods: Api<Pod> = Api::namespaced(client, namespace);
        let pod_name = running_pod(&pods, selector).await?;
        Self::to_pod(pods, pod_name, remote_port).await
    }

    /// Forward to `remote_port` of the named pod.
    pub async fn to_pod(
        pods: Api<Pod>,
        pod_name: String,
        remote_port: u16,
    ) -> Result<Self, PortForwardError> {
        // Bind before spawning so the port is accepting when we return
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let local_port = listener.local_addr()?.port();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = {
            let pod_name = pod_name.clone();
            tokio::spawn(async move {
                accept_loop(listener, pods, pod_name, remote_port, shutdown_rx).await;
            })
        };

        tracing::debug!(
            pod = %pod_name,
            local_port = local_port,
            remote_port = remote_port,
            "Port-forward established"
        );

        Ok(Self {
            local_port,
            pod_name,
            shutdown_tx: Some(shutdown_tx),
            handle,
        })
    }

    pub fn pod_name(&self) -> &str {
        &self.pod_name
    }

    /// Base URL for HTTP requests through the forward.
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.local_port)
    }
}

impl Drop for PortForward {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

/// Resolve a label selector to the name of a running pod.
async fn running_pod(pods: &Api<Pod>, selector: &str) -> Result<String, PortForwardError> {
    let list = pods.list(&ListParams::default().labels(selector)).await?;
    list.items
        .into_iter()
        .find(|p| {
            p.status
                .as_ref()
                .and_then(|s| s.phase.as_deref())
                .is_some_and(|phase| phase == "Running")
                && p.metadata.deletion_timestamp.is_none()
        })
        .and_then(|p| p.metadata.name)
        .ok_or_else(|| PortForwardError::NoPodsFound(selector.to_string()))
}

async fn accept_loop(
    listener: TcpListener,
    pods: Api<Pod>,
    pod_name: String,
    remote_port: u16,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                tracing::debug!(pod = %pod_name, "Port forward shutdown requested");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let pods = pods.clone();
                    let pod_name = pod_name.clone();
                    tokio::spawn(async move {
                        if let Err(e) = forward_connection(pods, &pod_name, remote_port, stream).await {
                            tracing::warn!(pod = %pod_name, error = %e, "Port forward connection error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Port forward accept error");
                }
            }
        }
    }
}

async fn forward_connection(
    pods: Api<Pod>,
    pod_name: &str,
    remote_port: u16,
    mut local: TcpStream,
) -> Result<(), PortForwardError> {
    let mut forwarder = pods.portforward(pod_name, &[remote_port]).await?;
    let mut upstream = forwarder
        .take_stream(remote_port)
        .ok_or_else(|| PortForwardError::NoStream(pod_name.to_string()))?;

    tokio::io::copy_bidirectional(&mut local, &mut upstream).await?;
    drop(upstream);

    forwarder
        .join()
        .await
        .map_err(|e| PortForwardError::Join(e.to_string()))
}
