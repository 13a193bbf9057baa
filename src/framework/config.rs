//! Runner configuration.
//!
//! Every setting can be given as a command line flag or through the
//! environment, so the runner works both interactively and inside a test
//! machinery pod.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

/// Default guestbook front end image.
pub const DEFAULT_GUESTBOOK_IMAGE: &str = "registry.k8s.io/guestbook:v3";
/// Default redis image backing the guestbook.
pub const DEFAULT_REDIS_IMAGE: &str = "registry.k8s.io/e2e-test-images/redis:5.0.5-alpine";

/// Settings identifying the target shoot and the garden it lives in.
#[derive(Args, Debug, Clone)]
pub struct FrameworkConfig {
    /// Kubeconfig of the garden cluster (defaults to the inferred config)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Project namespace of the shoot in the garden cluster
    #[arg(long, env = "PROJECT_NAMESPACE")]
    pub project_namespace: String,

    /// Name of the shoot under test
    #[arg(long, env = "SHOOT_NAME")]
    pub shoot_name: String,

    /// Directory receiving the rotated shoot kubeconfig as `shoot.config`
    #[arg(long, env = "TM_KUBECONFIG_PATH")]
    pub kubeconfigs_path: Option<PathBuf>,

    /// Upper bound for a single wait on the shoot, in seconds
    #[arg(long, default_value_t = 3600)]
    pub operation_timeout_secs: u64,

    #[command(flatten)]
    pub guestbook: GuestbookConfig,
}

impl FrameworkConfig {
    /// Configuration with defaults for everything but the shoot identity.
    pub fn new(project_namespace: impl Into<String>, shoot_name: impl Into<String>) -> Self {
        Self {
            kubeconfig: None,
            project_namespace: project_namespace.into(),
            shoot_name: shoot_name.into(),
            kubeconfigs_path: None,
            operation_timeout_secs: 3600,
            guestbook: GuestbookConfig::default(),
        }
    }

    /// Set the directory receiving the rotated kubeconfig.
    pub fn with_kubeconfigs_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfigs_path = Some(path.into());
        self
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

/// Settings of the guestbook sample workload.
#[derive(Args, Debug, Clone)]
pub struct GuestbookConfig {
    /// Guestbook front end image
    #[arg(long, default_value = DEFAULT_GUESTBOOK_IMAGE)]
    pub guestbook_image: String,

    /// Redis image
    #[arg(long, default_value = DEFAULT_REDIS_IMAGE)]
    pub redis_image: String,

    /// Time allowed for the workload deployments to become ready, in seconds
    #[arg(long, default_value_t = 600)]
    pub workload_ready_timeout_secs: u64,
}

impl GuestbookConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.workload_ready_timeout_secs)
    }
}

impl Default for GuestbookConfig {
    fn default() -> Self {
        Self {
            guestbook_image: DEFAULT_GUESTBOOK_IMAGE.to_string(),
            redis_image: DEFAULT_REDIS_IMAGE.to_string(),
            workload_ready_timeout_secs: 600,
        }
    }
}
