//! Kubernetes pod inventory.
//!
//! # Responsibilities
//! - Locate the API server and service account credentials
//! - List pods (cluster-wide or one namespace, optional label selector)
//! - Map pods to inventory entries
//!
//! # Design Decisions
//! - Plain REST over reqwest; only the handful of pod fields we read are
//!   modelled
//! - The token is re-read on every fetch since projected tokens rotate
//! - Pods without an IP are not running yet and are left out

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{Certificate, Client};
use serde::Deserialize;
use url::Url;

use crate::config::InventoryConfig;
use crate::inventory::{InventoryEntry, InventoryError, InventorySnapshot, InventorySource};

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMetadata,
    #[serde(default)]
    spec: PodSpec,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Deserialize)]
struct PodMetadata {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodSpec {
    #[serde(default)]
    host_network: bool,
}

#[derive(Debug, Default, Deserialize)]
struct PodStatus {
    #[serde(default, rename = "podIP")]
    pod_ip: Option<String>,
}

/// Map a decoded pod list to inventory entries.
fn entries_from_pods(list: PodList) -> Vec<InventoryEntry> {
    list.items
        .into_iter()
        .filter_map(|pod| {
            let address = pod.status.pod_ip.filter(|ip| !ip.is_empty())?;
            Some(InventoryEntry::new(
                pod.metadata.name,
                address,
                pod.spec.host_network,
            ))
        })
        .collect()
}

/// Pod lister talking to the Kubernetes API server.
#[derive(Debug, Clone)]
pub struct KubernetesSource {
    client: Client,
    pods_url: Url,
    token_path: Option<PathBuf>,
}

impl KubernetesSource {
    /// Build a source against `api_server`.
    ///
    /// `token_path` is optional so an unauthenticated proxy (`kubectl proxy`)
    /// can be used during development.
    pub fn new(
        api_server: Url,
        token_path: Option<PathBuf>,
        ca_path: Option<&Path>,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Self, InventoryError> {
        let mut builder = Client::builder();
        if let Some(ca_path) = ca_path {
            let pem = std::fs::read(ca_path).map_err(|e| {
                InventoryError::Credentials(format!("reading CA {}: {}", ca_path.display(), e))
            })?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }
        let client = builder.build()?;

        let pods_url = pods_url(&api_server, namespace, label_selector)?;

        Ok(Self {
            client,
            pods_url,
            token_path,
        })
    }

    /// Build a source from configuration, filling gaps from the in-cluster
    /// environment.
    pub fn from_config(config: &InventoryConfig) -> Result<Self, InventoryError> {
        let api_server = match &config.api_server {
            Some(raw) => Url::parse(raw)
                .map_err(|e| InventoryError::Credentials(format!("api_server {:?}: {}", raw, e)))?,
            None => in_cluster_api_server()?,
        };

        let account_dir = Path::new(SERVICE_ACCOUNT_DIR);
        let token_path = config
            .token_path
            .clone()
            .unwrap_or_else(|| account_dir.join("token"));
        let ca_path = match &config.ca_path {
            Some(path) => Some(path.clone()),
            None if api_server.scheme() == "https" => Some(account_dir.join("ca.crt")),
            None => None,
        };

        Self::new(
            api_server,
            Some(token_path),
            ca_path.as_deref(),
            config.namespace.as_deref(),
            config.label_selector.as_deref(),
        )
    }

    pub fn pods_url(&self) -> &Url {
        &self.pods_url
    }

    async fn bearer_token(&self) -> Result<Option<String>, InventoryError> {
        let Some(path) = &self.token_path else {
            return Ok(None);
        };
        let token = tokio::fs::read_to_string(path).await.map_err(|e| {
            InventoryError::Credentials(format!("reading token {}: {}", path.display(), e))
        })?;
        Ok(Some(token.trim().to_string()))
    }
}

/// API server address from `KUBERNETES_SERVICE_HOST`/`_PORT`.
fn in_cluster_api_server() -> Result<Url, InventoryError> {
    let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
        InventoryError::Credentials(
            "KUBERNETES_SERVICE_HOST is not set; not running in a cluster?".to_string(),
        )
    })?;
    let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());

    let host = if host.contains(':') {
        format!("[{}]", host)
    } else {
        host
    };
    Url::parse(&format!("https://{}:{}", host, port))
        .map_err(|e| InventoryError::Credentials(format!("in-cluster API address: {}", e)))
}

fn pods_url(
    api_server: &Url,
    namespace: Option<&str>,
    label_selector: Option<&str>,
) -> Result<Url, InventoryError> {
    let path = match namespace {
        Some(ns) => format!("api/v1/namespaces/{}/pods", ns),
        None => "api/v1/pods".to_string(),
    };

    let mut base = api_server.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    let mut url = base
        .join(&path)
        .map_err(|e| InventoryError::Credentials(format!("pods URL: {}", e)))?;

    if let Some(selector) = label_selector {
        url.query_pairs_mut().append_pair("labelSelector", selector);
    }
    Ok(url)
}

#[async_trait]
impl InventorySource for KubernetesSource {
    fn describe(&self) -> String {
        format!("kubernetes {}", self.pods_url)
    }

    async fn snapshot(&self) -> Result<InventorySnapshot, InventoryError> {
        let mut request = self.client.get(self.pods_url.clone());
        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InventoryError::Status { status, body });
        }

        let list: PodList = response.json().await?;
        Ok(InventorySnapshot::new(entries_from_pods(list)))
    }
}
