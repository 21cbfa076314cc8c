//! The test framework main entry point.

use std::{fmt, time::Duration};

use k8s_openapi::api::{apps::v1::Deployment, core::v1::Pod};
use kube::{
    Api, Client, Config, ResourceExt,
    api::ListParams,
    config::{KubeConfigOptions, Kubeconfig},
};
use snafu::{OptionExt, ResultExt};
use tracing::{debug, info};

use crate::{
    Interface, Result,
    error::{
        ApiSnafu, BuildClientSnafu, DeploymentNotFoundSnafu, InferConfigSnafu,
        LoadKubeconfigSnafu,
    },
    wait::{DEFAULT_POLL_INTERVAL, deployment_is_ready, pod_is_running, poll_until},
};

/// Framework wraps the interface to the system with an easy-to-use rust API
/// optimized for implementing test cases.
#[derive(Clone)]
pub struct Framework {
    interface: Interface,
    client: Client,
}

impl fmt::Debug for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framework")
            .field("interface", &self.interface)
            .finish_non_exhaustive()
    }
}

impl Framework {
    /// Create a new [`Framework`] talking to the cluster described by the
    /// interface's kubeconfig, or to the inferred one if it has none.
    pub async fn connect(interface: Interface) -> Result<Self> {
        let config = match &interface.kubeconfig {
            Some(path) => {
                let kubeconfig =
                    Kubeconfig::read_from(path).context(LoadKubeconfigSnafu { path })?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .context(LoadKubeconfigSnafu { path })?
            }
            None => Config::infer().await.context(InferConfigSnafu)?,
        };
        let client = Client::try_from(config).context(BuildClientSnafu)?;
        Ok(Self::new(interface, client))
    }

    /// Create a new [`Framework`] powered by an existing client.
    pub fn new(interface: Interface, client: Client) -> Self {
        Self { interface, client }
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetch a deployment. An absent deployment is an error.
    pub async fn pull_deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        get_deployment(&self.deployments(namespace), namespace, name).await
    }

    /// Wait for a deployment to have all of its replicas ready.
    ///
    /// The deployment vanishing while waiting aborts the wait.
    pub async fn wait_for_deployment_ready(
        &self,
        namespace: &str,
        name: &str,
        timeout: Duration,
    ) -> Result<()> {
        let deployments = self.deployments(namespace);
        info!(message = "Waiting for deployment to be ready.", %namespace, %name, ?timeout);

        poll_until(
            &format!("deployment {namespace}/{name} to be ready"),
            timeout,
            DEFAULT_POLL_INTERVAL,
            || {
                let deployments = deployments.clone();
                async move {
                    let deployment = get_deployment(&deployments, namespace, name).await?;
                    let ready = deployment_is_ready(&deployment);
                    debug!(
                        message = "Deployment status.",
                        %name,
                        ready,
                        replicas = ?deployment.status.as_ref().and_then(|status| status.replicas),
                        ready_replicas = ?deployment.status.as_ref().and_then(|status| status.ready_replicas),
                    );
                    Ok(ready.then_some(()))
                }
            },
        )
        .await?;

        info!(message = "Deployment is ready.", %namespace, %name);
        Ok(())
    }

    /// Wait for the pods matching `label_selector` to be running.
    ///
    /// The pod list is refreshed on every probe, so pods replaced during a
    /// rollout are picked up. An empty selection keeps the wait going.
    /// Returns the names of the running pods.
    pub async fn wait_for_pods_running(
        &self,
        namespace: &str,
        label_selector: &str,
        timeout: Duration,
    ) -> Result<Vec<String>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = ListParams::default().labels(label_selector);
        info!(message = "Waiting for pods to be running.", %namespace, %label_selector, ?timeout);

        let names = poll_until(
            &format!("pods `{label_selector}` in {namespace} to be running"),
            timeout,
            DEFAULT_POLL_INTERVAL,
            || {
                let pods = pods.clone();
                let params = params.clone();
                async move {
                    let list = pods.list(&params).await.context(ApiSnafu {
                        operation: format!("list pods `{label_selector}` in {namespace}"),
                    })?;
                    if list.items.is_empty() {
                        debug!(message = "No pods matched yet.", %label_selector);
                        return Ok(None);
                    }

                    let pending = list
                        .items
                        .iter()
                        .filter(|pod| !pod_is_running(pod))
                        .map(ResourceExt::name_any)
                        .collect::<Vec<_>>();
                    if !pending.is_empty() {
                        debug!(message = "Pods not running yet.", ?pending);
                        return Ok(None);
                    }

                    Ok(Some(
                        list.items.iter().map(ResourceExt::name_any).collect::<Vec<_>>(),
                    ))
                }
            },
        )
        .await?;

        info!(message = "Pods are running.", %namespace, pods = ?names);
        Ok(names)
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

async fn get_deployment(
    deployments: &Api<Deployment>,
    namespace: &str,
    name: &str,
) -> Result<Deployment> {
    deployments
        .get_opt(name)
        .await
        .context(ApiSnafu {
            operation: format!("get deployment {namespace}/{name}"),
        })?
        .context(DeploymentNotFoundSnafu { namespace, name })
}
