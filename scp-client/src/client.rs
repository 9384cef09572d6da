//! Composite client bundling every service sub-client

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::services::auto_scaling::AutoScalingClient;
use crate::services::direct_connect::DirectConnectClient;
use crate::services::dns::DnsClient;
use crate::services::image::ImageClient;
use crate::services::load_balancer::LoadBalancerClient;
use crate::services::postgresql::PostgresqlClient;
use crate::services::product::ProductClient;
use crate::services::project::ProjectClient;
use crate::services::resource_group::ResourceGroupClient;
use crate::services::routing::RoutingClient;
use crate::services::subnet::SubnetClient;
use crate::services::tag::TagClient;
use crate::services::vpc::VpcClient;

/// Stateless handle to the control plane; cheap to clone, safe to share
#[derive(Clone)]
pub struct ScpClient {
    pub project: ProjectClient,
    pub vpc: VpcClient,
    pub subnet: SubnetClient,
    pub routing: RoutingClient,
    pub load_balancer: LoadBalancerClient,
    pub auto_scaling: AutoScalingClient,
    pub dns: DnsClient,
    pub image: ImageClient,
    pub postgresql: PostgresqlClient,
    pub product: ProductClient,
    pub resource_group: ResourceGroupClient,
    pub direct_connect: DirectConnectClient,
    pub tag: TagClient,
    config: ClientConfig,
}

impl ScpClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = HttpClient::new(config.clone())?;
        log::debug!("SCP client for {} (project {})", config.endpoint, config.project_id);
        Ok(Self {
            project: ProjectClient::new(http.clone()),
            vpc: VpcClient::new(http.clone()),
            subnet: SubnetClient::new(http.clone()),
            routing: RoutingClient::new(http.clone()),
            load_balancer: LoadBalancerClient::new(http.clone()),
            auto_scaling: AutoScalingClient::new(http.clone()),
            dns: DnsClient::new(http.clone()),
            image: ImageClient::new(http.clone()),
            postgresql: PostgresqlClient::new(http.clone()),
            product: ProductClient::new(http.clone()),
            resource_group: ResourceGroupClient::new(http.clone()),
            direct_connect: DirectConnectClient::new(http.clone()),
            tag: TagClient::new(http),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
