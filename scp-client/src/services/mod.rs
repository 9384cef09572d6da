//! Per-service sub-clients of the SCP OpenAPI

pub mod auto_scaling;
pub mod direct_connect;
pub mod dns;
pub mod image;
pub mod load_balancer;
pub mod postgresql;
pub mod product;
pub mod project;
pub mod resource_group;
pub mod routing;
pub mod subnet;
pub mod tag;
pub mod vpc;
