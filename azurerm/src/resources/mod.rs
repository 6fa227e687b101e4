//! Resource implementations

pub mod common;
pub mod devops_infrastructure;
pub mod dynatrace;
pub mod kubernetes_configuration;
pub mod network;
pub mod service_linker;
pub mod web;

pub use devops_infrastructure::ManagedPoolResource;
pub use dynatrace::DynatraceMonitorResource;
pub use kubernetes_configuration::ClusterExtensionResource;
pub use network::PrivateDnsResolverResource;
pub use service_linker::AppServiceConnectionResource;
pub use web::ApiConnectionResource;
