//! Data source implementations

pub mod data_source_dynatrace_monitor;
pub mod data_source_private_dns_resolver;

pub use data_source_dynatrace_monitor::DynatraceMonitorDataSource;
pub use data_source_private_dns_resolver::PrivateDnsResolverDataSource;
