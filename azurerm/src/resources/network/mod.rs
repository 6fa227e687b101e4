pub mod resource_private_dns_resolver;

pub use resource_private_dns_resolver::PrivateDnsResolverResource;
