pub mod resource_cluster_extension;

pub use resource_cluster_extension::ClusterExtensionResource;
