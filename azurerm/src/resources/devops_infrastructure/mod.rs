pub mod resource_managed_pool;

pub use resource_managed_pool::ManagedPoolResource;
