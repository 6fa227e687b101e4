pub mod resource_api_connection;

pub use resource_api_connection::ApiConnectionResource;
