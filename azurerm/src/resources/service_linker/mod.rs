pub mod resource_app_service_connection;

pub use resource_app_service_connection::AppServiceConnectionResource;
