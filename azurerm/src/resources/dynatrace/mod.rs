pub mod resource_monitor;

pub use resource_monitor::DynatraceMonitorResource;
