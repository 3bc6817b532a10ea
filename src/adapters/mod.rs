// Adapters layer: concrete implementations of the domain ports (http, in-memory, console, ...)

pub mod http_store;
pub mod ip_locator;
pub mod memory_store;
pub mod notifier;
pub mod render;
pub mod sensor;
