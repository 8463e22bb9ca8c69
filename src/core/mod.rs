//! Core admission-and-dispatch engine
//!
//! Registry, routing, scheduling, concurrency rules, process lifecycle, and
//! the per-request fallback controller.

pub mod concurrency;
pub mod controller;
pub mod process;
pub mod providers;
pub mod registry;
pub mod request_log;
pub mod routing;
pub mod scheduler;
pub mod types;

pub use controller::RequestController;
pub use process::ProcessSupervisor;
pub use providers::{AdapterBuilders, ProviderAdapter, ProviderSpec};
pub use registry::Registry;
pub use request_log::{RequestLog, RequestRecord};
pub use routing::RouteResolver;
pub use scheduler::Scheduler;
