pub mod bootstrap;
pub mod errors;
pub mod service;
pub mod tickets;
pub mod tracker;

pub use bootstrap::{bootstrap, bootstrap_with_config, Application, BootstrapError};
pub use errors::LifecycleError;
pub use service::QuoteLifecycleService;
pub use tickets::{InMemoryTicketDirectory, TicketDirectory, TicketDirectoryError};
pub use tracker::ApprovalTracker;
