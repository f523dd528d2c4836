//! Domain layer - core business models, entities, and rules

/// Map nodes, edges, and display-space geometry
pub mod node;

/// Staff records and capability matching
pub mod employee;

/// Service requests and the service catalog
pub mod request;

/// Domain events exposed to the presentation layer
pub mod events;

/// Store traits the core is written against
pub mod repository;
