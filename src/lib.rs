// Module layout
// - bootstrap: configuration and dependency wiring
// - infrastructure: note store adapters (Dropbox, filesystem) and webhook crypto
// - presentation: HTTP handlers and routing
// - application: sync engine, indexes, rendering and use cases
// - domain: note identity, rendered notes, error taxonomy

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
