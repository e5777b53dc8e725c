#![cfg(not(target_arch = "wasm32"))]
#![warn(missing_docs)]

//! # Console RBAC Inspect
//!
//! Offline troubleshooting for access-control resolution. Given the view
//! registry of a console and a composite response recorded from a live
//! backend, the tool shows what a view asks for and what the operator may
//! do with it.
//!
//! ```bash
//! # The composite request a view sends
//! rbac-inspect --registry views.json request logging-view
//!
//! # Every resource of the view with its constraints
//! rbac-inspect --registry views.json dump logging-view --response recorded.json
//!
//! # One decision
//! rbac-inspect --registry views.json --select selected.profile=profile=full \
//!     check datasources --response recorded.json \
//!     profile=full/subsystem=datasources/data-source=ExampleDS write-attribute jndi-name
//! ```
//!
//! Set `RUST_LOG` (or pass `--verbose`) to see how the context is built.

mod cli;
pub use cli::*;

mod replay;
pub use replay::*;

mod inspect;
pub use inspect::*;
