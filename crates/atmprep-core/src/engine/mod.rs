//! # Engine Module
//!
//! The stateful orchestration layer of the preparation protocol. It owns the
//! run configuration, the adapter seam to the external MD engine, and the
//! per-phase protocols; the physics itself (force evaluation, integration,
//! constraint solving) happens entirely on the other side of the seam.
//!
//! - **Configuration** ([`config`]) - Typed, immutable run parameters with
//!   defaults resolved at load time, and the pure restraint transform.
//! - **Backend seam** ([`backend`]) - The `MdEngine`/`SystemFactory` traits
//!   describing what the external engine must provide.
//! - **Phases** ([`phases`]) - The fixed catalog of preparation phases and
//!   their protocols.
//! - **Progress** ([`progress`]) - Callback-based progress reporting.
//! - **Error Handling** ([`error`]) - Fail-fast error taxonomy.

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod phases;
pub mod progress;
