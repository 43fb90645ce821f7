//! # atmprep Core Library
//!
//! A driver library for preparing and equilibrating Alchemical Transfer Method (ATM)
//! binding free-energy simulations: a scripted sequence of minimization, thermalization,
//! pressure/volume equilibration and alchemical-parameter annealing stages, with
//! checkpoint persistence between stages. All force evaluation and integration is
//! delegated to an external molecular dynamics engine reached through an adapter trait.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`AlchemicalState`,
//!   `Snapshot`, `CycleRecord`), deterministic schedules (`LambdaSchedule`,
//!   `TemperatureRamp`), and I/O utilities (checkpoint store, structure snapshots,
//!   cycle logs).
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates the preparation
//!   protocol. It defines the seam to the external MD engine (`MdEngine`,
//!   `SystemFactory`), the typed run configuration, and the per-phase protocols.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing layer.
//!   It ties the `engine` and `core` together to execute the complete staged
//!   preparation protocol, phase by phase, with restart support.
//!
//! The optional [`openmm`] module (cargo feature `openmm`) provides the production
//! implementation of the engine seam on top of the OpenMM Python API.

pub mod core;
pub mod engine;
pub mod workflows;

#[cfg(feature = "openmm")]
pub mod openmm;
