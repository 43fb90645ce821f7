pub mod alchemy;
pub mod job;
pub mod observables;
pub mod snapshot;
pub mod topology;
