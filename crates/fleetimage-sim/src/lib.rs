//! fleetimage-sim — an in-memory fleet behind every capability trait.
//!
//! Loaded from a JSON fixture, the simulated fleet answers deployment,
//! scaling-group, image, launch-configuration and parameter calls,
//! appends launch configuration versions, injects faults on request, and
//! records every call it receives. The CLI runs against it and the test
//! suites use it as their only test double.

pub mod fixture;
pub mod fleet;

pub use fixture::{
    ApplicationFixture, DeploymentGroupFixture, Fault, FixtureError, FleetFixture, Operation,
};
pub use fleet::{Call, SimulatedFleet};
