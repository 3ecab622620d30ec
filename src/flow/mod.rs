/*!
# Context Dataflow

Forward propagation of the active [`GuardContext`] through method bodies.

- [`context`] - the context lattice (sets of platform/version worlds)
- [`callables`] - local functions and lambdas, walked after their owner
- [`engine`] - the statement walker and condition splitter

Every walk is seeded with the allowed worlds of the enclosing symbol's own
contract: code inside a `[SupportedOSPlatform("windows")]` method only ever
runs on Windows.
*/

pub mod callables;
pub mod context;
pub mod engine;

pub use callables::{CallableIndex, CallableKey};
pub use context::GuardContext;
pub use engine::FlowEngine;
