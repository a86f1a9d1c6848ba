//! Business logic for the task tracker. Each submodule exposes "driving ports" (what the API layer
//! calls) and "driven ports" (what the logic needs from storage), so persistence can be swapped for
//! in-memory fakes during tests.

pub mod task;
pub mod user;
