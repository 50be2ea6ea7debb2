//! `gatehouse-core` — value vocabulary shared by the gate and its hosts.
//!
//! This crate contains **pure values** (no evaluation logic, no IO).

pub mod argument;
pub mod id;
pub mod subject;

pub use argument::{Argument, Arguments};
pub use id::{PolicyRef, SubjectType};
pub use subject::Subject;
