//! Integration tests: the recap pipeline end to end with deterministic
//! in-memory collaborators.

mod fakes;
mod fixtures;
mod pipeline;
