//! End-to-end pipeline tests over an in-memory knowledge base.

mod fixtures;
mod pipeline;
