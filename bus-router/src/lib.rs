//! Bus route finding server.
//!
//! Answers "which buses do I take from here to there?" over a network
//! ingested from LTA DataMall, ranking candidate routes by travel time
//! plus the live wait for the first bus.

pub mod cache;
pub mod config;
pub mod domain;
pub mod graph;
pub mod ingest;
pub mod lta;
pub mod planner;
pub mod reducer;
pub mod store;
pub mod web;

#[cfg(test)]
mod fixture;
