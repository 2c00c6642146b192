//! Transit graph construction and shortest-path routing for simulated commutes.
//!
//! Stations and line geometries are turned into an undirected [`graph::TransitGraph`],
//! searched with either [`search::Algorithm`], and used by [`commute`] to generate
//! batches of synthetic commuters along with search statistics.

pub mod commute;
pub mod geometry;
pub mod graph;
pub mod network;
pub mod search;
