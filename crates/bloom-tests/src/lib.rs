//! Integration test suite for Bloom nodes.
//!
//! Deploys the manager against in-memory collaborators and replays full
//! node lifecycles: deposits, locks, compounding, claims, and emergency
//! claims under a controllable clock.

pub mod helpers;
