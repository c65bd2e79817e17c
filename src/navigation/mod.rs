//! Navigation module - HTTP access to the web
//!
//! One reusable session per client, with an ordered visit history.

mod client;

pub use client::{NavigationClient, Payload};
