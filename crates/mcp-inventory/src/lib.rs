//! Inventory of locally configured MCP servers.
//!
//! The scan builds a [`catalog::LocationCatalog`] for the host, probes every
//! candidate, routes existing files through schema adapters that share a
//! [`ledger::DedupLedger`], scores each record with the [`risk`] model and
//! collects the result in an [`inventory::Inventory`] for export.

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod inventory;
pub mod ledger;
pub mod model;
pub mod parser;
pub mod report;
pub mod risk;
