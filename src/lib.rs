//! Ledgerlink - estimate-to-payout integration with QuickBooks Online.
//!
//! A contractor's project estimate is split into phases. Each phase becomes
//! a service item, then an invoice, a payment and finally a reconciled
//! invoice snapshot in the user's QuickBooks company. Provider webhooks keep
//! the stored snapshots current.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
