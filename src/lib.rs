//! webflow-sync - one-way change propagation from the content store into the
//! Webflow CMS.
//!
//! Row-level change events on articles arrive as webhook deliveries; each
//! delivery is normalized, reconciled against the remote collection
//! (create/update/delete), published in two steps (item, then site), and
//! audited from start to verdict.

pub mod config;
pub mod effects;
pub mod server;
pub mod store;
pub mod sync;
pub mod types;
pub mod webflow;
pub mod webhooks;
