// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = "Workflow orchestration for the content-signing engine."]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Ties [`signoff_policy`]'s transition DAG, [`signoff_signer`]'s signer
//! registry, and [`signoff_storage`]'s backend traits into one [`Engine`]
//! that processes host notifications: record changes, collection status
//! changes, and collection deletion. [`updater`] does the actual mirroring
//! and signing; [`lifecycle`] bootstraps groups and mirror collections;
//! [`events`] and [`context`] carry the commit-bound review-event queue.

mod cache;
mod context;
mod error;
mod events;
mod lifecycle;
mod orchestrator;
mod updater;

pub use cache::{CacheInvalidator, CacheSettings, NoopInvalidator};
pub use context::EngineContext;
pub use error::EngineError;
pub use events::{CapabilityDescriptor, CapabilityResource, RequestInfo, ReviewEvent};
pub use lifecycle::{EVERYONE_PRINCIPAL, bootstrap_review_groups, ensure_mirror_collection};
pub use orchestrator::{Engine, KeyReader, MatchedResource};
pub use updater::{SignOutcome, Updater};
