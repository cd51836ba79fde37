// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = "Domain types shared across the signing workflow engine."]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Status, tracking fields, records, signature bundles, and collection
//! metadata views used by every other crate in the workspace. None of this
//! crate touches I/O: it is pure data plus the conversions between raw
//! JSON objects and typed views.

mod collection;
mod principal;
mod record;
mod resource_ref;
mod signature_bundle;
mod status;
mod tracking;

pub use collection::{DestinationMetadata, SourceMetadata};
pub use principal::{PLUGIN_PRINCIPAL, is_plugin_principal};
pub use record::{JsonObject, Record};
pub use resource_ref::CollectionRef;
pub use signature_bundle::{MANDATORY_VERIFY_FIELDS, SignatureBundle};
pub use status::{Status, UnknownStatus};
pub use tracking::TrackingFields;
