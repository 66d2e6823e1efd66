//! Helpers for classifying and normalising asset references.
//!
//! This module splits the responsibilities into focused submodules so that the logic for
//! detecting external references, splitting query/fragment tails, inferring extensions and
//! joining URL paths can be tested independently of any lookup source.

mod asset_type;
mod filters;
mod reference;
mod urls;

pub use asset_type::AssetType;
pub use filters::{check_reference_syntax, is_external_reference};
pub use reference::{AssetReference, ReferenceKind};
pub use urls::{digest_file_name, join_url_path};
