//! Precompiled manifest support: a flat table from logical paths to digest-qualified files.

mod table;

pub use table::{MANIFEST_FILE, Manifest, ManifestDocument, ManifestFileRecord, locate_manifest};
