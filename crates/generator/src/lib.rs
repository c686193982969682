//! Per-page renderer generation.
//!
//! Scans the component folders, aggregates their GraphQL fragments, writes
//! one renderer per page that imports only the components the page uses and
//! registers the pages with the site builder.

pub mod build;
pub mod fragments;
pub mod registrar;
pub mod scanner;
pub mod skeleton;
pub mod synthesizer;
mod text;

pub use build::{BuildStats, load_registry, refresh_fragments, run_build};
pub use fragments::{ComponentRegistry, FRAGMENT_EXTENSION, descriptor_path};
pub use registrar::{PageActions, RegisteredKind, register_collection, register_page, register_pages};
pub use scanner::list_subdirectories;
pub use skeleton::{RendererSections, Skeleton, Slot};
pub use synthesizer::{SynthesisRequest, Synthesizer};
