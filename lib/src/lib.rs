//! Derives SHACL validation shapes from OWL ontologies.
//!
//! An [`ontology::OntologyIndex`] answers structural questions about a loaded ontology graph
//! (classes, object properties, qualified restrictions). [`shacl::ShapeGraph::generate`] turns
//! it into a shape graph with one `sh:NodeShape` per class, configured by a
//! [`config::ShaclConfig`].

pub mod config;
pub mod consts;
pub mod errors;
pub mod ontology;
pub mod shacl;
pub mod util;

pub use config::ShaclConfig;
pub use errors::ShaclError;
pub use ontology::{OntologyIndex, OntologyLocation, Restriction};
pub use shacl::{shape_name, ShapeGenerator, ShapeGraph};

pub fn init_logging() {
    // Allow ONTOSHACL_LOG to override RUST_LOG for consistent CLI defaults.
    if let Ok(log_level) = std::env::var("ONTOSHACL_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}
