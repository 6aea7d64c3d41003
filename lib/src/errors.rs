// Errors raised while indexing an ontology or generating shapes from it

use oxigraph::model::IriParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaclError {
    /// A query on the ontology index was called with an invalid combination of arguments.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    /// The ontology lacks data the generator needs, e.g. a restriction without owl:onProperty.
    #[error("malformed ontology: {0}")]
    MalformedOntology(String),
    #[error("failed to load ontology from {location}: {message}")]
    SourceLoad { location: String, message: String },
    #[error("invalid IRI: {0}")]
    InvalidIri(#[from] IriParseError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShaclError>;
