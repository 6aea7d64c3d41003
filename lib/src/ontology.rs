//! Structural queries over an OWL ontology graph: its classes, the object properties
//! attached to them and the qualified restrictions declared on them.
//! Includes `OntologyLocation`, `Restriction` and `OntologyIndex`.

use crate::consts::*;
use crate::errors::{Result, ShaclError};
use crate::util::{read_file, read_url};
use log::{debug, info, warn};
use oxigraph::model::{
    Graph as OxigraphGraph, NamedNode, NamedNodeRef, NamedOrBlankNodeRef, TermRef, TripleRef,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::str::FromStr;

/// Where an ontology document is read from.
#[derive(Serialize, Deserialize, Hash, Clone, Eq, PartialEq, Debug)]
pub enum OntologyLocation {
    #[serde(rename = "file")]
    File(PathBuf),
    #[serde(rename = "url")]
    Url(String),
}

impl std::fmt::Display for OntologyLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OntologyLocation::File(p) => write!(f, "file://{}", p.display()),
            OntologyLocation::Url(u) => write!(f, "{}", u),
        }
    }
}

impl FromStr for OntologyLocation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(OntologyLocation::Url(s.to_string()))
        } else {
            let s = s.trim_start_matches("file://");
            let mut p = PathBuf::from(s);
            if !p.is_absolute() {
                p = std::env::current_dir()?.join(p);
            }
            Ok(OntologyLocation::File(p))
        }
    }
}

impl OntologyLocation {
    pub fn is_file(&self) -> bool {
        matches!(self, OntologyLocation::File(_))
    }

    pub fn is_url(&self) -> bool {
        matches!(self, OntologyLocation::Url(_))
    }

    pub fn graph(&self) -> anyhow::Result<OxigraphGraph> {
        match self {
            OntologyLocation::File(p) => read_file(p),
            OntologyLocation::Url(u) => read_url(u),
        }
    }
}

/// One qualified `owl:Restriction` attached to a class through `rdfs:subClassOf`.
///
/// `on_class` holds a single class, or every member of an `owl:unionOf` list in list order.
/// The cardinalities are `None` when the restriction does not state them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Restriction {
    pub on_property: NamedNode,
    pub on_class: Vec<NamedNode>,
    pub min_cardinality: Option<u64>,
    pub max_cardinality: Option<u64>,
}

impl std::fmt::Display for Restriction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ->", self.on_property)?;
        for (i, class) in self.on_class.iter().enumerate() {
            if i > 0 {
                write!(f, " |")?;
            }
            write!(f, " {}", class)?;
        }
        if let Some(min) = self.min_cardinality {
            write!(f, " min {}", min)?;
        }
        if let Some(max) = self.max_cardinality {
            write!(f, " max {}", max)?;
        }
        Ok(())
    }
}

/// Read-only query surface over a loaded ontology graph.
///
/// Entities belong to the ontology when their IRI starts with the ontology identifier.
pub struct OntologyIndex {
    graph: OxigraphGraph,
    identifier: NamedNode,
    classes: BTreeSet<NamedNode>,
}

impl OntologyIndex {
    pub fn new(graph: OxigraphGraph, identifier: NamedNode) -> Self {
        let classes = graph
            .subjects_for_predicate_object(TYPE, CLASS)
            .filter_map(|subject| match subject {
                NamedOrBlankNodeRef::NamedNode(n)
                    if n.as_str().starts_with(identifier.as_str()) =>
                {
                    Some(n.into_owned())
                }
                _ => None,
            })
            .collect::<BTreeSet<_>>();
        info!(
            "Indexed ontology {} with {} triples and {} classes",
            identifier,
            graph.len(),
            classes.len()
        );
        OntologyIndex {
            graph,
            identifier,
            classes,
        }
    }

    pub fn from_location(location: &OntologyLocation, identifier: NamedNode) -> Result<Self> {
        let graph = location.graph().map_err(|e| ShaclError::SourceLoad {
            location: location.to_string(),
            message: format!("{:#}", e),
        })?;
        Ok(Self::new(graph, identifier))
    }

    pub fn identifier(&self) -> NamedNodeRef<'_> {
        self.identifier.as_ref()
    }

    pub fn graph(&self) -> &OxigraphGraph {
        &self.graph
    }

    fn in_namespace(&self, node: NamedNodeRef) -> bool {
        node.as_str().starts_with(self.identifier.as_str())
    }

    /// All `owl:Class` IRIs declared inside the ontology namespace.
    pub fn all_classes(&self) -> &BTreeSet<NamedNode> {
        &self.classes
    }

    /// Returns the ontology classes, optionally restricted to those related to a property.
    ///
    /// Both filters follow the property's `rdfs:range`, including `in_domain_of`. Existing
    /// shape files were generated with this behavior, so it is kept as is.
    pub fn classes(
        &self,
        in_domain_of: Option<NamedNodeRef>,
        in_range_of: Option<NamedNodeRef>,
    ) -> Result<BTreeSet<NamedNode>> {
        let property = match (in_domain_of, in_range_of) {
            (Some(_), Some(_)) => {
                return Err(ShaclError::InvalidQuery(
                    "domain and range cannot be given at the same time".to_string(),
                ))
            }
            (Some(p), None) | (None, Some(p)) => p,
            (None, None) => return Ok(self.classes.clone()),
        };
        Ok(self
            .graph
            .objects_for_subject_predicate(property, RANGE)
            .filter_map(|object| match object {
                TermRef::NamedNode(n) if self.classes.contains(&n.into_owned()) => {
                    Some(n.into_owned())
                }
                _ => None,
            })
            .collect())
    }

    /// Returns the properties of the ontology whose `rdfs:domain` (or `rdfs:range`) is the
    /// given class. Exactly one of the two arguments must be given, and it must name one of
    /// the ontology's classes.
    pub fn properties(
        &self,
        with_domain: Option<NamedNodeRef>,
        with_range: Option<NamedNodeRef>,
    ) -> Result<BTreeSet<NamedNode>> {
        let (predicate, class) = match (with_domain, with_range) {
            (Some(c), None) => (DOMAIN, c),
            (None, Some(c)) => (RANGE, c),
            (Some(_), Some(_)) => {
                return Err(ShaclError::InvalidQuery(
                    "domain and range cannot be given at the same time".to_string(),
                ))
            }
            (None, None) => {
                return Err(ShaclError::InvalidQuery(
                    "one of domain or range must be given".to_string(),
                ))
            }
        };
        if !self.classes.contains(&class.into_owned()) {
            return Err(ShaclError::InvalidQuery(format!(
                "{} is not an owl:Class defined in {}",
                class, self.identifier
            )));
        }
        Ok(self
            .graph
            .subjects_for_predicate_object(predicate, class)
            .filter_map(|subject| match subject {
                NamedOrBlankNodeRef::NamedNode(n) if self.in_namespace(n) => Some(n.into_owned()),
                _ => None,
            })
            .collect())
    }

    /// Returns the qualified restrictions that the class is a direct `rdfs:subClassOf`.
    /// Restrictions inherited from superclasses are not included. Restrictions without
    /// `owl:onClass` are skipped.
    pub fn restrictions(&self, for_class: NamedNodeRef) -> Result<Vec<Restriction>> {
        let mut restrictions = Vec::new();
        for parent in self
            .graph
            .objects_for_subject_predicate(for_class, SUB_CLASS_OF)
        {
            let node: NamedOrBlankNodeRef = match parent {
                TermRef::NamedNode(n) => n.into(),
                TermRef::BlankNode(b) => b.into(),
                _ => continue,
            };
            if !self.graph.contains(TripleRef::new(node, TYPE, RESTRICTION)) {
                continue;
            }
            match self.read_restriction(node)? {
                Some(restriction) => restrictions.push(restriction),
                None => warn!(
                    "Skipping restriction {} on {}: no owl:onClass",
                    node, for_class
                ),
            }
        }
        restrictions.sort();
        restrictions.dedup();
        debug!("{} restrictions on {}", restrictions.len(), for_class);
        Ok(restrictions)
    }

    fn read_restriction(&self, node: NamedOrBlankNodeRef) -> Result<Option<Restriction>> {
        // unqualified restrictions are not translated, whatever their onProperty looks like
        let on_class = match self.graph.object_for_subject_predicate(node, ON_CLASS) {
            None => return Ok(None),
            Some(TermRef::NamedNode(c)) => vec![c.into_owned()],
            Some(TermRef::BlankNode(b)) => {
                let head = self
                    .graph
                    .object_for_subject_predicate(b, UNION_OF)
                    .ok_or_else(|| {
                        ShaclError::MalformedOntology(format!(
                            "owl:onClass of restriction {} is a blank node without owl:unionOf",
                            node
                        ))
                    })?;
                let members = self.collection(head)?;
                if members.is_empty() {
                    return Err(ShaclError::MalformedOntology(format!(
                        "owl:unionOf of restriction {} is empty",
                        node
                    )));
                }
                members
            }
            Some(other) => {
                return Err(ShaclError::MalformedOntology(format!(
                    "owl:onClass of restriction {} is a literal: {}",
                    node, other
                )))
            }
        };
        let on_property = match self.graph.object_for_subject_predicate(node, ON_PROPERTY) {
            Some(TermRef::NamedNode(p)) => p.into_owned(),
            Some(other) => {
                return Err(ShaclError::MalformedOntology(format!(
                    "owl:onProperty of restriction {} is not an IRI: {}",
                    node, other
                )))
            }
            None => {
                return Err(ShaclError::MalformedOntology(format!(
                    "restriction {} has no owl:onProperty",
                    node
                )))
            }
        };
        Ok(Some(Restriction {
            on_property,
            on_class,
            min_cardinality: self.cardinality(node, MIN_QUALIFIED_CARDINALITY)?,
            max_cardinality: self.cardinality(node, MAX_QUALIFIED_CARDINALITY)?,
        }))
    }

    fn cardinality(
        &self,
        node: NamedOrBlankNodeRef,
        predicate: NamedNodeRef,
    ) -> Result<Option<u64>> {
        match self.graph.object_for_subject_predicate(node, predicate) {
            None => Ok(None),
            Some(TermRef::Literal(lit)) => lit.value().trim().parse::<u64>().map(Some).map_err(|_| {
                ShaclError::MalformedOntology(format!(
                    "{} of restriction {} is not a non-negative integer: {}",
                    predicate, node, lit
                ))
            }),
            Some(other) => Err(ShaclError::MalformedOntology(format!(
                "{} of restriction {} is not a literal: {}",
                predicate, node, other
            ))),
        }
    }

    /// Reads an RDF list of IRIs starting at `head`.
    fn collection(&self, head: TermRef) -> Result<Vec<NamedNode>> {
        let mut members = Vec::new();
        let mut seen = HashSet::new();
        let mut current = head;
        loop {
            let cell: NamedOrBlankNodeRef = match current {
                TermRef::NamedNode(n) if n == NIL => return Ok(members),
                TermRef::NamedNode(n) => n.into(),
                TermRef::BlankNode(b) => b.into(),
                other => {
                    return Err(ShaclError::MalformedOntology(format!(
                        "list cell is a literal: {}",
                        other
                    )))
                }
            };
            if !seen.insert(cell) {
                return Err(ShaclError::MalformedOntology(format!(
                    "list through {} is cyclic",
                    cell
                )));
            }
            match self.graph.object_for_subject_predicate(cell, FIRST) {
                Some(TermRef::NamedNode(n)) => members.push(n.into_owned()),
                Some(other) => {
                    return Err(ShaclError::MalformedOntology(format!(
                        "union member {} is not a named class",
                        other
                    )))
                }
                None => {
                    return Err(ShaclError::MalformedOntology(format!(
                        "list cell {} has no rdf:first",
                        cell
                    )))
                }
            }
            current = self
                .graph
                .object_for_subject_predicate(cell, REST)
                .ok_or_else(|| {
                    ShaclError::MalformedOntology(format!("list cell {} has no rdf:rest", cell))
                })?;
        }
    }
}
