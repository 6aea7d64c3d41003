//! Generates a SHACL shape graph from an [`OntologyIndex`].
//!
//! Every ontology class gets one `sh:NodeShape` targeting it. Property constraints come from
//! two places: the `rdfs:domain`/`rdfs:range` declarations of object properties, and the
//! qualified `owl:Restriction`s the class is a subclass of. Both are attached to the same
//! `sh:property` node when they concern the same property.

use crate::config::{today, ShaclConfig};
use crate::consts::*;
use crate::errors::Result;
use crate::ontology::OntologyIndex;
use chrono::NaiveDate;
use log::{debug, info};
use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::{
    BlankNode, Graph as OxigraphGraph, Literal, NamedNode, NamedNodeRef, NamedOrBlankNode,
    NamedOrBlankNodeRef, TripleRef,
};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Computes the local name of the shape for a class: `{fragment}Shape` when the IRI has a
/// non-empty fragment, otherwise `{segment}Shape` for its last non-empty path segment.
///
/// Both are taken from the IRI text as written, so non-ASCII names are kept unescaped.
pub fn shape_name(class: NamedNodeRef) -> String {
    let iri = class.as_str();
    let local = match iri.split_once('#') {
        Some((_, fragment)) if !fragment.is_empty() => fragment,
        Some((rest, _)) => last_segment(path(rest)),
        None => last_segment(path(iri)),
    };
    format!("{}Shape", local)
}

/// Path of an IRI without its fragment: scheme, authority and query removed.
fn path(iri: &str) -> &str {
    let iri = iri.split_once('?').map_or(iri, |(before, _)| before);
    let hier = iri.split_once(':').map_or(iri, |(_, after)| after);
    match hier.strip_prefix("//") {
        Some(authority_path) => authority_path
            .find('/')
            .map_or("", |start| &authority_path[start..]),
        None => hier,
    }
}

fn last_segment(path: &str) -> &str {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or_default()
}

/// The generated shape graph together with the prefixes used to serialize it.
#[derive(Debug, Clone)]
pub struct ShapeGraph {
    identifier: NamedNode,
    graph: OxigraphGraph,
    prefixes: Vec<(String, String)>,
}

impl ShapeGraph {
    /// Runs shape generation for every class of the ontology.
    pub fn generate(ontology: &OntologyIndex, config: &ShaclConfig) -> Result<Self> {
        let mut generator = ShapeGenerator::new(ontology, config);
        for class in ontology.all_classes() {
            generator.add_node_shape(class.as_ref())?;
        }
        let shapes = generator.finish();
        info!(
            "Generated {} triples for {} classes of {}",
            shapes.len(),
            ontology.all_classes().len(),
            ontology.identifier()
        );
        Ok(shapes)
    }

    pub fn identifier(&self) -> NamedNodeRef<'_> {
        self.identifier.as_ref()
    }

    pub fn graph(&self) -> &OxigraphGraph {
        &self.graph
    }

    pub fn prefixes(&self) -> &[(String, String)] {
        &self.prefixes
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Serializes the graph. Triples are written sorted by their N-Triples form so that the
    /// same graph always produces the same bytes.
    pub fn write<W: Write>(&self, writer: W, format: RdfFormat) -> Result<W> {
        let mut serializer = RdfSerializer::from_format(format);
        for (prefix, namespace) in &self.prefixes {
            serializer = serializer.with_prefix(prefix.as_str(), namespace.as_str())?;
        }
        let mut serializer = serializer.for_writer(writer);
        let mut triples: Vec<TripleRef> = self.graph.iter().collect();
        triples.sort_by_cached_key(|t| t.to_string());
        for triple in triples {
            serializer.serialize_triple(triple)?;
        }
        Ok(serializer.finish()?)
    }

    pub fn to_string(&self, format: RdfFormat) -> Result<String> {
        let buffer = self.write(Vec::new(), format)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn write_to_file(&self, file: &Path, format: RdfFormat) -> Result<()> {
        info!("Writing {} shape triples to {}", self.len(), file.display());
        let file = std::fs::File::create(file)?;
        let mut writer = self.write(std::io::BufWriter::new(file), format)?;
        writer.flush()?;
        Ok(())
    }
}

/// Builds a shape graph one class at a time.
///
/// Construction writes the `owl:Ontology` description of the shape graph itself; each call
/// to [`ShapeGenerator::add_node_shape`] then adds the shape of one class.
pub struct ShapeGenerator<'a> {
    ontology: &'a OntologyIndex,
    config: &'a ShaclConfig,
    graph: OxigraphGraph,
    next_blank: u64,
}

impl<'a> ShapeGenerator<'a> {
    pub fn new(ontology: &'a OntologyIndex, config: &'a ShaclConfig) -> Self {
        let mut generator = ShapeGenerator {
            ontology,
            config,
            graph: OxigraphGraph::new(),
            next_blank: 0,
        };
        generator.add_metadata();
        generator
    }

    fn add_metadata(&mut self) {
        let config = self.config;
        let index = self.ontology;
        let id = config.shape_namespace.as_ref();
        let ontology = index.identifier();

        self.graph.insert(TripleRef::new(id, TYPE, ONTOLOGY));
        self.graph
            .insert(TripleRef::new(id, VERSION_IRI, config.version_iri.as_ref()));
        // the version IRI is always written in angle brackets, never as a prefixed name
        let version_info = Literal::new_simple_literal(format!(
            "{}: Generated by OntoShacl on commit: {}",
            config.version_iri, config.revision
        ));
        self.graph
            .insert(TripleRef::new(id, VERSION_INFO, version_info.as_ref()));
        self.graph
            .insert(TripleRef::new(id, CREATOR, config.creator.as_ref()));

        let date_modified = config.date_modified.unwrap_or_else(today);
        let date_created = config.date_created.unwrap_or(date_modified);
        let created = date_literal(date_created);
        let modified = date_literal(date_modified);
        self.graph
            .insert(TripleRef::new(id, DATE_CREATED, created.as_ref()));
        self.graph
            .insert(TripleRef::new(id, DATE_MODIFIED, modified.as_ref()));

        let description = Literal::new_simple_literal(
            config
                .description
                .clone()
                .unwrap_or_else(|| {
                    format!("OntoShacl generated validator for {}", ontology.as_str())
                }),
        );
        self.graph
            .insert(TripleRef::new(id, DESCRIPTION, description.as_ref()));
        let name = Literal::new_simple_literal(
            config
                .name
                .clone()
                .unwrap_or_else(|| format!("{} Validator", ontology.as_str())),
        );
        self.graph.insert(TripleRef::new(id, NAME, name.as_ref()));
        if let Some(publisher) = &config.publisher {
            self.graph
                .insert(TripleRef::new(id, PUBLISHER, publisher.as_ref()));
        }
    }

    /// The IRI of the shape generated for `class`, inside the shape namespace.
    pub fn shape_iri(&self, class: NamedNodeRef) -> NamedNode {
        // both parts come from already validated IRIs
        NamedNode::new_unchecked(format!(
            "{}{}",
            self.config.shape_namespace.as_str(),
            shape_name(class)
        ))
    }

    fn blank(&mut self) -> BlankNode {
        let node = BlankNode::new_unchecked(format!("b{}", self.next_blank));
        self.next_blank += 1;
        node
    }

    /// Adds a `sh:property` node with its `sh:path` to the shape.
    fn add_property_anchor(&mut self, shape: NamedNodeRef, path: NamedNodeRef) -> BlankNode {
        let anchor = self.blank();
        self.graph
            .insert(TripleRef::new(shape, PROPERTY, anchor.as_ref()));
        self.graph
            .insert(TripleRef::new(anchor.as_ref(), TYPE, PROPERTY_SHAPE));
        self.graph.insert(TripleRef::new(anchor.as_ref(), PATH, path));
        debug!("Added property {} to {}", path, shape);
        anchor
    }

    /// Attaches `sh:class` for a single class, or `sh:or` over one `sh:class` node per class.
    fn add_class_constraint<'c, I>(&mut self, anchor: NamedOrBlankNodeRef, classes: I)
    where
        I: IntoIterator<Item = &'c NamedNode>,
        I::IntoIter: ExactSizeIterator,
    {
        let classes = classes.into_iter();
        // empty ranges are skipped and empty unions rejected before reaching here
        debug_assert_ne!(classes.len(), 0, "class constraint on {} without classes", anchor);
        match classes.len() {
            0 => {}
            1 => {
                for class in classes {
                    self.graph
                        .insert(TripleRef::new(anchor, SH_CLASS, class.as_ref()));
                }
            }
            _ => {
                let members = classes
                    .map(|class| {
                        let member = self.blank();
                        self.graph
                            .insert(TripleRef::new(member.as_ref(), SH_CLASS, class.as_ref()));
                        member
                    })
                    .collect::<Vec<_>>();
                let head = self.add_list(&members);
                self.graph.insert(TripleRef::new(anchor, OR, head.as_ref()));
            }
        }
    }

    /// Writes an RDF list of the given members and returns its head.
    fn add_list(&mut self, members: &[BlankNode]) -> NamedOrBlankNode {
        let mut head: NamedOrBlankNode = NIL.into_owned().into();
        for member in members.iter().rev() {
            let cell = self.blank();
            self.graph
                .insert(TripleRef::new(cell.as_ref(), FIRST, member.as_ref()));
            self.graph
                .insert(TripleRef::new(cell.as_ref(), REST, head.as_ref()));
            head = cell.into();
        }
        head
    }

    /// Adds the node shape of one class with its property constraints.
    pub fn add_node_shape(&mut self, class: NamedNodeRef) -> Result<()> {
        let ontology = self.ontology;
        let shape = self.shape_iri(class);
        debug!("Adding shape {} for {}", shape, class);
        self.graph
            .insert(TripleRef::new(shape.as_ref(), TYPE, NODE_SHAPE));
        self.graph
            .insert(TripleRef::new(shape.as_ref(), DEFINED_BY, ontology.identifier()));
        self.graph
            .insert(TripleRef::new(shape.as_ref(), TARGET_CLASS, class));

        let mut anchors: HashMap<NamedNode, BlankNode> = HashMap::new();
        for property in ontology.properties(Some(class), None)? {
            let range = ontology.classes(None, Some(property.as_ref()))?;
            if range.is_empty() {
                continue;
            }
            let anchor = self.add_property_anchor(shape.as_ref(), property.as_ref());
            self.add_class_constraint(anchor.as_ref().into(), &range);
            anchors.insert(property, anchor);
        }

        for restriction in ontology.restrictions(class)? {
            let anchor = match anchors.get(&restriction.on_property) {
                Some(anchor) => anchor.clone(),
                None => {
                    let anchor =
                        self.add_property_anchor(shape.as_ref(), restriction.on_property.as_ref());
                    anchors.insert(restriction.on_property.clone(), anchor.clone());
                    anchor
                }
            };
            self.add_class_constraint(anchor.as_ref().into(), &restriction.on_class);
            if let Some(min) = restriction.min_cardinality {
                let min = integer_literal(min);
                self.graph
                    .insert(TripleRef::new(anchor.as_ref(), MIN_COUNT, min.as_ref()));
            }
            if let Some(max) = restriction.max_cardinality {
                let max = integer_literal(max);
                self.graph
                    .insert(TripleRef::new(anchor.as_ref(), MAX_COUNT, max.as_ref()));
            }
        }
        Ok(())
    }

    pub fn finish(self) -> ShapeGraph {
        let mut prefixes = vec![(
            String::new(),
            self.config.shape_namespace.as_str().to_string(),
        )];
        if let Some(prefix) = &self.config.ontology_prefix {
            prefixes.push((prefix.clone(), self.ontology.identifier().as_str().to_string()));
        }
        prefixes.extend(
            PREFIXES
                .iter()
                .map(|(prefix, namespace)| (prefix.to_string(), namespace.to_string())),
        );
        ShapeGraph {
            identifier: self.config.shape_namespace.clone(),
            graph: self.graph,
            prefixes,
        }
    }
}

fn date_literal(date: NaiveDate) -> Literal {
    Literal::new_typed_literal(date.format("%Y-%m-%d").to_string(), XSD_DATE)
}

fn integer_literal(value: u64) -> Literal {
    Literal::new_typed_literal(value.to_string(), XSD_INTEGER)
}
