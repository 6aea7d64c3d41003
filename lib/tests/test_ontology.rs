use ontoshacl::ontology::{OntologyIndex, OntologyLocation};
use ontoshacl::ShaclError;
use oxigraph::model::NamedNode;
use std::path::Path;

const RICO: &str = "https://example.org/rico#";

fn rico() -> OntologyIndex {
    let location: OntologyLocation = "fixtures/rico.ttl".parse().unwrap();
    OntologyIndex::from_location(&location, NamedNode::new(RICO).unwrap()).unwrap()
}

fn iri(local: &str) -> NamedNode {
    NamedNode::new(format!("{}{}", RICO, local)).unwrap()
}

#[test]
fn test_classes_in_namespace() {
    let index = rico();
    let classes: Vec<String> = index
        .classes(None, None)
        .unwrap()
        .into_iter()
        .map(|c| c.into_string())
        .collect();
    assert_eq!(
        classes,
        vec![
            format!("{}Agent", RICO),
            format!("{}CorporateBody", RICO),
            format!("{}Instantiation", RICO),
            format!("{}Person", RICO),
            format!("{}Record", RICO),
            format!("{}RecordSet", RICO),
            format!("{}Thing", RICO),
        ]
    );
}

#[test]
fn test_range_classes() {
    let index = rico();
    let has_part = iri("hasPart");
    let range = index.classes(None, Some(has_part.as_ref())).unwrap();
    assert_eq!(range.len(), 2);
    assert!(range.contains(&iri("Record")));
    assert!(range.contains(&iri("RecordSet")));

    // ranges outside the ontology are dropped
    let subject = iri("hasOrHadSubject");
    assert!(index
        .classes(None, Some(subject.as_ref()))
        .unwrap()
        .is_empty());
}

#[test]
fn test_properties_with_domain() {
    let index = rico();
    let record = iri("Record");
    let properties = index.properties(Some(record.as_ref()), None).unwrap();
    assert_eq!(
        properties.into_iter().collect::<Vec<_>>(),
        vec![iri("hasDescription"), iri("hasInstantiation"), iri("hasPart")]
    );
}

#[test]
fn test_properties_with_range() {
    let index = rico();
    let record = iri("Record");
    let properties = index.properties(None, Some(record.as_ref())).unwrap();
    assert_eq!(
        properties.into_iter().collect::<Vec<_>>(),
        vec![iri("hasPart"), iri("isInstantiationOf")]
    );
}

#[test]
fn test_properties_of_unknown_class() {
    let index = rico();
    let external = NamedNode::new("http://other.example.org/vocab#External").unwrap();
    let result = index.properties(Some(external.as_ref()), None);
    assert!(matches!(result, Err(ShaclError::InvalidQuery(_))));
}

#[test]
fn test_restrictions_for_record() {
    let index = rico();
    let record = iri("Record");
    let restrictions = index.restrictions(record.as_ref()).unwrap();
    assert_eq!(restrictions.len(), 1);
    let restriction = &restrictions[0];
    assert_eq!(restriction.on_property, iri("hasInstantiation"));
    assert_eq!(restriction.on_class, vec![iri("Instantiation")]);
    assert_eq!(restriction.min_cardinality, Some(1));
    assert_eq!(restriction.max_cardinality, None);
}

#[test]
fn test_restrictions_with_union() {
    let index = rico();
    let agent = iri("Agent");
    let restrictions = index.restrictions(agent.as_ref()).unwrap();
    assert_eq!(restrictions.len(), 1);
    assert_eq!(
        restrictions[0].on_class,
        vec![iri("Person"), iri("CorporateBody")]
    );
}

#[test]
fn test_restrictions_missing_property() {
    let location = OntologyLocation::File(Path::new("fixtures/malformed.ttl").to_path_buf());
    let index = OntologyIndex::from_location(
        &location,
        NamedNode::new("https://example.org/broken#").unwrap(),
    )
    .unwrap();
    let record = NamedNode::new("https://example.org/broken#Record").unwrap();
    let result = index.restrictions(record.as_ref());
    assert!(matches!(result, Err(ShaclError::MalformedOntology(_))));
}

#[test]
fn test_missing_source() {
    let location: OntologyLocation = "fixtures/does-not-exist.ttl".parse().unwrap();
    let result = OntologyIndex::from_location(&location, NamedNode::new(RICO).unwrap());
    assert!(matches!(result, Err(ShaclError::SourceLoad { .. })));
}
