use anyhow::Result;

use std::io::{BufReader, Read};
use std::path::Path;

use reqwest::header::{ACCEPT, CONTENT_TYPE};

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::graph::Graph as OxigraphGraph;
use oxigraph::model::Triple;

use log::debug;

/// Guesses the RDF format of a file from its extension. Unknown extensions yield `None`.
pub fn format_from_extension(file: &Path) -> Option<RdfFormat> {
    let ext = file.extension().and_then(|ext| ext.to_str())?;
    match ext {
        "ttl" => Some(RdfFormat::Turtle),
        "xml" | "rdf" | "owl" => Some(RdfFormat::RdfXml),
        "n3" => Some(RdfFormat::Turtle),
        "nt" => Some(RdfFormat::NTriples),
        _ => None,
    }
}

/// Maps a short format name as given on the command line to an RdfFormat.
pub fn format_from_name(name: &str) -> Option<RdfFormat> {
    match name.to_ascii_lowercase().as_str() {
        "turtle" | "ttl" => Some(RdfFormat::Turtle),
        "ntriples" | "nt" => Some(RdfFormat::NTriples),
        "rdfxml" | "xml" => Some(RdfFormat::RdfXml),
        _ => None,
    }
}

/// Parses every triple from the reader into a new graph.
pub fn parse_graph<R: Read>(content: R, format: RdfFormat) -> Result<OxigraphGraph> {
    let parser = RdfParser::from_format(format).for_reader(content);
    let mut graph = OxigraphGraph::new();
    for quad in parser {
        let quad = quad?;
        let triple = Triple::new(quad.subject, quad.predicate, quad.object);
        graph.insert(&triple);
    }
    Ok(graph)
}

pub fn read_file(file: &Path) -> Result<OxigraphGraph> {
    debug!("Reading file: {}", file.display());
    let format = format_from_extension(file).unwrap_or(RdfFormat::Turtle);
    let content = BufReader::new(std::fs::File::open(file)?);
    parse_graph(content, format)
}

pub fn read_url(url: &str) -> Result<OxigraphGraph> {
    debug!("Reading url: {}", url);

    let client = reqwest::blocking::Client::new();
    let resp = client
        .get(url)
        .header(ACCEPT, "text/turtle, application/rdf+xml;q=0.9, application/n-triples;q=0.8")
        .send()?;
    if !resp.status().is_success() {
        return Err(anyhow::anyhow!(
            "Failed to fetch ontology from {} ({})",
            url,
            resp.status()
        ));
    }
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_string());
    let format = match content_type.as_deref() {
        Some("text/turtle") | Some("application/x-turtle") | Some("text/n3") => RdfFormat::Turtle,
        Some("application/rdf+xml") => RdfFormat::RdfXml,
        Some("application/n-triples") => RdfFormat::NTriples,
        other => {
            debug!("Unknown content type {:?}, assuming turtle", other);
            RdfFormat::Turtle
        }
    };

    let body = resp.bytes()?;
    parse_graph(&body[..], format)
}
