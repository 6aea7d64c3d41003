//! Defines the configuration used to generate a shape graph: where the shapes live, how the
//! generated graph describes itself, and how it is serialized.

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use derive_builder::Builder;
use oxigraph::model::NamedNode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{serde_as, DeserializeAs, SerializeAs};
use std::io::{BufReader, Write};
use std::path::Path;

fn namednode_ser<S>(namednode: &NamedNode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(namednode.as_str())
}

fn namednode_de<'de, D>(deserializer: D) -> Result<NamedNode, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NamedNode::new(s).map_err(serde::de::Error::custom)
}

struct Iri;

impl SerializeAs<NamedNode> for Iri {
    fn serialize_as<S>(value: &NamedNode, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        namednode_ser(value, serializer)
    }
}

impl<'de> DeserializeAs<'de, NamedNode> for Iri {
    fn deserialize_as<D>(deserializer: D) -> Result<NamedNode, D::Error>
    where
        D: Deserializer<'de>,
    {
        namednode_de(deserializer)
    }
}

fn default_revision() -> String {
    "unknown".to_string()
}

#[serde_as]
#[derive(Builder, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[builder(pattern = "owned", build_fn(validate = "Self::validate"))]
pub struct ShaclConfig {
    /// Namespace of the generated shapes; also the identifier of the shape graph.
    #[builder(setter(into))]
    #[serde(serialize_with = "namednode_ser", deserialize_with = "namednode_de")]
    pub shape_namespace: NamedNode,
    #[builder(setter(into))]
    #[serde(serialize_with = "namednode_ser", deserialize_with = "namednode_de")]
    pub version_iri: NamedNode,
    #[builder(setter(into))]
    #[serde(serialize_with = "namednode_ser", deserialize_with = "namednode_de")]
    pub creator: NamedNode,
    /// Source revision the generator was built from; embedded in owl:versionInfo.
    #[builder(setter(into), default = "default_revision()")]
    #[serde(default = "default_revision")]
    pub revision: String,
    #[builder(setter(into, strip_option), default)]
    pub date_created: Option<NaiveDate>,
    /// Defaults to the current date at generation time.
    #[builder(setter(into, strip_option), default)]
    pub date_modified: Option<NaiveDate>,
    #[builder(setter(into, strip_option), default)]
    pub name: Option<String>,
    #[builder(setter(into, strip_option), default)]
    pub description: Option<String>,
    #[builder(setter(into, strip_option), default)]
    #[serde_as(as = "Option<Iri>")]
    pub publisher: Option<NamedNode>,
    /// Prefix bound to the source ontology namespace when serializing.
    #[builder(setter(into, strip_option), default)]
    pub ontology_prefix: Option<String>,
}

/// The date generation runs on, used when no modification date is configured.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn check(
    date_created: Option<NaiveDate>,
    date_modified: Option<NaiveDate>,
    ontology_prefix: Option<&str>,
) -> Result<(), String> {
    if let Some(created) = date_created {
        let modified = date_modified.unwrap_or_else(today);
        if created > modified {
            return Err(format!(
                "date_created ({}) is later than date_modified ({})",
                created, modified
            ));
        }
    }
    if let Some(prefix) = ontology_prefix {
        if prefix.is_empty() || prefix.contains(':') {
            return Err(format!("invalid ontology prefix '{}'", prefix));
        }
    }
    Ok(())
}

impl ShaclConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        check(
            self.date_created.flatten(),
            self.date_modified.flatten(),
            self.ontology_prefix.as_ref().and_then(|p| p.as_deref()),
        )
    }
}

impl ShaclConfig {
    pub fn builder() -> ShaclConfigBuilder {
        ShaclConfigBuilder::default()
    }

    /// A builder pre-filled with this configuration, for overriding single fields.
    pub fn into_builder(self) -> ShaclConfigBuilder {
        let mut builder = ShaclConfig::builder()
            .shape_namespace(self.shape_namespace)
            .version_iri(self.version_iri)
            .creator(self.creator)
            .revision(self.revision);
        if let Some(date) = self.date_created {
            builder = builder.date_created(date);
        }
        if let Some(date) = self.date_modified {
            builder = builder.date_modified(date);
        }
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        if let Some(description) = self.description {
            builder = builder.description(description);
        }
        if let Some(publisher) = self.publisher {
            builder = builder.publisher(publisher);
        }
        if let Some(prefix) = self.ontology_prefix {
            builder = builder.ontology_prefix(prefix);
        }
        builder
    }

    /// Checks the constraints the builder enforces, for configurations built any other way.
    pub fn validate(&self) -> Result<()> {
        check(
            self.date_created,
            self.date_modified,
            self.ontology_prefix.as_deref(),
        )
        .map_err(|e| anyhow!("invalid configuration: {}", e))
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        let config: ShaclConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Prints out the current config in a readable way for command line output.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  Shape Namespace: {}", self.shape_namespace.as_str());
        println!("  Version IRI: {}", self.version_iri.as_str());
        println!("  Creator: {}", self.creator.as_str());
        println!("  Revision: {}", self.revision);
        if let Some(date) = self.date_created {
            println!("  Date Created: {}", date);
        }
        if let Some(date) = self.date_modified {
            println!("  Date Modified: {}", date);
        }
        if let Some(name) = &self.name {
            println!("  Name: {}", name);
        }
        if let Some(description) = &self.description {
            println!("  Description: {}", description);
        }
        if let Some(publisher) = &self.publisher {
            println!("  Publisher: {}", publisher.as_str());
        }
        if let Some(prefix) = &self.ontology_prefix {
            println!("  Ontology Prefix: {}", prefix);
        }
    }
}
