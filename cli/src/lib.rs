use anyhow::{Error, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::info;
use ontoshacl::config::{ShaclConfig, ShaclConfigBuilder};
use ontoshacl::ontology::{OntologyIndex, OntologyLocation};
use ontoshacl::util::format_from_name;
use ontoshacl::ShapeGraph;
use oxigraph::model::NamedNode;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ontoshacl")]
#[command(about = "Generate SHACL shapes from an OWL ontology")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
}

#[derive(Debug, Args)]
struct OntologyArgs {
    /// File path or http(s) URL of the ontology
    ontology: String,
    /// Namespace of the ontology; only classes and properties inside it are considered
    #[clap(long, short)]
    namespace: String,
}

impl OntologyArgs {
    fn load(&self) -> Result<OntologyIndex> {
        let location: OntologyLocation = self.ontology.parse()?;
        let identifier = NamedNode::new(self.namespace.as_str())?;
        Ok(OntologyIndex::from_location(&location, identifier)?)
    }
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[command(flatten)]
    ontology: OntologyArgs,
    /// JSON file with the shape graph configuration; other flags override its values
    #[clap(long, short)]
    config: Option<PathBuf>,
    /// Namespace of the generated shapes
    #[clap(long)]
    shape_namespace: Option<String>,
    /// owl:versionIRI of the generated shape graph
    #[clap(long)]
    version_iri: Option<String>,
    /// IRI of the creator of the shape graph
    #[clap(long)]
    creator: Option<String>,
    /// Source revision recorded in owl:versionInfo
    #[clap(long)]
    revision: Option<String>,
    /// Creation date (YYYY-MM-DD), defaults to the modification date
    #[clap(long)]
    date_created: Option<NaiveDate>,
    /// Modification date (YYYY-MM-DD), defaults to today
    #[clap(long)]
    date_modified: Option<NaiveDate>,
    /// Name of the shape graph
    #[clap(long)]
    name: Option<String>,
    /// Description of the shape graph
    #[clap(long)]
    description: Option<String>,
    /// IRI of the publisher of the shape graph
    #[clap(long)]
    publisher: Option<String>,
    /// Prefix to bind to the ontology namespace in the output
    #[clap(long)]
    prefix: Option<String>,
    /// Output format: turtle, ntriples or rdfxml
    #[clap(long, short, default_value = "turtle")]
    format: String,
    /// The file to write the shapes to, defaults to stdout
    #[clap(long, short)]
    output: Option<PathBuf>,
    /// Write the effective configuration to this file
    #[clap(long)]
    save_config: Option<PathBuf>,
}

impl GenerateArgs {
    /// Applies the flags given on the command line on top of `builder`.
    fn apply_overrides(&self, mut builder: ShaclConfigBuilder) -> Result<ShaclConfigBuilder> {
        if let Some(ns) = &self.shape_namespace {
            builder = builder.shape_namespace(NamedNode::new(ns.as_str())?);
        }
        if let Some(iri) = &self.version_iri {
            builder = builder.version_iri(NamedNode::new(iri.as_str())?);
        }
        if let Some(creator) = &self.creator {
            builder = builder.creator(NamedNode::new(creator.as_str())?);
        }
        if let Some(revision) = &self.revision {
            builder = builder.revision(revision.as_str());
        }
        if let Some(date) = self.date_created {
            builder = builder.date_created(date);
        }
        if let Some(date) = self.date_modified {
            builder = builder.date_modified(date);
        }
        if let Some(name) = &self.name {
            builder = builder.name(name.as_str());
        }
        if let Some(description) = &self.description {
            builder = builder.description(description.as_str());
        }
        if let Some(publisher) = &self.publisher {
            builder = builder.publisher(NamedNode::new(publisher.as_str())?);
        }
        if let Some(prefix) = &self.prefix {
            builder = builder.ontology_prefix(prefix.as_str());
        }
        Ok(builder)
    }

    /// The configuration file (if any) with the flags applied, validated as a whole.
    fn config(&self) -> Result<ShaclConfig> {
        let builder = match &self.config {
            Some(path) => ShaclConfig::from_file(path)?.into_builder(),
            None => ShaclConfig::builder(),
        };
        Ok(self.apply_overrides(builder)?.build()?)
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate the SHACL shape graph of an ontology
    Generate(GenerateArgs),
    /// List the classes declared in an ontology
    Classes {
        #[command(flatten)]
        ontology: OntologyArgs,
    },
    /// List the qualified restrictions declared on a class
    Restrictions {
        #[command(flatten)]
        ontology: OntologyArgs,
        /// The class (IRI) to list restrictions for
        class: String,
    },
    /// Prints the version of the ontoshacl binary
    Version,
}

pub fn run() -> Result<()> {
    ontoshacl::init_logging();
    let cmd = Cli::parse();
    execute(cmd)
}

pub fn run_from_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    ontoshacl::init_logging();
    let cmd = Cli::try_parse_from(args).map_err(Error::from)?;
    execute(cmd)
}

fn execute(cmd: Cli) -> Result<()> {
    // The RUST_LOG env var is set by `init_logging` if ONTOSHACL_LOG is present.
    // CLI flags for verbosity take precedence. If nothing is set, we default to "warn".
    if cmd.debug {
        std::env::set_var("RUST_LOG", "debug");
    } else if cmd.verbose {
        std::env::set_var("RUST_LOG", "info");
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    let _ = env_logger::try_init();

    match cmd.command {
        Commands::Generate(args) => {
            let config = args.config()?;
            if cmd.verbose || cmd.debug {
                config.print();
            }
            if let Some(path) = &args.save_config {
                config.save_to_file(path)?;
                info!("Saved configuration to {}", path.display());
            }
            let format = format_from_name(&args.format)
                .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}", args.format))?;
            let index = args.ontology.load()?;
            let shapes = ShapeGraph::generate(&index, &config)?;
            match &args.output {
                Some(path) => shapes.write_to_file(path, format)?,
                None => {
                    let stdout = std::io::stdout();
                    let mut writer = shapes.write(stdout.lock(), format)?;
                    writer.flush()?;
                }
            }
        }
        Commands::Classes { ontology } => {
            let index = ontology.load()?;
            for class in index.all_classes() {
                println!("{}", class.as_str());
            }
        }
        Commands::Restrictions { ontology, class } => {
            let index = ontology.load()?;
            let class = NamedNode::new(class)?;
            for restriction in index.restrictions(class.as_ref())? {
                println!("{}", restriction);
            }
        }
        Commands::Version => {
            println!("ontoshacl {}", env!("CARGO_PKG_VERSION"));
        }
    }
    Ok(())
}
