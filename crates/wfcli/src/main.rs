// crates/wfcli/src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use petgraph::dot::Dot;
use petgraph::graph::{Graph, NodeIndex};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use wfactivities::{ActivityDocument, PortDocument, WorkflowDocument};
use wfbuild::{flatten, ActivityGraph, ActivityTypeRegistry, BuilderServices, WorkflowBuilderFactory};
use wfcore::{Variable, Workflow};

#[derive(Parser)]
#[command(name = "wf")]
#[command(about = "Workflow graph builder CLI", long_about = None)]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a workflow definition and print its identity graph
    Inspect {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Build a workflow definition and write a JSON summary
    Build {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Output file path; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the identity graph as Graphviz DOT
    Graph {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List activity types, either the built-in ones or those a workflow uses
    Types {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Create a new example workflow definition
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { file } => inspect_workflow(&file).await?,
        Commands::Build { file, output } => build_workflow(&file, output).await?,
        Commands::Graph { file } => render_graph(&file).await?,
        Commands::Types { file } => list_types(file).await?,
        Commands::Init { output } => create_example_workflow(output)?,
    }

    Ok(())
}

/// Token cancelled on ctrl-c, plus the watcher task to abort once the build
/// is over.
fn cancel_on_ctrl_c() -> (CancellationToken, JoinHandle<()>) {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling build");
            token.cancel();
        }
    });
    (cancel, watcher)
}

async fn load_and_build(file: &Path, registry: &ActivityTypeRegistry) -> Result<Workflow> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let document = WorkflowDocument::from_json(&json)
        .with_context(|| format!("{} is not a valid workflow document", file.display()))?;

    let factory = WorkflowBuilderFactory::new(BuilderServices::new(Arc::new(registry.clone())));
    let (cancel, watcher) = cancel_on_ctrl_c();

    let result = factory.create().build_from_definition(&document, &cancel).await;
    watcher.abort();

    let workflow = result.with_context(|| format!("failed to build {}", file.display()))?;
    Ok(workflow)
}

/// Flatten the built tree again; ids on the nodes are now the final ones.
fn identity_graph(workflow: &Workflow) -> Result<ActivityGraph> {
    Ok(flatten(workflow.root())?)
}

async fn inspect_workflow(file: &Path) -> Result<()> {
    println!("🔍 Building workflow: {}", file.display());

    let registry = ActivityTypeRegistry::new();
    let workflow = load_and_build(file, &registry).await?;
    let graph = identity_graph(&workflow)?;

    let identity = workflow.identity();
    println!("📋 Workflow: {}", workflow.metadata().name.as_deref().unwrap_or("(unnamed)"));
    println!("   Definition: {} (version {})", identity.definition_id, identity.version);
    println!("   Id: {}", identity.id);
    println!("   Activities: {}", graph.len());
    println!();

    let width = graph
        .nodes()
        .iter()
        .map(|node| node.path.to_string().len())
        .max()
        .unwrap_or(0);
    for node in graph.nodes() {
        let activity_type = format!("{}{}", "  ".repeat(node.depth()), node.activity_type);
        println!(
            "  {:<width$}  {:<36}  {}",
            node.path.to_string(),
            activity_type,
            node.explicit_id.as_deref().unwrap_or("-"),
            width = width
        );
    }

    print_variables("Workflow variables", workflow.variables());
    if let Some(result) = workflow.result_variable() {
        println!();
        println!("📤 Result variable: {}", result.name.as_deref().unwrap_or("-"));
    }

    Ok(())
}

fn print_variables(title: &str, variables: &[Variable]) {
    if variables.is_empty() {
        return;
    }
    println!();
    println!("📦 {}:", title);
    for variable in variables {
        match &variable.type_name {
            Some(type_name) => println!("   {}: {}", variable.name.as_deref().unwrap_or("-"), type_name),
            None => println!("   {}", variable.name.as_deref().unwrap_or("-")),
        }
    }
}

async fn build_workflow(file: &Path, output: Option<PathBuf>) -> Result<()> {
    let registry = ActivityTypeRegistry::new();
    let workflow = load_and_build(file, &registry).await?;
    let graph = identity_graph(&workflow)?;

    let activities: Vec<serde_json::Value> = graph
        .nodes()
        .iter()
        .map(|node| {
            serde_json::json!({
                "id": node.explicit_id,
                "path": node.path.to_string(),
                "type": node.activity_type,
            })
        })
        .collect();

    let summary = serde_json::json!({
        "identity": workflow.identity(),
        "publication": workflow.publication(),
        "metadata": workflow.metadata(),
        "options": workflow.options(),
        "variables": workflow.variables(),
        "inputs": workflow.inputs(),
        "outputs": workflow.outputs(),
        "outcomes": workflow.outcomes(),
        "custom_properties": workflow.custom_properties(),
        "result_variable": workflow.result_variable(),
        "activities": activities,
    });
    let json = serde_json::to_string_pretty(&summary)?;

    match output {
        Some(output) => {
            std::fs::write(&output, json)?;
            println!("✨ Built {} activities into: {}", graph.len(), output.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

async fn render_graph(file: &Path) -> Result<()> {
    let registry = ActivityTypeRegistry::new();
    let workflow = load_and_build(file, &registry).await?;
    let activities = identity_graph(&workflow)?;

    let mut graph: Graph<String, String> = Graph::new();
    let mut indices: Vec<NodeIndex> = Vec::with_capacity(activities.len());
    for node in activities.nodes() {
        let label = format!(
            "{}\n{}",
            node.activity_type,
            node.explicit_id.as_deref().unwrap_or("-")
        );
        let index = graph.add_node(label);
        if let (Some(parent), Some(segment)) = (node.parent, &node.segment) {
            graph.add_edge(indices[parent], index, segment.to_string());
        }
        indices.push(index);
    }

    println!("{}", Dot::new(&graph));

    Ok(())
}

async fn list_types(file: Option<PathBuf>) -> Result<()> {
    let registry = ActivityTypeRegistry::new();

    match file {
        Some(file) => {
            load_and_build(&file, &registry).await?;
            println!("📦 Activity types used by {}:", file.display());
        }
        None => {
            wfactivities::register_all(&registry).await?;
            println!("📦 Built-in activity types:");
        }
    }
    println!();

    for type_name in registry.list_types().await {
        if let Some(descriptor) = registry.get(&type_name).await {
            println!("  • {} ({})", type_name, descriptor.category);
            if !descriptor.description.is_empty() {
                println!("    {}", descriptor.description);
            }
            for port in &descriptor.ports {
                println!("    ↳ {} [{}]", port.name, port.kind.label());
            }
        } else {
            println!("  • {}", type_name);
        }
    }

    Ok(())
}

fn create_example_workflow(output: PathBuf) -> Result<()> {
    let root = ActivityDocument::Sequence {
        id: None,
        variables: vec![Variable::named("Attempts").with_type("int").with_value(0)],
        activities: vec![
            ActivityDocument::WriteLine {
                id: None,
                text: "Starting".to_string(),
            },
            ActivityDocument::While {
                id: None,
                condition: "Attempts < 3".to_string(),
                body: Some(Box::new(ActivityDocument::Sequence {
                    id: None,
                    variables: vec![Variable::new()],
                    activities: vec![
                        ActivityDocument::SetVariable {
                            id: None,
                            variable: "Attempts".to_string(),
                            value: serde_json::json!("Attempts + 1"),
                        },
                        ActivityDocument::If {
                            id: Some("check-done".to_string()),
                            condition: "Done".to_string(),
                            then: Some(Box::new(ActivityDocument::Break { id: None })),
                            otherwise: None,
                        },
                    ],
                })),
            },
            ActivityDocument::Custom {
                id: None,
                activity_type: "example.notify".to_string(),
                category: Some("example".to_string()),
                variables: Vec::new(),
                ports: vec![PortDocument::List {
                    name: "Channels".to_string(),
                    children: vec![Some(ActivityDocument::WriteLine {
                        id: None,
                        text: "Finished".to_string(),
                    })],
                }],
                properties: serde_json::Map::new(),
            },
        ],
    };

    let document = WorkflowDocument {
        definition_id: Some("example".to_string()),
        name: Some("Example Retry Loop".to_string()),
        description: Some("Retries until done, then notifies".to_string()),
        outcomes: vec!["Done".to_string()],
        result: Some(Variable::new().with_type("bool")),
        root: Some(root),
        ..WorkflowDocument::default()
    };

    std::fs::write(&output, document.to_json_pretty()?)?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Inspect it with:");
    println!("  wf inspect --file {}", output.display());

    Ok(())
}
