mod output;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use scp_core::context::OperationContext;
use scp_core::filter::FILTER_KEY;
use scp_core::provider::ProviderDescriptor;
use scp_core::resource::{Attributes, ResourceData, Value};
use scp_core::schema::{AttributeType, ResourceSchema};
use scp_provider::Meta;

#[derive(Parser)]
#[command(name = "scp")]
#[command(about = "Inspect Samsung Cloud Platform resources through the provider handlers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered resource types
    Resources,
    /// List registered data sources
    DataSources,
    /// Print the schema of a resource type or data source as JSON
    Schema {
        /// Resource type or data source key, e.g. scp_vpc
        key: String,
    },
    /// Read one resource and print its attributes
    Read {
        /// Resource type, e.g. scp_vpc
        key: String,

        /// Resource ID (composite IDs as parent:child)
        id: String,

        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Run a data source and print its result
    Query {
        /// Data source key, e.g. scp_vpcs
        key: String,

        /// Data source argument as key=value (repeatable)
        #[arg(long = "arg", value_name = "KEY=VALUE")]
        args: Vec<String>,

        /// Row filter as attribute=value1,value2 (repeatable)
        #[arg(long = "filter", value_name = "NAME=VALUES")]
        filters: Vec<String>,

        /// Treat filter values as regular expressions
        #[arg(long)]
        regex: bool,

        #[command(flatten)]
        provider: ProviderArgs,
    },
}

/// Provider block, from flags or the environment
#[derive(Args)]
struct ProviderArgs {
    #[arg(long, env = "SCP_ENDPOINT")]
    endpoint: Option<String>,

    #[arg(long, env = "SCP_ACCESS_KEY", hide_env_values = true)]
    access_key: String,

    #[arg(long, env = "SCP_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    #[arg(long, env = "SCP_PROJECT_ID")]
    project_id: String,

    #[arg(long, env = "SCP_REGION")]
    region: Option<String>,
}

impl ProviderArgs {
    fn into_attributes(self) -> Attributes {
        let mut config = Attributes::new();
        config.insert("access_key".to_string(), Value::String(self.access_key));
        config.insert("secret_key".to_string(), Value::String(self.secret_key));
        config.insert("project_id".to_string(), Value::String(self.project_id));
        if let Some(endpoint) = self.endpoint {
            config.insert("endpoint".to_string(), Value::String(endpoint));
        }
        if let Some(region) = self.region {
            config.insert("region".to_string(), Value::String(region));
        }
        config
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resources => run_list(Kind::Resources),
        Commands::DataSources => run_list(Kind::DataSources),
        Commands::Schema { key } => run_schema(&key),
        Commands::Read { key, id, provider } => run_read(&key, &id, provider).await,
        Commands::Query {
            key,
            args,
            filters,
            regex,
            provider,
        } => run_query(&key, &args, &filters, regex, provider).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_provider() -> Result<ProviderDescriptor<Meta>> {
    scp_provider::provider().context("failed to assemble provider")
}

enum Kind {
    Resources,
    DataSources,
}

fn run_list(kind: Kind) -> Result<()> {
    let provider = load_provider()?;
    let mut entries: Vec<(&String, &ResourceSchema)> = match kind {
        Kind::Resources => provider
            .resources
            .iter()
            .map(|(k, d)| (k, &d.schema))
            .collect(),
        Kind::DataSources => provider
            .data_sources
            .iter()
            .map(|(k, d)| (k, &d.schema))
            .collect(),
    };
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (key, schema) in entries {
        let description = schema.description.as_deref().unwrap_or_default();
        println!("{}  {}", key.cyan().bold(), description.dimmed());
    }
    Ok(())
}

fn run_schema(key: &str) -> Result<()> {
    let provider = load_provider()?;
    let schema = match (provider.resources.get(key), provider.data_sources.get(key)) {
        (Some(resource), _) => &resource.schema,
        (None, Some(data_source)) => &data_source.schema,
        (None, None) => bail!("no resource type or data source named '{}'", key),
    };
    println!("{}", serde_json::to_string_pretty(&schema.to_json())?);
    Ok(())
}

async fn run_read(key: &str, id: &str, args: ProviderArgs) -> Result<()> {
    let provider = load_provider()?;
    let descriptor = provider.resource(key)?;
    let meta = provider.configure(args.into_attributes()).await?;

    let mut rd = ResourceData::from_state(id, Attributes::new());
    descriptor
        .read(&OperationContext::background(), &mut rd, &meta)
        .await?;

    if rd.id().is_empty() {
        println!("{} {} {} no longer exists", "!".yellow().bold(), key, id);
        return Ok(());
    }
    let json = output::state_to_json(rd.id(), rd.state(), &descriptor.schema);
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn run_query(
    key: &str,
    args: &[String],
    filters: &[String],
    regex: bool,
    provider_args: ProviderArgs,
) -> Result<()> {
    let provider = load_provider()?;
    let descriptor = provider.data_source(key)?;

    let mut config = Attributes::new();
    for arg in args {
        let (name, raw) = split_pair(arg)?;
        let value = parse_argument(&descriptor.schema, name, raw)?;
        config.insert(name.to_string(), value);
    }
    if !filters.is_empty() {
        let blocks = filters
            .iter()
            .map(|f| filter_block(f, regex))
            .collect::<Result<Vec<_>>>()?;
        config.insert(FILTER_KEY.to_string(), Value::List(blocks));
    }

    let meta = provider.configure(provider_args.into_attributes()).await?;
    let mut rd = ResourceData::new(config);
    descriptor
        .read(&OperationContext::background(), &mut rd, &meta)
        .await?;

    let json = output::state_to_json(rd.id(), rd.state(), &descriptor.schema);
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    pair.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{}'", pair))
}

/// Convert a command-line string to the attribute's declared type
fn parse_argument(schema: &ResourceSchema, name: &str, raw: &str) -> Result<Value> {
    let attr = schema
        .attributes
        .get(name)
        .ok_or_else(|| anyhow!("'{}' has no argument '{}'", schema.resource_type, name))?;
    convert(&attr.attr_type, raw).with_context(|| format!("invalid value for '{}'", name))
}

fn convert(attr_type: &AttributeType, raw: &str) -> Result<Value> {
    Ok(match attr_type {
        AttributeType::Int => Value::Int(raw.parse()?),
        AttributeType::Float => Value::Float(raw.parse()?),
        AttributeType::Bool => Value::Bool(raw.parse()?),
        AttributeType::Custom { base, .. } => convert(base, raw)?,
        AttributeType::List(inner) => Value::List(
            raw.split(',')
                .map(|item| convert(inner, item.trim()))
                .collect::<Result<_>>()?,
        ),
        _ => Value::String(raw.to_string()),
    })
}

fn filter_block(flag: &str, regex: bool) -> Result<Value> {
    let (name, values) = split_pair(flag)?;
    let mut block = Attributes::new();
    block.insert("name".to_string(), Value::from(name));
    block.insert(
        "values".to_string(),
        Value::List(values.split(',').map(|v| Value::from(v.trim())).collect()),
    );
    block.insert("use_regex".to_string(), Value::Bool(regex));
    Ok(Value::Map(block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scp_core::schema::{AttributeSchema, types};

    #[test]
    fn arguments_follow_schema_types() {
        let schema = ResourceSchema::new("scp_test")
            .attribute(AttributeSchema::new("size", types::positive_int()))
            .attribute(AttributeSchema::new("ids", types::string_list()))
            .attribute(AttributeSchema::new("name", AttributeType::String));

        assert_eq!(parse_argument(&schema, "size", "50").unwrap(), Value::Int(50));
        assert_eq!(
            parse_argument(&schema, "ids", "a, b").unwrap(),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(parse_argument(&schema, "name", "42").unwrap(), Value::from("42"));
        assert!(parse_argument(&schema, "size", "many").is_err());
        assert!(parse_argument(&schema, "missing", "x").is_err());
    }

    #[test]
    fn filter_flag_becomes_block() {
        let block = filter_block("vpc_state=ACTIVE,EDITING", true).unwrap();
        let map = block.as_map().unwrap();
        assert_eq!(map["name"], Value::from("vpc_state"));
        assert_eq!(map["values"].as_list().unwrap().len(), 2);
        assert_eq!(map["use_regex"], Value::Bool(true));
    }

    #[test]
    fn pairs_need_a_key() {
        assert_eq!(split_pair("a=b=c").unwrap(), ("a", "b=c"));
        assert!(split_pair("=x").is_err());
        assert!(split_pair("novalue").is_err());
    }

    #[test]
    fn cli_parses_query() {
        let cli = Cli::try_parse_from([
            "scp",
            "query",
            "scp_vpcs",
            "--arg",
            "name=netA",
            "--filter",
            "vpc_state=ACTIVE",
            "--access-key",
            "ak",
            "--secret-key",
            "sk",
            "--project-id",
            "P-1",
        ])
        .unwrap();
        match cli.command {
            Commands::Query { key, args, .. } => {
                assert_eq!(key, "scp_vpcs");
                assert_eq!(args, vec!["name=netA".to_string()]);
            }
            _ => panic!("expected query"),
        }
    }
}
