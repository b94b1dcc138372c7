//! shardlog CLI
//!
//! Command-line interface for a shardlog database directory.

use clap::{Parser, Subcommand};
use shardlog::{AttributeMap, AttributeValue, Config, Database, ShardError};
use tracing_subscriber::{fmt, EnvFilter};

/// shardlog CLI
#[derive(Parser, Debug)]
#[command(name = "shardlog-cli")]
#[command(about = "CLI for the shardlog document store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./shardlog_data")]
    data_dir: String,

    /// Partition count used when creating a new database
    #[arg(short, long, default_value = "10")]
    partitions: u32,

    /// Attribute that addresses items
    #[arg(short = 'k', long, default_value = "pk")]
    partition_key: String,

    /// Max store bytes per segment
    #[arg(long, default_value = "1024")]
    max_store_bytes: u64,

    /// Max index bytes per segment
    #[arg(long, default_value = "1024")]
    max_index_bytes: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store an item
    Put {
        /// Attributes as name=value or name:TYPE=value
        /// (TYPE: s, n, b, bool, null, ss, ns)
        #[arg(required = true)]
        attributes: Vec<String>,
    },

    /// Get an item by partition key
    Get {
        /// The partition-key value
        key: String,
    },

    /// Delete an item by partition key
    Delete {
        /// The partition-key value
        key: String,
    },

    /// Show partition and segment counts
    Stats,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,shardlog=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> shardlog::Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .partition_count(args.partitions)
        .partition_key(&args.partition_key)
        .max_store_bytes(args.max_store_bytes)
        .max_index_bytes(args.max_index_bytes)
        .build();

    let db = Database::open(config)?;

    match args.command {
        Commands::Put { attributes } => {
            let mut item = AttributeMap::new();
            for attr in &attributes {
                let (name, value) = parse_attribute(attr)?;
                item.insert(name, value);
            }
            db.put_item(item)?;
            println!("OK");
        }
        Commands::Get { key } => match db.get_item(&key_map(&args.partition_key, key))? {
            Some(item) => {
                for (name, value) in &item {
                    println!("{} ({}) = {}", name, value.type_name(), value);
                }
            }
            None => println!("(not found)"),
        },
        Commands::Delete { key } => {
            db.delete_item(&key_map(&args.partition_key, key))?;
            println!("OK");
        }
        Commands::Stats => {
            println!("partitions: {}", db.partition_count());
            for partition in db.partitions() {
                println!(
                    "  {:>3}: {} segment(s), active #{}",
                    partition.id(),
                    partition.segment_count(),
                    partition.active_segment_id()
                );
            }
        }
    }

    db.close()
}

fn key_map(partition_key: &str, key: String) -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert(partition_key.to_string(), AttributeValue::String(key));
    map
}

/// Parse "name=value" (String) or "name:TYPE=value"
fn parse_attribute(input: &str) -> shardlog::Result<(String, AttributeValue)> {
    let (lhs, raw) = input
        .split_once('=')
        .ok_or_else(|| ShardError::Config(format!("expected name=value, got '{}'", input)))?;

    let (name, kind) = match lhs.split_once(':') {
        Some((name, kind)) => (name, kind),
        None => (lhs, "s"),
    };
    if name.is_empty() {
        return Err(ShardError::Config(format!("missing attribute name in '{}'", input)));
    }

    let list = || raw.split(',').map(str::to_string).collect::<Vec<_>>();
    let value = match kind.to_ascii_lowercase().as_str() {
        "s" => AttributeValue::String(raw.to_string()),
        "n" => {
            raw.parse::<f64>()
                .map_err(|_| ShardError::Config(format!("'{}' is not a number", raw)))?;
            AttributeValue::Number(raw.to_string())
        }
        "b" => AttributeValue::Bytes(raw.as_bytes().to_vec()),
        "bool" => match raw {
            "true" => AttributeValue::Bool(true),
            "false" => AttributeValue::Bool(false),
            _ => return Err(ShardError::Config(format!("'{}' is not a bool", raw))),
        },
        "null" => AttributeValue::Null,
        "ss" => AttributeValue::StringSet(list()),
        "ns" => AttributeValue::NumberSet(list()),
        other => return Err(ShardError::Config(format!("unknown attribute type '{}'", other))),
    };

    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_attribute_is_string() {
        let (name, value) = parse_attribute("name=Taro").unwrap();
        assert_eq!(name, "name");
        assert_eq!(value, AttributeValue::String("Taro".into()));
    }

    #[test]
    fn typed_attributes() {
        assert_eq!(parse_attribute("age:n=20").unwrap().1, AttributeValue::Number("20".into()));
        assert_eq!(parse_attribute("ok:bool=true").unwrap().1, AttributeValue::Bool(true));
        assert_eq!(parse_attribute("x:null=").unwrap().1, AttributeValue::Null);
        assert_eq!(
            parse_attribute("tags:ss=a,b").unwrap().1,
            AttributeValue::StringSet(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn value_may_contain_equals_and_colon() {
        let (name, value) = parse_attribute("pk=USER#1:a=b").unwrap();
        assert_eq!(name, "pk");
        assert_eq!(value, AttributeValue::String("USER#1:a=b".into()));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_attribute("novalue").is_err());
        assert!(parse_attribute("age:n=abc").is_err());
        assert!(parse_attribute("x:zz=1").is_err());
        assert!(parse_attribute("=v").is_err());
    }
}
