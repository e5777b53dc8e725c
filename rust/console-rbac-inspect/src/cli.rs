use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use console_rbac::{NavigationContext, Privilege};

/// Command line of `rbac-inspect`.
#[derive(Debug, Parser)]
#[command(name = "rbac-inspect")]
#[command(bin_name = "rbac-inspect")]
#[command(about = "Inspect console access-control resolution offline", long_about = None)]
pub struct InspectCli {
    /// JSON file mapping view ids to the resources they need
    #[arg(short, long)]
    pub registry: PathBuf,

    /// JSON file with description request settings
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Navigation selection, `key=value` or `key=type=name`
    #[arg(short, long = "select")]
    pub selections: Vec<Selection>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of `rbac-inspect`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the composite request a view would send
    Request {
        /// The view id
        view: String,
    },

    /// Build a view's context from a recorded response and print it
    Dump {
        /// The view id
        view: String,

        /// Recorded composite response
        #[arg(long)]
        response: PathBuf,
    },

    /// Answer one authorization query against a recorded response
    Check {
        /// The view id
        view: String,

        /// Recorded composite response
        #[arg(long)]
        response: PathBuf,

        /// Resource address, e.g. `subsystem=logging/logger=*`
        address: String,

        /// What to check
        #[arg(value_enum)]
        privilege: PrivilegeKind,

        /// Attribute or operation name
        name: Option<String>,
    },
}

/// Privilege kinds accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrivilegeKind {
    /// The resource is visible
    Address,
    /// The resource can be read
    Read,
    /// The resource can be written
    Write,
    /// The named attribute can be read
    ReadAttribute,
    /// The named attribute can be written
    WriteAttribute,
    /// The named operation can be executed
    Execute,
}

impl PrivilegeKind {
    /// Combine with the attribute or operation name, where one is needed.
    pub fn with_name(self, name: Option<String>) -> anyhow::Result<Privilege> {
        let named = |name: Option<String>| {
            name.ok_or_else(|| anyhow::anyhow!("'{self:?}' needs an attribute or operation name"))
        };

        Ok(match self {
            Self::Address => Privilege::Address,
            Self::Read => Privilege::Read,
            Self::Write => Privilege::Write,
            Self::ReadAttribute => Privilege::ReadAttribute(named(name)?),
            Self::WriteAttribute => Privilege::WriteAttribute(named(name)?),
            Self::Execute => Privilege::Execute(named(name)?),
        })
    }
}

/// One `--select` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// `selected.server=server-one`
    Value {
        /// Placeholder name.
        key: String,
        /// Instance name it resolves to.
        value: String,
    },
    /// `selected.profile=profile=full`
    Tuple {
        /// Placeholder name.
        key: String,
        /// Segment type.
        resource_type: String,
        /// Segment instance name.
        name: String,
    },
}

impl Selection {
    /// Record the selection.
    pub fn apply(&self, navigation: &NavigationContext) {
        match self {
            Self::Value { key, value } => navigation.select(key.as_str(), value.as_str()),
            Self::Tuple {
                key,
                resource_type,
                name,
            } => navigation.select_tuple(key.as_str(), resource_type.as_str(), name.as_str()),
        }
    }
}

impl FromStr for Selection {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (key, rest) = input
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{input}'"))?;
        if key.is_empty() || rest.is_empty() {
            return Err(format!("expected key=value, got '{input}'"));
        }

        Ok(match rest.split_once('=') {
            Some((resource_type, name)) if !resource_type.is_empty() && !name.is_empty() => {
                Self::Tuple {
                    key: key.to_string(),
                    resource_type: resource_type.to_string(),
                    name: name.to_string(),
                }
            }
            Some(_) => return Err(format!("expected key=type=name, got '{input}'")),
            None => Self::Value {
                key: key.to_string(),
                value: rest.to_string(),
            },
        })
    }
}
