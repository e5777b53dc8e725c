use anyhow::Result;
use clap::Parser;
use console_rbac::ResourceAddress;
use console_rbac_inspect::{Command, InspectCli, Inspector, ReplayDispatcher};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> Result<()> {
    let cli = InspectCli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let inspector = Inspector::load(&cli).await?;

    match cli.command {
        Command::Request { view } => {
            println!("{}", inspector.request(&view)?);
        }
        Command::Dump { view, response } => {
            let dispatcher = ReplayDispatcher::load(&response).await?;
            print!("{}", inspector.dump(&view, dispatcher).await?);
        }
        Command::Check {
            view,
            response,
            address,
            privilege,
            name,
        } => {
            let address: ResourceAddress = address.parse()?;
            let privilege = privilege.with_name(name)?;
            let dispatcher = ReplayDispatcher::load(&response).await?;
            let decision = inspector
                .check(&view, dispatcher, &address, &privilege)
                .await?;
            println!("{privilege} on {address}: {decision}");
        }
    }

    Ok(())
}
