use anyhow::Result;
use clap::Parser;
use docqa_cli::{App, Cli, Settings, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    telemetry::init(settings.log_json);

    let app = App::open(settings).await?;
    let output = app.run(cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
