use clap::Parser;
use classify::{Cli, classify_all, init_logging};
use dispatch::{Dispatcher, ModelName};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging();

    if cli.list {
        for name in ModelName::ALL {
            println!("{name}");
        }
        return Ok(());
    }

    let prompt = cli.read_prompt().await?;
    let dispatcher = Dispatcher::from_config(cli.config())?;
    let reports = classify_all(&dispatcher, &cli.model_names(), &prompt, !cli.no_rules).await;

    for report in &reports {
        if cli.json {
            println!("{}", serde_json::to_string(report)?);
        } else {
            println!("{}\n", report.to_text());
        }
    }

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} submissions failed", reports.len());
    }
    Ok(())
}
