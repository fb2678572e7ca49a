//! Formats command - list the statement layouts the engine knows.

use clap::Args;
use console::style;

use statex_core::statement::formats::registry;

#[derive(Args)]
pub struct FormatsArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: FormatsArgs) -> anyhow::Result<()> {
    let formats = registry();

    if args.json {
        let listing: Vec<_> = formats
            .iter()
            .map(|f| {
                serde_json::json!({
                    "id": f.id,
                    "name": f.name,
                    "strategies": f.strategies().iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                    "summaries": f.summaries.iter().map(|s| s.name).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{}", style("Statement formats").bold());
    println!();

    for format in &formats {
        let strategies: Vec<_> = format.strategies().iter().map(|s| s.as_str()).collect();
        println!("  {} - {}", style(format.id).cyan(), format.name);
        println!("      strategies: {}", strategies.join(" → "));
        if !format.summaries.is_empty() {
            let summaries: Vec<_> = format.summaries.iter().map(|s| s.name).collect();
            println!("      summaries:  {}", summaries.join(", "));
        }
    }

    println!();
    println!("Force one with --statement <id> or extraction.format in the config file.");

    Ok(())
}
