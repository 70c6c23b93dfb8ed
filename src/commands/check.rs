use anyhow::Result;

use crate::cli::CheckArgs;
use crate::segment::SpaceRestorer;

/// Sample classifieds phrases for a quick end-to-end probe.
const SAMPLE_TEXTS: &[&str] = &[
    "куплюайфон14про",
    "ищудомвПодмосковье",
    "сдаюквартирусмебельюитехникой",
    "новыйдивандоставканедорого",
    "куплютелевизорPhilips",
    "ищуработупрограммистом",
    "срочноотдамкотенка",
    "новаякуртказима",
];

pub async fn run(args: CheckArgs) -> Result<()> {
    let client = super::build_client(args.api, args.model.as_deref())?;

    if let Err(e) = client.health_check().await {
        println!("Endpoint check failed: {:#}", e);
        println!("Start the server first, e.g. `ollama serve` or a vLLM OpenAI server,");
        println!("and point OLLAMA_API_URL at it.");
        return Ok(());
    }
    println!("Endpoint reachable ({} API)", client.transport_name());

    let restorer = SpaceRestorer::new(client);
    for text in SAMPLE_TEXTS {
        let positions = restorer.restore_spaces(text).await;
        println!("{} -> {:?}", text, positions);
    }

    Ok(())
}
