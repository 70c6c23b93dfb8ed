use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::PredictArgs;
use crate::dataset;
use crate::segment::{format_positions, SpaceRestorer};

/// Pacing between consecutive calls. API courtesy, not a correctness
/// mechanism.
const CALL_PACING_MS: u64 = 100;

/// Progress is printed every this many records.
const PROGRESS_EVERY: usize = 5;

#[derive(Debug, Serialize)]
struct ResultRow {
    id: i64,
    text_no_spaces: String,
    predicted_positions: String,
}

pub async fn run(args: PredictArgs) -> Result<()> {
    let client = super::build_client(args.api, args.model.as_deref())?;

    // Abort before touching any record if the endpoint is down
    client
        .health_check()
        .await
        .context("LLM endpoint health check failed; is the server running?")?;
    info!(api = client.transport_name(), "endpoint reachable");

    let records = dataset::read_dataset(&args.dataset)?;
    println!("Loaded {} records from {}", records.len(), args.dataset.display());

    let restorer = SpaceRestorer::new(client);
    let start = Instant::now();
    let mut results: Vec<ResultRow> = Vec::with_capacity(records.len());

    for record in &records {
        let positions = restorer.restore_spaces(&record.text_no_spaces).await;
        results.push(ResultRow {
            id: record.id,
            text_no_spaces: record.text_no_spaces.clone(),
            predicted_positions: format_positions(&positions),
        });

        let processed = results.len();
        if processed % PROGRESS_EVERY == 0 {
            let elapsed = start.elapsed().as_secs_f64();
            let avg = elapsed / processed as f64;
            let remaining = (records.len() - processed) as f64 * avg;
            println!(
                "Processed {}/{} ({:.1}%), avg {:.2}s per record, ~{:.1} min left",
                processed,
                records.len(),
                processed as f64 / records.len() as f64 * 100.0,
                avg,
                remaining / 60.0
            );
        }

        tokio::time::sleep(Duration::from_millis(CALL_PACING_MS)).await;
    }

    // One terminal write; a crash mid-run loses progress by design
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    for row in &results {
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!(
        "Saved {} predictions to {} in {:.1} min",
        results.len(),
        args.output.display(),
        start.elapsed().as_secs_f64() / 60.0
    );
    Ok(())
}
