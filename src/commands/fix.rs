use anyhow::Result;
use tracing::warn;

use crate::cli::FixArgs;
use crate::dataset;
use crate::submission::{self, reconcile};

/// Rebuild the submission so it covers exactly the required id set, then
/// write it in all three quoting shapes and report what had to be repaired.
pub fn run(args: FixArgs) -> Result<()> {
    let required = dataset::required_ids(&args.dataset, args.fallback_len);
    println!(
        "Required ids: {} (from {} to {})",
        required.len(),
        required.first().copied().unwrap_or(0),
        required.last().copied().unwrap_or(0)
    );

    // A missing or unreadable submission is not fatal: every id gets []
    let rows = match submission::read_predictions(&args.submission) {
        Ok(rows) => {
            println!("Loaded {} rows from {}", rows.len(), args.submission.display());
            rows
        }
        Err(e) => {
            warn!(error = %e, "cannot read submission, repairing from scratch");
            vec![]
        }
    };

    let (output, anomalies) = reconcile(&required, &rows);

    if anomalies.duplicate_input_ids > 0 {
        warn!(
            count = anomalies.duplicate_input_ids,
            "duplicate ids in submission, kept first occurrence"
        );
    }
    if anomalies.extraneous_ids > 0 {
        warn!(
            count = anomalies.extraneous_ids,
            "dropped rows with ids outside the required set"
        );
    }
    println!(
        "{} rows total, {} filled with empty lists",
        output.len(),
        anomalies.missing_ids
    );

    submission::write_submission(&args.output, &output)?;
    submission::write_unquoted(&args.unquoted_output, &output)?;
    submission::write_quoted(&args.quoted_output, &output)?;
    println!("Wrote {}", args.output.display());
    println!("Wrote {} (list field unquoted)", args.unquoted_output.display());
    println!("Wrote {} (list field quoted)", args.quoted_output.display());

    // Advisory only: report, never abort
    let report = submission::validate(&required, &output);
    println!("Row count ok: {}", report.row_count_ok);
    println!("Id set matches: {}", report.id_set_ok);
    println!("No duplicate ids: {}", report.no_duplicates);
    if report.unparseable_samples > 0 {
        warn!(
            count = report.unparseable_samples,
            "sampled list fields that do not parse"
        );
    } else {
        println!("Sampled list fields all parse");
    }

    Ok(())
}
