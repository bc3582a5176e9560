use crate::errors::PersistenceError;
use crate::session::SessionResult;

use csv::Writer;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::info;

pub const REWARD_TRACE_FILE: &str = "reward_trace.csv";
pub const REWARD_SUMMARY_FILE: &str = "reward_perc.csv";

/// One column per agent, one row per step, holding the cumulative reward summed over trials.
pub fn write_reward_trace<W: io::Write>(
    result: &SessionResult,
    writer: W,
) -> Result<(), PersistenceError> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(result.agents())?;

    for step in 0..result.n_step() {
        let row = result.agents().iter().map(|label| {
            result
                .reward_trace(label)
                .and_then(|trace| trace.get(step))
                .copied()
                .unwrap_or_default()
                .to_string()
        });
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// One column per agent, one row per trial, holding the normalized reward of the trial.
pub fn write_reward_summary<W: io::Write>(
    result: &SessionResult,
    writer: W,
) -> Result<(), PersistenceError> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(result.agents())?;

    for trial in 0..result.n_test() {
        let row = result.agents().iter().map(|label| {
            result
                .reward_sums(label)
                .and_then(|sums| sums.get(trial))
                .copied()
                .unwrap_or_default()
                .to_string()
        });
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn save_results(result: &SessionResult, dir: &Path) -> Result<(), PersistenceError> {
    fs::create_dir_all(dir)?;

    let trace_path = dir.join(REWARD_TRACE_FILE);
    write_reward_trace(result, File::create(&trace_path)?)?;
    let summary_path = dir.join(REWARD_SUMMARY_FILE);
    write_reward_summary(result, File::create(&summary_path)?)?;

    info!(
        id = %result.id(),
        trace = %trace_path.display(),
        summary = %summary_path.display(),
        "Saved results"
    );
    Ok(())
}
