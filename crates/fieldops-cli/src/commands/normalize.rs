//! Normalize command implementation

use crate::cli::NormalizeArgs;
use crate::output::OutputWriter;
use crate::output_types::{NormalizeRow, NormalizedAddress};
use anyhow::Result;
use fieldops_geo::{normalize, validate_address};

pub fn execute(args: NormalizeArgs, output: &OutputWriter) -> Result<()> {
    let results: Vec<NormalizedAddress> = args
        .addresses
        .into_iter()
        .map(|input| NormalizedAddress {
            normalized: normalize(&input),
            error: validate_address(&input).err().map(|e| e.to_string()),
            input,
        })
        .collect();

    if output.is_json() {
        output.result(&results)?;
        return Ok(());
    }

    for invalid in results.iter().filter_map(|r| r.error.as_ref()) {
        output.warning(invalid);
    }
    output.table(
        results
            .into_iter()
            .map(|r| NormalizeRow { input: r.input, normalized: r.normalized })
            .collect(),
    );

    Ok(())
}
