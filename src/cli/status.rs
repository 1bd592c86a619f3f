use std::fmt::Write as _;

use crate::database_ops::{sentinel, Store, SCHEMA};
use crate::entities;
use crate::error::SeedResult;

fn yes_no(v: bool) -> &'static str {
    if v {
        "yes"
    } else {
        "no"
    }
}

/// Sentinel signals and per-table row counts as printable text.
pub async fn render<S: Store + ?Sized>(store: &S) -> SeedResult<String> {
    let signals = sentinel::inspect(store).await?;
    let mut out = String::new();
    writeln!(out, "SEED STATUS ({SCHEMA}):").ok();
    writeln!(out, "namespace: {}", yes_no(signals.namespace)).ok();
    writeln!(out, "marker: {}", yes_no(signals.marker)).ok();
    writeln!(out, "constraint: {}", yes_no(signals.constraint)).ok();
    writeln!(out, "initialized: {}", yes_no(signals.is_initialized())).ok();

    if !signals.namespace {
        return Ok(out);
    }
    let mut total = 0i64;
    for table in entities::tables() {
        match store.row_count(table.name).await? {
            Some(n) => {
                total += n;
                writeln!(out, "{}: {n}", table.name).ok();
            }
            None => {
                writeln!(out, "{}: (missing)", table.name).ok();
            }
        }
    }
    writeln!(out, "total rows: {total}").ok();
    Ok(out)
}
