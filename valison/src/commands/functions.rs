// valison/src/commands/functions.rs
//! The `functions` command: lists the registry.
//!
//! License: MIT OR APACHE 2.0

use std::io::{self, Write};

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use serde::Serialize;

use valison_core::{default_registry, FunctionKind};

use super::Outcome;
use crate::cli::{FunctionsCommand, KindFilter};
use crate::ui::output;

#[derive(Serialize)]
struct Listing<'a> {
    name: &'a str,
    kind: FunctionKind,
}

/// Registry entries matching `filter`, validators first.
pub fn list_functions(filter: Option<KindFilter>) -> Vec<(&'static str, FunctionKind)> {
    let wanted = filter.map(|k| match k {
        KindFilter::Validator => FunctionKind::Validator,
        KindFilter::Sanitizer => FunctionKind::Sanitizer,
    });
    default_registry()
        .names()
        .into_iter()
        .filter(|(_, kind)| wanted.map_or(true, |w| w == *kind))
        .collect()
}

pub fn run_functions(cmd: &FunctionsCommand) -> Result<Outcome> {
    let entries = list_functions(cmd.kind);
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    if cmd.json {
        let listing: Vec<_> = entries
            .iter()
            .map(|&(name, kind)| Listing { name, kind })
            .collect();
        serde_json::to_writer_pretty(&mut writer, &listing).context("Failed to serialize function list")?;
        writeln!(writer)?;
    } else {
        let color = io::stdout().is_terminal();
        writeln!(writer, "{}", output::function_table(&entries, color))?;
    }
    Ok(Outcome::Clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_kind() {
        let sanitizers = list_functions(Some(KindFilter::Sanitizer));
        assert!(sanitizers.iter().all(|(_, kind)| *kind == FunctionKind::Sanitizer));
        assert!(sanitizers.iter().any(|(name, _)| *name == "trim"));

        let all = list_functions(None);
        assert!(all.len() > sanitizers.len());
        assert!(all.iter().any(|(name, _)| *name == "isEmail"));
    }
}
