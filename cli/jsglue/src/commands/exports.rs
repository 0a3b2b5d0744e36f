//! `jsglue exports`: the re-exported symbol surface.

use anyhow::{bail, Result};

use jsglue_abi::{validate_manifest, ExportManifest, Precondition};

use crate::manifest::Project;

pub fn render_list(manifest: &ExportManifest) -> String {
    let mut out = String::new();
    for export in &manifest.exports {
        let mut notes = vec![export.forward.kind().to_string()];
        if export.precondition != Precondition::None {
            notes.push(format!("requires {}", export.precondition));
        }
        if export.testing_only {
            notes.push("testing only".into());
        }
        out.push_str(&format!("{:<28} {}\n", export.symbol, export.signature));
        out.push_str(&format!("{:<28} [{}]\n", "", notes.join(", ")));
    }
    out
}

pub fn list(project: &Project) -> Result<()> {
    let manifest = project.exports()?;
    print!("{}", render_list(&manifest));
    Ok(())
}

/// Validation messages; empty when the manifest is sound.
pub fn issues(manifest: &ExportManifest) -> Vec<String> {
    match validate_manifest(manifest) {
        Ok(()) => Vec::new(),
        Err(issues) => issues.iter().map(ToString::to_string).collect(),
    }
}

pub fn check(project: &Project) -> Result<()> {
    let manifest = project.exports()?;
    let issues = issues(&manifest);
    if issues.is_empty() {
        println!("{} exports OK", manifest.exports.len());
        return Ok(());
    }
    for issue in &issues {
        eprintln!("  {issue}");
    }
    bail!("export manifest has {} issue(s)", issues.len())
}
