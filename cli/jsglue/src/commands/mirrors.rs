//! `jsglue mirrors`: listing, checking and emitting layout mirrors.

use anyhow::{bail, Context, Result};

use jsglue_layout::{
    emit_cpp_replacement, emit_rust_mirror, fingerprint, CheckOutcome, Endianness, MirrorRegistry, MirrorSchema,
    Target,
};

use crate::manifest::Project;
use crate::{Lang, OutputFormat};

/// Targets checked when no word size is given.
const DEFAULT_TARGETS: [Target; 2] = [Target::LP64, Target::ILP32];

fn targets(word_bits: Option<u32>) -> Vec<Target> {
    match word_bits {
        Some(bits) => vec![Target::new(bits, Endianness::Little)],
        None => DEFAULT_TARGETS.to_vec(),
    }
}

fn selected<'a>(registry: &'a MirrorRegistry, mirror: Option<&str>) -> Result<Vec<&'a MirrorSchema>> {
    match mirror {
        Some(name) => match registry.get(name).or_else(|| registry.by_replaced(name)) {
            Some(schema) => Ok(vec![schema]),
            None => bail!("unknown mirror: '{name}'. Use 'jsglue mirrors list' to see available mirrors."),
        },
        None => Ok(registry.iter().collect()),
    }
}

pub fn render_list(registry: &MirrorRegistry) -> String {
    let mut out = String::new();
    out.push_str("Layout mirrors:\n");
    out.push('\n');
    for schema in registry.iter() {
        out.push_str(&format!("  {:<34} replaces {}\n", schema.name, schema.replaces));
        for variant in registry.variants() {
            let fields: Vec<&str> = schema.active_fields(variant).map(|f| f.name.as_str()).collect();
            out.push_str(&format!("    {:<10} {}\n", variant.name, fields.join(", ")));
        }
    }
    out
}

pub fn list(project: &Project) -> Result<()> {
    let registry = project.registry()?;
    print!("{}", render_list(&registry));
    Ok(())
}

fn describe_outcome(outcome: &CheckOutcome) -> String {
    let status = if outcome.is_unchecked() {
        "unchecked".to_string()
    } else if outcome.is_drift() {
        format!(
            "DRIFT (recorded size {} align {})",
            outcome.expected_size.unwrap_or_default(),
            outcome.expected_align.unwrap_or_default()
        )
    } else {
        "ok".to_string()
    };
    format!(
        "  {:<34} {:<8} {}-bit  size {:>3}  align {}  {status}",
        outcome.mirror, outcome.variant, outcome.word_bits, outcome.size, outcome.align
    )
}

/// Every outcome for the requested word sizes.
pub fn check_outcomes(registry: &MirrorRegistry, word_bits: Option<u32>) -> Result<Vec<CheckOutcome>> {
    let mut outcomes = Vec::new();
    for target in targets(word_bits) {
        outcomes.extend(registry.check_report(target)?);
    }
    Ok(outcomes)
}

pub fn render_check(outcomes: &[CheckOutcome], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcomes)? + "\n"),
        OutputFormat::Human => {
            let mut out = String::new();
            for outcome in outcomes {
                out.push_str(&format!("{}\n", describe_outcome(outcome)));
            }
            Ok(out)
        }
    }
}

/// Print the check report and fail when a fingerprint or recorded layout no longer holds.
pub fn check(project: &Project, word_bits: Option<u32>, format: OutputFormat) -> Result<()> {
    let registry = project.registry()?;
    registry.verify_fingerprints()?;

    let outcomes = check_outcomes(&registry, word_bits)?;
    print!("{}", render_check(&outcomes, format)?);

    let drifted = outcomes.iter().filter(|o| o.is_drift()).count();
    if drifted > 0 {
        bail!("{drifted} mirror layout(s) differ from their recorded expectations");
    }
    Ok(())
}

pub fn render_emit(
    registry: &MirrorRegistry,
    lang: Lang,
    variant: &str,
    word_bits: Option<u32>,
    mirror: Option<&str>,
) -> Result<String> {
    let schemas = selected(registry, mirror)?;
    let mut chunks = Vec::new();
    match lang {
        Lang::Cpp => {
            for schema in schemas {
                chunks.push(emit_cpp_replacement(schema));
            }
        }
        Lang::Rust => {
            let variant = registry
                .variant(variant)
                .with_context(|| format!("unknown build variant '{variant}'"))?;
            let host = Target::host();
            let target = Target::new(word_bits.unwrap_or(host.word_bits), host.endian);
            for schema in schemas {
                chunks.push(emit_rust_mirror(schema, registry.types(), variant, target)?);
            }
        }
    }
    Ok(chunks.join("\n"))
}

pub fn emit(
    project: &Project,
    lang: Lang,
    variant: Option<&str>,
    word_bits: Option<u32>,
    mirror: Option<&str>,
) -> Result<()> {
    let registry = project.registry()?;
    print!("{}", render_emit(&registry, lang, project.variant(variant), word_bits, mirror)?);
    Ok(())
}

pub fn render_fingerprints(registry: &MirrorRegistry) -> Result<String> {
    let mut out = String::new();
    for schema in registry.iter() {
        let computed = fingerprint(schema)?;
        let status = match &schema.fingerprint {
            None => "unpinned",
            Some(pinned) if pinned.eq_ignore_ascii_case(&computed) => "pinned",
            Some(_) => "MISMATCH",
        };
        out.push_str(&format!("{:<34} {computed}  {status}\n", schema.name));
    }
    Ok(out)
}

pub fn fingerprints(project: &Project) -> Result<()> {
    let registry = project.registry()?;
    print!("{}", render_fingerprints(&registry)?);
    Ok(())
}
