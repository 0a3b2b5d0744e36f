//! Generation of the C++ side of the glue.
//!
//! - [`generate_glue_source`] writes the translation unit that gives every export a real,
//!   non-inline definition.
//! - [`generate_wrapper_header`] writes bindgen's input header: engine includes, the
//!   mirror replacement classes and the export prototypes.

use jsglue_layout::{emit_cpp_replacement, MirrorRegistry};

use crate::config::BindingConfig;
use crate::csig::CSignature;
use crate::error::{AbiError, Result};
use crate::export::{Export, ExportManifest, Forward};

const GENERATED_BANNER: &str = "// Generated by jsglue. Do not edit.";

fn forwarding_body(export: &Export, sig: &CSignature) -> Result<Vec<String>> {
    let args: Vec<&str> = sig.parameters.iter().map(|p| p.name.as_str()).collect();
    let first = || {
        args.first().copied().ok_or_else(|| AbiError::InvalidManifest {
            detail: format!("{}: forwarding needs a parameter", export.symbol),
        })
    };
    let lines = match &export.forward {
        Forward::DefaultConstruct { ty, with_context } => {
            let decl = if *with_context {
                format!("{ty} result({});", first()?)
            } else {
                format!("{ty} result;")
            };
            vec![decl, "return result;".to_string()]
        }
        Forward::Construct { function } => vec![format!("return {function}({});", args.join(", "))],
        Forward::Predicate { method } | Forward::UncheckedRead { method, .. } => {
            vec![format!("return {}.{method}();", first()?)]
        }
        Forward::Reinterpret { function } => vec![format!("return {function}({});", first()?)],
    };
    Ok(lines)
}

/// The glue translation unit: one definition per export.
///
/// The manifest must already be valid; see [`ExportManifest::validated`].
pub fn generate_glue_source(manifest: &ExportManifest) -> Result<String> {
    let mut out = String::new();
    out.push_str(GENERATED_BANNER);
    out.push_str("\n\n");
    out.push_str(&format!("#include \"{}\"\n", manifest.header));
    out.push('\n');
    out.push_str("// Reexport some functions that are marked inline.\n");

    for (export, sig) in manifest.signatures()? {
        out.push('\n');
        if export.testing_only {
            out.push_str(&format!("// Testing only. Requires {}.\n", export.precondition));
        }
        out.push_str(&format!("{sig} {{\n"));
        for line in forwarding_body(export, &sig)? {
            out.push_str(&format!("    {line}\n"));
        }
        out.push_str("}\n");
    }
    tracing::debug!(exports = manifest.exports.len(), "generated glue source");
    Ok(out)
}

/// bindgen's input header.
pub fn generate_wrapper_header(
    registry: &MirrorRegistry,
    manifest: &ExportManifest,
    config: &BindingConfig,
) -> Result<String> {
    let mut out = String::new();
    out.push_str(GENERATED_BANNER);
    out.push_str("\n\n");
    out.push_str("#include <stdint.h>\n");
    out.push_str("#ifndef _MSC_VER\n");
    out.push_str("#include <unistd.h>\n");
    out.push_str("#endif\n");
    out.push('\n');
    out.push_str("typedef uint32_t HashNumber;\n");
    out.push('\n');
    for include in &config.includes {
        out.push_str(&format!("#include \"{include}\"\n"));
    }

    out.push('\n');
    out.push_str("// Classes bindgen cannot lay out on its own.\n");
    out.push_str("// https://rust-lang.github.io/rust-bindgen/replacing-types.html\n");
    for mirror in registry.iter() {
        out.push('\n');
        out.push_str(&emit_cpp_replacement(mirror));
    }

    out.push('\n');
    out.push_str("// Non-inline definitions live in the generated glue source.\n");
    for (_, sig) in manifest.signatures()? {
        out.push_str(&format!("{sig};\n"));
    }
    tracing::debug!(
        mirrors = registry.iter().count(),
        exports = manifest.exports.len(),
        "generated wrapper header"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> ExportManifest {
        ExportManifest::builtin().unwrap().validated().unwrap()
    }

    #[test]
    fn glue_bodies_forward_to_engine() {
        let glue = generate_glue_source(&manifest()).unwrap();
        assert!(glue.starts_with(GENERATED_BANNER));
        assert!(glue.contains("#include \"jsglue.hpp\"\n"));
        assert!(glue.contains(
            "JS::CompartmentOptions JS_NewCompartmentOptions() {\n    JS::CompartmentOptions result;\n    return result;\n}\n"
        ));
        assert!(glue.contains(
            "JS::OwningCompileOptions JS_NewOwningCompileOptions(JSContext* cx) {\n    JS::OwningCompileOptions result(cx);\n    return result;\n}\n"
        ));
        assert!(glue.contains("int32_t JS_ValueToInt32(JS::Value value) {\n    return value.toInt32();\n}\n"));
        assert!(glue.contains("bool JS_ValueIsInt32(JS::Value value) {\n    return value.isInt32();\n}\n"));
        assert!(glue.contains("JS::Value JS_Int32Value(int32_t i) {\n    return JS::Int32Value(i);\n}\n"));
        assert!(glue.contains(
            "JS::shadow::Zone* JS_AsShadowZone(JS::Zone* zone) {\n    return JS::shadow::Zone::asShadowZone(zone);\n}\n"
        ));
        assert!(glue.contains("// Testing only. Requires predicate-holds.\nint32_t JS_ValueToInt32"));
    }

    #[test]
    fn wrapper_header_has_mirrors_then_prototypes() {
        let registry = MirrorRegistry::builtin().unwrap();
        let config = BindingConfig::builtin().unwrap();
        let header = generate_wrapper_header(&registry, &manifest(), &config).unwrap();

        assert!(header.contains("#include \"jsfriendapi.h\"\n"));
        let call_args = header.find("class MOZ_STACK_CLASS CallArgsReplacement").unwrap();
        let jit_args = header.find("class JSJitMethodCallArgsReplacement").unwrap();
        let prototypes = header.find("JS::Value JS_Int32Value(int32_t i);").unwrap();
        assert!(call_args < jit_args && jit_args < prototypes);
        assert_eq!(header.matches("#ifdef JS_DEBUG").count(), 2);
        assert_eq!(header.matches(");\n").count(), 6);
    }
}
