//! `jsglue generate`: the C++ glue source and the binding generator's input header.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use jsglue_abi::{generate_glue_source, generate_wrapper_header};

use crate::manifest::Project;

pub fn header_source(project: &Project) -> Result<String> {
    let registry = project.registry()?;
    let manifest = project.exports()?.validated()?;
    let config = project.bindings()?.validated(&registry, &manifest)?;
    Ok(generate_wrapper_header(&registry, &manifest, &config)?)
}

pub fn glue_source(project: &Project) -> Result<String> {
    let manifest = project.exports()?.validated()?;
    Ok(generate_glue_source(&manifest)?)
}

/// `--output`, else the manifest default, resolved against the project directory.
fn destination(project: &Project, output: Option<&str>, configured: Option<&str>) -> Option<PathBuf> {
    output.or(configured).map(|p| project.resolve(p))
}

fn write_or_print(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
            println!("Generated → {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

pub fn header(project: &Project, output: Option<&str>) -> Result<()> {
    let content = header_source(project)?;
    let path = destination(project, output, project.manifest.generate.header.as_deref());
    write_or_print(path.as_deref(), &content)
}

pub fn glue(project: &Project, output: Option<&str>) -> Result<()> {
    let content = glue_source(project)?;
    let path = destination(project, output, project.manifest.generate.glue.as_deref());
    write_or_print(path.as_deref(), &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_FILE;

    #[test]
    fn writes_to_manifest_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            "[generate]\nheader = \"etc/wrapper.hpp\"\nglue = \"src/jsglue.cpp\"\n",
        )
        .unwrap();
        let project = Project::discover(dir.path()).unwrap();

        header(&project, None).unwrap();
        glue(&project, None).unwrap();

        let wrapper = std::fs::read_to_string(dir.path().join("etc/wrapper.hpp")).unwrap();
        assert!(wrapper.contains("class MOZ_STACK_CLASS CallArgsReplacement"));
        let glue = std::fs::read_to_string(dir.path().join("src/jsglue.cpp")).unwrap();
        assert!(glue.contains("return value.toInt32();"));
    }

    #[test]
    fn output_flag_wins() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::builtin(dir.path());
        glue(&project, Some("out/glue.cpp")).unwrap();
        assert!(dir.path().join("out/glue.cpp").is_file());
    }

    #[test]
    fn invalid_exports_stop_generation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[sources]\nexports = \"exports.toml\"\n").unwrap();
        std::fs::write(
            dir.path().join("exports.toml"),
            r#"
[[export]]
symbol = "JS_Int32Value"
signature = "JS::Value JS_MakeInt32(int32_t i)"
forward = { kind = "construct", function = "JS::Int32Value" }
"#,
        )
        .unwrap();
        let project = Project::discover(dir.path()).unwrap();
        let err = glue_source(&project).unwrap_err();
        assert!(format!("{err:#}").contains("declaration names 'JS_MakeInt32'"));
    }
}
