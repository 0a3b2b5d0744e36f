//! `jsglue bindings`: binding-generator arguments and configuration checks.

use anyhow::{bail, Result};

use jsglue_abi::validate_config;

use crate::manifest::Project;

pub fn clang_args(project: &Project, variant: Option<&str>, msvc: bool) -> Result<Vec<String>> {
    let registry = project.registry()?;
    let config = project.bindings()?;
    Ok(config.clang_args_for(&registry, project.variant(variant), msvc)?)
}

pub fn args(project: &Project, variant: Option<&str>, msvc: bool) -> Result<()> {
    for arg in clang_args(project, variant, msvc)? {
        println!("{arg}");
    }
    Ok(())
}

pub fn bindgen_args(project: &Project, variant: Option<&str>, msvc: bool) -> Result<Vec<String>> {
    let registry = project.registry()?;
    let config = project.bindings()?;
    Ok(config.bindgen_args_for(&registry, project.variant(variant), msvc)?)
}

pub fn command(project: &Project, variant: Option<&str>, msvc: bool) -> Result<()> {
    for arg in bindgen_args(project, variant, msvc)? {
        println!("{arg}");
    }
    Ok(())
}

pub fn check(project: &Project) -> Result<()> {
    let registry = project.registry()?;
    let manifest = project.exports()?;
    let config = project.bindings()?;

    let Err(issues) = validate_config(&config, &registry, &manifest) else {
        println!("binding configuration OK");
        return Ok(());
    };
    let mut errors = 0;
    for issue in &issues {
        if issue.severity == "error" {
            errors += 1;
        }
        eprintln!("  {}: {}", issue.severity, issue.message);
    }
    if errors > 0 {
        bail!("binding configuration has {errors} error(s)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_FILE;

    #[test]
    fn variant_comes_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[generate]\nvariant = \"debug\"\n").unwrap();
        let project = Project::discover(dir.path()).unwrap();

        let args = clang_args(&project, None, false).unwrap();
        assert!(args.iter().any(|a| a == "-DJS_DEBUG"));
        let args = clang_args(&project, Some("release"), false).unwrap();
        assert!(!args.iter().any(|a| a == "-DJS_DEBUG"));
    }

    #[test]
    fn unknown_variant_fails() {
        let project = Project::builtin(std::path::Path::new("."));
        assert!(clang_args(&project, Some("profile"), false).is_err());
        assert!(bindgen_args(&project, Some("profile"), false).is_err());
    }

    #[test]
    fn command_line_ends_with_clang_args() {
        let project = Project::builtin(std::path::Path::new("."));
        let args = bindgen_args(&project, Some("release"), true).unwrap();
        assert_eq!(args.first().map(String::as_str), Some("--enable-cxx-namespaces"));
        assert!(args.iter().any(|a| a == "--rustified-enum"));
        assert!(args.iter().any(|a| a == "JS::UndefinedHandleValue"));

        let split = args.iter().position(|a| a == "--").unwrap();
        assert_eq!(args[split + 1..], clang_args(&project, Some("release"), true).unwrap()[..]);
    }

    #[test]
    fn missing_static_fails_check() {
        let dir = tempfile::tempdir().unwrap();
        let bindings = jsglue_abi::BUILTIN_BINDINGS.replace("    \"JS::NullHandleValue\",\n", "");
        assert_ne!(bindings, jsglue_abi::BUILTIN_BINDINGS);
        std::fs::write(dir.path().join("bindings.toml"), bindings).unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[sources]\nbindings = \"bindings.toml\"\n").unwrap();
        let project = Project::discover(dir.path()).unwrap();

        let err = check(&project).unwrap_err();
        assert!(err.to_string().contains("1 error(s)"));
    }

    #[test]
    fn builtin_configuration_checks_clean() {
        let project = Project::builtin(std::path::Path::new("."));
        check(&project).unwrap();
    }
}
