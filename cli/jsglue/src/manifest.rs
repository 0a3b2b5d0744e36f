//! `jsglue.toml` project manifest and source resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use jsglue_abi::{BindingConfig, ExportManifest};
use jsglue_layout::MirrorRegistry;

pub const MANIFEST_FILE: &str = "jsglue.toml";

/// Variant used when neither the command line nor the manifest names one.
pub const DEFAULT_VARIANT: &str = "release";

/// The top-level manifest of a glue project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JsglueManifest {
    #[serde(default)]
    pub project: Option<ProjectConfig>,
    /// Replacements for the built-in schema files.
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
}

/// Paths relative to the manifest directory. Unset entries use the built-in files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourcesConfig {
    #[serde(default)]
    pub mirrors: Option<String>,
    #[serde(default)]
    pub exports: Option<String>,
    #[serde(default)]
    pub bindings: Option<String>,
}

/// Defaults for `jsglue generate` and `jsglue bindings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GenerateConfig {
    /// Build variant of the engine being bound.
    #[serde(default)]
    pub variant: Option<String>,
    /// Where `generate header` writes when `--output` is absent.
    #[serde(default)]
    pub header: Option<String>,
    /// Where `generate glue` writes when `--output` is absent.
    #[serde(default)]
    pub glue: Option<String>,
}

impl JsglueManifest {
    /// Search upward from `start_dir` for a `jsglue.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest = Self::parse(&content).with_context(|| format!("parsing {}", candidate.display()))?;
                tracing::debug!(path = %candidate.display(), "loaded project manifest");
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    pub fn parse(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Where the schema files come from: a discovered project or the built-in defaults.
#[derive(Debug, Clone)]
pub struct Project {
    /// Manifest directory, or the working directory when there is no manifest.
    pub dir: PathBuf,
    pub manifest: JsglueManifest,
}

impl Project {
    /// Look for a manifest from `cwd` upward.
    pub fn discover(cwd: &Path) -> Result<Self> {
        match JsglueManifest::find_and_load(cwd)? {
            Some((manifest, dir)) => Ok(Self { dir, manifest }),
            None => Ok(Self::builtin(cwd)),
        }
    }

    /// A project using only the built-in files.
    pub fn builtin(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            manifest: JsglueManifest::default(),
        }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.dir.join(path)
    }

    pub fn registry(&self) -> Result<MirrorRegistry> {
        match &self.manifest.sources.mirrors {
            Some(path) => {
                let path = self.resolve(path);
                MirrorRegistry::from_file(&path).with_context(|| format!("loading {}", path.display()))
            }
            None => MirrorRegistry::builtin().context("loading built-in mirrors"),
        }
    }

    pub fn exports(&self) -> Result<ExportManifest> {
        match &self.manifest.sources.exports {
            Some(path) => {
                let path = self.resolve(path);
                ExportManifest::load(&path).with_context(|| format!("loading {}", path.display()))
            }
            None => ExportManifest::builtin().context("loading built-in exports"),
        }
    }

    pub fn bindings(&self) -> Result<BindingConfig> {
        match &self.manifest.sources.bindings {
            Some(path) => {
                let path = self.resolve(path);
                BindingConfig::load(&path).with_context(|| format!("loading {}", path.display()))
            }
            None => BindingConfig::builtin().context("loading built-in binding configuration"),
        }
    }

    /// `requested`, else the manifest's variant, else [`DEFAULT_VARIANT`].
    pub fn variant<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.manifest.generate.variant.as_deref())
            .unwrap_or(DEFAULT_VARIANT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_manifest() {
        let manifest = JsglueManifest::parse(
            r#"
[project]
name = "mozjs"

[sources]
mirrors = "etc/mirrors.toml"
bindings = "etc/bindings.toml"

[generate]
variant = "debug"
header = "etc/wrapper.hpp"
glue = "src/jsglue.cpp"
"#,
        )
        .unwrap();
        assert_eq!(manifest.project.unwrap().name, "mozjs");
        assert_eq!(manifest.sources.mirrors.as_deref(), Some("etc/mirrors.toml"));
        assert!(manifest.sources.exports.is_none());
        assert_eq!(manifest.generate.glue.as_deref(), Some("src/jsglue.cpp"));
    }

    #[test]
    fn empty_manifest_uses_defaults() {
        let manifest = JsglueManifest::parse("").unwrap();
        assert!(manifest.project.is_none());
        let project = Project {
            dir: PathBuf::from("."),
            manifest,
        };
        assert_eq!(project.variant(None), DEFAULT_VARIANT);
        assert_eq!(project.variant(Some("debug")), "debug");
        assert!(project.registry().is_ok());
        assert!(project.exports().is_ok());
        assert!(project.bindings().is_ok());
    }

    #[test]
    fn reject_invalid_toml() {
        assert!(JsglueManifest::parse("this is not valid toml [[[").is_err());
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            "[project]\nname = \"parent\"\n\n[generate]\nvariant = \"debug\"\n",
        )
        .unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let project = Project::discover(&nested).unwrap();
        assert_eq!(project.dir, dir.path());
        assert_eq!(project.variant(None), "debug");
    }

    #[test]
    fn manifest_sources_override_builtins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[sources]\nexports = \"missing.toml\"\n").unwrap();

        let project = Project::discover(dir.path()).unwrap();
        let err = project.exports().unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
        assert!(project.registry().is_ok());
    }
}
