//! Pack definitions as declared in the configuration document
//!
//! Definitions are immutable once loaded. Type selectors that the document
//! misspells do not fail the load; they surface as per-pack errors (acquisition)
//! or fall back to the default strategy (build).

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// How the pack's source tree is obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AcquisitionType {
    /// Download and extract a release tarball
    Tar,
    /// Shallow-clone a git repository at the version tag
    Git,
    /// Anything else, including an absent `type` key
    Unknown(String),
}

impl Default for AcquisitionType {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<String> for AcquisitionType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tar" => Self::Tar,
            "git" => Self::Git,
            _ => Self::Unknown(value),
        }
    }
}

impl From<AcquisitionType> for String {
    fn from(value: AcquisitionType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AcquisitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tar => f.write_str("tar"),
            Self::Git => f.write_str("git"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Which external build recipe runs against the acquired source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildType {
    /// `buildpack-packager build` (the default)
    #[default]
    Packager,
    /// `bundle exec buildpack-packager` for pre-Go buildpacks
    OldPackager,
    /// Pack-supplied command
    Custom,
    /// `bundle exec rake clean package` for the Java buildpack
    Java,
}

impl From<String> for BuildType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "oldpackager" => Self::OldPackager,
            "custom" => Self::Custom,
            "java" => Self::Java,
            _ => Self::Packager,
        }
    }
}

impl From<BuildType> for String {
    fn from(value: BuildType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Packager => "packager",
            Self::OldPackager => "oldpackager",
            Self::Custom => "custom",
            Self::Java => "java",
        };
        f.write_str(name)
    }
}

/// Command line for the `custom` build strategy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomExec {
    /// Program to run
    #[serde(default)]
    pub cmd: String,
    /// Arguments passed verbatim
    #[serde(default)]
    pub args: Vec<String>,
}

/// Build section of a pack definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSpec {
    /// Selected strategy
    #[serde(rename = "type", default)]
    pub build_type: BuildType,
    /// Only meaningful for `custom`
    #[serde(default)]
    pub exec: CustomExec,
}

/// Explicit archive location for non-official packs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TarLocation {
    #[serde(default)]
    pub url: String,
}

/// Explicit repository location for non-official packs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLocation {
    #[serde(default)]
    pub repo: String,
}

/// One independently configured unit to fetch and build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackDefinition {
    /// Pack name, also the repository name under the release host
    pub name: String,
    /// Version without the leading `v`
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
    /// Stack passed through to the packager
    #[serde(default)]
    pub stack: String,
    /// Use the release-host conventions instead of explicit locations
    #[serde(default)]
    pub official: bool,
    /// Archive download or repository clone
    #[serde(rename = "type", default)]
    pub acquisition: AcquisitionType,
    /// Build a cached (offline) package where the strategy supports it
    #[serde(default)]
    pub offline: bool,
    #[serde(rename = "git", default)]
    pub git_location: GitLocation,
    #[serde(rename = "tar", default)]
    pub tar_location: TarLocation,
    #[serde(default)]
    pub build: BuildSpec,
    /// Bypass this pack entirely
    #[serde(default)]
    pub skip: bool,
}

impl PackDefinition {
    /// Version-qualified directory name, `<name>-<version>`
    pub fn qualified_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Release tag, `v<version>`
    pub fn tag(&self) -> String {
        format!("v{}", self.version)
    }

    /// File name of the downloaded release archive
    pub fn archive_file_name(&self) -> String {
        format!("{}.tar.gz", self.tag())
    }

    /// `offline` rendered the way the packaging tools expect it
    pub fn offline_flag(&self) -> &'static str {
        if self.offline { "true" } else { "false" }
    }
}

/// Accepts a bare numeric `version: 4.5` as well as a quoted one
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a version string, found {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_definition() {
        let yaml = r#"
name: ruby
version: 1.2.3
stack: cflinuxfs4
official: true
type: tar
offline: true
build:
  type: oldPackager
skip: false
"#;
        let pack: PackDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(pack.name, "ruby");
        assert_eq!(pack.acquisition, AcquisitionType::Tar);
        assert_eq!(pack.build.build_type, BuildType::OldPackager);
        assert!(pack.offline);
        assert_eq!(pack.qualified_name(), "ruby-1.2.3");
        assert_eq!(pack.archive_file_name(), "v1.2.3.tar.gz");
    }

    #[test]
    fn test_unknown_build_type_falls_back_to_packager() {
        let pack: PackDefinition =
            serde_yaml::from_str("name: go\nversion: '1.0'\nbuild:\n  type: gradle\n").unwrap();
        assert_eq!(pack.build.build_type, BuildType::Packager);

        let pack: PackDefinition = serde_yaml::from_str("name: go\nversion: '1.0'\n").unwrap();
        assert_eq!(pack.build.build_type, BuildType::Packager);
    }

    #[test]
    fn test_unknown_acquisition_type_is_kept() {
        let pack: PackDefinition =
            serde_yaml::from_str("name: go\nversion: '1.0'\ntype: svn\n").unwrap();
        assert_eq!(pack.acquisition, AcquisitionType::Unknown("svn".to_string()));

        let pack: PackDefinition = serde_yaml::from_str("name: go\nversion: '1.0'\n").unwrap();
        assert_eq!(pack.acquisition, AcquisitionType::default());
    }

    #[test]
    fn test_numeric_version_is_accepted() {
        let pack: PackDefinition = serde_yaml::from_str("name: java\nversion: 4.5\n").unwrap();
        assert_eq!(pack.version, "4.5");
    }

    #[test]
    fn test_custom_exec_and_locations() {
        let yaml = r#"
name: staticfile
version: 1.6.0
type: git
git:
  repo: https://example.com/staticfile.git
tar:
  url: https://example.com/staticfile.tar.gz
build:
  type: custom
  exec:
    cmd: make
    args: [package, "STACK=cflinuxfs4"]
"#;
        let pack: PackDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(pack.acquisition, AcquisitionType::Git);
        assert_eq!(pack.git_location.repo, "https://example.com/staticfile.git");
        assert_eq!(pack.tar_location.url, "https://example.com/staticfile.tar.gz");
        assert_eq!(pack.build.build_type, BuildType::Custom);
        assert_eq!(pack.build.exec.cmd, "make");
        assert_eq!(pack.build.exec.args, vec!["package", "STACK=cflinuxfs4"]);
    }

    #[test]
    fn test_offline_flag() {
        let mut pack = PackDefinition::default();
        assert_eq!(pack.offline_flag(), "false");
        pack.offline = true;
        assert_eq!(pack.offline_flag(), "true");
    }
}
