//! Serde schema of declaration files

use serde::Deserialize;
use toml::Spanned;

/// Whole file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawFile {
    /// Assembly of every type that does not name one
    #[serde(default)]
    pub assembly: Option<String>,
    #[serde(default, rename = "type")]
    pub types: Vec<RawType>,
}

/// One `[[type]]` table
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawType {
    pub name: Spanned<String>,
    #[serde(default = "default_type_kind")]
    pub kind: String,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default, rename = "where")]
    pub where_clauses: Vec<RawWhere>,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub assembly: Option<String>,
    #[serde(default, rename = "member")]
    pub members: Vec<RawMember>,
}

/// One `[[type.member]]` table
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawMember {
    #[serde(default = "default_member_kind")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<Spanned<String>>,
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default, rename = "where")]
    pub where_clauses: Vec<RawWhere>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default)]
    pub ref_return: bool,
    #[serde(default)]
    pub explicit: Option<String>,
    #[serde(default)]
    pub accessors: Option<Vec<String>>,
}

/// `{ param = "U", constraints = ["class"] }`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawWhere {
    pub param: String,
    #[serde(default)]
    pub constraints: Vec<String>,
}

fn default_type_kind() -> String {
    "class".to_owned()
}

fn default_member_kind() -> String {
    "method".to_owned()
}
