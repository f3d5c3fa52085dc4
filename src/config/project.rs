// ABOUTME: Per-project configuration: the super jail, blue/green groups, and members.
// ABOUTME: Members accept a "jail@host" shorthand or a detailed mapping with overrides.

use crate::error::{Error, Result};
use crate::types::JailId;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    /// The authoritative jail whose state is replicated.
    #[serde(rename = "super", deserialize_with = "deserialize_jail_id")]
    pub super_jail: JailId,

    /// Data center tag of the super.
    #[serde(default)]
    pub dc: String,

    /// Named cohorts. Blue/green is the common case; the semantics live
    /// entirely in which group the resolver selects.
    #[serde(deserialize_with = "deserialize_groups")]
    pub groups: BTreeMap<String, NonEmpty<Member>>,

    /// A literal group name, or an HTTP(S) URL returning one as plain text.
    #[serde(default)]
    pub inactive: Option<String>,

    /// HTTP(S) URL returning a YAML document whose `tail:` field names
    /// the inactive group. Takes precedence over `inactive`.
    #[serde(default)]
    pub info: Option<String>,

    /// Default snapshot retention per target.
    #[serde(default = "default_keep")]
    pub keep: u32,

    /// Directories inside the super's root purged before snapshotting.
    #[serde(default = "default_clean")]
    pub clean: Vec<String>,

    /// Host files copied into each target's root after receive.
    #[serde(default = "default_copy")]
    pub copy: Vec<String>,

    /// Path of the deployment descriptor inside each target's root.
    /// An empty string disables the breadcrumb.
    #[serde(default = "default_meta")]
    pub meta: String,

    /// Shell filter applied to the send stream.
    #[serde(default)]
    pub compress: Option<String>,

    /// Shell filter applied to the receive stream.
    #[serde(default)]
    pub decompress: Option<String>,
}

fn default_keep() -> u32 {
    23
}

fn default_clean() -> Vec<String> {
    vec!["/tmp".to_string(), "/var/log".to_string()]
}

fn default_copy() -> Vec<String> {
    vec!["/etc/hosts".to_string(), "/etc/resolv.conf".to_string()]
}

fn default_meta() -> String {
    "/etc/deploy.meta.yml".to_string()
}

impl Project {
    pub fn group(&self, project_name: &str, group: &str) -> Result<&NonEmpty<Member>> {
        self.groups.get(group).ok_or_else(|| Error::UnknownGroup {
            project: project_name.to_string(),
            group: group.to_string(),
        })
    }

    pub fn effective_keep(&self, member: &Member) -> u32 {
        member.keep.unwrap_or(self.keep)
    }

    pub fn effective_copy<'a>(&'a self, member: &'a Member) -> &'a [String] {
        member.copy.as_deref().unwrap_or(&self.copy)
    }

    /// Meta path for a member, None when disabled by an empty string.
    pub fn effective_meta<'a>(&'a self, member: &'a Member) -> Option<&'a str> {
        let path = member.meta.as_deref().unwrap_or(&self.meta);
        if path.is_empty() { None } else { Some(path) }
    }
}

/// A deployment target.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: JailId,
    pub dc: String,
    pub keep: Option<u32>,
    pub copy: Option<Vec<String>>,
    pub meta: Option<String>,
    /// Do not restart the jail after deploy.
    pub halt: bool,
}

impl Member {
    fn from_id(id: JailId) -> Self {
        Self {
            id,
            dc: String::new(),
            keep: None,
            copy: None,
            meta: None,
            halt: false,
        }
    }
}

// Custom deserializers

fn deserialize_jail_id<'de, D>(deserializer: D) -> std::result::Result<JailId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    JailId::parse(&s).map_err(serde::de::Error::custom)
}

fn deserialize_groups<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, NonEmpty<Member>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: BTreeMap<String, Vec<MemberEntry>> = BTreeMap::deserialize(deserializer)?;
    let mut groups = BTreeMap::new();

    for (name, entries) in raw {
        let members = entries
            .into_iter()
            .map(|entry| entry.into_member())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(serde::de::Error::custom)?;

        let members = NonEmpty::from_vec(members).ok_or_else(|| {
            serde::de::Error::custom(format!("group '{}' has no members", name))
        })?;
        groups.insert(name, members);
    }

    Ok(groups)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MemberEntry {
    Simple(String),
    Detailed(DetailedMember),
}

#[derive(Debug, Deserialize)]
struct DetailedMember {
    id: String,
    #[serde(default)]
    dc: String,
    #[serde(default)]
    keep: Option<u32>,
    #[serde(default)]
    copy: Option<Vec<String>>,
    #[serde(default)]
    meta: Option<String>,
    #[serde(default)]
    halt: bool,
}

impl MemberEntry {
    fn into_member(self) -> std::result::Result<Member, String> {
        match self {
            MemberEntry::Simple(s) => {
                let id = JailId::parse(&s).map_err(|e| e.to_string())?;
                Ok(Member::from_id(id))
            }
            MemberEntry::Detailed(d) => {
                let id = JailId::parse(&d.id).map_err(|e| e.to_string())?;
                Ok(Member {
                    id,
                    dc: d.dc,
                    keep: d.keep,
                    copy: d.copy,
                    meta: d.meta,
                    halt: d.halt,
                })
            }
        }
    }
}
