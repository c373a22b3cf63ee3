//! Resource info snapshots / 资源信息
//!
//! An [`Info`] is assembled per request from the namespaces the caller asks
//! for; "basic" is always present.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FsError;
use crate::storage::ObjectProperties;

/// Custom metadata key holding an access time written by setinfo
pub const META_ACCESSED: &str = "last_accessed_on";
/// Custom metadata key holding a modification time written by setinfo
pub const META_MODIFIED: &str = "last_modified";

/// Named metadata subset / 信息命名空间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Basic,
    Details,
    Backend,
}

impl FromStr for Namespace {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Namespace::Basic),
            "details" => Ok(Namespace::Details),
            "backend" | "blob" => Ok(Namespace::Backend),
            other => Err(FsError::Unsupported(format!("unknown namespace {:?}", other))),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Namespace::Basic => "basic",
            Namespace::Details => "details",
            Namespace::Backend => "backend",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    File,
    Directory,
}

/// "details" namespace / 详细信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Details {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Epoch seconds / 时间戳（秒）
    pub accessed: Option<i64>,
    pub created: Option<i64>,
    pub modified: Option<i64>,
    /// Never known for object stores
    pub metadata_changed: Option<i64>,
    pub size: u64,
}

/// Immutable info snapshot / 资源信息快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub name: String,
    pub is_dir: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<HashMap<String, String>>,
}

impl Info {
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }

    pub fn size(&self) -> Option<u64> {
        self.details.as_ref().map(|d| d.size)
    }

    pub fn modified(&self) -> Option<i64> {
        self.details.as_ref().and_then(|d| d.modified)
    }

    pub fn has_namespace(&self, ns: Namespace) -> bool {
        match ns {
            Namespace::Basic => true,
            Namespace::Details => self.details.is_some(),
            Namespace::Backend => self.backend.is_some(),
        }
    }
}

/// Writable subset of "details" / 可写的详细信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailsUpdate {
    pub accessed: Option<i64>,
    pub modified: Option<i64>,
}

/// Changes accepted by setinfo / setinfo 参数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoUpdate {
    #[serde(default)]
    pub details: Option<DetailsUpdate>,
    #[serde(default)]
    pub backend: Option<HashMap<String, String>>,
}

impl InfoUpdate {
    pub fn is_empty(&self) -> bool {
        self.details.is_none() && self.backend.is_none()
    }

    /// Fold the update into an existing metadata map / 合并到已有元数据
    pub fn apply_to(&self, metadata: &mut HashMap<String, String>) {
        if let Some(backend) = &self.backend {
            metadata.extend(backend.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(details) = &self.details {
            if let Some(accessed) = details.accessed {
                metadata.insert(META_ACCESSED.to_string(), accessed.to_string());
            }
            if let Some(modified) = details.modified {
                metadata.insert(META_MODIFIED.to_string(), modified.to_string());
            }
        }
    }
}

fn to_epoch(t: Option<DateTime<Utc>>) -> Option<i64> {
    t.map(|t| t.timestamp())
}

fn meta_epoch(metadata: &HashMap<String, String>, key: &str) -> Option<i64> {
    metadata.get(key).and_then(|v| v.parse::<f64>().ok()).map(|v| v as i64)
}

/// Info for a directory / 目录信息
///
/// `marker` carries the properties of the directory's marker object, when
/// there is one; times written by setinfo are read back from its metadata.
pub fn dir_info(name: &str, marker: Option<&ObjectProperties>, namespaces: &[Namespace]) -> Info {
    let metadata = marker.map(|m| &m.metadata);
    Info {
        name: name.to_string(),
        is_dir: true,
        details: namespaces.contains(&Namespace::Details).then(|| Details {
            resource_type: ResourceType::Directory,
            accessed: metadata.and_then(|m| meta_epoch(m, META_ACCESSED)),
            created: None,
            modified: metadata.and_then(|m| meta_epoch(m, META_MODIFIED)),
            metadata_changed: None,
            size: 0,
        }),
        backend: namespaces
            .contains(&Namespace::Backend)
            .then(|| metadata.cloned().unwrap_or_default()),
    }
}

/// Map backend properties of a file into an Info / 将对象属性转换为 Info
pub fn file_info(name: &str, props: &ObjectProperties, namespaces: &[Namespace]) -> Info {
    let details = namespaces.contains(&Namespace::Details).then(|| Details {
        resource_type: ResourceType::File,
        accessed: to_epoch(props.accessed).or_else(|| meta_epoch(&props.metadata, META_ACCESSED)),
        created: to_epoch(props.created),
        modified: to_epoch(props.modified).or_else(|| meta_epoch(&props.metadata, META_MODIFIED)),
        metadata_changed: None,
        size: props.size,
    });

    Info {
        name: name.to_string(),
        is_dir: false,
        details,
        backend: namespaces
            .contains(&Namespace::Backend)
            .then(|| props.metadata.clone()),
    }
}

/// Whether the namespaces require a properties round trip
pub fn needs_properties(namespaces: &[Namespace]) -> bool {
    namespaces
        .iter()
        .any(|ns| matches!(ns, Namespace::Details | Namespace::Backend))
}
