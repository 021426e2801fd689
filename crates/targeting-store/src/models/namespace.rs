//! 命名空间键
//!
//! 命名空间是开关、规则、变体的租户隔离边界。
//! 空键在构造与反序列化时统一替换为默认命名空间，
//! 所有请求入口共享这一处归一化逻辑，无需逐个操作重复判断。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 默认命名空间键
pub const DEFAULT_NAMESPACE: &str = "default";

/// 命名空间键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(from = "String")]
pub struct NamespaceKey(String);

impl NamespaceKey {
    /// 构造命名空间键，空输入回退到默认命名空间
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        if key.is_empty() {
            Self(DEFAULT_NAMESPACE.to_string())
        } else {
            Self(key)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_NAMESPACE
    }
}

impl Default for NamespaceKey {
    fn default() -> Self {
        Self(DEFAULT_NAMESPACE.to_string())
    }
}

impl From<String> for NamespaceKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl From<&str> for NamespaceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl AsRef<str> for NamespaceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_falls_back_to_default() {
        assert_eq!(NamespaceKey::new("").as_str(), DEFAULT_NAMESPACE);
        assert_eq!(NamespaceKey::from("").as_str(), DEFAULT_NAMESPACE);
        assert_eq!(NamespaceKey::from(String::new()).as_str(), DEFAULT_NAMESPACE);
        assert!(NamespaceKey::default().is_default());
    }

    #[test]
    fn test_non_empty_key_preserved() {
        let key = NamespaceKey::new("production");
        assert_eq!(key.as_str(), "production");
        assert!(!key.is_default());
    }

    #[test]
    fn test_deserialize_applies_default() {
        let key: NamespaceKey = serde_json::from_str(r#""""#).unwrap();
        assert!(key.is_default());

        let key: NamespaceKey = serde_json::from_str(r#""staging""#).unwrap();
        assert_eq!(key.as_str(), "staging");
    }

    #[test]
    fn test_serialize_as_plain_string() {
        let key = NamespaceKey::new("staging");
        assert_eq!(serde_json::to_string(&key).unwrap(), r#""staging""#);
    }

    #[test]
    fn test_display() {
        assert_eq!(NamespaceKey::new("ns1").to_string(), "ns1");
    }
}
