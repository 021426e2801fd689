//! 分页令牌与结果集
//!
//! 键集分页：令牌只记录上一页最后一行的序号（序号在开关范围内唯一），
//! 续页查询按序号续扫而非偏移量跳过，并发写入下不会漏行或重复。
//! 对外为不透明的 base64(JSON) 字符串。

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// 分页令牌
///
/// 仅在存在下一页时产出；解码失败原样上报，不做吞没
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken {
    /// 上一页最后一行的序号
    pub rank: i32,
}

impl PageToken {
    /// 编码为不透明令牌字符串
    pub fn encode(&self) -> Result<String> {
        let payload = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(payload))
    }

    /// 解码令牌，任何畸形输入映射为 InvalidPageToken
    pub fn decode(token: &str) -> Result<Self> {
        let payload = STANDARD
            .decode(token)
            .map_err(|e| StoreError::InvalidPageToken(e.to_string()))?;
        serde_json::from_slice(&payload).map_err(|e| StoreError::InvalidPageToken(e.to_string()))
    }
}

/// 分页结果集
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet<T> {
    pub results: Vec<T>,
    /// 存在下一页时为续页令牌，否则为 None
    pub next_page_token: Option<String>,
}

impl<T> Default for ResultSet<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            next_page_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let token = PageToken { rank: 42 };
        let encoded = token.encode().unwrap();
        assert_eq!(PageToken::decode(&encoded).unwrap(), token);
    }

    #[test]
    fn test_token_is_base64_json() {
        let encoded = PageToken { rank: 7 }.encode().unwrap();
        let payload = STANDARD.decode(&encoded).unwrap();
        assert_eq!(std::str::from_utf8(&payload).unwrap(), r#"{"rank":7}"#);
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let err = PageToken::decode("not-base64!!").unwrap_err();
        assert!(matches!(err, StoreError::InvalidPageToken(_)));
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        // 合法 base64 但不是令牌 JSON
        let garbage = STANDARD.encode(b"{\"foo\": true}");
        let err = PageToken::decode(&garbage).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPageToken(_)));

        let garbage = STANDARD.encode(b"plain text");
        assert!(PageToken::decode(&garbage).is_err());
    }

    #[test]
    fn test_decode_empty_token() {
        // 空字符串是合法 base64（空负载），但 JSON 解析必须失败
        assert!(PageToken::decode("").is_err());
    }

    #[test]
    fn test_result_set_default_empty() {
        let set: ResultSet<u8> = ResultSet::default();
        assert!(set.results.is_empty());
        assert!(set.next_page_token.is_none());
    }
}
