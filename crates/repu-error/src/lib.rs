use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// 请求超时的固定值（毫秒），与客户端传输层保持一致
pub const REQUEST_TIMEOUT_MS: u64 = 15_000;

/// 系统统一错误类型
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum RepuError {
    // === 信封业务错误 ===
    /// `code != 0` 且不是认证失败，Display 即服务端的 `msg`
    #[error("{message}")]
    Business { code: i64, message: String },

    /// `code == 401`，会话已被清除
    #[error("{message}")]
    Authentication { message: String },

    // === 传输错误 ===
    #[error("网络错误: {operation}: {message}")]
    Network { operation: String, message: String },

    #[error("超时错误: {operation} 超过 {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("HTTP 状态异常: {status}")]
    HttpStatus { status: u16, body: String },

    // === 本地错误 ===
    #[error("存储错误: {operation}: {message}")]
    Storage { operation: String, message: String },

    #[error("配置错误: {key} - {reason}")]
    Configuration { key: String, reason: String },

    #[error("序列化错误: {format}: {message}")]
    Serialization { format: String, message: String },

    #[error("导航失败: {path} - {reason}")]
    Navigation { path: String, reason: String },

    #[error("内部系统错误: {message}")]
    Internal { message: String },
}

/// 错误严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Low,      // 可预期的业务错误
    Medium,   // 技术错误但不影响核心功能
    High,     // 影响核心功能的错误
    Critical, // 系统级严重错误
}

/// 错误元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMetadata {
    pub error_id: String,
    pub severity: ErrorSeverity,
    pub component: String,
    pub operation: Option<String>,
    pub role: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub context: std::collections::HashMap<String, String>,
}

impl RepuError {
    /// 获取错误的严重级别
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RepuError::Business { .. } | RepuError::Navigation { .. } => ErrorSeverity::Low,
            RepuError::Authentication { .. }
            | RepuError::Network { .. }
            | RepuError::Timeout { .. }
            | RepuError::HttpStatus { .. } => ErrorSeverity::Medium,
            RepuError::Storage { .. } | RepuError::Serialization { .. } => ErrorSeverity::High,
            RepuError::Configuration { .. } | RepuError::Internal { .. } => ErrorSeverity::Critical,
        }
    }

    /// 是否为传输层错误（网络、超时、无法解析的非 2xx 响应）
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RepuError::Network { .. } | RepuError::Timeout { .. } | RepuError::HttpStatus { .. }
        )
    }

    /// 是否为认证失败
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, RepuError::Authentication { .. })
    }

    /// 信封错误码，非信封错误返回 None
    pub fn envelope_code(&self) -> Option<i64> {
        match self {
            RepuError::Business { code, .. } => Some(*code),
            RepuError::Authentication { .. } => Some(401),
            _ => None,
        }
    }

    /// 记录错误日志
    pub fn log(&self, metadata: &ErrorMetadata) {
        match metadata.severity {
            ErrorSeverity::Low => {
                warn!(
                    error_id = %metadata.error_id,
                    component = %metadata.component,
                    operation = ?metadata.operation,
                    role = ?metadata.role,
                    error = %self,
                    "业务错误"
                );
            }
            ErrorSeverity::Medium => {
                warn!(
                    error_id = %metadata.error_id,
                    component = %metadata.component,
                    operation = ?metadata.operation,
                    role = ?metadata.role,
                    error = %self,
                    context = ?metadata.context,
                    "技术错误"
                );
            }
            ErrorSeverity::High | ErrorSeverity::Critical => {
                error!(
                    error_id = %metadata.error_id,
                    component = %metadata.component,
                    operation = ?metadata.operation,
                    role = ?metadata.role,
                    error = %self,
                    context = ?metadata.context,
                    severity = ?metadata.severity,
                    "严重错误"
                );
            }
        }
    }

    /// 获取用户友好的错误消息
    pub fn user_message(&self) -> String {
        match self {
            RepuError::Business { message, .. } | RepuError::Authentication { message } => {
                message.clone()
            }
            RepuError::Network { .. } | RepuError::HttpStatus { .. } => {
                "网络异常，请稍后重试".to_string()
            }
            RepuError::Timeout { .. } => "请求超时，请重试".to_string(),
            RepuError::Navigation { .. } => "页面跳转失败".to_string(),
            _ => "系统内部错误，请联系管理员".to_string(),
        }
    }
}

/// 创建错误元数据的便捷构造器
pub struct ErrorMetadataBuilder {
    metadata: ErrorMetadata,
}

impl ErrorMetadataBuilder {
    pub fn new(component: &str) -> Self {
        Self {
            metadata: ErrorMetadata {
                error_id: uuid::Uuid::new_v4().to_string(),
                severity: ErrorSeverity::Medium,
                component: component.to_string(),
                operation: None,
                role: None,
                timestamp: chrono::Utc::now(),
                context: std::collections::HashMap::new(),
            },
        }
    }

    pub fn operation(mut self, operation: &str) -> Self {
        self.metadata.operation = Some(operation.to_string());
        self
    }

    pub fn role(mut self, role: &str) -> Self {
        if !role.is_empty() {
            self.metadata.role = Some(role.to_string());
        }
        self
    }

    pub fn context(mut self, key: &str, value: &str) -> Self {
        self.metadata
            .context
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(mut self, error: &RepuError) -> ErrorMetadata {
        self.metadata.severity = error.severity();
        self.metadata
    }
}

pub type Result<T> = std::result::Result<T, RepuError>;

// === 转换实现 ===

impl From<serde_json::Error> for RepuError {
    fn from(err: serde_json::Error) -> Self {
        RepuError::Serialization {
            format: "json".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<sled::Error> for RepuError {
    fn from(err: sled::Error) -> Self {
        RepuError::Storage {
            operation: "sled".to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_errors_display_server_message() {
        let err = RepuError::Business {
            code: 7,
            message: "bad".to_string(),
        };
        assert_eq!(err.to_string(), "bad");
        assert_eq!(err.envelope_code(), Some(7));
        assert!(!err.is_transport());

        let auth = RepuError::Authentication {
            message: "unauthorized".to_string(),
        };
        assert_eq!(auth.to_string(), "unauthorized");
        assert!(auth.is_auth_failure());
        assert_eq!(auth.envelope_code(), Some(401));
    }

    #[test]
    fn test_transport_classification() {
        let timeout = RepuError::Timeout {
            operation: "GET /api/reviews".to_string(),
            timeout_ms: REQUEST_TIMEOUT_MS,
        };
        assert!(timeout.is_transport());
        assert_eq!(timeout.severity(), ErrorSeverity::Medium);
        assert_eq!(timeout.envelope_code(), None);

        let status = RepuError::HttpStatus {
            status: 502,
            body: "upstream down".to_string(),
        };
        assert!(status.is_transport());
        assert!(!status.is_auth_failure());
    }

    #[test]
    fn test_metadata_builder_takes_severity_from_error() {
        let err = RepuError::Storage {
            operation: "set_item".to_string(),
            message: "disk full".to_string(),
        };
        let metadata = ErrorMetadataBuilder::new("repu-auth")
            .operation("set_session")
            .role("")
            .context("key", "repu_token")
            .build(&err);

        assert_eq!(metadata.severity, ErrorSeverity::High);
        assert_eq!(metadata.role, None);
        assert_eq!(metadata.context.get("key").map(String::as_str), Some("repu_token"));
        assert!(!metadata.error_id.is_empty());
    }
}
