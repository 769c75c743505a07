//! 领域模型错误定义
//!
//! 定义了目录系统中所有可能的领域错误类型，提供清晰的错误上下文。

use rust_decimal::Decimal;
use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 输入验证错误，在任何副作用之前拦截
    #[error("验证失败: {field}: {message}")]
    Validation { field: String, message: String },

    /// 余额不足，提交/推广前的余额闸门拒绝
    #[error("余额不足: 需要 {required}, 可用 {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    /// 支付网关签名校验失败
    #[error("签名校验失败: {gateway}")]
    InvalidSignature { gateway: String },

    /// 支付回调引用了不存在的订单号
    #[error("未知支付单: {invoice_id}")]
    UnknownInvoice { invoice_id: String },

    /// 资源不存在错误
    #[error("资源不存在: {resource_type} ID {resource_id}")]
    ResourceNotFound {
        resource_type: String,
        resource_id: String,
    },

    /// 业务规则违反错误
    #[error("业务规则违反: {rule}")]
    BusinessRuleViolation { rule: String },
}

impl DomainError {
    /// 创建验证错误
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 创建余额不足错误
    pub fn insufficient_balance(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalance {
            required,
            available,
        }
    }

    /// 创建签名校验错误
    pub fn invalid_signature(gateway: impl Into<String>) -> Self {
        Self::InvalidSignature {
            gateway: gateway.into(),
        }
    }

    /// 创建未知支付单错误
    pub fn unknown_invoice(invoice_id: impl Into<String>) -> Self {
        Self::UnknownInvoice {
            invoice_id: invoice_id.into(),
        }
    }

    /// 创建资源不存在错误
    pub fn resource_not_found(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// 创建业务规则违反错误
    pub fn business_rule_violation(rule: impl Into<String>) -> Self {
        Self::BusinessRuleViolation { rule: rule.into() }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 仓储层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("resource not found")]
    NotFound,
    #[error("resource conflict")]
    Conflict,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
