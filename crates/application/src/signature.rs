//! 支付网关签名校验
//!
//! 两个网关的算法各不相同：Robokassa 对 `OutSum:InvId:Password2` 做 SHA-256
//! 取十六进制（大小写不敏感）；CloudPayments 对请求原始报文做 HMAC-SHA256，
//! 密钥为 API Secret，结果 Base64 放在 `Content-HMAC` 头里。
//! 校验必须发生在任何余额写入之前。

use data_encoding::BASE64;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Robokassa Result URL 签名校验器。
#[derive(Debug, Clone)]
pub struct RobokassaVerifier {
    password2: String,
}

impl RobokassaVerifier {
    pub fn new(password2: impl Into<String>) -> Self {
        Self {
            password2: password2.into(),
        }
    }

    pub fn verify(&self, out_sum: &str, inv_id: &str, signature_value: &str) -> bool {
        // 十六进制解码本身大小写不敏感，摘要比较必须恒定时间
        let candidate = match hex::decode(signature_value.trim()) {
            Ok(candidate) => candidate,
            Err(_) => return false,
        };
        let digest = Sha256::digest(format!("{out_sum}:{inv_id}:{}", self.password2));
        digest.as_slice().ct_eq(&candidate).into()
    }
}

/// CloudPayments Webhook 签名校验器。
#[derive(Debug, Clone)]
pub struct CloudPaymentsVerifier {
    api_secret: String,
}

impl CloudPaymentsVerifier {
    pub fn new(api_secret: impl Into<String>) -> Self {
        Self {
            api_secret: api_secret.into(),
        }
    }

    pub fn verify(&self, body: &[u8], content_hmac: &str) -> bool {
        let candidate = match BASE64.decode(content_hmac.trim().as_bytes()) {
            Ok(candidate) => candidate,
            Err(_) => return false,
        };
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(body);
        mac.verify_slice(&candidate).is_ok()
    }
}
