/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * CC Evidence SDK is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! Hash helpers shared by backends and the event-log replay.

use crate::error::EvidenceError;
use crate::tcg::TcgAlgorithmId;
use openssl::hash::{Hasher, MessageDigest};

/// Size of the report-data field bound into TDX and SEV-SNP reports.
pub const REPORT_DATA_LEN: usize = 64;

/// Map a TCG algorithm identifier onto an openssl message digest.
///
/// # Errors
/// Returns `EvidenceError::UnsupportedAlgorithm` for identifiers without a
/// digest implementation.
pub fn message_digest(algo_id: TcgAlgorithmId) -> Result<MessageDigest, EvidenceError> {
    match algo_id {
        TcgAlgorithmId::Sha1 => Ok(MessageDigest::sha1()),
        TcgAlgorithmId::Sha256 => Ok(MessageDigest::sha256()),
        TcgAlgorithmId::Sha384 => Ok(MessageDigest::sha384()),
        TcgAlgorithmId::Sha512 => Ok(MessageDigest::sha512()),
        TcgAlgorithmId::Sm3 => Ok(MessageDigest::sm3()),
        TcgAlgorithmId::Unknown => Err(EvidenceError::UnsupportedAlgorithm(algo_id)),
    }
}

/// Compress a freshness nonce and caller data into the 64-byte report-data
/// field: `SHA-512(nonce || user_data)`. Either part may be absent; the
/// hash of the empty string is still a valid binding.
///
/// # Errors
/// Returns `EvidenceError::InternalError` when the digest computation fails.
pub fn report_data(
    nonce: Option<&[u8]>,
    user_data: Option<&[u8]>,
) -> Result<[u8; REPORT_DATA_LEN], EvidenceError> {
    let mut hasher = Hasher::new(MessageDigest::sha512())
        .map_err(|e| EvidenceError::InternalError(format!("Failed to create hasher: {}", e)))?;

    hasher
        .update(nonce.unwrap_or_default())
        .map_err(|e| EvidenceError::InternalError(format!("Failed to hash nonce: {}", e)))?;
    hasher
        .update(user_data.unwrap_or_default())
        .map_err(|e| EvidenceError::InternalError(format!("Failed to hash user data: {}", e)))?;

    let digest = hasher
        .finish()
        .map_err(|e| EvidenceError::InternalError(format!("Failed to finish hasher: {}", e)))?;

    let mut out = [0u8; REPORT_DATA_LEN];
    out.copy_from_slice(&digest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_data_is_deterministic() {
        let a = report_data(Some(b"nonce"), Some(b"data")).unwrap();
        let b = report_data(Some(b"nonce"), Some(b"data")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_report_data_binds_both_parts() {
        let base = report_data(Some(b"nonce"), Some(b"data")).unwrap();
        assert_ne!(base, report_data(Some(b"nonce"), Some(b"other")).unwrap());
        assert_ne!(base, report_data(Some(b"other"), Some(b"data")).unwrap());
    }

    #[test]
    fn test_report_data_empty_inputs() {
        // SHA-512 of the empty string.
        let empty = report_data(None, None).unwrap();
        assert_eq!(
            hex::encode(empty),
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
             47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
        );
    }

    #[test]
    fn test_message_digest_rejects_unknown() {
        assert!(message_digest(TcgAlgorithmId::Unknown).is_err());
        assert!(message_digest(TcgAlgorithmId::Sha384).is_ok());
    }
}
