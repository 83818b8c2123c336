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

use evidence_api::EvidenceError;
use std::path::PathBuf;

// Persistent handle range reserved for keys,
// per registry-of-reserved-tpm-2.0-handles-and-localities.
const TPM_KEY_HANDLE_MIN: u32 = 0x8100_0000;
const TPM_KEY_HANDLE_MAX: u32 = 0x81FF_FFFF;

/// Measured-boot log exported through securityfs.
pub const DEFAULT_TPM_EVENT_LOG_PATH: &str = "/sys/kernel/security/tpm0/binary_bios_measurements";
/// Kernel resource-managed TPM device.
pub const DEFAULT_TCTI: &str = "device:/dev/tpmrm0";
/// Conventional persistent handle for the attestation key.
pub const DEFAULT_AK_HANDLE: u32 = 0x8101_0002;

/// PCR bank and index selection a quote covers.
#[derive(Debug, Clone)]
pub struct PcrSelectionConfig {
    pub banks: Vec<u32>,
    pub hash_alg: String,
}

impl Default for PcrSelectionConfig {
    fn default() -> Self {
        Self {
            banks: (0..=7).collect(),
            hash_alg: "sha256".to_string(),
        }
    }
}

/// Signature scheme the TPM signs quotes with.
#[derive(Debug, Clone)]
pub struct QuoteSignatureScheme {
    pub signature_alg: String,
    pub hash_alg: String,
}

#[derive(Debug, Clone)]
pub struct TpmAttesterConfig {
    pub tcti: String,
    pub ak_handle: u32,
    pub pcr_selection: PcrSelectionConfig,
    pub quote_signature_scheme: Option<QuoteSignatureScheme>,
    pub event_log_path: PathBuf,
}

impl Default for TpmAttesterConfig {
    fn default() -> Self {
        Self {
            tcti: DEFAULT_TCTI.to_string(),
            ak_handle: DEFAULT_AK_HANDLE,
            pcr_selection: PcrSelectionConfig::default(),
            quote_signature_scheme: None,
            event_log_path: PathBuf::from(DEFAULT_TPM_EVENT_LOG_PATH),
        }
    }
}

impl TpmAttesterConfig {
    /// Check value ranges before touching the TPM.
    ///
    /// # Errors
    /// Returns `EvidenceError::InputError` for an attestation key handle
    /// outside the persistent-key range or a PCR index above 23.
    pub fn validate(&self) -> Result<(), EvidenceError> {
        if !(TPM_KEY_HANDLE_MIN..=TPM_KEY_HANDLE_MAX).contains(&self.ak_handle) {
            return Err(EvidenceError::InputError(format!(
                "AK handle 0x{:08X} outside persistent key range 0x{:08X}-0x{:08X}",
                self.ak_handle, TPM_KEY_HANDLE_MIN, TPM_KEY_HANDLE_MAX
            )));
        }

        if self.pcr_selection.banks.is_empty() {
            return Err(EvidenceError::InputError(
                "PCR selection must name at least one register".to_string(),
            ));
        }
        if let Some(invalid) = self.pcr_selection.banks.iter().find(|&&bank| bank > 23) {
            return Err(EvidenceError::InputError(format!(
                "Invalid PCR index {} in configuration, PCR indices must be between 0 and 23",
                invalid
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TpmAttesterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_handle() {
        let config = TpmAttesterConfig {
            ak_handle: 0x0100_0000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_pcr_index() {
        let config = TpmAttesterConfig {
            pcr_selection: PcrSelectionConfig {
                banks: vec![0, 24],
                hash_alg: "sha256".to_string(),
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_selection() {
        let config = TpmAttesterConfig {
            pcr_selection: PcrSelectionConfig {
                banks: vec![],
                hash_alg: "sha256".to_string(),
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
