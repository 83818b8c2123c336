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

//! Confidential-computing hardware mechanism enumeration and detection.

use crate::error::EvidenceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// TPM character device.
pub const TEE_TPM_PATH: &str = "/dev/tpm0";
/// TDX 1.0 guest device.
pub const TEE_TDX_1_0_PATH: &str = "/dev/tdx-guest";
/// TDX 1.5 guest device.
pub const TEE_TDX_1_5_PATH: &str = "/dev/tdx_guest";
/// SEV-SNP guest device.
pub const TEE_SEV_PATH: &str = "/dev/sev-guest";
/// virtCCA TSI device.
pub const TEE_CCA_PATH: &str = "/dev/tsi";

/// Closed set of supported confidential-computing mechanisms.
///
/// Raw values are part of the public contract and never change:
/// `None = -1`, `Tpm = 0`, `Tdx = 1`, `Sev = 2`, `Cca = 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum CcType {
    None = -1,
    Tpm = 0,
    Tdx = 1,
    Sev = 2,
    Cca = 3,
}

impl CcType {
    /// Canonical short name of the mechanism.
    pub const fn name(&self) -> &'static str {
        match self {
            CcType::None => "NONE",
            CcType::Tpm => "TPM",
            CcType::Tdx => "TDX",
            CcType::Sev => "SEV",
            CcType::Cca => "CCA",
        }
    }

    /// Stable raw value of the mechanism.
    pub const fn to_raw(&self) -> i32 {
        *self as i32
    }

    /// Convert a raw mechanism value back into the closed set.
    ///
    /// A value outside the set is an explicit [`EvidenceError::UnknownCcType`]
    /// so callers cannot confuse "no CC hardware" with "unrecognized value".
    ///
    /// # Errors
    /// Returns `EvidenceError::UnknownCcType` for any value outside
    /// {-1, 0, 1, 2, 3}.
    pub fn from_raw(value: i32) -> Result<Self, EvidenceError> {
        match value {
            -1 => Ok(CcType::None),
            0 => Ok(CcType::Tpm),
            1 => Ok(CcType::Tdx),
            2 => Ok(CcType::Sev),
            3 => Ok(CcType::Cca),
            other => Err(EvidenceError::UnknownCcType(other)),
        }
    }

    /// Probe well-known device nodes and report the mechanism of the
    /// running platform, `CcType::None` when nothing matches.
    pub fn detect() -> CcType {
        if Path::new(TEE_TPM_PATH).exists() {
            CcType::Tpm
        } else if Path::new(TEE_TDX_1_0_PATH).exists() || Path::new(TEE_TDX_1_5_PATH).exists() {
            CcType::Tdx
        } else if Path::new(TEE_SEV_PATH).exists() {
            CcType::Sev
        } else if Path::new(TEE_CCA_PATH).exists() {
            CcType::Cca
        } else {
            CcType::None
        }
    }
}

impl fmt::Display for CcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names() {
        assert_eq!(CcType::None.name(), "NONE");
        assert_eq!(CcType::Tpm.name(), "TPM");
        assert_eq!(CcType::Tdx.name(), "TDX");
        assert_eq!(CcType::Sev.name(), "SEV");
        assert_eq!(CcType::Cca.name(), "CCA");
    }

    #[test]
    fn test_display_matches_name() {
        for cc_type in [CcType::None, CcType::Tpm, CcType::Tdx, CcType::Sev, CcType::Cca] {
            assert_eq!(cc_type.to_string(), cc_type.name());
        }
    }

    #[test]
    fn test_raw_round_trip() {
        for (raw, expected) in [
            (-1, CcType::None),
            (0, CcType::Tpm),
            (1, CcType::Tdx),
            (2, CcType::Sev),
            (3, CcType::Cca),
        ] {
            let cc_type = CcType::from_raw(raw).unwrap();
            assert_eq!(cc_type, expected);
            assert_eq!(cc_type.to_raw(), raw);
        }
    }

    #[test]
    fn test_unknown_raw_value_is_an_error() {
        for raw in [-2, 4, 5, 42, i32::MAX, i32::MIN] {
            match CcType::from_raw(raw) {
                Err(EvidenceError::UnknownCcType(value)) => assert_eq!(value, raw),
                other => panic!("expected UnknownCcType for {}, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_detect_does_not_panic() {
        // Result depends on the host; only the closed-set property is stable.
        let detected = CcType::detect();
        assert!(CcType::from_raw(detected.to_raw()).is_ok());
    }
}
