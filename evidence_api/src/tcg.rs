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

//! TCG data model: algorithm registry identifiers, digests, and the
//! PC-Client event type registry shared by the event-log machinery.

use crate::error::EvidenceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// TPM 2.0 algorithm registry identifiers used across evidence payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum TcgAlgorithmId {
    Sha1 = 0x0004,
    Sha256 = 0x000B,
    Sha384 = 0x000C,
    Sha512 = 0x000D,
    Sm3 = 0x0012,
    Unknown = 0xFFFF,
}

impl From<u16> for TcgAlgorithmId {
    fn from(value: u16) -> Self {
        match value {
            0x0004 => TcgAlgorithmId::Sha1,
            0x000B => TcgAlgorithmId::Sha256,
            0x000C => TcgAlgorithmId::Sha384,
            0x000D => TcgAlgorithmId::Sha512,
            0x0012 => TcgAlgorithmId::Sm3,
            _ => TcgAlgorithmId::Unknown,
        }
    }
}

impl TcgAlgorithmId {
    /// Parse a lowercase digest name ("sha256", "sm3", ...).
    ///
    /// # Errors
    /// Returns `EvidenceError::InputError` for names outside the registry.
    pub fn from_name(name: &str) -> Result<Self, EvidenceError> {
        match name {
            "sha1" => Ok(TcgAlgorithmId::Sha1),
            "sha256" => Ok(TcgAlgorithmId::Sha256),
            "sha384" => Ok(TcgAlgorithmId::Sha384),
            "sha512" => Ok(TcgAlgorithmId::Sha512),
            "sm3" => Ok(TcgAlgorithmId::Sm3),
            other => Err(EvidenceError::InputError(format!(
                "Unsupported algorithm name: {}",
                other
            ))),
        }
    }

    /// Canonical `TPM_ALG_*` registry name.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            TcgAlgorithmId::Sha1 => "TPM_ALG_SHA1",
            TcgAlgorithmId::Sha256 => "TPM_ALG_SHA256",
            TcgAlgorithmId::Sha384 => "TPM_ALG_SHA384",
            TcgAlgorithmId::Sha512 => "TPM_ALG_SHA512",
            TcgAlgorithmId::Sm3 => "TPM_ALG_SM3_256",
            TcgAlgorithmId::Unknown => "TPM_ALG_ERROR",
        }
    }

    /// Lowercase digest name as used in configuration files.
    pub fn digest_name(&self) -> &'static str {
        match self {
            TcgAlgorithmId::Sha1 => "sha1",
            TcgAlgorithmId::Sha256 => "sha256",
            TcgAlgorithmId::Sha384 => "sha384",
            TcgAlgorithmId::Sha512 => "sha512",
            TcgAlgorithmId::Sm3 => "sm3",
            TcgAlgorithmId::Unknown => "unknown",
        }
    }

    /// Digest output size in bytes, 0 for unknown identifiers.
    pub fn digest_size(&self) -> u16 {
        match self {
            TcgAlgorithmId::Sha1 => 20,
            TcgAlgorithmId::Sha256 => 32,
            TcgAlgorithmId::Sha384 => 48,
            TcgAlgorithmId::Sha512 => 64,
            TcgAlgorithmId::Sm3 => 32,
            TcgAlgorithmId::Unknown => 0,
        }
    }
}

impl fmt::Display for TcgAlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.algorithm_name())
    }
}

/// Algorithm identifier together with its registry name, as returned by
/// `EvidenceApi::get_default_algorithm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcgAlgorithm {
    pub algo_id: TcgAlgorithmId,
    pub name: String,
}

impl From<TcgAlgorithmId> for TcgAlgorithm {
    fn from(algo_id: TcgAlgorithmId) -> Self {
        Self {
            algo_id,
            name: algo_id.algorithm_name().to_string(),
        }
    }
}

/// One digest value: algorithm identifier plus raw hash bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcgDigest {
    pub algo_id: TcgAlgorithmId,
    pub hash: Vec<u8>,
}

impl TcgDigest {
    pub fn new(algo_id: TcgAlgorithmId, hash: Vec<u8>) -> Self {
        Self { algo_id, hash }
    }

    /// Hex rendering of the hash value.
    pub fn hash_hex(&self) -> String {
        hex::encode(&self.hash)
    }
}

/// TCG PC-Client event type.
///
/// Raw values outside the registry are preserved as-is so a log produced
/// against a newer revision still parses and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TcgEventType(pub u32);

impl TcgEventType {
    pub const EV_PREBOOT_CERT: TcgEventType = TcgEventType(0x0000_0000);
    pub const EV_POST_CODE: TcgEventType = TcgEventType(0x0000_0001);
    pub const EV_UNUSED: TcgEventType = TcgEventType(0x0000_0002);
    pub const EV_NO_ACTION: TcgEventType = TcgEventType(0x0000_0003);
    pub const EV_SEPARATOR: TcgEventType = TcgEventType(0x0000_0004);
    pub const EV_ACTION: TcgEventType = TcgEventType(0x0000_0005);
    pub const EV_EVENT_TAG: TcgEventType = TcgEventType(0x0000_0006);
    pub const EV_S_CRTM_CONTENTS: TcgEventType = TcgEventType(0x0000_0007);
    pub const EV_S_CRTM_VERSION: TcgEventType = TcgEventType(0x0000_0008);
    pub const EV_CPU_MICROCODE: TcgEventType = TcgEventType(0x0000_0009);
    pub const EV_PLATFORM_CONFIG_FLAGS: TcgEventType = TcgEventType(0x0000_000A);
    pub const EV_TABLE_OF_DEVICES: TcgEventType = TcgEventType(0x0000_000B);
    pub const EV_COMPACT_HASH: TcgEventType = TcgEventType(0x0000_000C);
    pub const EV_IPL: TcgEventType = TcgEventType(0x0000_000D);
    pub const EV_IPL_PARTITION_DATA: TcgEventType = TcgEventType(0x0000_000E);
    pub const EV_NONHOST_CODE: TcgEventType = TcgEventType(0x0000_000F);
    pub const EV_NONHOST_CONFIG: TcgEventType = TcgEventType(0x0000_0010);
    pub const EV_NONHOST_INFO: TcgEventType = TcgEventType(0x0000_0011);
    pub const EV_OMIT_BOOT_DEVICE_EVENTS: TcgEventType = TcgEventType(0x0000_0012);

    pub const EV_EFI_EVENT_BASE: TcgEventType = TcgEventType(0x8000_0000);
    pub const EV_EFI_VARIABLE_DRIVER_CONFIG: TcgEventType = TcgEventType(0x8000_0001);
    pub const EV_EFI_VARIABLE_BOOT: TcgEventType = TcgEventType(0x8000_0002);
    pub const EV_EFI_BOOT_SERVICES_APPLICATION: TcgEventType = TcgEventType(0x8000_0003);
    pub const EV_EFI_BOOT_SERVICES_DRIVER: TcgEventType = TcgEventType(0x8000_0004);
    pub const EV_EFI_RUNTIME_SERVICES_DRIVER: TcgEventType = TcgEventType(0x8000_0005);
    pub const EV_EFI_GPT_EVENT: TcgEventType = TcgEventType(0x8000_0006);
    pub const EV_EFI_ACTION: TcgEventType = TcgEventType(0x8000_0007);
    pub const EV_EFI_PLATFORM_FIRMWARE_BLOB: TcgEventType = TcgEventType(0x8000_0008);
    pub const EV_EFI_HANDOFF_TABLES: TcgEventType = TcgEventType(0x8000_0009);
    pub const EV_EFI_PLATFORM_FIRMWARE_BLOB2: TcgEventType = TcgEventType(0x8000_000A);
    pub const EV_EFI_HANDOFF_TABLES2: TcgEventType = TcgEventType(0x8000_000B);
    pub const EV_EFI_VARIABLE_BOOT2: TcgEventType = TcgEventType(0x8000_000C);
    pub const EV_EFI_VARIABLE_AUTHORITY: TcgEventType = TcgEventType(0x8000_00E0);

    /// Registry name for known types.
    pub fn name(&self) -> Option<&'static str> {
        let name = match *self {
            Self::EV_PREBOOT_CERT => "EV_PREBOOT_CERT",
            Self::EV_POST_CODE => "EV_POST_CODE",
            Self::EV_UNUSED => "EV_UNUSED",
            Self::EV_NO_ACTION => "EV_NO_ACTION",
            Self::EV_SEPARATOR => "EV_SEPARATOR",
            Self::EV_ACTION => "EV_ACTION",
            Self::EV_EVENT_TAG => "EV_EVENT_TAG",
            Self::EV_S_CRTM_CONTENTS => "EV_S_CRTM_CONTENTS",
            Self::EV_S_CRTM_VERSION => "EV_S_CRTM_VERSION",
            Self::EV_CPU_MICROCODE => "EV_CPU_MICROCODE",
            Self::EV_PLATFORM_CONFIG_FLAGS => "EV_PLATFORM_CONFIG_FLAGS",
            Self::EV_TABLE_OF_DEVICES => "EV_TABLE_OF_DEVICES",
            Self::EV_COMPACT_HASH => "EV_COMPACT_HASH",
            Self::EV_IPL => "EV_IPL",
            Self::EV_IPL_PARTITION_DATA => "EV_IPL_PARTITION_DATA",
            Self::EV_NONHOST_CODE => "EV_NONHOST_CODE",
            Self::EV_NONHOST_CONFIG => "EV_NONHOST_CONFIG",
            Self::EV_NONHOST_INFO => "EV_NONHOST_INFO",
            Self::EV_OMIT_BOOT_DEVICE_EVENTS => "EV_OMIT_BOOT_DEVICE_EVENTS",
            Self::EV_EFI_EVENT_BASE => "EV_EFI_EVENT_BASE",
            Self::EV_EFI_VARIABLE_DRIVER_CONFIG => "EV_EFI_VARIABLE_DRIVER_CONFIG",
            Self::EV_EFI_VARIABLE_BOOT => "EV_EFI_VARIABLE_BOOT",
            Self::EV_EFI_BOOT_SERVICES_APPLICATION => "EV_EFI_BOOT_SERVICES_APPLICATION",
            Self::EV_EFI_BOOT_SERVICES_DRIVER => "EV_EFI_BOOT_SERVICES_DRIVER",
            Self::EV_EFI_RUNTIME_SERVICES_DRIVER => "EV_EFI_RUNTIME_SERVICES_DRIVER",
            Self::EV_EFI_GPT_EVENT => "EV_EFI_GPT_EVENT",
            Self::EV_EFI_ACTION => "EV_EFI_ACTION",
            Self::EV_EFI_PLATFORM_FIRMWARE_BLOB => "EV_EFI_PLATFORM_FIRMWARE_BLOB",
            Self::EV_EFI_HANDOFF_TABLES => "EV_EFI_HANDOFF_TABLES",
            Self::EV_EFI_PLATFORM_FIRMWARE_BLOB2 => "EV_EFI_PLATFORM_FIRMWARE_BLOB2",
            Self::EV_EFI_HANDOFF_TABLES2 => "EV_EFI_HANDOFF_TABLES2",
            Self::EV_EFI_VARIABLE_BOOT2 => "EV_EFI_VARIABLE_BOOT2",
            Self::EV_EFI_VARIABLE_AUTHORITY => "EV_EFI_VARIABLE_AUTHORITY",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for TcgEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "UNKNOWN(0x{:08X})", self.0),
        }
    }
}

/// One parsed measured-boot event.
///
/// `register_index` is the measurement register the event extends (PCR for
/// TPM logs, RTMR for CCEL logs after index mapping). The first entry of a
/// log is the TCG 1.2-format Specification ID header and carries a single
/// SHA-1 digest bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcgEventLogEntry {
    pub event_number: u32,
    pub register_index: u32,
    pub event_type: TcgEventType,
    pub digests: Vec<TcgDigest>,
    pub event: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_id_registry_values() {
        assert_eq!(TcgAlgorithmId::from(0x0004), TcgAlgorithmId::Sha1);
        assert_eq!(TcgAlgorithmId::from(0x000B), TcgAlgorithmId::Sha256);
        assert_eq!(TcgAlgorithmId::from(0x000C), TcgAlgorithmId::Sha384);
        assert_eq!(TcgAlgorithmId::from(0x000D), TcgAlgorithmId::Sha512);
        assert_eq!(TcgAlgorithmId::from(0x0012), TcgAlgorithmId::Sm3);
        assert_eq!(TcgAlgorithmId::from(0x0001), TcgAlgorithmId::Unknown);
    }

    #[test]
    fn test_algorithm_digest_sizes() {
        assert_eq!(TcgAlgorithmId::Sha1.digest_size(), 20);
        assert_eq!(TcgAlgorithmId::Sha256.digest_size(), 32);
        assert_eq!(TcgAlgorithmId::Sha384.digest_size(), 48);
        assert_eq!(TcgAlgorithmId::Sha512.digest_size(), 64);
        assert_eq!(TcgAlgorithmId::Sm3.digest_size(), 32);
        assert_eq!(TcgAlgorithmId::Unknown.digest_size(), 0);
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(TcgAlgorithmId::Sha384.algorithm_name(), "TPM_ALG_SHA384");
        assert_eq!(TcgAlgorithmId::Sha384.digest_name(), "sha384");
        assert_eq!(TcgAlgorithmId::from_name("sha256").unwrap(), TcgAlgorithmId::Sha256);
        assert!(TcgAlgorithmId::from_name("md5").is_err());
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(TcgEventType::EV_NO_ACTION.to_string(), "EV_NO_ACTION");
        assert_eq!(TcgEventType::EV_SEPARATOR.to_string(), "EV_SEPARATOR");
        assert_eq!(
            TcgEventType::EV_EFI_VARIABLE_AUTHORITY.to_string(),
            "EV_EFI_VARIABLE_AUTHORITY"
        );
        // Unrecognized values keep their raw rendering instead of failing.
        assert_eq!(TcgEventType(0x1234_5678).to_string(), "UNKNOWN(0x12345678)");
    }

    #[test]
    fn test_digest_hex() {
        let digest = TcgDigest::new(TcgAlgorithmId::Sha256, vec![0xAB, 0xCD]);
        assert_eq!(digest.hash_hex(), "abcd");
    }
}
