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

//! Event-log structures surrounding the per-event data model.

use serde::Serialize;

/// "Spec ID Event03" including the NUL terminator.
pub const SPEC_ID_EVENT_SIGNATURE_03: &[u8] = &[
    0x53, 0x70, 0x65, 0x63, 0x20, // "Spec "
    0x49, 0x44, 0x20, // "ID "
    0x45, 0x76, 0x65, 0x6E, 0x74, // "Event"
    0x30, 0x33, // "03"
    0x00, // NUL terminator
];

/// Register index value that terminates a padded log (CCEL tables are
/// 0xFF-padded after the last event).
pub const LOG_TERMINATOR_INDEX: u32 = 0xFFFF_FFFF;

/// Largest digest-bank count a single event may carry
/// (sha1, sha256, sha384, sha512, sm3).
pub const MAX_DIGEST_COUNT: u32 = 5;

/// Which on-disk flavor the log bytes come from.
///
/// The binary event format is identical; the flavors differ in how the
/// per-event register field maps onto measurement registers. CCEL tables
/// number their measurement registers from 1 (0 is the build-time
/// measurement, which never appears in the log), so the parsed entry index
/// is the raw field minus one. PC-Client logs carry the PCR index directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLogFormat {
    PcClient,
    Ccel,
}

impl EventLogFormat {
    /// Map a raw on-disk register field onto the register index the parsed
    /// entry reports.
    pub fn map_register_index(&self, raw: u32) -> u32 {
        match self {
            EventLogFormat::PcClient => raw,
            EventLogFormat::Ccel => raw.saturating_sub(1),
        }
    }
}

/// One row of the algorithm table inside the Specification ID event.
#[derive(Debug, Clone, Serialize)]
pub struct TcgEfiSpecIdEventAlgorithmSize {
    pub algorithm_id: u16,
    pub digest_size: u16,
}

/// Parsed body of the TCG Specification ID header event.
///
/// The algorithm table governs digest sizes for the rest of the log.
#[derive(Debug, Clone, Serialize)]
pub struct EfiSpecIdEvent {
    pub signature: String,
    pub platform_class: u32,
    pub spec_version_minor: u8,
    pub spec_version_major: u8,
    pub spec_errata: u8,
    pub uintn_size: u8,
    pub digest_sizes: Vec<TcgEfiSpecIdEventAlgorithmSize>,
    pub vendor_info: Vec<u8>,
}

impl EfiSpecIdEvent {
    /// Digest size for an algorithm id, when the header lists it.
    pub fn digest_size(&self, algorithm_id: u16) -> Option<u16> {
        self.digest_sizes
            .iter()
            .find(|entry| entry.algorithm_id == algorithm_id)
            .map(|entry| entry.digest_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_index_mapping() {
        assert_eq!(EventLogFormat::PcClient.map_register_index(0), 0);
        assert_eq!(EventLogFormat::PcClient.map_register_index(7), 7);
        assert_eq!(EventLogFormat::Ccel.map_register_index(1), 0);
        assert_eq!(EventLogFormat::Ccel.map_register_index(4), 3);
        assert_eq!(EventLogFormat::Ccel.map_register_index(0), 0);
    }

    #[test]
    fn test_spec_id_digest_size_lookup() {
        let event = EfiSpecIdEvent {
            signature: "Spec ID Event03".to_string(),
            platform_class: 0,
            spec_version_minor: 0,
            spec_version_major: 2,
            spec_errata: 0,
            uintn_size: 2,
            digest_sizes: vec![TcgEfiSpecIdEventAlgorithmSize {
                algorithm_id: 0x000B,
                digest_size: 32,
            }],
            vendor_info: vec![],
        };
        assert_eq!(event.digest_size(0x000B), Some(32));
        assert_eq!(event.digest_size(0x000C), None);
    }
}
