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

//! Binary event-log parsing and windowed selection.
//!
//! A log opens with the TCG 1.2-format Specification ID event whose body
//! carries the algorithm table; every following entry is a TCG_PCR_EVENT2.
//! Parsing stops at the end of data or at the 0xFFFFFFFF padding marker
//! CCEL tables carry after their last event.

use crate::byte_reader::ByteReader;
use crate::model::{
    EfiSpecIdEvent, EventLogFormat, TcgEfiSpecIdEventAlgorithmSize, LOG_TERMINATOR_INDEX,
    MAX_DIGEST_COUNT, SPEC_ID_EVENT_SIGNATURE_03,
};
use evidence_api::{EvidenceError, TcgAlgorithmId, TcgDigest, TcgEventLogEntry, TcgEventType};

const SHA1_DIGEST_SIZE: usize = 20;

/// A measured-boot event log: raw bytes plus the parsed entry sequence.
pub struct EventLog {
    format: EventLogFormat,
    data: Vec<u8>,
    spec_id_header: Option<EfiSpecIdEvent>,
    entries: Vec<TcgEventLogEntry>,
}

impl EventLog {
    pub fn new(format: EventLogFormat, data: Vec<u8>) -> Self {
        Self {
            format,
            data,
            spec_id_header: None,
            entries: Vec::new(),
        }
    }

    /// Parsed Specification ID header, available after [`parse`](Self::parse).
    pub fn spec_id_header(&self) -> Option<&EfiSpecIdEvent> {
        self.spec_id_header.as_ref()
    }

    /// Parsed entries, available after [`parse`](Self::parse).
    pub fn entries(&self) -> &[TcgEventLogEntry] {
        &self.entries
    }

    /// Total number of parsed events (the Specification ID header included).
    pub fn count(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Parse the raw log data into structured entries.
    ///
    /// # Errors
    /// Returns `EvidenceError::InputError` for an empty log, a first event
    /// that is not a valid Specification ID event, a digest bank whose
    /// algorithm has no known size, or any truncation.
    pub fn parse(&mut self) -> Result<&mut Self, EvidenceError> {
        if self.data.is_empty() {
            return Err(EvidenceError::InputError(
                "No event log data provided".to_string(),
            ));
        }

        let data = std::mem::take(&mut self.data);
        let mut reader = ByteReader::new(&data);
        let mut entries = Vec::new();

        let result: Result<(), EvidenceError> = (|| {
            entries.push(self.parse_spec_id_event(&mut reader)?);

            while !reader.is_end() {
                let raw_register = reader.read_u32().map_err(|e| {
                    EvidenceError::InputError(format!(
                        "Failed to read register index of event {}: {}",
                        entries.len(),
                        e
                    ))
                })?;
                if raw_register == LOG_TERMINATOR_INDEX {
                    break;
                }
                entries.push(self.parse_event2(
                    &mut reader,
                    raw_register,
                    entries.len() as u32,
                )?);
            }
            Ok(())
        })();

        self.data = data;
        result?;

        self.entries = entries;
        Ok(self)
    }

    /// Collect a window of parsed events.
    ///
    /// `start` is a 0-based index, `count` a number of events. Omitting both
    /// yields every event; omitting only `count` yields everything from
    /// `start`; a `count` past the end is clamped to the tail.
    ///
    /// # Errors
    /// Returns `EvidenceError::InputError` when `start` lies beyond the last
    /// event or `count` is zero.
    pub fn select(
        &self,
        start: Option<u32>,
        count: Option<u32>,
    ) -> Result<Vec<TcgEventLogEntry>, EvidenceError> {
        let total = self.entries.len() as u32;
        let begin = start.unwrap_or(0);
        if begin >= total {
            return Err(EvidenceError::InputError(format!(
                "Invalid start index {}: the log holds {} events",
                begin, total
            )));
        }

        let end = match count {
            Some(0) => {
                return Err(EvidenceError::InputError(
                    "Invalid count 0: at least one event must be selected".to_string(),
                ))
            }
            Some(c) => begin.saturating_add(c).min(total),
            None => total,
        };

        Ok(self.entries[begin as usize..end as usize].to_vec())
    }

    /// Parse the TCG 1.2-format Specification ID event that opens the log
    /// and record its algorithm table.
    fn parse_spec_id_event(
        &mut self,
        reader: &mut ByteReader,
    ) -> Result<TcgEventLogEntry, EvidenceError> {
        let raw_register = reader
            .read_u32()
            .map_err(|e| EvidenceError::InputError(format!("Failed to read header register: {}", e)))?;
        let event_type = TcgEventType(reader.read_u32()?);
        if event_type != TcgEventType::EV_NO_ACTION {
            return Err(EvidenceError::InputError(format!(
                "First event must be EV_NO_ACTION, found {}",
                event_type
            )));
        }

        let digest = reader.read_bytes(SHA1_DIGEST_SIZE)?;
        let event_size = reader.read_u32()?;
        let event = reader.read_bytes(event_size as usize).map_err(|e| {
            EvidenceError::InputError(format!("Failed to read Spec ID event body: {}", e))
        })?;

        self.spec_id_header = Some(Self::parse_spec_id_body(&event)?);

        Ok(TcgEventLogEntry {
            event_number: 0,
            register_index: self.format.map_register_index(raw_register),
            event_type,
            digests: vec![TcgDigest::new(TcgAlgorithmId::Sha1, digest)],
            event,
        })
    }

    fn parse_spec_id_body(event: &[u8]) -> Result<EfiSpecIdEvent, EvidenceError> {
        let mut reader = ByteReader::new(event);

        let signature = reader.read_bytes(SPEC_ID_EVENT_SIGNATURE_03.len())?;
        if signature != SPEC_ID_EVENT_SIGNATURE_03 {
            return Err(EvidenceError::InputError(format!(
                "Unrecognized Spec ID event signature: {:?}",
                String::from_utf8_lossy(&signature)
            )));
        }

        let platform_class = reader.read_u32()?;
        let spec_version_minor = reader.read_u8()?;
        let spec_version_major = reader.read_u8()?;
        let spec_errata = reader.read_u8()?;
        let uintn_size = reader.read_u8()?;

        let algorithm_count = reader.read_u32()?;
        if algorithm_count == 0 || algorithm_count > MAX_DIGEST_COUNT {
            return Err(EvidenceError::InputError(format!(
                "Invalid algorithm count in Spec ID event: {}",
                algorithm_count
            )));
        }

        let mut digest_sizes = Vec::with_capacity(algorithm_count as usize);
        for _ in 0..algorithm_count {
            let algorithm_id = reader.read_u16()?;
            let digest_size = reader.read_u16()?;
            digest_sizes.push(TcgEfiSpecIdEventAlgorithmSize {
                algorithm_id,
                digest_size,
            });
        }

        let vendor_info_size = reader.read_u8()?;
        let vendor_info = if vendor_info_size > 0 {
            reader.read_bytes(vendor_info_size as usize)?
        } else {
            Vec::new()
        };

        Ok(EfiSpecIdEvent {
            signature: String::from_utf8_lossy(SPEC_ID_EVENT_SIGNATURE_03)
                .trim_end_matches('\0')
                .to_string(),
            platform_class,
            spec_version_minor,
            spec_version_major,
            spec_errata,
            uintn_size,
            digest_sizes,
            vendor_info,
        })
    }

    /// Parse one TCG_PCR_EVENT2 entry; the register field has already been
    /// consumed by the caller's terminator check.
    fn parse_event2(
        &self,
        reader: &mut ByteReader,
        raw_register: u32,
        event_number: u32,
    ) -> Result<TcgEventLogEntry, EvidenceError> {
        let event_type = TcgEventType(reader.read_u32().map_err(|e| {
            EvidenceError::InputError(format!(
                "Failed to read event type of event {}: {}",
                event_number, e
            ))
        })?);

        let digest_count = reader.read_u32().map_err(|e| {
            EvidenceError::InputError(format!(
                "Failed to read digest count of event {}: {}",
                event_number, e
            ))
        })?;
        if digest_count == 0 || digest_count > MAX_DIGEST_COUNT {
            return Err(EvidenceError::InputError(format!(
                "Invalid digest count {} in event {}",
                digest_count, event_number
            )));
        }

        let mut digests = Vec::with_capacity(digest_count as usize);
        for _ in 0..digest_count {
            let algorithm_id = reader.read_u16()?;
            let digest_size = self.digest_size_for(algorithm_id, event_number)?;
            let hash = reader.read_bytes(digest_size).map_err(|e| {
                EvidenceError::InputError(format!(
                    "Failed to read digest of event {}: {}",
                    event_number, e
                ))
            })?;
            digests.push(TcgDigest::new(TcgAlgorithmId::from(algorithm_id), hash));
        }

        let event_size = reader.read_u32().map_err(|e| {
            EvidenceError::InputError(format!(
                "Failed to read event size of event {}: {}",
                event_number, e
            ))
        })?;
        if event_size as u64 > reader.remaining() {
            return Err(EvidenceError::InputError(format!(
                "Event size {} exceeds remaining data {} in event {}",
                event_size,
                reader.remaining(),
                event_number
            )));
        }
        let event = reader.read_bytes(event_size as usize)?;

        Ok(TcgEventLogEntry {
            event_number,
            register_index: self.format.map_register_index(raw_register),
            event_type,
            digests,
            event,
        })
    }

    /// Digest size governed by the Spec ID algorithm table, falling back to
    /// the registry size for an identifier the header does not list.
    fn digest_size_for(&self, algorithm_id: u16, event_number: u32) -> Result<usize, EvidenceError> {
        if let Some(size) = self
            .spec_id_header
            .as_ref()
            .and_then(|header| header.digest_size(algorithm_id))
        {
            return Ok(size as usize);
        }

        let registry_size = TcgAlgorithmId::from(algorithm_id).digest_size();
        if registry_size > 0 {
            return Ok(registry_size as usize);
        }

        Err(EvidenceError::InputError(format!(
            "No digest size known for algorithm 0x{:04X} in event {}",
            algorithm_id, event_number
        )))
    }
}
