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

use evidence_api::{EvidenceError, TcgAlgorithmId, TcgEventType};
use openssl::hash::{Hasher, MessageDigest};
use tcg_eventlog::{replay_event_log, EventLog, EventLogFormat, ReplayError};

const TPM_ALG_SHA1: u16 = 0x0004;
const TPM_ALG_SHA256: u16 = 0x000B;
const TPM_ALG_SHA384: u16 = 0x000C;
// Listed in a Spec ID header below but absent from the digest registry.
const TPM_ALG_UNLISTED: u16 = 0x0010;

/// Build the TCG 1.2-format Specification ID event opening a log.
fn spec_id_event(algorithms: &[(u16, u16)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"Spec ID Event03\0");
    body.extend_from_slice(&0u32.to_le_bytes()); // platform class
    body.push(0); // spec version minor
    body.push(2); // spec version major
    body.push(0); // errata
    body.push(2); // uintn size
    body.extend_from_slice(&(algorithms.len() as u32).to_le_bytes());
    for (algorithm_id, digest_size) in algorithms {
        body.extend_from_slice(&algorithm_id.to_le_bytes());
        body.extend_from_slice(&digest_size.to_le_bytes());
    }
    body.push(0); // vendor info size

    let mut event = Vec::new();
    event.extend_from_slice(&0u32.to_le_bytes()); // register index
    event.extend_from_slice(&TcgEventType::EV_NO_ACTION.0.to_le_bytes());
    event.extend_from_slice(&[0u8; 20]); // TCG 1.2 digest
    event.extend_from_slice(&(body.len() as u32).to_le_bytes());
    event.extend_from_slice(&body);
    event
}

/// Build a TCG_PCR_EVENT2 entry.
fn event2(register: u32, event_type: u32, digests: &[(u16, Vec<u8>)], data: &[u8]) -> Vec<u8> {
    let mut event = Vec::new();
    event.extend_from_slice(&register.to_le_bytes());
    event.extend_from_slice(&event_type.to_le_bytes());
    event.extend_from_slice(&(digests.len() as u32).to_le_bytes());
    for (algorithm_id, digest) in digests {
        event.extend_from_slice(&algorithm_id.to_le_bytes());
        event.extend_from_slice(digest);
    }
    event.extend_from_slice(&(data.len() as u32).to_le_bytes());
    event.extend_from_slice(data);
    event
}

fn hash(digest: MessageDigest, parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Hasher::new(digest).unwrap();
    for part in parts {
        hasher.update(part).unwrap();
    }
    hasher.finish().unwrap().to_vec()
}

#[test]
fn test_parse_pc_client_log() {
    let mut data = spec_id_event(&[(TPM_ALG_SHA256, 32), (TPM_ALG_SHA384, 48)]);
    data.extend(event2(
        0,
        TcgEventType::EV_S_CRTM_VERSION.0,
        &[(TPM_ALG_SHA256, vec![0x11; 32])],
        b"version",
    ));
    data.extend(event2(
        7,
        TcgEventType::EV_SEPARATOR.0,
        &[(TPM_ALG_SHA256, vec![0x22; 32]), (TPM_ALG_SHA384, vec![0x33; 48])],
        &[0, 0, 0, 0],
    ));

    let mut log = EventLog::new(EventLogFormat::PcClient, data);
    log.parse().unwrap();

    assert_eq!(log.count(), 3);
    let header = log.spec_id_header().unwrap();
    assert_eq!(header.signature, "Spec ID Event03");
    assert_eq!(header.spec_version_major, 2);
    assert_eq!(header.digest_sizes.len(), 2);

    let entries = log.entries();
    assert_eq!(entries[0].event_type, TcgEventType::EV_NO_ACTION);
    assert_eq!(entries[0].digests[0].algo_id, TcgAlgorithmId::Sha1);

    assert_eq!(entries[1].event_number, 1);
    assert_eq!(entries[1].register_index, 0);
    assert_eq!(entries[1].event_type, TcgEventType::EV_S_CRTM_VERSION);
    assert_eq!(entries[1].digests[0].hash, vec![0x11; 32]);
    assert_eq!(entries[1].event, b"version");

    assert_eq!(entries[2].register_index, 7);
    assert_eq!(entries[2].digests.len(), 2);
    assert_eq!(entries[2].digests[1].algo_id, TcgAlgorithmId::Sha384);
}

#[test]
fn test_ccel_register_mapping() {
    // CCEL tables number measurement registers from 1.
    let mut data = spec_id_event(&[(TPM_ALG_SHA384, 48)]);
    data.extend(event2(
        1,
        TcgEventType::EV_EFI_PLATFORM_FIRMWARE_BLOB.0,
        &[(TPM_ALG_SHA384, vec![0x44; 48])],
        b"firmware",
    ));

    let mut log = EventLog::new(EventLogFormat::Ccel, data);
    log.parse().unwrap();
    assert_eq!(log.entries()[1].register_index, 0);
}

#[test]
fn test_terminator_stops_parsing() {
    let mut data = spec_id_event(&[(TPM_ALG_SHA256, 32)]);
    data.extend(event2(
        0,
        TcgEventType::EV_SEPARATOR.0,
        &[(TPM_ALG_SHA256, vec![0x55; 32])],
        &[],
    ));
    // CCEL-style 0xFF padding after the last event.
    data.extend_from_slice(&[0xFF; 64]);

    let mut log = EventLog::new(EventLogFormat::PcClient, data);
    log.parse().unwrap();
    assert_eq!(log.count(), 2);
}

#[test]
fn test_select_windows() {
    let mut data = spec_id_event(&[(TPM_ALG_SHA256, 32)]);
    for register in 0..4u32 {
        data.extend(event2(
            register,
            TcgEventType::EV_SEPARATOR.0,
            &[(TPM_ALG_SHA256, vec![register as u8; 32])],
            &[],
        ));
    }

    let mut log = EventLog::new(EventLogFormat::PcClient, data);
    log.parse().unwrap();
    assert_eq!(log.count(), 5);

    // No bounds: the full log.
    assert_eq!(log.select(None, None).unwrap().len(), 5);

    // Start only: the tail.
    let tail = log.select(Some(2), None).unwrap();
    assert_eq!(tail.len(), 3);
    assert_eq!(tail[0].event_number, 2);

    // Start and count.
    let window = log.select(Some(1), Some(2)).unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].event_number, 1);
    assert_eq!(window[1].event_number, 2);

    // Count past the end is clamped to the tail.
    assert_eq!(log.select(Some(3), Some(10)).unwrap().len(), 2);

    // Start beyond the last event is an input error.
    assert!(matches!(
        log.select(Some(5), None),
        Err(EvidenceError::InputError(_))
    ));

    // A zero count selects nothing meaningful.
    assert!(log.select(None, Some(0)).is_err());
}

#[test]
fn test_malformed_logs_are_rejected() {
    // Empty data.
    assert!(EventLog::new(EventLogFormat::PcClient, vec![]).parse().is_err());

    // First event is not EV_NO_ACTION.
    let data = event2(
        0,
        TcgEventType::EV_SEPARATOR.0,
        &[(TPM_ALG_SHA1, vec![0u8; 20])],
        &[],
    );
    assert!(EventLog::new(EventLogFormat::PcClient, data).parse().is_err());

    // Event truncated in the middle of a digest.
    let mut data = spec_id_event(&[(TPM_ALG_SHA256, 32)]);
    data.extend(event2(
        0,
        TcgEventType::EV_SEPARATOR.0,
        &[(TPM_ALG_SHA256, vec![0x66; 32])],
        &[],
    ));
    data.truncate(data.len() - 20);
    assert!(EventLog::new(EventLogFormat::PcClient, data).parse().is_err());

    // Digest algorithm known to neither the header table nor the registry.
    let mut data = spec_id_event(&[(TPM_ALG_SHA256, 32)]);
    data.extend(event2(
        0,
        TcgEventType::EV_SEPARATOR.0,
        &[(0x0021, vec![0x77; 32])],
        &[],
    ));
    assert!(EventLog::new(EventLogFormat::PcClient, data).parse().is_err());
}

#[test]
fn test_replay_extends_registers() {
    let digest_a = vec![0xAA; 32];
    let digest_b = vec![0xBB; 32];
    let mut data = spec_id_event(&[(TPM_ALG_SHA256, 32)]);
    data.extend(event2(
        0,
        TcgEventType::EV_S_CRTM_VERSION.0,
        &[(TPM_ALG_SHA256, digest_a.clone())],
        &[],
    ));
    data.extend(event2(
        0,
        TcgEventType::EV_SEPARATOR.0,
        &[(TPM_ALG_SHA256, digest_b.clone())],
        &[],
    ));

    let mut log = EventLog::new(EventLogFormat::PcClient, data);
    log.parse().unwrap();
    let replay = replay_event_log(log.entries());

    let first = hash(MessageDigest::sha256(), &[&[0u8; 32], &digest_a]);
    let expected = hash(MessageDigest::sha256(), &[&first, &digest_b]);

    let bank = replay.bank(0, TcgAlgorithmId::Sha256).unwrap();
    assert_eq!(bank.as_ref().unwrap(), &expected);

    // The Spec ID header never lands in a register.
    assert_eq!(replay.registers().len(), 1);
}

#[test]
fn test_replay_skips_no_action_events() {
    let mut data = spec_id_event(&[(TPM_ALG_SHA256, 32)]);
    data.extend(event2(
        5,
        TcgEventType::EV_NO_ACTION.0,
        &[(TPM_ALG_SHA256, vec![0u8; 32])],
        b"StartupLocality\0",
    ));
    data.extend(event2(
        3,
        TcgEventType::EV_SEPARATOR.0,
        &[(TPM_ALG_SHA256, vec![0xCC; 32])],
        &[],
    ));

    let mut log = EventLog::new(EventLogFormat::PcClient, data);
    log.parse().unwrap();
    let replay = replay_event_log(log.entries());

    assert!(replay.bank(5, TcgAlgorithmId::Sha256).is_none());
    assert!(replay.bank(3, TcgAlgorithmId::Sha256).is_some());
}

#[test]
fn test_replay_partial_failure_keeps_healthy_banks() {
    // 0x0010 is carried by the header table (so it parses) but has no
    // digest implementation, so only that bank fails during replay.
    let digest = vec![0xDD; 32];
    let mut data = spec_id_event(&[(TPM_ALG_SHA256, 32), (TPM_ALG_UNLISTED, 48)]);
    data.extend(event2(
        2,
        TcgEventType::EV_SEPARATOR.0,
        &[
            (TPM_ALG_SHA256, digest.clone()),
            (TPM_ALG_UNLISTED, vec![0xEE; 48]),
        ],
        &[],
    ));

    let mut log = EventLog::new(EventLogFormat::PcClient, data);
    log.parse().unwrap();
    let replay = replay_event_log(log.entries());

    let healthy = replay.bank(2, TcgAlgorithmId::Sha256).unwrap();
    let expected = hash(MessageDigest::sha256(), &[&[0u8; 32], &digest]);
    assert_eq!(healthy.as_ref().unwrap(), &expected);

    let failed = replay.bank(2, TcgAlgorithmId::Unknown).unwrap();
    assert_eq!(
        failed.as_ref().unwrap_err(),
        &ReplayError::UnsupportedAlgorithm(TcgAlgorithmId::Unknown)
    );
}
