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

//! TPM quote evidence encoding and parsing.
//!
//! The report payload is the marshalled TPMS_ATTEST followed by the
//! marshalled TPMT_SIGNATURE, with a length prefix so the two halves can be
//! split again. Parsing follows the TPM 2.0 wire format (big-endian).

use byteorder::{BigEndian, ReadBytesExt};
use evidence_api::{EvidenceError, TcgAlgorithmId};
use log::info;
use std::io::{Cursor, Read};

/// TPM 2.0 magic value opening every attestation structure ("\xFFTCG").
pub const TPM2_GENERATED_VALUE: u32 = 0xFF54_4347;
/// TPMI_ST_ATTEST value for quotes.
pub const TPM2_ST_ATTEST_QUOTE: u16 = 0x8018;

/// Concatenate marshalled quote and signature into one report payload.
pub fn encode_report(quote: &[u8], signature: &[u8]) -> Vec<u8> {
    let mut report = Vec::with_capacity(4 + quote.len() + signature.len());
    report.extend_from_slice(&(quote.len() as u32).to_be_bytes());
    report.extend_from_slice(quote);
    report.extend_from_slice(signature);
    report
}

/// Split a report payload back into quote and signature bytes.
///
/// # Errors
/// Returns `EvidenceError::InputError` when the length prefix does not fit
/// the payload.
pub fn split_report(report: &[u8]) -> Result<(&[u8], &[u8]), EvidenceError> {
    if report.len() < 4 {
        return Err(EvidenceError::InputError(
            "TPM report shorter than its length prefix".to_string(),
        ));
    }
    let mut prefix = [0u8; 4];
    prefix.copy_from_slice(&report[..4]);
    let quote_len = u32::from_be_bytes(prefix) as usize;
    let rest = &report[4..];
    if quote_len > rest.len() {
        return Err(EvidenceError::InputError(format!(
            "TPM report quote length {} exceeds payload {}",
            quote_len,
            rest.len()
        )));
    }
    Ok(rest.split_at(quote_len))
}

fn read_u16_sized_field(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<Vec<u8>, EvidenceError> {
    let size = cursor
        .read_u16::<BigEndian>()
        .map_err(|e| EvidenceError::InputError(format!("Failed to read {} size: {}", what, e)))?;
    let mut field = vec![0u8; size as usize];
    cursor
        .read_exact(&mut field)
        .map_err(|e| EvidenceError::InputError(format!("Failed to read {}: {}", what, e)))?;
    Ok(field)
}

/// TPM clock information inside a TPMS_ATTEST.
#[derive(Debug, Clone)]
pub struct TpmsClockInfo {
    pub clock: u64,
    pub reset_count: u32,
    pub restart_count: u32,
    pub safe: bool,
}

impl TpmsClockInfo {
    fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, EvidenceError> {
        let clock = cursor
            .read_u64::<BigEndian>()
            .map_err(|e| EvidenceError::InputError(format!("Failed to read clock: {}", e)))?;
        let reset_count = cursor
            .read_u32::<BigEndian>()
            .map_err(|e| EvidenceError::InputError(format!("Failed to read reset count: {}", e)))?;
        let restart_count = cursor.read_u32::<BigEndian>().map_err(|e| {
            EvidenceError::InputError(format!("Failed to read restart count: {}", e))
        })?;
        let safe = cursor
            .read_u8()
            .map_err(|e| EvidenceError::InputError(format!("Failed to read safe flag: {}", e)))?
            != 0;

        Ok(Self {
            clock,
            reset_count,
            restart_count,
            safe,
        })
    }
}

/// One TPMS_PCR_SELECTION row.
#[derive(Debug, Clone)]
pub struct TpmsPcrSelection {
    pub hash_alg: TcgAlgorithmId,
    pub pcr_select: Vec<u8>,
}

impl TpmsPcrSelection {
    fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, EvidenceError> {
        let alg = cursor
            .read_u16::<BigEndian>()
            .map_err(|e| EvidenceError::InputError(format!("Failed to read PCR bank: {}", e)))?;
        let size_of_select = cursor.read_u8().map_err(|e| {
            EvidenceError::InputError(format!("Failed to read PCR select size: {}", e))
        })?;
        let mut pcr_select = vec![0u8; size_of_select as usize];
        cursor
            .read_exact(&mut pcr_select)
            .map_err(|e| EvidenceError::InputError(format!("Failed to read PCR select: {}", e)))?;

        Ok(Self {
            hash_alg: TcgAlgorithmId::from(alg),
            pcr_select,
        })
    }

    /// Whether the selection mask covers a PCR index.
    pub fn is_pcr_selected(&self, pcr_index: u32) -> bool {
        let byte_index = (pcr_index / 8) as usize;
        let mask = 1u8 << (pcr_index % 8);
        self.pcr_select
            .get(byte_index)
            .map_or(false, |byte| byte & mask != 0)
    }

    /// Selected PCR indices in ascending order.
    pub fn selected_pcrs(&self) -> Vec<u32> {
        (0..(self.pcr_select.len() as u32 * 8))
            .filter(|index| self.is_pcr_selected(*index))
            .collect()
    }
}

/// Quote-specific half of a TPMS_ATTEST.
#[derive(Debug, Clone)]
pub struct TpmsQuoteInfo {
    pub pcr_select: Vec<TpmsPcrSelection>,
    pub pcr_digest: Vec<u8>,
}

impl TpmsQuoteInfo {
    fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, EvidenceError> {
        let count = cursor.read_u32::<BigEndian>().map_err(|e| {
            EvidenceError::InputError(format!("Failed to read PCR selection count: {}", e))
        })?;
        if count > 16 {
            return Err(EvidenceError::InputError(format!(
                "Implausible PCR selection count: {}",
                count
            )));
        }

        let mut pcr_select = Vec::with_capacity(count as usize);
        for _ in 0..count {
            pcr_select.push(TpmsPcrSelection::parse(cursor)?);
        }

        let pcr_digest = read_u16_sized_field(cursor, "PCR digest")?;

        Ok(Self {
            pcr_select,
            pcr_digest,
        })
    }
}

/// Parsed TPMS_ATTEST quote structure.
#[derive(Debug, Clone)]
pub struct TpmsAttest {
    pub magic: u32,
    pub qualified_signer: Vec<u8>,
    pub extra_data: Vec<u8>,
    pub clock_info: TpmsClockInfo,
    pub firmware_version: u64,
    pub attested: TpmsQuoteInfo,
}

impl TpmsAttest {
    /// Parse a marshalled TPMS_ATTEST.
    ///
    /// # Errors
    /// Returns `EvidenceError::InputError` for a wrong magic value, a
    /// non-quote attestation type, or truncation.
    pub fn parse(data: &[u8]) -> Result<Self, EvidenceError> {
        let mut cursor = Cursor::new(data);

        let magic = cursor
            .read_u32::<BigEndian>()
            .map_err(|e| EvidenceError::InputError(format!("Failed to read magic: {}", e)))?;
        if magic != TPM2_GENERATED_VALUE {
            return Err(EvidenceError::InputError(format!(
                "Invalid TPM magic value: 0x{:08X}, expected 0x{:08X}",
                magic, TPM2_GENERATED_VALUE
            )));
        }

        let attest_type = cursor.read_u16::<BigEndian>().map_err(|e| {
            EvidenceError::InputError(format!("Failed to read attestation type: {}", e))
        })?;
        if attest_type != TPM2_ST_ATTEST_QUOTE {
            return Err(EvidenceError::InputError(format!(
                "Expected a quote attestation, got type 0x{:04X}",
                attest_type
            )));
        }

        let qualified_signer = read_u16_sized_field(&mut cursor, "qualified signer")?;
        let extra_data = read_u16_sized_field(&mut cursor, "extra data")?;
        let clock_info = TpmsClockInfo::parse(&mut cursor)?;
        let firmware_version = cursor.read_u64::<BigEndian>().map_err(|e| {
            EvidenceError::InputError(format!("Failed to read firmware version: {}", e))
        })?;
        let attested = TpmsQuoteInfo::parse(&mut cursor)?;

        Ok(Self {
            magic,
            qualified_signer,
            extra_data,
            clock_info,
            firmware_version,
            attested,
        })
    }

    /// Dump the parsed fields through the log facade.
    pub fn dump(&self) {
        info!("Qualified signer  = {}", hex::encode(&self.qualified_signer));
        info!("Extra data        = {}", hex::encode(&self.extra_data));
        info!(
            "Clock             = {} (resets {}, restarts {}, safe {})",
            self.clock_info.clock,
            self.clock_info.reset_count,
            self.clock_info.restart_count,
            self.clock_info.safe
        );
        info!("Firmware version  = 0x{:016X}", self.firmware_version);
        for selection in &self.attested.pcr_select {
            info!(
                "PCR selection     = {} {:?}",
                selection.hash_alg,
                selection.selected_pcrs()
            );
        }
        info!("PCR digest        = {}", hex::encode(&self.attested.pcr_digest));
    }
}

/// TPMT_SIGNATURE algorithm identifiers this backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TpmSignatureAlgId {
    RsaSsa,
    RsaPss,
    EcDsa,
    Sm2,
    Unknown(u16),
}

impl From<u16> for TpmSignatureAlgId {
    fn from(value: u16) -> Self {
        match value {
            0x0014 => TpmSignatureAlgId::RsaSsa,
            0x0016 => TpmSignatureAlgId::RsaPss,
            0x0018 => TpmSignatureAlgId::EcDsa,
            0x001B => TpmSignatureAlgId::Sm2,
            other => TpmSignatureAlgId::Unknown(other),
        }
    }
}

/// Parsed TPMT_SIGNATURE.
#[derive(Debug, Clone)]
pub struct TpmtSignature {
    pub sig_alg: TpmSignatureAlgId,
    pub hash_alg: TcgAlgorithmId,
    /// RSA: the signature block. ECC/SM2: r followed by s.
    pub signature: Vec<u8>,
}

impl TpmtSignature {
    /// Parse a marshalled TPMT_SIGNATURE.
    ///
    /// # Errors
    /// Returns `EvidenceError::InputError` for unknown signature algorithms
    /// or truncation.
    pub fn parse(data: &[u8]) -> Result<Self, EvidenceError> {
        let mut cursor = Cursor::new(data);

        let sig_alg_raw = cursor.read_u16::<BigEndian>().map_err(|e| {
            EvidenceError::InputError(format!("Failed to read signature algorithm: {}", e))
        })?;
        let sig_alg = TpmSignatureAlgId::from(sig_alg_raw);

        let hash_alg_raw = cursor.read_u16::<BigEndian>().map_err(|e| {
            EvidenceError::InputError(format!("Failed to read signature hash algorithm: {}", e))
        })?;
        let hash_alg = TcgAlgorithmId::from(hash_alg_raw);

        let signature = match sig_alg {
            TpmSignatureAlgId::RsaSsa | TpmSignatureAlgId::RsaPss => {
                read_u16_sized_field(&mut cursor, "RSA signature")?
            }
            TpmSignatureAlgId::EcDsa | TpmSignatureAlgId::Sm2 => {
                let mut signature = read_u16_sized_field(&mut cursor, "ECC signature r")?;
                signature.extend(read_u16_sized_field(&mut cursor, "ECC signature s")?);
                signature
            }
            TpmSignatureAlgId::Unknown(raw) => {
                return Err(EvidenceError::InputError(format!(
                    "Unsupported signature algorithm: 0x{:04X}",
                    raw
                )))
            }
        };

        Ok(Self {
            sig_alg,
            hash_alg,
            signature,
        })
    }

    pub fn dump(&self) {
        info!(
            "Signature         = {:?}/{}, {} bytes",
            self.sig_alg,
            self.hash_alg,
            self.signature.len()
        );
    }
}
