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

//! TD quote generation and parsing.
//!
//! Quote generation wraps the TDREPORT in a Quote Generation Service
//! message and submits it through the guest quote ioctl. Parsing covers the
//! version 4 quote format (header + TD quote body); version 5 is rejected
//! explicitly instead of being mis-read.

use crate::report::{TdxVersion, TDX_REPORT_LEN};
use evidence_api::EvidenceError;
use log::info;
use tcg_eventlog::byte_reader::ByteReader;

/// Quote transfer buffer length shared with the guest driver.
pub const TDX_QUOTE_LEN: usize = 4 * 4096;

pub const TDX_QUOTE_VERSION_4: u16 = 4;
pub const TDX_QUOTE_VERSION_5: u16 = 5;

const QGS_MSG_MAJOR_VERSION: u16 = 1;
const QGS_MSG_MINOR_VERSION: u16 = 0;
const QGS_MSG_GET_QUOTE_REQ: u32 = 0;
const QGS_MSG_GET_QUOTE_RESP: u32 = 1;
// Message header: major(2) minor(2) type(4) size(4) error_code(4).
const QGS_MSG_HEADER_SIZE: usize = 16;
// Request body ahead of the report: report_size(4) + id_list_size(4).
const QGS_REQ_BODY_SIZE: usize = 8;
// Response body ahead of the quote: selected_id_size(4) + quote_size(4).
const QGS_RESP_BODY_SIZE: usize = 8;

const QGS_REQ_SIZE: usize = QGS_MSG_HEADER_SIZE + QGS_REQ_BODY_SIZE + TDX_REPORT_LEN;

/// Quote transfer header shared with the guest driver.
#[repr(C)]
pub struct TdxQuoteHdr {
    pub version: u64,
    pub status: u64,
    pub in_len: u32,
    pub out_len: u32,
    pub data_len_be_bytes: [u8; 4],
    pub data: [u8; TDX_QUOTE_LEN],
}

/// Quote request passed to the TDX 1.5 quote ioctl.
#[repr(C)]
pub struct TdxQuoteReq {
    pub buf: u64,
    pub len: u64,
}

/// Serialize the QGS GET_QUOTE_REQ message wrapping a TDREPORT.
fn build_qgs_quote_request(tdreport: &[u8; TDX_REPORT_LEN]) -> Vec<u8> {
    let mut message = Vec::with_capacity(QGS_REQ_SIZE);
    message.extend_from_slice(&QGS_MSG_MAJOR_VERSION.to_le_bytes());
    message.extend_from_slice(&QGS_MSG_MINOR_VERSION.to_le_bytes());
    message.extend_from_slice(&QGS_MSG_GET_QUOTE_REQ.to_le_bytes());
    message.extend_from_slice(&(QGS_REQ_SIZE as u32).to_le_bytes());
    message.extend_from_slice(&0u32.to_le_bytes()); // error code, request side
    message.extend_from_slice(&(TDX_REPORT_LEN as u32).to_le_bytes());
    message.extend_from_slice(&0u32.to_le_bytes()); // empty id list
    message.extend_from_slice(tdreport);
    message
}

/// Validate a QGS GET_QUOTE_RESP message and extract the quote bytes.
///
/// `expected_size` is the response length announced by the transfer header.
fn parse_qgs_quote_response(data: &[u8], expected_size: u32) -> Result<Vec<u8>, EvidenceError> {
    let mut reader = ByteReader::new(data);

    let major_version = reader.read_u16()?;
    let minor_version = reader.read_u16()?;
    let msg_type = reader.read_u32()?;
    let size = reader.read_u32()?;
    let error_code = reader.read_u32()?;

    if major_version != QGS_MSG_MAJOR_VERSION
        || minor_version != QGS_MSG_MINOR_VERSION
        || msg_type != QGS_MSG_GET_QUOTE_RESP
        || error_code != 0
    {
        return Err(EvidenceError::InternalError(format!(
            "Quote generation service rejected the request: type {}, error code {}",
            msg_type, error_code
        )));
    }
    if size != expected_size {
        return Err(EvidenceError::InternalError(format!(
            "Quote response size {} does not match announced size {}",
            size, expected_size
        )));
    }
    if (size as usize) < QGS_MSG_HEADER_SIZE + QGS_RESP_BODY_SIZE {
        return Err(EvidenceError::InternalError(format!(
            "Quote response size {} is shorter than the message framing",
            size
        )));
    }

    let _selected_id_size = reader.read_u32()?;
    let quote_size = reader.read_u32()?;
    let available = size as usize - QGS_MSG_HEADER_SIZE - QGS_RESP_BODY_SIZE;
    if quote_size as usize > available {
        return Err(EvidenceError::InternalError(format!(
            "Quote size {} exceeds response payload {}",
            quote_size, available
        )));
    }

    reader.read_bytes(quote_size as usize)
}

#[cfg(target_os = "linux")]
mod ioctl {
    use super::*;
    use std::fs::File;
    use std::os::fd::AsRawFd;
    use std::ptr;

    const TDX_CMD_GET_QUOTE_V10: u8 = 2;
    const TDX_CMD_GET_QUOTE_V15: u8 = 4;

    nix::ioctl_read!(tdx_get_quote_1_0, b'T', TDX_CMD_GET_QUOTE_V10, u64);
    nix::ioctl_read!(tdx_get_quote_1_5, b'T', TDX_CMD_GET_QUOTE_V15, TdxQuoteReq);

    /// Exchange a TDREPORT for a signed TD quote.
    pub fn get_td_quote(version: TdxVersion, tdreport: &[u8]) -> Result<Vec<u8>, EvidenceError> {
        let tdreport: &[u8; TDX_REPORT_LEN] = tdreport.try_into().map_err(|_| {
            EvidenceError::InputError(format!(
                "TDREPORT must be {} bytes, got {}",
                TDX_REPORT_LEN,
                tdreport.len()
            ))
        })?;

        let message = build_qgs_quote_request(tdreport);

        let mut quote_header = Box::new(TdxQuoteHdr {
            version: 1,
            status: 0,
            in_len: (message.len() + 4) as u32,
            out_len: 0,
            data_len_be_bytes: (message.len() as u32).to_be_bytes(),
            data: [0u8; TDX_QUOTE_LEN],
        });
        quote_header.data[..message.len()].copy_from_slice(&message);

        let mut request = TdxQuoteReq {
            buf: ptr::addr_of_mut!(*quote_header) as u64,
            len: TDX_QUOTE_LEN as u64,
        };

        let device = File::options()
            .read(true)
            .write(true)
            .open(version.device_path())
            .map_err(|e| {
                EvidenceError::InternalError(format!(
                    "Failed to open {}: {}",
                    version.device_path(),
                    e
                ))
            })?;

        match version {
            TdxVersion::Tdx10 => unsafe {
                tdx_get_quote_1_0(
                    device.as_raw_fd(),
                    ptr::addr_of_mut!(request) as *mut u64,
                )
            },
            TdxVersion::Tdx15 => unsafe {
                tdx_get_quote_1_5(device.as_raw_fd(), &mut request)
            },
        }
        .map_err(|e| EvidenceError::InternalError(format!("TDX quote ioctl failed: {}", e)))?;

        if quote_header.status != 0 {
            return Err(EvidenceError::InternalError(format!(
                "TDX quote request failed with status 0x{:016X}",
                quote_header.status
            )));
        }

        let response_size = u32::from_be_bytes(quote_header.data_len_be_bytes);
        match quote_header.out_len.checked_sub(response_size) {
            Some(4) => {}
            _ => {
                return Err(EvidenceError::InternalError(
                    "TDX quote response has inconsistent length fields".to_string(),
                ))
            }
        }

        parse_qgs_quote_response(&quote_header.data[..response_size as usize], response_size)
    }
}

#[cfg(target_os = "linux")]
pub use ioctl::get_td_quote;

#[cfg(not(target_os = "linux"))]
pub fn get_td_quote(_version: TdxVersion, _tdreport: &[u8]) -> Result<Vec<u8>, EvidenceError> {
    Err(EvidenceError::InternalError(
        "TDX quote retrieval is only available on Linux".to_string(),
    ))
}

/// TD quote header (48 bytes, version 4 format).
#[derive(Debug, Clone)]
pub struct TdQuoteHeader {
    pub version: u16,
    pub ak_type: u16,
    pub tee_type: u32,
    pub qe_vendor: Vec<u8>,
    pub user_data: Vec<u8>,
}

/// TD quote body (584 bytes, version 4 format).
#[derive(Debug, Clone)]
pub struct TdQuoteBody {
    pub tee_tcb_svn: Vec<u8>,
    pub mrseam: Vec<u8>,
    pub mrsignerseam: Vec<u8>,
    pub seam_attributes: Vec<u8>,
    pub td_attributes: Vec<u8>,
    pub xfam: Vec<u8>,
    pub mrtd: Vec<u8>,
    pub mrconfigid: Vec<u8>,
    pub mrowner: Vec<u8>,
    pub mrownerconfig: Vec<u8>,
    pub rtmrs: Vec<Vec<u8>>,
    pub report_data: Vec<u8>,
}

/// Parsed TD quote: header, body, and the trailing signature length.
#[derive(Debug, Clone)]
pub struct TdQuote {
    pub header: TdQuoteHeader,
    pub body: TdQuoteBody,
    pub signature_len: u32,
}

impl TdQuote {
    /// Parse a version 4 TD quote.
    ///
    /// # Errors
    /// Returns `EvidenceError::InputError` for truncated input, a version 5
    /// quote, or an unrecognized version.
    pub fn parse(quote: &[u8]) -> Result<Self, EvidenceError> {
        let mut reader = ByteReader::new(quote);

        let version = reader.read_u16()?;
        if version == TDX_QUOTE_VERSION_5 {
            return Err(EvidenceError::InputError(
                "TD quote format version 5 is not supported".to_string(),
            ));
        }
        if version != TDX_QUOTE_VERSION_4 {
            return Err(EvidenceError::InputError(format!(
                "Unrecognized TD quote version: {}",
                version
            )));
        }

        let ak_type = reader.read_u16()?;
        let tee_type = reader.read_u32()?;
        let _reserved = reader.read_bytes(4)?;
        let qe_vendor = reader.read_bytes(16)?;
        let user_data = reader.read_bytes(20)?;

        let header = TdQuoteHeader {
            version,
            ak_type,
            tee_type,
            qe_vendor,
            user_data,
        };

        let body = TdQuoteBody {
            tee_tcb_svn: reader.read_bytes(16)?,
            mrseam: reader.read_bytes(48)?,
            mrsignerseam: reader.read_bytes(48)?,
            seam_attributes: reader.read_bytes(8)?,
            td_attributes: reader.read_bytes(8)?,
            xfam: reader.read_bytes(8)?,
            mrtd: reader.read_bytes(48)?,
            mrconfigid: reader.read_bytes(48)?,
            mrowner: reader.read_bytes(48)?,
            mrownerconfig: reader.read_bytes(48)?,
            rtmrs: (0..4)
                .map(|_| reader.read_bytes(48))
                .collect::<Result<Vec<_>, _>>()?,
            report_data: reader.read_bytes(64)?,
        };

        let signature_len = reader.read_u32()?;

        Ok(Self {
            header,
            body,
            signature_len,
        })
    }

    /// Dump the parsed fields through the log facade.
    pub fn dump(&self) {
        info!("TD quote version      = {}", self.header.version);
        info!("Attestation key type  = {}", self.header.ak_type);
        info!("TEE type              = 0x{:08X}", self.header.tee_type);
        info!("QE vendor id          = {}", hex::encode(&self.header.qe_vendor));
        info!("TEE TCB SVN           = {}", hex::encode(&self.body.tee_tcb_svn));
        info!("MRSEAM                = {}", hex::encode(&self.body.mrseam));
        info!("MRSIGNERSEAM          = {}", hex::encode(&self.body.mrsignerseam));
        info!("TD attributes         = {}", hex::encode(&self.body.td_attributes));
        info!("XFAM                  = {}", hex::encode(&self.body.xfam));
        info!("MRTD                  = {}", hex::encode(&self.body.mrtd));
        info!("MRCONFIGID            = {}", hex::encode(&self.body.mrconfigid));
        info!("MROWNER               = {}", hex::encode(&self.body.mrowner));
        info!("MROWNERCONFIG         = {}", hex::encode(&self.body.mrownerconfig));
        for (index, rtmr) in self.body.rtmrs.iter().enumerate() {
            info!("RTMR{}                 = {}", index, hex::encode(rtmr));
        }
        info!("Report data           = {}", hex::encode(&self.body.report_data));
        info!("Signature length      = {}", self.signature_len);
    }
}
