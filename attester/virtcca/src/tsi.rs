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

//! Bindings to the virtCCA TSI attestation library.

use evidence_api::EvidenceError;

/// Challenge length the TSI interface binds into a token.
pub const TSI_CHALLENGE_LEN: usize = 64;

const TSI_TOKEN_BUFFER_LEN: usize = 4096;

#[allow(non_camel_case_types)]
pub type wchar_t = std::os::raw::c_int;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
#[allow(non_camel_case_types)]
pub struct tsi_ctx {
    pub fd: wchar_t,
}

#[cfg(target_arch = "aarch64")]
#[link(name = "vccaattestation")]
extern "C" {
    fn tsi_new_ctx() -> *mut tsi_ctx;
    fn tsi_free_ctx(ctx: *mut tsi_ctx);
    fn get_attestation_token(
        ctx: *mut tsi_ctx,
        challenge: *mut std::os::raw::c_uchar,
        challenge_len: usize,
        token: *mut std::os::raw::c_uchar,
        token_len: *mut usize,
    ) -> wchar_t;
}

/// Owned TSI library context.
pub struct TsiContext {
    #[allow(dead_code)]
    ctx: *mut tsi_ctx,
}

#[cfg(target_arch = "aarch64")]
impl TsiContext {
    /// Open the TSI device.
    ///
    /// # Errors
    /// Returns `EvidenceError::InternalError` when the library cannot create
    /// a context.
    pub fn new() -> Result<Self, EvidenceError> {
        let ctx = unsafe { tsi_new_ctx() };
        if ctx.is_null() {
            return Err(EvidenceError::InternalError(
                "Failed to create TSI context".to_string(),
            ));
        }
        Ok(Self { ctx })
    }

    /// Request an attestation token bound to the challenge.
    ///
    /// # Errors
    /// Returns `EvidenceError::InternalError` when the TSI call fails.
    pub fn get_attestation_token(
        &self,
        challenge: &[u8; TSI_CHALLENGE_LEN],
    ) -> Result<Vec<u8>, EvidenceError> {
        let mut token = vec![0u8; TSI_TOKEN_BUFFER_LEN];
        let mut token_len = token.len();

        let ret = unsafe {
            get_attestation_token(
                self.ctx,
                challenge.as_ptr() as *mut std::os::raw::c_uchar,
                challenge.len(),
                token.as_mut_ptr(),
                &mut token_len as *mut usize,
            )
        };
        if ret != 0 {
            return Err(EvidenceError::InternalError(format!(
                "virtCCA attestation token request failed: {}",
                ret
            )));
        }

        token.truncate(token_len);
        Ok(token)
    }
}

#[cfg(target_arch = "aarch64")]
impl Drop for TsiContext {
    fn drop(&mut self) {
        unsafe {
            tsi_free_ctx(self.ctx);
        }
    }
}

#[cfg(not(target_arch = "aarch64"))]
impl TsiContext {
    pub fn new() -> Result<Self, EvidenceError> {
        Err(EvidenceError::InternalError(
            "virtCCA attestation is only supported on ARM64".to_string(),
        ))
    }

    pub fn get_attestation_token(
        &self,
        _challenge: &[u8; TSI_CHALLENGE_LEN],
    ) -> Result<Vec<u8>, EvidenceError> {
        Err(EvidenceError::InternalError(
            "virtCCA attestation is only supported on ARM64".to_string(),
        ))
    }
}
