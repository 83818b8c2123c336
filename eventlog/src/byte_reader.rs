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

//! Bounds-checked little-endian reader over event-log bytes.
//!
//! Every read reports truncation as an error instead of panicking, so a
//! corrupt or cut-off log fails with a message naming the missing field.

use byteorder::{LittleEndian, ReadBytesExt};
use evidence_api::EvidenceError;
use std::io::{Cursor, Read};

/// Binary data parsing helper over a byte slice.
pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Current reading position (byte offset).
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Number of unread bytes remaining.
    pub fn remaining(&self) -> u64 {
        let total = self.cursor.get_ref().len() as u64;
        total.saturating_sub(self.cursor.position())
    }

    /// Whether the end of data has been reached.
    pub fn is_end(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u8(&mut self) -> Result<u8, EvidenceError> {
        self.cursor
            .read_u8()
            .map_err(|e| EvidenceError::InputError(format!("Failed to read u8: {}", e)))
    }

    pub fn read_u16(&mut self) -> Result<u16, EvidenceError> {
        self.cursor
            .read_u16::<LittleEndian>()
            .map_err(|e| EvidenceError::InputError(format!("Failed to read u16: {}", e)))
    }

    pub fn read_u32(&mut self) -> Result<u32, EvidenceError> {
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| EvidenceError::InputError(format!("Failed to read u32: {}", e)))
    }

    /// Read `length` bytes.
    ///
    /// # Errors
    /// Returns `EvidenceError::InputError` when fewer than `length` bytes
    /// remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>, EvidenceError> {
        if length as u64 > self.remaining() {
            return Err(EvidenceError::InputError(format!(
                "Read exceeds data range: requested {} bytes but only {} bytes remain",
                length,
                self.remaining()
            )));
        }
        let mut buffer = vec![0u8; length];
        self.cursor
            .read_exact(&mut buffer)
            .map_err(|e| EvidenceError::InputError(format!("Failed to read bytes: {}", e)))?;
        Ok(buffer)
    }

    /// Read a fixed-length UTF-8 field, trimming trailing NUL padding.
    pub fn read_string(&mut self, length: usize) -> Result<String, EvidenceError> {
        let bytes = self.read_bytes(length)?;
        let trimmed: Vec<u8> = bytes.into_iter().take_while(|b| *b != 0).collect();
        String::from_utf8(trimmed)
            .map_err(|e| EvidenceError::InputError(format!("Invalid UTF-8 sequence: {}", e)))
    }
}
