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

use log::info;

/* Dump raw evidence bytes through the log facade, 16 bytes per line:
   00000000 04 00 02 00 81 00 00 00 00 00 00 00 93 9A 72 33  ..............r3
   00000010 F7 9C 4C A9 94 0A 0D B3 95 7F 06 07 D5 68 59 C7  ..L..........hY.
*/
pub fn dump_data(data: &[u8]) {
    for (line, chunk) in data.chunks(16).enumerate() {
        let mut hexstr = String::with_capacity(48);
        let mut printstr = String::with_capacity(16);
        for byte in chunk {
            hexstr.push_str(&format!("{:02X} ", byte));
            if byte.is_ascii_graphic() || *byte == b' ' {
                printstr.push(*byte as char);
            } else {
                printstr.push('.');
            }
        }
        info!("{:08X} {:<48} {}", line * 16, hexstr, printstr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_data_handles_partial_lines() {
        // Output goes to the log facade; this only exercises the chunking.
        dump_data(&[]);
        dump_data(&[0x41; 16]);
        dump_data(&[0x00, 0x41, 0xFF]);
    }
}
