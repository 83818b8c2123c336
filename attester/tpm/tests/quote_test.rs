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

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use evidence_api::TcgAlgorithmId;
use tpm_attester::quote::{
    encode_report, split_report, TpmSignatureAlgId, TpmsAttest, TpmtSignature,
};

// Quote produced by a real TPM over PCRs 0-7 (sha256 bank) with a 16-byte
// nonce as qualifying data.
const QUOTE_DATA: &str = concat!(
    "/1RDR4AYACIAC4AUbRH7b7Tx6NWCEXXAfTkXtGVl28mbdO8mgjtmLc3dABBGW/LurKot1UeCQBxSXeBv",
    "AAAACAemgS0ekmZKo0yPswG4TAdhkO8QbgAAAAEACwP/AAAAIPM1m5EaC4D9tYvMGKh/xRAgDvxo8KTn",
    "yLeNljrSeBMY"
);

const SIGNATURE: &str = concat!(
    "ABQACwEAMbPyNICmUBuQQNU3jNEnexOaTSLV1sXLRMEvZtxVvB9bvcRCUqkhW/5IdarIlsBoeKos+fwA",
    "tdY/rHmGkc5WJVQbuq6CiT72058oSscYV1wt7phle2ipS9sA9DNm6U6Fja3D4fdoP7BiHwMq16v0VDG1",
    "0lgbtqlqYjKMkmOsRVpaVgm06ujfOLRiATCoT7VYazOl2yYC18ErsqsSFZAuWkusdLHnm1H9z9orY37r",
    "3Ub20CTqHs7dcbUAtGXlNYQCnwl79nZcHfnHkJr5mXtxfCk0bKr8mr1FTtmcfQEYKsn90nK5I7Aa7KTI",
    "ZBtf9LRB1coblcA+ZnmdkZXV21gShQ=="
);

const NONCE: &str = "Rlvy7qyqLdVHgkAcUl3gbw==";

#[test]
fn test_parse_real_quote() {
    let quote_bytes = BASE64.decode(QUOTE_DATA).unwrap();
    let nonce = BASE64.decode(NONCE).unwrap();

    let attest = TpmsAttest::parse(&quote_bytes).unwrap();

    // The nonce travels as the extra data.
    assert_eq!(attest.extra_data, nonce);

    assert_eq!(attest.attested.pcr_select.len(), 1);
    let selection = &attest.attested.pcr_select[0];
    assert_eq!(selection.hash_alg, TcgAlgorithmId::Sha256);
    assert_eq!(selection.selected_pcrs(), (0..=7).collect::<Vec<u32>>());
    assert_eq!(attest.attested.pcr_digest.len(), 32);
}

#[test]
fn test_parse_real_signature() {
    let signature_bytes = BASE64.decode(SIGNATURE).unwrap();
    let signature = TpmtSignature::parse(&signature_bytes).unwrap();

    assert_eq!(signature.sig_alg, TpmSignatureAlgId::RsaSsa);
    assert_eq!(signature.hash_alg, TcgAlgorithmId::Sha256);
    assert_eq!(signature.signature.len(), 256);
}

#[test]
fn test_report_round_trip() {
    let quote_bytes = BASE64.decode(QUOTE_DATA).unwrap();
    let signature_bytes = BASE64.decode(SIGNATURE).unwrap();

    let report = encode_report(&quote_bytes, &signature_bytes);
    let (quote, signature) = split_report(&report).unwrap();
    assert_eq!(quote, quote_bytes);
    assert_eq!(signature, signature_bytes);

    assert!(TpmsAttest::parse(quote).is_ok());
    assert!(TpmtSignature::parse(signature).is_ok());
}

#[test]
fn test_parse_rejects_corrupt_magic() {
    let mut quote_bytes = BASE64.decode(QUOTE_DATA).unwrap();
    quote_bytes[0] = 0x00;
    assert!(TpmsAttest::parse(&quote_bytes).is_err());
}

#[test]
fn test_split_rejects_bad_length_prefix() {
    assert!(split_report(&[0, 0]).is_err());

    // Length prefix claims more bytes than the payload holds.
    let report = encode_report(&[1, 2, 3], &[]);
    assert!(split_report(&report[..5]).is_err());
}
