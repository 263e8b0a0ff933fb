//! # AES-128 Block Cipher Core
//!
//! Encrypt-only AES-128 used by the LoRaWAN payload cipher and MIC. Round keys are
//! not expanded up front: a single 16-byte round key is advanced in place before
//! each AddRoundKey, so the whole cipher runs on two stack blocks.
//!
//! The round structure is nine full rounds (SubBytes, ShiftRows, MixColumns,
//! next round key, AddRoundKey) followed by a final round without MixColumns.
//! State bytes are kept in wire order: byte `4 * c + r` is row `r` of column `c`.

use crate::lorawan::session::AesKey;

/// One 16-byte cipher block
pub type Block = [u8; 16];

/// Block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Rounds that include MixColumns
const FULL_ROUNDS: usize = 9;

/// AES substitution box
const S_BOX: [u8; 256] = [
    0x63, 0x7C, 0x77, 0x7B, 0xF2, 0x6B, 0x6F, 0xC5, 0x30, 0x01, 0x67, 0x2B, 0xFE, 0xD7, 0xAB, 0x76,
    0xCA, 0x82, 0xC9, 0x7D, 0xFA, 0x59, 0x47, 0xF0, 0xAD, 0xD4, 0xA2, 0xAF, 0x9C, 0xA4, 0x72, 0xC0,
    0xB7, 0xFD, 0x93, 0x26, 0x36, 0x3F, 0xF7, 0xCC, 0x34, 0xA5, 0xE5, 0xF1, 0x71, 0xD8, 0x31, 0x15,
    0x04, 0xC7, 0x23, 0xC3, 0x18, 0x96, 0x05, 0x9A, 0x07, 0x12, 0x80, 0xE2, 0xEB, 0x27, 0xB2, 0x75,
    0x09, 0x83, 0x2C, 0x1A, 0x1B, 0x6E, 0x5A, 0xA0, 0x52, 0x3B, 0xD6, 0xB3, 0x29, 0xE3, 0x2F, 0x84,
    0x53, 0xD1, 0x00, 0xED, 0x20, 0xFC, 0xB1, 0x5B, 0x6A, 0xCB, 0xBE, 0x39, 0x4A, 0x4C, 0x58, 0xCF,
    0xD0, 0xEF, 0xAA, 0xFB, 0x43, 0x4D, 0x33, 0x85, 0x45, 0xF9, 0x02, 0x7F, 0x50, 0x3C, 0x9F, 0xA8,
    0x51, 0xA3, 0x40, 0x8F, 0x92, 0x9D, 0x38, 0xF5, 0xBC, 0xB6, 0xDA, 0x21, 0x10, 0xFF, 0xF3, 0xD2,
    0xCD, 0x0C, 0x13, 0xEC, 0x5F, 0x97, 0x44, 0x17, 0xC4, 0xA7, 0x7E, 0x3D, 0x64, 0x5D, 0x19, 0x73,
    0x60, 0x81, 0x4F, 0xDC, 0x22, 0x2A, 0x90, 0x88, 0x46, 0xEE, 0xB8, 0x14, 0xDE, 0x5E, 0x0B, 0xDB,
    0xE0, 0x32, 0x3A, 0x0A, 0x49, 0x06, 0x24, 0x5C, 0xC2, 0xD3, 0xAC, 0x62, 0x91, 0x95, 0xE4, 0x79,
    0xE7, 0xC8, 0x37, 0x6D, 0x8D, 0xD5, 0x4E, 0xA9, 0x6C, 0x56, 0xF4, 0xEA, 0x65, 0x7A, 0xAE, 0x08,
    0xBA, 0x78, 0x25, 0x2E, 0x1C, 0xA6, 0xB4, 0xC6, 0xE8, 0xDD, 0x74, 0x1F, 0x4B, 0xBD, 0x8B, 0x8A,
    0x70, 0x3E, 0xB5, 0x66, 0x48, 0x03, 0xF6, 0x0E, 0x61, 0x35, 0x57, 0xB9, 0x86, 0xC1, 0x1D, 0x9E,
    0xE1, 0xF8, 0x98, 0x11, 0x69, 0xD9, 0x8E, 0x94, 0x9B, 0x1E, 0x87, 0xE9, 0xCE, 0x55, 0x28, 0xDF,
    0x8C, 0xA1, 0x89, 0x0D, 0xBF, 0xE6, 0x42, 0x68, 0x41, 0x99, 0x2D, 0x0F, 0xB0, 0x54, 0xBB, 0x16,
];

/// AES-128 encryptor bound to one key
pub struct Aes128<'k> {
    key: &'k AesKey,
}

impl<'k> Aes128<'k> {
    pub fn new(key: &'k AesKey) -> Self {
        Self { key }
    }

    /// Encrypt one block in place
    pub fn encrypt_block(&self, block: &mut Block) {
        let mut round_key = *self.key.as_bytes();
        let mut round_constant = 0x01u8;

        add_round_key(block, &round_key);

        for _ in 0..FULL_ROUNDS {
            sub_bytes(block);
            shift_rows(block);
            mix_columns(block);
            next_round_key(&mut round_key, round_constant);
            round_constant = xtime(round_constant);
            add_round_key(block, &round_key);
        }

        sub_bytes(block);
        shift_rows(block);
        next_round_key(&mut round_key, round_constant);
        add_round_key(block, &round_key);
    }

    /// Encrypt a copy of `block`
    pub fn encrypt(&self, block: &Block) -> Block {
        let mut out = *block;
        self.encrypt_block(&mut out);
        out
    }
}

/// Multiply by x in GF(2^8) modulo x^8 + x^4 + x^3 + x + 1
fn xtime(value: u8) -> u8 {
    if value & 0x80 != 0 {
        (value << 1) ^ 0x1B
    } else {
        value << 1
    }
}

fn add_round_key(state: &mut Block, round_key: &Block) {
    for (byte, key) in state.iter_mut().zip(round_key.iter()) {
        *byte ^= key;
    }
}

fn sub_bytes(state: &mut Block) {
    for byte in state.iter_mut() {
        *byte = S_BOX[*byte as usize];
    }
}

/// Row `r` rotates left by `r` columns
fn shift_rows(state: &mut Block) {
    let old = *state;
    for column in 0..4 {
        for row in 1..4 {
            state[4 * column + row] = old[4 * ((column + row) % 4) + row];
        }
    }
}

fn mix_columns(state: &mut Block) {
    for column in state.chunks_exact_mut(4) {
        let a0 = column[0];
        let all = column[0] ^ column[1] ^ column[2] ^ column[3];
        column[0] ^= all ^ xtime(column[0] ^ column[1]);
        column[1] ^= all ^ xtime(column[1] ^ column[2]);
        column[2] ^= all ^ xtime(column[2] ^ column[3]);
        column[3] ^= all ^ xtime(column[3] ^ a0);
    }
}

/// Advance the round key by one step of the AES-128 key schedule
fn next_round_key(round_key: &mut Block, round_constant: u8) {
    let mut carry = [
        S_BOX[round_key[13] as usize] ^ round_constant,
        S_BOX[round_key[14] as usize],
        S_BOX[round_key[15] as usize],
        S_BOX[round_key[12] as usize],
    ];

    for word in round_key.chunks_exact_mut(4) {
        for (byte, carried) in word.iter_mut().zip(carry.iter_mut()) {
            *byte ^= *carried;
            *carried = *byte;
        }
    }
}
