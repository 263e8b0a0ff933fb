//! # LoRaWAN Payload Cipher and Message Integrity Code
//!
//! Both constructions sit on top of the AES-128 core in [`crate::lorawan::aes`].
//!
//! ## Payload cipher
//!
//! FRMPayload is XORed with a keystream of encrypted counter blocks
//!
//! ```text
//! A_i = 01 | 00 00 00 00 | dir | DevAddr (LE) | FCnt (LE, 32 bit) | 00 | i
//! ```
//!
//! with `i` starting at 1, so encryption and decryption are the same operation.
//!
//! ## MIC
//!
//! AES-CMAC (NIST SP 800-38B) over `B_0 | msg`, truncated to four bytes:
//!
//! ```text
//! B_0 = 49 | 00 00 00 00 | dir | DevAddr (LE) | FCnt (LE, 32 bit) | 00 | len(msg)
//! ```
//!
//! Only uplinks (`dir = 0`) with a 16-bit frame counter are produced here.

use crate::lorawan::aes::{Aes128, Block, BLOCK_SIZE};
use crate::lorawan::session::{AesKey, DevAddr};

/// Length of the truncated MIC
pub const MIC_LEN: usize = 4;

const PAYLOAD_BLOCK_TAG: u8 = 0x01;
const MIC_BLOCK_TAG: u8 = 0x49;
const DIRECTION_UPLINK: u8 = 0x00;

/// CMAC subkey reduction constant for 128-bit blocks
const CMAC_RB: u8 = 0x87;

/// 4-byte message integrity code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mic(pub [u8; MIC_LEN]);

impl Mic {
    pub fn as_bytes(&self) -> &[u8; MIC_LEN] {
        &self.0
    }
}

impl std::fmt::Display for Mic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Shared layout of A_i and B_0
fn frame_block(tag: u8, dev_addr: &DevAddr, fcnt: u16, last: u8) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    block[0] = tag;
    block[5] = DIRECTION_UPLINK;
    block[6..10].copy_from_slice(&dev_addr.wire_bytes());
    block[10..12].copy_from_slice(&fcnt.to_le_bytes());
    block[15] = last;
    block
}

/// Encrypt FRMPayload in place with the AppSKey keystream
pub fn encrypt_payload(buffer: &mut [u8], dev_addr: &DevAddr, app_skey: &AesKey, fcnt: u16) {
    let cipher = Aes128::new(app_skey);

    for (index, chunk) in buffer.chunks_mut(BLOCK_SIZE).enumerate() {
        // Counter is one byte; payloads never exceed 255 bytes.
        let counter = (index + 1) as u8;
        let keystream = cipher.encrypt(&frame_block(PAYLOAD_BLOCK_TAG, dev_addr, fcnt, counter));
        for (byte, key) in chunk.iter_mut().zip(keystream.iter()) {
            *byte ^= key;
        }
    }
}

/// Decrypt FRMPayload in place (the keystream XOR is its own inverse)
pub fn decrypt_payload(buffer: &mut [u8], dev_addr: &DevAddr, app_skey: &AesKey, fcnt: u16) {
    encrypt_payload(buffer, dev_addr, app_skey, fcnt);
}

/// Double a block in GF(2^128)
fn shift_left_reduce(block: &Block) -> Block {
    let mut out = [0u8; BLOCK_SIZE];
    let mut carry = 0u8;
    for i in (0..BLOCK_SIZE).rev() {
        out[i] = (block[i] << 1) | carry;
        carry = block[i] >> 7;
    }
    if carry != 0 {
        out[BLOCK_SIZE - 1] ^= CMAC_RB;
    }
    out
}

/// Derive the CMAC subkeys (K1, K2) for `key`
pub fn generate_subkeys(key: &AesKey) -> (Block, Block) {
    let l = Aes128::new(key).encrypt(&[0u8; BLOCK_SIZE]);
    let k1 = shift_left_reduce(&l);
    let k2 = shift_left_reduce(&k1);
    (k1, k2)
}

fn xor_into(target: &mut Block, data: &[u8]) {
    for (byte, value) in target.iter_mut().zip(data.iter()) {
        *byte ^= value;
    }
}

/// Compute the MIC of `message` (MHDR through the end of FRMPayload).
///
/// `message` must not exceed 255 bytes; its length is carried in one byte of B_0.
pub fn calculate_mic(message: &[u8], nwk_skey: &AesKey, dev_addr: &DevAddr, fcnt: u16) -> Mic {
    let cipher = Aes128::new(nwk_skey);
    let (k1, k2) = generate_subkeys(nwk_skey);
    let b0 = frame_block(MIC_BLOCK_TAG, dev_addr, fcnt, message.len() as u8);

    let mut chain = if message.is_empty() {
        // B_0 is then the final complete block
        let mut last = b0;
        xor_into(&mut last, &k1);
        last
    } else {
        let mut state = cipher.encrypt(&b0);
        let last_start = (message.len() - 1) / BLOCK_SIZE * BLOCK_SIZE;

        for block in message[..last_start].chunks_exact(BLOCK_SIZE) {
            xor_into(&mut state, block);
            cipher.encrypt_block(&mut state);
        }

        let tail = &message[last_start..];
        if tail.len() == BLOCK_SIZE {
            xor_into(&mut state, tail);
            xor_into(&mut state, &k1);
        } else {
            let mut padded = [0u8; BLOCK_SIZE];
            padded[..tail.len()].copy_from_slice(tail);
            padded[tail.len()] = 0x80;
            xor_into(&mut state, &padded);
            xor_into(&mut state, &k2);
        }
        state
    };

    cipher.encrypt_block(&mut chain);

    let mut mic = [0u8; MIC_LEN];
    mic.copy_from_slice(&chain[..MIC_LEN]);
    Mic(mic)
}
