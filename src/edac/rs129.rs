//! Reed-Solomon (12,9) checksum over GF(2^8) protecting the full link
//! control. Three parity symbols are appended to the nine LC bytes; the
//! decoder is detection-only (the LC layer discards on mismatch), matching
//! how the full LC is validated in practice.

use once_cell::sync::Lazy;

/// GF(2^8) primitive polynomial x^8 + x^4 + x^3 + x^2 + 1.
const PRIM_POLY: u16 = 0x11D;

struct Gf256 {
    exp: [u8; 512],
    log: [u8; 256],
}

static GF: Lazy<Gf256> = Lazy::new(|| {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    for i in 0..255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIM_POLY;
        }
    }
    for i in 255..512 {
        exp[i] = exp[i - 255];
    }
    Gf256 { exp, log }
});

fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let gf = &*GF;
    gf.exp[usize::from(gf.log[usize::from(a)]) + usize::from(gf.log[usize::from(b)])]
}

/// Generator polynomial (x - a^0)(x - a^1)(x - a^2), low-order first,
/// without the monic leading term.
static GENERATOR: Lazy<[u8; 3]> = Lazy::new(|| {
    let gf = &*GF;
    let mut gen = vec![1u8];
    for root in 0..3usize {
        let alpha = gf.exp[root];
        let mut next = vec![0u8; gen.len() + 1];
        for (i, &c) in gen.iter().enumerate() {
            next[i] ^= gf_mul(c, alpha);
            next[i + 1] ^= c;
        }
        gen = next;
    }
    [gen[0], gen[1], gen[2]]
});

/// Compute the three parity symbols for a 9-byte message, highest-order
/// remainder coefficient first (transmit order).
pub fn encode(msg: &[u8; 9]) -> [u8; 3] {
    let gen = &*GENERATOR; // [g0, g1, g2]; g3 = 1 implicit
    let mut rem = [0u8; 3]; // rem[0] holds the x^2 coefficient
    for &byte in msg.iter() {
        let feedback = byte ^ rem[0];
        rem[0] = rem[1] ^ gf_mul(feedback, gen[2]);
        rem[1] = rem[2] ^ gf_mul(feedback, gen[1]);
        rem[2] = gf_mul(feedback, gen[0]);
    }
    rem
}

/// Verify a 12-byte codeword (9 message + 3 parity symbols).
pub fn check(code: &[u8; 12]) -> bool {
    let gf = &*GF;
    // all three syndromes S_i = c(a^i) must vanish
    for i in 0..3usize {
        let alpha = gf.exp[i];
        let mut acc = 0u8;
        for &byte in code.iter() {
            acc = gf_mul(acc, alpha) ^ byte;
        }
        if acc != 0 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codeword(msg: &[u8; 9]) -> [u8; 12] {
        let parity = encode(msg);
        let mut code = [0u8; 12];
        code[..9].copy_from_slice(msg);
        code[9..].copy_from_slice(&parity);
        code
    }

    #[test]
    fn test_encode_check_round_trip() {
        let msgs: [[u8; 9]; 3] = [
            [0; 9],
            [0x00, 0x00, 0x20, 0x00, 0x00, 0x64, 0x00, 0x00, 0x2A],
            [0xFF, 0x01, 0x55, 0xAA, 0x12, 0x34, 0x56, 0x78, 0x9B],
        ];
        for msg in msgs {
            assert!(check(&codeword(&msg)));
        }
    }

    #[test]
    fn test_corruption_detected() {
        let code = codeword(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99]);
        for pos in 0..12 {
            for bit in [0x01u8, 0x80] {
                let mut bad = code;
                bad[pos] ^= bit;
                assert!(!check(&bad), "corruption at byte {pos} undetected");
            }
        }
    }
}
