//! Base64 over the standard RFC 4648 alphabet, with the forgiving
//! decoder that MIME bodies and encoded words need in practice.

use data_encoding::{Encoding, BASE64};

/// Decoding table used after the input has been reduced to alphabet
/// symbols. Padding has already been discarded at that point, and the
/// unused low bits of a final partial group are ignored rather than
/// rejected.
const BASE64_LENIENT: Encoding = data_encoding_macro::new_encoding! {
    symbols: "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/",
    check_trailing_bits: false,
};

fn is_alphabet(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/'
}

/// Encode `data` with `=` padding and no line breaks
pub fn encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Length of the padded encoding of `len` input bytes
pub fn encoded_len(len: usize) -> usize {
    BASE64.encode_len(len)
}

/// Decode `text`, skipping anything that is not part of the alphabet
/// (padding, whitespace, 8-bit bytes). A trailing group of two or three
/// symbols yields one or two bytes; a lone trailing symbol carries
/// less than a byte of information and is dropped.
pub fn decode(text: impl AsRef<[u8]>) -> Vec<u8> {
    let mut symbols: Vec<u8> = text
        .as_ref()
        .iter()
        .copied()
        .filter(|&b| is_alphabet(b))
        .collect();
    if symbols.len() % 4 == 1 {
        symbols.pop();
    }
    // Only alphabet symbols remain and the length is never 1 mod 4,
    // which are the only ways an unpadded decode can fail
    BASE64_LENIENT.decode(&symbols).unwrap_or_default()
}
