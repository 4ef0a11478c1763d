/// Decode a hex string into bytes, two digits per byte.
///
/// A trailing odd digit is read as a single nibble. Any non-hex digit fails
/// the whole decode.
pub fn hex_to_bytes(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.is_empty() {
        return None;
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}

/// Read bits `bit_start..=bit_end` of the `word`-th big-endian word of
/// `word_len` bytes. Bit 0 is the least significant bit of the word.
///
/// Returns `None` when the word or the bit range lies outside the buffer.
pub fn word_bits(
    bytes: &[u8],
    word_len: usize,
    word: usize,
    bit_start: u32,
    bit_end: u32,
) -> Option<u32> {
    if word_len == 0 || word >= bytes.len() / word_len {
        return None;
    }
    let max_bit = (word_len * 8 - 1) as u32;
    if bit_start > bit_end || bit_end > max_bit || bit_end - bit_start >= u32::BITS {
        return None;
    }

    let base = word * word_len;
    let mut result = 0u32;
    for (shift, bit) in (bit_start..=bit_end).enumerate() {
        let byte = bytes.get(base + (word_len - 1) - (bit / 8) as usize)?;
        if byte & (1 << (bit % 8)) != 0 {
            result |= 1 << shift;
        }
    }
    Some(result)
}

/// ASCII rendering of a hex string, stopping at the first `00` byte or at
/// the first pair that is not hex.
pub fn hex_to_ascii(hex: &str) -> String {
    hex.trim()
        .as_bytes()
        .chunks(2)
        .map_while(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .take_while(|b| *b != 0)
        .map(char::from)
        .collect()
}
