//! Uppercase base36 encoding of big-endian byte strings.

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Encode `bytes`, read as one big-endian unsigned integer, in base36.
///
/// Each leading zero byte contributes one leading `'0'`, so distinct inputs of
/// equal numeric value but different length stay distinct.
pub fn encode_base36(bytes: &[u8]) -> String {
    let leading_zeros = bytes.iter().take_while(|b| **b == 0).count();
    let mut number: Vec<u8> = bytes[leading_zeros..].to_vec();
    let mut digits = Vec::with_capacity(bytes.len() * 2);

    while !number.is_empty() {
        let mut remainder: u32 = 0;
        let mut quotient = Vec::with_capacity(number.len());
        for byte in &number {
            let acc = (remainder << 8) | u32::from(*byte);
            let q = acc / 36;
            remainder = acc % 36;
            if !quotient.is_empty() || q != 0 {
                quotient.push(q as u8);
            }
        }
        digits.push(ALPHABET[remainder as usize]);
        number = quotient;
    }

    digits.extend(std::iter::repeat(b'0').take(leading_zeros));
    digits.reverse();
    // Every byte comes from ALPHABET.
    String::from_utf8_lossy(&digits).into_owned()
}
