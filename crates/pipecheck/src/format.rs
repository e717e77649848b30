/// The low `width` bits of `value`, most significant first.
pub fn binary(value: u64, width: usize) -> String {
    (0..width)
        .rev()
        .map(|bit| if bit < 64 && (value >> bit) & 1 == 1 { '1' } else { '0' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_fixed_width() {
        assert_eq!(binary(0b101, 5), "00101");
        assert_eq!(binary(0b1_1111_0000, 4), "0000");
        assert_eq!(binary(1, 0), "");
        assert_eq!(binary(u64::MAX, 66), format!("00{}", "1".repeat(64)));
    }
}
