use rand::Rng;

pub fn generate() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{code:06}")
}

#[cfg(test)]
mod tests {
    use super::generate;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let code = generate();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn otp_parses_into_the_expected_range() {
        let code = generate();
        let value: u32 = code.parse().unwrap();
        assert!(value < 1_000_000);
    }
}
