/// Fraction of a download completed, if the server announced a size.
pub fn progress_fraction(downloaded: u64, total: Option<u64>) -> Option<f32> {
    match total {
        Some(total) if total > 0 => Some((downloaded as f64 / total as f64).min(1.0) as f32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_of_known_total() {
        assert_eq!(progress_fraction(0, Some(200)), Some(0.0));
        assert_eq!(progress_fraction(50, Some(200)), Some(0.25));
        assert_eq!(progress_fraction(200, Some(200)), Some(1.0));
    }

    #[test]
    fn clamps_overshoot() {
        assert_eq!(progress_fraction(300, Some(200)), Some(1.0));
    }

    #[test]
    fn unknown_total() {
        assert_eq!(progress_fraction(10, None), None);
        assert_eq!(progress_fraction(10, Some(0)), None);
    }
}
