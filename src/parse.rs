/// Parse a comma-separated list into its finite numeric components.
///
/// Tokens that are empty, non-numeric or non-finite are dropped, never
/// replaced. The caller validates the resulting length.
pub fn parse_components(input: &str) -> Vec<f64> {
    input
        .split(',')
        .filter_map(|tok| tok.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect()
}

/// Parse a single finite scalar.
pub fn parse_scalar(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_triplet() {
        assert_eq!(parse_components("1,2,3"), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn drops_non_numeric_tokens() {
        assert_eq!(parse_components("1,a,3"), vec![1.0, 3.0]);
        assert_eq!(parse_components(" 4 , ,-2.5e1"), vec![4.0, -25.0]);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(parse_components("").is_empty());
    }

    #[test]
    fn non_finite_tokens_are_dropped() {
        assert_eq!(parse_components("inf,1,NaN,-inf,2"), vec![1.0, 2.0]);
    }

    #[test]
    fn output_never_longer_than_token_count() {
        for s in ["", "1", "1,,", "x,y,z", "1,2,3,4,5", ",,,,"] {
            let tokens = s.split(',').count();
            let out = parse_components(s);
            assert!(out.len() <= tokens, "{s:?} gave {out:?}");
            assert!(out.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn scalar_rejects_garbage() {
        assert_eq!(parse_scalar(" 9.81 "), Some(9.81));
        assert_eq!(parse_scalar("abc"), None);
        assert_eq!(parse_scalar("NaN"), None);
        assert_eq!(parse_scalar(""), None);
    }
}
