use crate::models::FraudInput;

/// Default payload offered as the reset value for the input editor.
pub const SAMPLE_INPUT_JSON: &str = include_str!("sample_input.json");

/// The sample payload, parsed.
pub fn sample_input() -> FraudInput {
    // Compile-time asset; the test below pins it as valid.
    serde_json::from_str(SAMPLE_INPUT_JSON).unwrap_or_default()
}

/// The sample payload pretty-printed, as shown in the editor after a reset.
pub fn sample_input_text() -> String {
    serde_json::to_string_pretty(&sample_input()).unwrap_or_else(|_| SAMPLE_INPUT_JSON.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Lenient;
    use crate::validator::parse_input;

    #[test]
    fn test_sample_passes_input_validation() {
        let input = parse_input(SAMPLE_INPUT_JSON).expect("sample must be valid");
        assert_eq!(input, sample_input());
        assert_eq!(
            input.sme_profile.business_name,
            Some(Lenient::from("Alpha Supplies Ltd".to_string()))
        );
        assert_eq!(input.recent_transactions.len(), 2);
    }

    #[test]
    fn test_sample_text_reparses_to_sample() {
        assert_eq!(parse_input(&sample_input_text()).unwrap(), sample_input());
    }
}
