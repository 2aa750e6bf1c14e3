pub mod error;
pub mod options;
pub mod response;
pub mod user;

pub use error::{Grammar, ParseError};
pub use options::OptionRecord;
pub use response::{GeoPoint, MatrixRow, ResponseRecord, ResponseType};
pub use user::UserType;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_names_grammar_and_position() {
        let err = ParseError::new(Grammar::Options, "1: a", 3, "expected integer");
        assert_eq!(
            err.to_string(),
            "cannot parse options text at byte 3: expected integer (text: \"1: a\")"
        );
    }

    #[test]
    fn range_step_option_repeats_step() {
        let option = OptionRecord::from_range_step(4);
        assert_eq!(option, OptionRecord::new("4", 4, Some(4)));
    }

    #[test]
    fn option_record_serializes_null_score() {
        let json = serde_json::to_value(OptionRecord::new("Yes", 1, None)).unwrap();
        assert_eq!(json["score"], serde_json::Value::Null);
        assert_eq!(json["name"], "Yes");
    }

    #[test]
    fn user_record_names() {
        let names: Vec<_> = UserType::ALL.iter().map(UserType::record_name).collect();
        assert_eq!(
            names,
            vec!["target_user", "source_user", "input_user", "account_user"]
        );
    }
}
