/// Renders the fixed safety question for a product identifier.
///
/// Pure and deterministic: the identifier appears verbatim in the output
/// and any identifier, including the empty string, yields a prompt.
pub fn safety_prompt(identifier: &str) -> String {
    format!("Is the product {identifier} dangerous and how should it be handled safely?")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(safety_prompt("acetone"), safety_prompt("acetone"));
    }

    #[test]
    fn prompt_contains_identifier_verbatim() {
        for identifier in ["acetone", "NaOH 50%", "7501031311309", "  spaced  ", ""] {
            let prompt = safety_prompt(identifier);
            assert!(prompt.contains(identifier));
        }
    }

    #[test]
    fn prompt_wraps_the_fixed_question() {
        assert_eq!(
            safety_prompt("acetone"),
            "Is the product acetone dangerous and how should it be handled safely?"
        );
    }
}
