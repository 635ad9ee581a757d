//! Few-shot prompt construction. Pure text, no I/O.

use crate::models::review::ExamplePair;

/// Opening sentence before the example pairs.
pub const PREAMBLE: &str = "Here are some reviews and responses:\n";

/// Closing instruction. `{review}` is replaced with the target review text.
pub const CLOSING_TEMPLATE: &str = "Use the reviews and responses to generate a response in a similar style to this review: {review}\nResponse:";

/// Renders the examples, in order, followed by the closing instruction for
/// `target_review`. Pair text is passed through without escaping, so a body
/// containing its own "Review:" line is indistinguishable from a delimiter.
pub fn build_prompt(examples: &[ExamplePair], target_review: &str) -> String {
    let mut prompt = String::from(PREAMBLE);
    for pair in examples {
        prompt.push_str(&format_pair(pair));
    }
    prompt.push_str(&CLOSING_TEMPLATE.replace("{review}", target_review));
    prompt
}

fn format_pair(pair: &ExamplePair) -> String {
    format!("Review: {}\nResponse: {}\n\n", pair.review, pair.response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(review: &str, response: &str) -> ExamplePair {
        ExamplePair {
            review: review.to_string(),
            response: response.to_string(),
        }
    }

    #[test]
    fn test_prompt_embeds_pairs_in_order_then_target() {
        let examples = vec![
            pair("Great food", "Thanks!"),
            pair("Bad service", "Sorry"),
            pair("Loved it", "Glad you did"),
        ];
        let prompt = build_prompt(&examples, "Too slow");

        assert_eq!(
            prompt,
            "Here are some reviews and responses:\n\
             Review: Great food\nResponse: Thanks!\n\n\
             Review: Bad service\nResponse: Sorry\n\n\
             Review: Loved it\nResponse: Glad you did\n\n\
             Use the reviews and responses to generate a response in a similar style to this review: Too slow\nResponse:"
        );
    }

    #[test]
    fn test_every_pair_appears_verbatim_in_relative_order() {
        let examples: Vec<_> = (0..12)
            .map(|i| pair(&format!("review number {i}"), &format!("reply number {i}")))
            .collect();
        let prompt = build_prompt(&examples, "target");

        let mut cursor = 0;
        for example in &examples {
            let review_at = prompt[cursor..].find(&example.review).unwrap() + cursor;
            let response_at = prompt[review_at..].find(&example.response).unwrap() + review_at;
            cursor = response_at;
        }
        assert!(prompt[cursor..].contains("this review: target"));
    }

    #[test]
    fn test_zero_examples_still_reference_target() {
        let prompt = build_prompt(&[], "Cold coffee");
        assert!(prompt.starts_with(PREAMBLE));
        assert!(prompt.contains("in a similar style to this review: Cold coffee"));
        assert!(prompt.ends_with("\nResponse:"));
    }

    #[test]
    fn test_multiline_content_is_not_escaped() {
        let examples = vec![pair("Line one\nReview: fake", "Reply\n\nwith gap")];
        let prompt = build_prompt(&examples, "t");
        assert!(prompt.contains("Review: Line one\nReview: fake\nResponse: Reply\n\nwith gap\n\n"));
    }
}
