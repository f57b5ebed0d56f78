//! Prompt builder for proposal rounds
//!
//! Every round gets a fresh prompt carrying the fixed search policy and the
//! lists the run has built so far, so the model can avoid repeats.

use crate::tool::CHECK_WEBSITE_TOOL;
use crate::types::ProposalRequest;

/// Build the prompt for one proposal round
pub fn build_proposal_prompt(request: &ProposalRequest<'_>) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "# SCOUT - Round {} of {}\n\n",
        request.iteration, request.max_iterations
    ));
    prompt.push_str("You are Scout, a research agent.\n\n");

    prompt.push_str("## GOAL\n\n");
    prompt.push_str("Find websites that have a pricing page.\n\n");

    prompt.push_str("## RULES\n\n");
    prompt.push_str("1. Generate a candidate URL which points to a pricing page.\n");
    prompt.push_str(&format!(
        "2. Call `{}` on the candidate URL.\n",
        CHECK_WEBSITE_TOOL
    ));
    prompt.push_str("3. Don't try the ones that have been tried before.\n");
    prompt.push_str("4. Prefer SaaS / software / online services.\n\n");

    push_list(&mut prompt, "ALREADY FOUND", request.found);
    push_list(&mut prompt, "TRIED BEFORE", request.tried);

    prompt
}

fn push_list(prompt: &mut String, title: &str, urls: &[String]) {
    prompt.push_str(&format!("## {}\n\n", title));
    if urls.is_empty() {
        prompt.push_str("(none)\n");
    }
    for url in urls {
        prompt.push_str(&format!("- {}\n", url));
    }
    prompt.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_round_prompt() {
        let prompt = build_proposal_prompt(&ProposalRequest {
            found: &[],
            tried: &[],
            iteration: 1,
            max_iterations: 20,
        });

        assert!(prompt.contains("Round 1 of 20"));
        assert!(prompt.contains("check_website_exists"));
        assert!(prompt.contains("Prefer SaaS"));
        assert!(prompt.contains("(none)"));
    }

    #[test]
    fn test_prompt_lists_history() {
        let found = vec!["https://a.com/pricing".to_string()];
        let tried = vec![
            "https://a.com/pricing".to_string(),
            "https://nope.example/pricing".to_string(),
        ];
        let prompt = build_proposal_prompt(&ProposalRequest {
            found: &found,
            tried: &tried,
            iteration: 3,
            max_iterations: 20,
        });

        let found_at = prompt.find("## ALREADY FOUND").unwrap();
        let tried_at = prompt.find("## TRIED BEFORE").unwrap();
        assert!(found_at < tried_at);
        assert!(prompt[tried_at..].contains("- https://nope.example/pricing"));
        assert!(!prompt.contains("(none)"));
    }
}
