//! Prompt templates for analysis, detection, and follow-up chat.
//!
//! Pure templating: the only branch is tier selection. Both analysis
//! templates demand a single JSON object with no surrounding prose and tell
//! the model to answer in the document's source language; the premium
//! template requests a strictly larger and more granular field set.

use pactscan_core::Tier;

const PREMIUM_INSTRUCTIONS: &str = "\
Analyze the following contract and provide:
1. A list of at least 10 potential risks for the party receiving the contract, each with a brief explanation and severity level (low, medium, high).
2. A list of at least 10 potential opportunities or benefits, each with a brief explanation and impact level (low, medium, high).
3. A comprehensive summary of the contract, including key terms and conditions.
4. An overall score for the contract from 0 to 100, higher being more favourable.
5. Any recommendations for improving the contract from the receiving party's perspective.
6. A list of key clauses in the contract.
7. An assessment of the contract's legal compliance.
8. A list of potential negotiation points.
9. The contract duration or term, if applicable.
10. A summary of termination conditions, if applicable.
11. A breakdown of any compensation or financial terms.
12. Any performance metrics or KPIs mentioned.
13. A summary of any other specific clauses worth attention (e.g. intellectual property, confidentiality).

Format your response as a JSON object with the following structure:
{
  \"risks\": [{\"risk\": \"Risk description\", \"explanation\": \"Brief explanation\", \"severity\": \"low|medium|high\"}],
  \"opportunities\": [{\"opportunity\": \"Opportunity description\", \"explanation\": \"Brief explanation\", \"impact\": \"low|medium|high\"}],
  \"summary\": \"Comprehensive summary of the contract\",
  \"overallScore\": \"Overall score from 0 to 100\",
  \"recommendations\": [\"Recommendation 1\", \"Recommendation 2\"],
  \"keyClauses\": [\"Clause 1\", \"Clause 2\"],
  \"legalCompliance\": \"Assessment of legal compliance\",
  \"negotiationPoints\": [\"Point 1\", \"Point 2\"],
  \"contractDuration\": \"Duration of the contract, if applicable\",
  \"terminationConditions\": \"Summary of termination conditions, if applicable\",
  \"compensationStructure\": {
    \"baseSalary\": \"Amount or description\",
    \"bonuses\": \"Description\",
    \"equity\": \"Description\",
    \"otherBenefits\": \"Description\"
  },
  \"performanceMetrics\": [\"Metric 1\", \"Metric 2\"],
  \"specificClauses\": \"Summary of other notable clauses\"
}";

const FREE_INSTRUCTIONS: &str = "\
Analyze the following contract and provide:
1. A list of at most 6 potential risks for the party receiving the contract, each with a brief explanation.
2. A list of at most 6 potential opportunities or benefits, each with a brief explanation.
3. A brief summary of the contract.
4. An overall score for the contract from 0 to 100, higher being more favourable.
5. Any recommendations for improving the contract from the receiving party's perspective.

Format your response as a JSON object with the following structure:
{
  \"risks\": [{\"risk\": \"Risk description\", \"explanation\": \"Brief explanation\"}],
  \"opportunities\": [{\"opportunity\": \"Opportunity description\", \"explanation\": \"Brief explanation\"}],
  \"summary\": \"Brief summary of the contract\",
  \"overallScore\": \"Overall score from 0 to 100\",
  \"recommendations\": [\"Recommendation 1\", \"Recommendation 2\"]
}";

/// Build the tier-specific analysis prompt for one document.
pub fn analysis_prompt(
    document_text: &str,
    tier: Tier,
    contract_type: &str,
    language: &str,
) -> String {
    let instructions = match tier {
        Tier::Premium => PREMIUM_INSTRUCTIONS,
        Tier::Free => FREE_INSTRUCTIONS,
    };
    format!(
        "{instructions}\n\n\
         The contract is of type: {contract_type}.\n\
         Important: Provide only the JSON object in your response, without any additional text, \
         markdown formatting, or commentary. Write all values in the contract's language ({language}).\n\n\
         Contract text:\n\
         {document_text}"
    )
}

/// Ask the model to name the contract category in a few words.
pub fn detect_type_prompt(text: &str) -> String {
    format!(
        "Classify the following contract by category (for example: Employment, Lease, NDA, \
         Service Agreement, Sales). Respond with the category name only, no explanation.\n\n\
         Contract text:\n\
         {text}"
    )
}

/// Ask the model for the document's ISO-639-1 language code.
pub fn detect_language_prompt(text: &str) -> String {
    format!(
        "Identify the language of the following document. Respond with the two-letter \
         ISO-639-1 code only (for example: en, fr, de).\n\n\
         Document text:\n\
         {text}"
    )
}

/// Ground a follow-up question in a stored analysis.
///
/// `context` is the bounded summary of the stored record; the full contract
/// text follows so the model can quote clauses directly.
pub fn chat_prompt(context: &str, contract_text: &str, question: &str) -> String {
    format!(
        "You are answering questions about a specific contract that has already been analysed.\n\
         Answer based only on the analysis context and contract text below. If the question is \
         not related to the contract, say that it is not related to the contract. If the matter \
         needs professional judgement, recommend consulting with a legal professional.\n\n\
         Analysis context:\n\
         {context}\n\n\
         Contract text:\n\
         {contract_text}\n\n\
         Question: {question}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premium_requests_levels_and_extended_fields() {
        let p = analysis_prompt("text", Tier::Premium, "Employment", "en");
        assert!(p.contains("severity"));
        assert!(p.contains("impact"));
        assert!(p.contains("at least 10"));
        assert!(p.contains("compensationStructure"));
        assert!(p.contains("negotiationPoints"));
    }

    #[test]
    fn free_requests_reduced_field_set() {
        let p = analysis_prompt("text", Tier::Free, "Employment", "en");
        assert!(!p.contains("severity"));
        assert!(!p.contains("impact"));
        assert!(p.contains("at most 6"));
        assert!(!p.contains("compensationStructure"));
        // Score is still included on the free tier.
        assert!(p.contains("overallScore"));
    }

    #[test]
    fn both_tiers_demand_bare_json_in_source_language() {
        for tier in [Tier::Free, Tier::Premium] {
            let p = analysis_prompt("text", tier, "Lease", "de");
            assert!(p.contains("only the JSON object"));
            assert!(p.contains("(de)"));
            assert!(p.contains("type: Lease"));
        }
    }

    #[test]
    fn document_text_is_embedded() {
        let p = analysis_prompt("THE PARTIES AGREE", Tier::Free, "NDA", "en");
        assert!(p.ends_with("THE PARTIES AGREE"));
    }

    #[test]
    fn chat_prompt_carries_context_and_question() {
        let p = chat_prompt("Score: 70", "full text", "What about notice?");
        assert!(p.contains("Score: 70"));
        assert!(p.contains("full text"));
        assert!(p.contains("Question: What about notice?"));
    }
}
