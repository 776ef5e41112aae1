//! Prompt templates for grounded answers

/// Answer the model gives when the context does not contain the information
pub const NOT_AVAILABLE: &str = "Information not available in the provided documents.";

/// Separator placed between ranked context entries
pub const CONTEXT_SEPARATOR: &str = "\n\n==========\n\n";

/// Prompt builder for document Q&A
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render retrieved chunk texts as a ranked context block (ranks start at 0)
    pub fn build_context<S: AsRef<str>>(texts: &[S]) -> String {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| format!("Relevant Context, Rank {} : {}\n", i, text.as_ref()))
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    /// Prompt for a single question answered in one sentence
    pub fn build_question_prompt(question: &str, context: &str) -> String {
        format!(
            "You are a helpful AI assistant trained on the following policy documents.\n\
             User Question: \"{question}\"\n\n\
             Relevant Context:\n{context}\n\n\
             Please answer the user's question **in one clear, complete, and concise sentence**, \
             using the policy context provided. Include relevant statistics from the documents \
             along with numerical figures wherever possible. \
             If the answer is not found in the context, respond with '{not_available}'",
            question = question,
            context = context,
            not_available = NOT_AVAILABLE,
        )
    }

    /// Prompt answering several questions at once as `{"answers": [...]}`
    pub fn build_batch_prompt<S: AsRef<str>>(questions: &[S], context: &str) -> String {
        let numbered = questions
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. {}", i + 1, q.as_ref().trim()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are a helpful AI assistant trained on the following policy documents.
Answer every question below using ONLY the policy context provided.

QUESTIONS ({count}):
{numbered}

RELEVANT CONTEXT:
{context}

FORMATTING RULES:
- Answer each question in one clear, complete, and concise sentence.
- Keep numbers exactly as written in the documents (periods, amounts, percentages, limits).
- If the answer is not found in the context, answer exactly: {not_available}
- Return a JSON object of the form {{"answers": ["...", "..."]}} with exactly {count} strings, one per question, in the same order as the questions.
- Do not number the answers and do not add any text outside the JSON object.

WORKED EXAMPLES:
Questions:
1. What is the grace period for premium payment?
2. Does the policy cover space travel?
Output:
{{"answers": ["A grace period of thirty days is provided for premium payment after the due date.", "{not_available}"]}}

Questions:
1. What is the waiting period for cataract surgery?
Output:
{{"answers": ["The policy has a specific waiting period of two (2) years for cataract surgery."]}}

Now answer the {count} questions above."#,
            count = questions.len(),
            numbered = numbered,
            context = context,
            not_available = NOT_AVAILABLE,
        )
    }
}
