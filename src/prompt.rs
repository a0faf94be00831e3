//! Prompt construction for README analysis.
//!
//! The instruction template and the per-strategy format instructions are
//! `'static` constants shared by every analysis without locking.

use crate::output_strategy::OutputStrategy;

/// Instruction template. `{format_instructions}` and `{readme_content}` are
/// substituted by [`PromptBuilder::build`].
pub const PROMPT_TEMPLATE: &str = "\
You are a technical documentation expert analyzing a GitHub repository. Your task is to provide a detailed technical analysis.

{format_instructions}

STRICT REQUIREMENTS:

For the summary:
- Provide specific details about what the repository does
- Mention the main technologies or frameworks used
- Include any unique selling points or key features
- Must be 2-3 informative sentences

For the cool facts:
- Provide exactly three cool facts
- Each fact must highlight a specific technical aspect, such as:
  * Architectural patterns used
  * Performance optimizations
  * Protocols or integration methods
  * Security features
  * Scalability approaches
- Avoid generic statements
- Be specific about technologies, methods, or patterns used
- Include numbers, metrics, or technical specifications when available

Example of good cool facts:
- \"Implements WebSocket for real-time updates with a custom heartbeat mechanism every 30 seconds\"
- \"Uses Redis for caching with a TTL of 24 hours, reducing database load by 70%\"
- \"Implements a microservices architecture with 5 independent services communicating via gRPC\"

Example of bad (too generic) cool facts:
- \"Uses modern development practices\"
- \"Has good performance\"
- \"Follows best practices\"

If the README doesn't contain enough information, analyze the repository name, structure, and context to make educated but specific technical guesses.

README Content:
{readme_content}";

/// Format contract for [`OutputStrategy::LineFormat`].
pub const LINE_FORMAT_INSTRUCTIONS: &str = "\
Respond in exactly this plain-text format, one item per line, and nothing else:
Summary: <2-3 sentence summary of the repository>
Cool fact: <first specific technical fact>
Cool fact: <second specific technical fact>
Cool fact: <third specific technical fact>";

/// Format contract for [`OutputStrategy::SchemaGuided`].
pub const SCHEMA_GUIDED_INSTRUCTIONS: &str = r#"The output should be a markdown code snippet formatted in the following schema, including the leading and trailing "```json" and "```":

```json
{
    "summary": string  // A detailed summary of the repository's purpose, main features, and technology stack (10-500 characters)
    "cool_facts": string[]  // Exactly 3 specific technical facts about the repository's implementation, architecture, or unique features (each at least 10 characters)
}
```"#;

/// Renders the analysis prompt for one strategy.
///
/// Any input text is accepted as-is: empty, huge, or full of braces and
/// control characters.
///
/// ```
/// use readme_digest::{OutputStrategy, PromptBuilder};
///
/// let prompt = PromptBuilder::new(OutputStrategy::LineFormat).build("# my-crate");
/// assert!(prompt.contains("Cool fact:"));
/// assert!(prompt.ends_with("# my-crate"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    format_instructions: &'static str,
}

impl PromptBuilder {
    pub fn new(strategy: OutputStrategy) -> Self {
        let format_instructions = match strategy {
            OutputStrategy::LineFormat => LINE_FORMAT_INSTRUCTIONS,
            OutputStrategy::SchemaGuided => SCHEMA_GUIDED_INSTRUCTIONS,
        };
        Self {
            format_instructions,
        }
    }

    pub fn build(&self, readme: &str) -> String {
        render(
            PROMPT_TEMPLATE,
            &[
                ("format_instructions", self.format_instructions),
                ("readme_content", readme),
            ],
        )
    }
}

/// Substitute `{key}` placeholders in a single pass.
///
/// `{{` and `}}` produce literal braces. Unknown placeholders are kept
/// verbatim. Substituted values are never scanned again, so placeholder-like
/// text inside a value stays untouched.
///
/// ```
/// use readme_digest::prompt::render;
///
/// let out = render("Hi {name}, JSON: {{\"k\": 1}}", &[("name", "{name}")]);
/// assert_eq!(out, r#"Hi {name}, JSON: {"k": 1}"#);
/// ```
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('{') {
            if let Some(end) = tail.find('}') {
                let key = &tail[1..end];
                if let Some((_, value)) = vars.iter().find(|(k, _)| *k == key) {
                    out.push_str(value);
                    rest = &tail[end + 1..];
                    continue;
                }
            }
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic() {
        let result = render("Hello {name}, process {input}", &[("name", "Alice"), ("input", "data")]);
        assert_eq!(result, "Hello Alice, process data");
    }

    #[test]
    fn test_render_unknown_placeholder_kept() {
        assert_eq!(render("keep {this}", &[]), "keep {this}");
    }

    #[test]
    fn test_render_escaped_braces() {
        let result = render("Output format: {{\"result\": {{\"value\": 42}}}}", &[]);
        assert_eq!(result, r#"Output format: {"result": {"value": 42}}"#);
    }

    #[test]
    fn test_render_values_not_rescanned() {
        let result = render("{a}|{b}", &[("a", "{b}"), ("b", "x")]);
        assert_eq!(result, "{b}|x");
    }

    #[test]
    fn test_render_lone_braces() {
        assert_eq!(render("a } b { c", &[]), "a } b { c");
    }

    #[test]
    fn test_line_prompt_embeds_contract_and_input() {
        let readme = "# cache-rs\nAn LRU cache.";
        let prompt = PromptBuilder::new(OutputStrategy::LineFormat).build(readme);
        assert!(prompt.contains(LINE_FORMAT_INSTRUCTIONS));
        assert!(prompt.contains("2-3 informative sentences"));
        assert!(prompt.contains("exactly three cool facts"));
        assert!(prompt.ends_with(readme));
        assert!(!prompt.contains("{format_instructions}"));
    }

    #[test]
    fn test_schema_prompt_uses_json_contract() {
        let prompt = PromptBuilder::new(OutputStrategy::SchemaGuided).build("x");
        assert!(prompt.contains("\"cool_facts\": string[]"));
        assert!(!prompt.contains(LINE_FORMAT_INSTRUCTIONS));
    }

    #[test]
    fn test_readme_with_braces_and_placeholders_verbatim() {
        let readme = "fn main() {{ }} {readme_content} {format_instructions} \u{0007}";
        let prompt = PromptBuilder::new(OutputStrategy::LineFormat).build(readme);
        assert!(prompt.ends_with(readme));
    }

    #[test]
    fn test_empty_readme_accepted() {
        let prompt = PromptBuilder::new(OutputStrategy::LineFormat).build("");
        assert!(prompt.ends_with("README Content:\n"));
    }
}
