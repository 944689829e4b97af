//! Prompt construction and chunking.
//!
//! A pull request with many changed files cannot always be reviewed in a
//! single model call. The diff source's file list is packed, in order, into
//! chunks whose rendered prompt stays within a character budget; each chunk
//! is analyzed independently and the findings are concatenated in chunk
//! order, which preserves the diff source's file order end to end.

use review_warden_developer_platforms::models::ChangedFile;

#[cfg(test)]
#[path = "prompts_tests.rs"]
mod tests;

/// Marker appended to a diff that had to be cut to fit the chunk budget.
const TRUNCATION_MARKER: &str = "\n[diff truncated to fit the analysis budget]";

/// The response-format instructions appended to every analysis prompt.
const RESPONSE_FORMAT: &str = r#"Provide the analysis in JSON format:
{
  "suggestions": [
    {
      "file_path": "<path of the file the suggestion applies to>",
      "line_number": <number or null>,
      "suggestion": "<specific suggestion>",
      "category": "architecture|best_practice|performance|maintainability",
      "severity": "low|medium|high"
    }
  ],
  "security_issues": [
    {
      "file_path": "<path of the file the issue applies to>",
      "line_number": <number or null>,
      "issue_type": "<type>",
      "description": "<description>",
      "severity": "low|medium|high|critical",
      "recommendation": "<how to fix>"
    }
  ],
  "complexity_score": <0-100>,
  "maintainability_score": <0-100>,
  "overall_assessment": "<brief summary>"
}"#;

/// One model-sized unit of work: a rendered prompt plus the paths of the
/// files it covers.
///
/// The paths double as the parser's set of known files for the chunk, so a
/// finding can never reference a file outside the chunk that produced it.
#[derive(Debug, Clone)]
pub struct PromptChunk {
    /// The fully rendered prompt text
    pub prompt: String,

    /// The paths of the files covered by this chunk, in diff source order
    pub paths: Vec<String>,
}

/// Renders the diff section for a single changed file.
///
/// A file whose rendered section alone exceeds the budget is truncated with
/// a visible marker rather than dropped; a partial diff still gives the
/// model something to work with.
fn render_file(file: &ChangedFile, budget: usize) -> String {
    let header = format!(
        "File: {} (+{} / -{})\n```diff\n",
        file.path, file.additions, file.deletions
    );
    let footer = "\n```\n\n";

    let overhead = header.len() + footer.len() + TRUNCATION_MARKER.len();
    let patch = if header.len() + footer.len() + file.patch.len() > budget {
        let keep = budget.saturating_sub(overhead);
        let cut: String = file.patch.chars().take(keep).collect();
        format!("{}{}", cut, TRUNCATION_MARKER)
    } else {
        file.patch.clone()
    };

    format!("{}{}{}", header, patch, footer)
}

/// Renders the prompt for one chunk of file sections.
fn render_prompt(pr_title: &str, sections: &str) -> String {
    format!(
        "Analyze these changed files from the pull request \"{}\" and provide a detailed review:\n\n{}{}",
        pr_title, sections, RESPONSE_FORMAT
    )
}

/// Packs changed files into prompts that fit within a character budget.
///
/// Files are packed greedily in the order the diff source returned them: a
/// chunk is closed as soon as adding the next file's rendered section would
/// push the chunk past `chunk_budget`. Every file lands in exactly one
/// chunk, and the concatenation of all chunks' `paths` equals the input
/// order.
///
/// # Arguments
///
/// * `pr_title` - The pull request title, included as context in each prompt
/// * `files` - The changed files in diff source order
/// * `chunk_budget` - The approximate maximum number of characters of file
///   sections per chunk
///
/// # Returns
///
/// The chunks in file order; empty iff `files` is empty.
pub fn build_chunks(pr_title: &str, files: &[ChangedFile], chunk_budget: usize) -> Vec<PromptChunk> {
    let mut chunks = Vec::new();
    let mut sections = String::new();
    let mut paths: Vec<String> = Vec::new();

    for file in files {
        let section = render_file(file, chunk_budget);

        if !paths.is_empty() && sections.len() + section.len() > chunk_budget {
            chunks.push(PromptChunk {
                prompt: render_prompt(pr_title, &sections),
                paths: std::mem::take(&mut paths),
            });
            sections.clear();
        }

        sections.push_str(&section);
        paths.push(file.path.clone());
    }

    if !paths.is_empty() {
        chunks.push(PromptChunk {
            prompt: render_prompt(pr_title, &sections),
            paths,
        });
    }

    chunks
}
