//! Prompt templates and builders for the note-generation pipeline.
//!
//! Templates are HTML skeletons the model is told to fill while keeping the
//! tags. They are call parameters, not a durable contract — tweak freely.

/// Raw outline skeleton: numbered main headings with subheadings.
pub const RAW_OUTLINE_TEMPLATE: &str = r#"
<h1>1. SUBJECT MAIN HEADING<h1>
    <h2>SUBJECT SUBHEADING 1<h2>
    <h2>SUBJECT SUBHEADING 2<h2>
    <h2>SUBJECT SUBHEADING N<h2>

<h1>2. SUBJECT MAIN HEADING<h1>
    <h2>SUBJECT SUBHEADING 1<h2>
    <h2>SUBJECT SUBHEADING 2<h2>
    <h2>SUBJECT SUBHEADING N<h2>

<h1>N. SUBJECT MAIN HEADING<h1>
    <h2>SUBJECT SUBHEADING 1<h2>
    <h2>SUBJECT SUBHEADING 2<h2>
    <h2>SUBJECT SUBHEADING N<h2>
"#;

/// Outline skeleton with `[hh:mm:ss]` markers on every heading.
pub const TIMESTAMPED_OUTLINE_TEMPLATE: &str = r#"
<h1>[hh:mm:ss] 1. SUBJECT MAIN HEADING<h1>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING 1<h2>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING 2<h2>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING N<h2>

<h1>[hh:mm:ss] 2. SUBJECT MAIN HEADING<h1>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING 1<h2>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING 2<h2>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING N<h2>

<h1>[hh:mm:ss] N. SUBJECT MAIN HEADING<h1>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING 1<h2>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING 2<h2>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING N<h2>
"#;

/// Full notes skeleton: timestamped headings with bullet lists.
pub const TIMESTAMPED_NOTES_TEMPLATE: &str = r#"
<h1>[hh:mm:ss] 1. SUBJECT MAIN HEADING<h1>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING 1<h2>
        <ul>
            <li><p>bullet 1</p></li>
            <li><p>bullet 2</p></li>
            <li><p>bullet N</p></li>
        </ul>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING 2<h2>
        <ul>
            <li><p>bullet 1</p></li>
            <li><p>bullet 2</p></li>
            <li><p>bullet N</p></li>
        </ul>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING N<h2>
        <ul>
            <li><p>bullet 1</p></li>
            <li><p>bullet 2</p></li>
            <li><p>bullet N</p></li>
        </ul>

<h1>[hh:mm:ss] N. SUBJECT MAIN HEADING<h1>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING 1<h2>
        <ul>
            <li><p>bullet 1</p></li>
            <li><p>bullet 2</p></li>
            <li><p>bullet N</p></li>
        </ul>
    <h2>[hh:mm:ss] SUBJECT SUBHEADING N<h2>
        <ul>
            <li><p>bullet 1</p></li>
            <li><p>bullet 2</p></li>
            <li><p>bullet N</p></li>
        </ul>
"#;

/// Key-term skeleton: main headings only.
pub const KEY_TERMS_TEMPLATE: &str = r#"
<h1>1. SUBJECT MAIN HEADING<h1>
<h1>2. SUBJECT MAIN HEADING<h1>
<h1>N. SUBJECT MAIN HEADING<h1>
"#;

// ---------------------------------------------------------------------------
// Prompt builders
// ---------------------------------------------------------------------------

/// Stage 1: summarize the transcript into an outline.
pub fn outline_prompt() -> String {
    format!(
        "You are a student taking notes for a lecture. Can you summarize this \
         lecture transcript by key topics? Follow this format and keep the html tags:\n{RAW_OUTLINE_TEMPLATE}"
    )
}

/// Stage 2: timestamp the outline against the VTT transcript.
pub fn timestamped_outline_prompt() -> String {
    format!(
        "You are a transcriber that is trying to timestamp lecture notes. Can you \
         timestamp each key topic from the initial outline using the vtt file. \
         Follow this format and keep the html tags:\n{TIMESTAMPED_OUTLINE_TEMPLATE}"
    )
}

/// Stage 3: expand the timestamped outline into detailed notes.
pub fn timestamped_notes_prompt() -> String {
    format!(
        "You are a student trying to write detailed lecture notes. Can you fill in \
         extremely detailed notes for each subheading using the lecture transcript. \
         Follow this format:\n{TIMESTAMPED_NOTES_TEMPLATE}"
    )
}

/// Stage 4: extract the main headings as key terms.
pub fn key_terms_prompt() -> String {
    format!(
        "You are a student trying to review key topics from lecture. Can you extract \
         only the SUBJECT MAIN HEADING without any additional characters from this \
         format:\n{KEY_TERMS_TEMPLATE} Filter out course logistics and administration."
    )
}

/// Research: summarize one chunk of scraped text for a key term.
///
/// The chunk arrives as `URL: text` blocks; bullets must carry their source
/// URL in an `<a href>`.
pub fn chunk_summary_prompt(term: &str, chunk: &str) -> String {
    format!(
        r#"You are an academic smart study assistant helping a student summarize lecture material.

Topic: '{term}'

TASK:
- Read through the grouped texts
- For each important fact add the source url to href.
- Prefer concise, clear notes.
- Ignore repeated, irrelevant, or off-topic content.
- Be sure to follow the output format EXACTLY.

Input format:
URL: Text

Output format:
<h1>{term}<h1>
    <h2>SUBJECT SUBHEADING 1<h2>
        <ul>
            <li><a href=URL >bullet 1</a></li>
            <li><a href=URL >bullet 2</a></li>
            <li><a href=URL >bullet N</a></li>
        </ul>
    <h2>SUBJECT SUBHEADING N<h2>
        <ul>
            <li><a href=URL >bullet 1</a></li>
            <li><a href=URL >bullet 2</a></li>
            <li><a href=URL >bullet N</a></li>
        </ul>

Here is the data grouped by source: {chunk}"#
    )
}

/// Research: merge per-chunk summaries into the final notes for a term.
///
/// `ordinal` is the 1-based position of the term in the key-term list, used
/// to number the final heading.
pub fn combine_summaries_prompt(ordinal: usize, term: &str, summaries: &str) -> String {
    format!(
        r#"You are an academic smart study assistant.

TASK:
- Combine the following multiple summarized notes into one clean, organized, and complete final set of notes.
- Eliminate duplicate points across different sources.
- Group related ideas under common <h2> subheadings whenever possible.
- Make sure each bullet point retains its correct <a href=URL>source</a>.
- Prefer concise and clear phrasing for bullet points.
- Follow this output format EXACTLY:

Output Format:
<h1>{ordinal} {term}</h1>
    <h2>SUBJECT SUBHEADING 1</h2>
        <ul>
            <li><a href=URL>bullet 1</a></li>
            <li><a href=URL>bullet 2</a></li>
            <li><a href=URL>bullet N</a></li>
        </ul>
    <h2>SUBJECT SUBHEADING N</h2>
        <ul>
            <li><a href=URL>bullet 1</a></li>
            <li><a href=URL>bullet 2</a></li>
            <li><a href=URL>bullet N</a></li>
        </ul>

Here are the multiple partial notes to combine:
{summaries}"#
    )
}

// ---------------------------------------------------------------------------
// Model output cleanup
// ---------------------------------------------------------------------------

/// Strip an outer markdown code fence from model output.
///
/// Models often wrap HTML answers in ``` fences; when the first and last
/// lines are fence markers, both are dropped. Unfenced output passes
/// through untouched.
pub fn strip_outer_fence(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();

    let fenced = lines.len() >= 2
        && lines.first().is_some_and(|l| l.trim_start().starts_with("```"))
        && lines.last().is_some_and(|l| l.trim_start().starts_with("```"));

    if fenced {
        lines[1..lines.len() - 1].join("\n")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_prompt_embeds_template() {
        let prompt = outline_prompt();
        assert!(prompt.contains("SUBJECT MAIN HEADING"));
        assert!(prompt.contains("keep the html tags"));
    }

    #[test]
    fn key_terms_prompt_filters_logistics() {
        let prompt = key_terms_prompt();
        assert!(prompt.contains("Filter out course logistics"));
    }

    #[test]
    fn chunk_prompt_embeds_term_and_chunk() {
        let prompt = chunk_summary_prompt("Dijkstra's Algorithm", "https://x.edu: shortest paths");
        assert!(prompt.contains("Topic: 'Dijkstra's Algorithm'"));
        assert!(prompt.contains("https://x.edu: shortest paths"));
    }

    #[test]
    fn combine_prompt_numbers_heading() {
        let prompt = combine_summaries_prompt(3, "Heaps", "partial notes");
        assert!(prompt.contains("<h1>3 Heaps</h1>"));
        assert!(prompt.contains("partial notes"));
    }

    #[test]
    fn strip_fence_removes_fenced_wrapper() {
        let text = "```html\n<h1>Title</h1>\n<p>body</p>\n```";
        assert_eq!(strip_outer_fence(text), "<h1>Title</h1>\n<p>body</p>");
    }

    #[test]
    fn strip_fence_leaves_unfenced_untouched() {
        let text = "<h1>Title</h1>\n<p>body</p>";
        assert_eq!(strip_outer_fence(text), text);
    }

    #[test]
    fn strip_fence_handles_tiny_inputs() {
        assert_eq!(strip_outer_fence(""), "");
        assert_eq!(strip_outer_fence("one line"), "one line");
        assert_eq!(strip_outer_fence("```\n```"), "");
    }
}
