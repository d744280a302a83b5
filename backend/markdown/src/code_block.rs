//! Code Block Scanner
//!
//! Collects fenced code blocks from markdown and pulls the JSON payload out of
//! a model reply.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Parser, Tag};

/// One fenced block: the first word of its info string and its raw contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock {
    pub lang: String,
    pub content: String,
}

impl FencedBlock {
    pub fn is_lang(&self, lang: &str) -> bool {
        self.lang.eq_ignore_ascii_case(lang)
    }
}

pub struct CodeBlockAnalyzer;

const JSON_OPENER: &str = "```json";

impl CodeBlockAnalyzer {
    /// Extracts all fenced code blocks in document order.
    ///
    /// An unterminated fence runs to the end of the input, as CommonMark specifies.
    /// A triple-backtick span on a single line (```` ```json {..}``` ````) is not a
    /// fence to CommonMark, but models emit it; it is reported as a block too.
    pub fn extract_blocks(markdown: &str) -> Vec<FencedBlock> {
        let mut blocks = Vec::new();
        let mut current: Option<FencedBlock> = None;

        for (event, range) in Parser::new(markdown).into_offset_iter() {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    current = Some(FencedBlock {
                        lang: info_lang(&info),
                        content: String::new(),
                    });
                }
                Event::Text(text) => {
                    if let Some(block) = current.as_mut() {
                        block.content.push_str(&text);
                    }
                }
                Event::End(Tag::CodeBlock(_)) => {
                    if let Some(block) = current.take() {
                        blocks.push(block);
                    }
                }
                Event::Code(code) if current.is_none() && markdown[range].starts_with("```") => {
                    if let Some(block) = single_line_block(&code) {
                        blocks.push(block);
                    }
                }
                _ => {}
            }
        }

        blocks
    }

    /// Contents of the first block tagged `lang`, if any.
    pub fn first_block_with_lang(markdown: &str, lang: &str) -> Option<String> {
        Self::extract_blocks(markdown)
            .into_iter()
            .find(|block| block.is_lang(lang))
            .map(|block| block.content)
    }
}

/// Returns the interior of the first `json` fence, trimmed, or the reply verbatim.
///
/// No JSON parsing happens here; the result may still be invalid JSON.
pub fn extract_json_payload(reply: &str) -> String {
    CodeBlockAnalyzer::first_block_with_lang(reply, "json")
        .or_else(|| mid_line_json_block(reply))
        .map(|content| content.trim().to_string())
        .unwrap_or_else(|| reply.to_string())
}

/// A ```` ```json ```` opener preceded by prose on the same line. The block ends at
/// the next line starting with a fence, or at the end of the reply.
fn mid_line_json_block(reply: &str) -> Option<String> {
    reply.match_indices(JSON_OPENER).find_map(|(idx, _)| {
        let (opener_rest, body) = reply[idx + JSON_OPENER.len()..].split_once('\n')?;
        if !opener_rest.trim().is_empty() {
            return None;
        }

        let mut offset = 0;
        for line in body.split_inclusive('\n') {
            if line.trim_start().starts_with("```") {
                break;
            }
            offset += line.len();
        }
        Some(body[..offset].to_string())
    })
}

fn info_lang(info: &CowStr<'_>) -> String {
    info.split_whitespace().next().unwrap_or("").to_string()
}

fn single_line_block(code: &str) -> Option<FencedBlock> {
    let code = code.trim_start();
    let (lang, rest) = code.split_once(char::is_whitespace)?;
    Some(FencedBlock {
        lang: lang.to_string(),
        content: rest.to_string(),
    })
}
