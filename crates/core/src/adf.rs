//! Rendering of ADF (Atlassian Document Format) documents to Markdown
//!
//! ADF is the JSON tree format Jira uses for rich text: a `doc` root whose
//! descendants are typed block nodes (paragraphs, headings, lists, tables)
//! and inline nodes (text runs with formatting marks, mentions, emoji).
//! The functions here walk that tree and produce Markdown suitable for
//! terminal or LLM consumption.
//!
//! Rendering never fails: malformed or unrecognized substructures degrade
//! to plain text or to nothing instead of producing an error.

use serde_json::Value;

const INDENT: &str = "  ";

/// A single node of an ADF document tree.
///
/// Built with [`AdfNode::from_value`], which is total: fields that are
/// missing or have an unexpected JSON shape default to empty rather than
/// failing the conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdfNode {
    pub kind: NodeKind,
    /// Child nodes. `None` when the raw node carried no `content` field at
    /// all, as opposed to an explicitly empty sequence.
    pub content: Option<Vec<AdfNode>>,
    pub attrs: Attrs,
    pub text: Option<String>,
    pub marks: Vec<Mark>,
}

/// Node discriminator. Unknown `type` strings map to [`NodeKind::Unrecognized`]
/// so new ADF node types fall into the plain-text fallback paths instead of
/// needing source changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    Blockquote,
    Panel,
    CodeBlock,
    Rule,
    Table,
    TableRow,
    TableHeader,
    TableCell,
    Text,
    Emoji,
    Mention,
    InlineCard,
    Status,
    Date,
    HardBreak,
    #[default]
    Unrecognized,
}

impl NodeKind {
    fn from_type(node_type: &str) -> Self {
        match node_type {
            "doc" => NodeKind::Doc,
            "paragraph" => NodeKind::Paragraph,
            "heading" => NodeKind::Heading,
            "bulletList" => NodeKind::BulletList,
            "orderedList" => NodeKind::OrderedList,
            "listItem" => NodeKind::ListItem,
            "blockquote" => NodeKind::Blockquote,
            "panel" => NodeKind::Panel,
            "codeBlock" => NodeKind::CodeBlock,
            "rule" => NodeKind::Rule,
            "table" => NodeKind::Table,
            "tableRow" => NodeKind::TableRow,
            "tableHeader" => NodeKind::TableHeader,
            "tableCell" => NodeKind::TableCell,
            "text" => NodeKind::Text,
            "emoji" => NodeKind::Emoji,
            "mention" => NodeKind::Mention,
            "inlineCard" => NodeKind::InlineCard,
            "status" => NodeKind::Status,
            "date" => NodeKind::Date,
            "hardBreak" => NodeKind::HardBreak,
            _ => NodeKind::Unrecognized,
        }
    }
}

/// Node attributes. Only the attributes the renderer consumes are kept;
/// empty strings are normalized to `None` so fallback chains
/// (`text`, then `shortName`, ...) behave uniformly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs {
    pub level: Option<i64>,
    pub order: Option<i64>,
    pub title: Option<String>,
    pub language: Option<String>,
    pub text: Option<String>,
    pub short_name: Option<String>,
    pub display_name: Option<String>,
    pub id: Option<String>,
    pub url: Option<String>,
    pub timestamp: Option<String>,
}

impl Attrs {
    fn from_value(attrs: &Value) -> Self {
        Self {
            level: attrs.get("level").and_then(Value::as_i64),
            order: attrs.get("order").and_then(Value::as_i64),
            title: string_attr(attrs, "title"),
            language: string_attr(attrs, "language"),
            text: string_attr(attrs, "text"),
            short_name: string_attr(attrs, "shortName"),
            display_name: string_attr(attrs, "displayName"),
            id: string_attr(attrs, "id"),
            url: string_attr(attrs, "url"),
            // Jira emits date timestamps as strings of epoch millis, but be
            // tolerant of plain numbers too.
            timestamp: match attrs.get("timestamp") {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            },
        }
    }
}

fn string_attr(attrs: &Value, key: &str) -> Option<String> {
    attrs
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A formatting mark attached to a text node.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub kind: MarkKind,
    /// Target of a `link` mark; `None` for other marks or empty hrefs.
    pub href: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Strong,
    Em,
    Strike,
    Underline,
    Code,
    Link,
    Unrecognized,
}

impl MarkKind {
    fn from_type(mark_type: &str) -> Self {
        match mark_type {
            "strong" => MarkKind::Strong,
            "em" => MarkKind::Em,
            "strike" => MarkKind::Strike,
            "underline" => MarkKind::Underline,
            "code" => MarkKind::Code,
            "link" => MarkKind::Link,
            _ => MarkKind::Unrecognized,
        }
    }
}

impl Mark {
    fn from_value(value: &Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .map(MarkKind::from_type)
            .unwrap_or(MarkKind::Unrecognized);
        let href = value
            .get("attrs")
            .and_then(|attrs| attrs.get("href"))
            .and_then(Value::as_str)
            .filter(|href| !href.is_empty())
            .map(str::to_string);
        Self { kind, href }
    }
}

impl AdfNode {
    /// Build a typed node tree from raw JSON. Total: never fails.
    pub fn from_value(value: &Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .map(NodeKind::from_type)
            .unwrap_or(NodeKind::Unrecognized);
        let content = value
            .get("content")
            .and_then(Value::as_array)
            .map(|nodes| nodes.iter().map(AdfNode::from_value).collect());
        let attrs = value
            .get("attrs")
            .map(Attrs::from_value)
            .unwrap_or_default();
        let text = value
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string);
        let marks = value
            .get("marks")
            .and_then(Value::as_array)
            .map(|marks| marks.iter().map(Mark::from_value).collect())
            .unwrap_or_default();
        Self {
            kind,
            content,
            attrs,
            text,
            marks,
        }
    }

    fn children(&self) -> &[AdfNode] {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Render a Jira rich-text value to Markdown.
///
/// The value may be the `doc` node itself, a comment object with a `body`
/// doc, an issue field object with a `description` doc, or a bare
/// version-tagged doc fragment. When no document can be found the result is
/// the empty string — many ticket fields are legitimately empty.
///
/// # Arguments
/// * `value` - The raw field value from the Jira API, if any
///
/// # Returns
/// * `String` - The rendered Markdown, possibly empty
pub fn render_markdown(value: Option<&Value>) -> String {
    match value.and_then(extract_doc) {
        Some(doc) => render_document(&doc),
        None => String::new(),
    }
}

/// Locate the `doc` node inside a possibly-wrapped value. First match wins.
fn extract_doc(value: &Value) -> Option<AdfNode> {
    if !value.is_object() {
        return None;
    }
    if is_doc(value) {
        return Some(AdfNode::from_value(value));
    }
    if let Some(body) = value.get("body") {
        if is_doc(body) {
            return Some(AdfNode::from_value(body));
        }
    }
    if let Some(description) = value.get("description") {
        if is_doc(description) {
            return Some(AdfNode::from_value(description));
        }
    }
    let has_content = value.get("content").is_some_and(Value::is_array);
    let has_version = value.get("version").is_some_and(|v| !v.is_null());
    if has_content && has_version {
        return Some(AdfNode::from_value(value));
    }
    None
}

fn is_doc(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some("doc")
}

/// Render the top-level blocks of a document, joined by blank lines.
fn render_document(doc: &AdfNode) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for node in doc.children() {
        let lines = render_block(node, 0);
        if lines.is_empty() {
            continue;
        }
        blocks.push(lines.join("\n"));
    }
    blocks.join("\n\n")
}

/// Render one block node at the given list nesting depth into output lines.
fn render_block(node: &AdfNode, list_level: usize) -> Vec<String> {
    match node.kind {
        NodeKind::Paragraph => render_paragraph_lines(node),
        NodeKind::Heading => vec![render_heading(node)],
        NodeKind::BulletList => render_list(node, list_level, false),
        NodeKind::OrderedList => render_list(node, list_level, true),
        NodeKind::Blockquote => render_blockquote(node, list_level),
        NodeKind::Panel => render_panel(node, list_level),
        NodeKind::CodeBlock => render_code_block(node),
        NodeKind::Rule => vec!["---".to_string()],
        NodeKind::Table => render_table(node),
        _ => {
            // Unknown block types degrade to their collected plain text so
            // future ADF nodes stay readable instead of disappearing.
            let text = collect_text(node);
            if text.is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        }
    }
}

/// Render a paragraph's inline children. A `hardBreak` ends the current
/// line (trailing-trimmed, with the two-space Markdown break marker) and
/// starts the next one. Always yields at least one line.
fn render_paragraph_lines(node: &AdfNode) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for child in node.children() {
        if child.kind == NodeKind::HardBreak {
            let mut line = current.trim_end().to_string();
            line.push_str("  ");
            lines.push(line);
            current = String::new();
        } else {
            current.push_str(&render_inline(child));
        }
    }
    lines.push(current);
    lines
}

fn render_heading(node: &AdfNode) -> String {
    let level = node.attrs.level.unwrap_or(1).clamp(1, 6) as usize;
    let text: String = node.children().iter().map(render_inline).collect();
    format!("{} {}", "#".repeat(level), text)
        .trim_end()
        .to_string()
}

fn render_list(node: &AdfNode, list_level: usize, ordered: bool) -> Vec<String> {
    // Ordered lists honor the start offset but always increment by one.
    let mut index = if ordered {
        node.attrs.order.unwrap_or(1)
    } else {
        1
    };
    let mut lines = Vec::new();
    for item in node.children() {
        lines.extend(render_list_item(item, list_level, ordered, index));
        if ordered {
            index += 1;
        }
    }
    lines
}

fn render_list_item(node: &AdfNode, list_level: usize, ordered: bool, index: i64) -> Vec<String> {
    let indent = INDENT.repeat(list_level);
    let bullet = if ordered {
        format!("{index}.")
    } else {
        "-".to_string()
    };
    let bullet_prefix = format!("{indent}{bullet} ");
    // Secondary lines align under the item text, not the marker.
    let continuation_prefix = " ".repeat(bullet_prefix.len());
    let content = node.children();
    if content.is_empty() {
        return vec![bullet_prefix.trim_end().to_string()];
    }

    let mut lines = Vec::new();
    let first = &content[0];
    if first.kind == NodeKind::Paragraph {
        let paragraph_lines = render_paragraph_lines(first);
        match paragraph_lines.split_first() {
            Some((head, rest)) => {
                lines.push(format!("{bullet_prefix}{head}"));
                for line in rest {
                    lines.push(format!("{continuation_prefix}{line}"));
                }
            }
            None => lines.push(bullet_prefix.trim_end().to_string()),
        }
    } else {
        lines.push(bullet_prefix.trim_end().to_string());
        lines.extend(render_block_in_list(first, list_level, &continuation_prefix));
    }

    for block in &content[1..] {
        lines.extend(render_block_in_list(block, list_level, &continuation_prefix));
    }
    lines
}

fn render_block_in_list(
    node: &AdfNode,
    list_level: usize,
    continuation_prefix: &str,
) -> Vec<String> {
    match node.kind {
        // Nested lists deepen one level instead of taking a text prefix.
        NodeKind::BulletList | NodeKind::OrderedList => render_block(node, list_level + 1),
        _ => render_block(node, list_level)
            .into_iter()
            .map(|line| format!("{continuation_prefix}{line}"))
            .collect(),
    }
}

fn render_blockquote(node: &AdfNode, list_level: usize) -> Vec<String> {
    let inner = render_inner_blocks(node.children(), list_level, false);
    if inner.is_empty() {
        return vec![">".to_string()];
    }
    inner
        .iter()
        .map(|line| format!("> {line}").trim_end().to_string())
        .collect()
}

/// Panels render as blockquotes with the panel title bolded into the first
/// line.
fn render_panel(node: &AdfNode, list_level: usize) -> Vec<String> {
    let title = node
        .attrs
        .title
        .as_deref()
        .map(|title| format!("**{}** ", escape_markdown(title)))
        .unwrap_or_default();
    let inner = render_inner_blocks(node.children(), list_level, false);
    if inner.is_empty() {
        return vec![format!("> {title}").trim_end().to_string()];
    }
    let mut lines = vec![format!("> {}{}", title, inner[0]).trim_end().to_string()];
    for line in &inner[1..] {
        lines.push(format!("> {line}").trim_end().to_string());
    }
    lines
}

fn render_code_block(node: &AdfNode) -> Vec<String> {
    let code = collect_text(node);
    let fence = match node.attrs.language.as_deref() {
        Some(language) => format!("```{language}"),
        None => "```".to_string(),
    };
    let mut lines = vec![fence];
    if code.is_empty() {
        lines.push(String::new());
    } else {
        lines.extend(code.lines().map(str::to_string));
    }
    lines.push("```".to_string());
    lines
}

/// Render a table as GitHub-flavored pipe rows. A `tableHeader` cell in any
/// row marks the whole table as header-bearing.
fn render_table(node: &AdfNode) -> Vec<String> {
    let rows = node.children();
    if rows.is_empty() {
        return Vec::new();
    }

    let mut rendered_rows: Vec<Vec<String>> = Vec::new();
    let mut header_row = false;
    for row in rows {
        let mut rendered_cells = Vec::new();
        for cell in row.children() {
            if cell.kind == NodeKind::TableHeader {
                header_row = true;
            }
            let cell_lines = render_inner_blocks(cell.children(), 0, true);
            rendered_cells.push(cell_lines.join("<br>").trim().to_string());
        }
        rendered_rows.push(rendered_cells);
    }

    let col_count = rendered_rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut lines = vec![pipe_row(&rendered_rows[0], col_count)];
    if header_row {
        lines.push(format!("| {} |", vec!["---"; col_count].join(" | ")));
    }
    let skip = if header_row { 1 } else { 0 };
    for row in rendered_rows.iter().skip(skip) {
        lines.push(pipe_row(row, col_count));
    }
    lines
}

fn pipe_row(cells: &[String], col_count: usize) -> String {
    let mut padded: Vec<&str> = cells.iter().map(String::as_str).collect();
    padded.resize(col_count, "");
    format!("| {} |", padded.join(" | "))
}

/// Render each child block and rejoin the results: blocks are separated by
/// a blank line, or by a single newline in tight mode (table cells).
fn render_inner_blocks(nodes: &[AdfNode], list_level: usize, tight: bool) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    for node in nodes {
        let lines = render_block(node, list_level);
        if lines.is_empty() {
            continue;
        }
        blocks.push(lines.join("\n"));
    }
    if blocks.is_empty() {
        return Vec::new();
    }
    let separator = if tight { "\n" } else { "\n\n" };
    blocks
        .join(separator)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Render one inline node to a string.
fn render_inline(node: &AdfNode) -> String {
    match node.kind {
        NodeKind::Text => apply_marks(node.text.as_deref().unwrap_or_default(), &node.marks),
        NodeKind::Emoji => node
            .attrs
            .text
            .clone()
            .or_else(|| node.attrs.short_name.clone())
            .unwrap_or_default(),
        NodeKind::Mention => {
            let name = node
                .attrs
                .text
                .as_deref()
                .or(node.attrs.display_name.as_deref())
                .or(node.attrs.id.as_deref())
                .unwrap_or_default();
            if name.is_empty() {
                String::new()
            } else {
                format!("@{name}")
            }
        }
        NodeKind::InlineCard => node
            .attrs
            .url
            .as_deref()
            .map(|url| format!("<{url}>"))
            .unwrap_or_default(),
        NodeKind::Status => node
            .attrs
            .text
            .as_deref()
            .map(|text| format!("`{}`", escape_markdown(text)))
            .unwrap_or_default(),
        NodeKind::Date => node
            .attrs
            .text
            .clone()
            .or_else(|| node.attrs.timestamp.clone())
            .unwrap_or_default(),
        // Line breaks are handled at the paragraph level.
        NodeKind::HardBreak => String::new(),
        _ => {
            if node.content.is_some() {
                node.children().iter().map(render_inline).collect()
            } else if let Some(text) = node.text.as_deref().filter(|t| !t.is_empty()) {
                escape_markdown(text)
            } else if let Some(url) = node.attrs.url.as_deref() {
                format!("<{url}>")
            } else {
                String::new()
            }
        }
    }
}

/// Apply formatting marks in a fixed precedence, regardless of the order
/// they appear on the node: a `code` mark overrides everything else; then
/// strong, em, strike, and underline each wrap the prior result; a `link`
/// mark wraps last.
fn apply_marks(text: &str, marks: &[Mark]) -> String {
    if marks.is_empty() {
        return escape_markdown(text);
    }

    if marks.iter().any(|mark| mark.kind == MarkKind::Code) {
        // Inside a code span only the backtick needs escaping.
        return format!("`{}`", text.replace('`', "\\`"));
    }

    let mut value = escape_markdown(text);
    if marks.iter().any(|mark| mark.kind == MarkKind::Strong) {
        value = format!("**{value}**");
    }
    if marks.iter().any(|mark| mark.kind == MarkKind::Em) {
        value = format!("*{value}*");
    }
    if marks.iter().any(|mark| mark.kind == MarkKind::Strike) {
        value = format!("~~{value}~~");
    }
    if marks.iter().any(|mark| mark.kind == MarkKind::Underline) {
        value = format!("<u>{value}</u>");
    }

    if let Some(link) = marks.iter().find(|mark| mark.kind == MarkKind::Link) {
        if let Some(href) = link.href.as_deref() {
            value = format!("[{value}]({href})");
        }
    }
    value
}

/// Escape Markdown metacharacters in literal text. Backslashes are doubled
/// first so the escapes themselves are not re-escaped.
fn escape_markdown(text: &str) -> String {
    let mut escaped = text.replace('\\', "\\\\");
    for ch in ['`', '*', '_', '~', '[', ']'] {
        escaped = escaped.replace(ch, &format!("\\{ch}"));
    }
    escaped
}

/// Collect the raw text of a subtree: text payloads, newlines for hard
/// breaks, and display text for emoji and mentions. Used by code blocks
/// and by the unknown-node fallback.
fn collect_text(node: &AdfNode) -> String {
    match node.kind {
        NodeKind::Text => node.text.clone().unwrap_or_default(),
        NodeKind::HardBreak => "\n".to_string(),
        NodeKind::Emoji | NodeKind::Mention => node
            .attrs
            .text
            .clone()
            .or_else(|| node.attrs.short_name.clone())
            .unwrap_or_default(),
        _ => node.children().iter().map(collect_text).collect(),
    }
}
