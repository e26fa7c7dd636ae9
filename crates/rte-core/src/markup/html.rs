use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::content::{
    BOLD, BlockType, CODE, ContentBlock, ContentState, Entity, EntityKey, ITALIC, InlineRun,
    InlineStyleSet, STRIKETHROUGH, UNDERLINE,
};
use crate::markup::MarkupError;
use crate::markup::builder::DocumentBuilder;

/// Inline style tags in nesting order, outermost first.
const STYLE_TAGS: [(&str, &str); 5] = [
    (BOLD, "strong"),
    (ITALIC, "em"),
    (UNDERLINE, "u"),
    (STRIKETHROUGH, "del"),
    (CODE, "code"),
];

const VOID_TAGS: [&str; 11] = [
    "br", "hr", "img", "meta", "link", "input", "col", "area", "base", "wbr", "source",
];

const SKIPPED_TAGS: [&str; 5] = ["head", "style", "script", "title", "template"];

type HtmlWriter = Writer<Vec<u8>>;

fn write(writer: &mut HtmlWriter, event: Event<'_>) -> Result<(), MarkupError> {
    writer
        .write_event(event)
        .map_err(|err| MarkupError::Write(err.to_string()))
}

fn block_tag(block_type: BlockType) -> &'static str {
    match block_type {
        BlockType::HeaderOne => "h1",
        BlockType::HeaderTwo => "h2",
        BlockType::HeaderThree => "h3",
        BlockType::Blockquote => "blockquote",
        BlockType::CodeBlock => "pre",
        BlockType::UnorderedListItem => "ul",
        BlockType::OrderedListItem => "ol",
        BlockType::Unstyled => "p",
    }
}

pub(crate) fn export(content: &ContentState) -> Result<String, MarkupError> {
    let mut writer = Writer::new(Vec::new());
    let blocks = content.blocks();
    let mut ix = 0;
    while ix < blocks.len() {
        if ix > 0 {
            write(&mut writer, Event::Text(BytesText::from_escaped("\n")))?;
        }
        let block = &blocks[ix];
        if block.is_list_item() {
            ix = write_list(&mut writer, content, ix, block.depth())?;
        } else {
            write_block(&mut writer, content, block)?;
            ix += 1;
        }
    }
    String::from_utf8(writer.into_inner()).map_err(|err| MarkupError::Write(err.to_string()))
}

fn write_block(
    writer: &mut HtmlWriter,
    content: &ContentState,
    block: &ContentBlock,
) -> Result<(), MarkupError> {
    let tag = block_tag(block.block_type());
    write(writer, Event::Start(BytesStart::new(tag)))?;
    if block.block_type() == BlockType::CodeBlock {
        write(writer, Event::Start(BytesStart::new("code")))?;
        write_inline(writer, content, block, true)?;
        write(writer, Event::End(BytesEnd::new("code")))?;
    } else {
        write_inline(writer, content, block, false)?;
    }
    write(writer, Event::End(BytesEnd::new(tag)))
}

/// Writes consecutive list items starting at `start`; deeper items nest
/// inside the preceding `<li>`. Returns the index of the first block not
/// written.
fn write_list(
    writer: &mut HtmlWriter,
    content: &ContentState,
    start: usize,
    depth: u8,
) -> Result<usize, MarkupError> {
    let blocks = content.blocks();
    let list_type = blocks[start].block_type();
    let tag = block_tag(list_type);
    write(writer, Event::Start(BytesStart::new(tag)))?;

    let mut ix = start;
    while let Some(block) = blocks.get(ix) {
        if !block.is_list_item() || block.depth() < depth {
            break;
        }
        if block.depth() > depth {
            ix = write_list(writer, content, ix, block.depth())?;
            continue;
        }
        if block.block_type() != list_type {
            break;
        }
        write(writer, Event::Start(BytesStart::new("li")))?;
        write_inline(writer, content, block, false)?;
        ix += 1;
        if let Some(next) = blocks.get(ix)
            && next.is_list_item()
            && next.depth() > depth
        {
            ix = write_list(writer, content, ix, next.depth())?;
        }
        write(writer, Event::End(BytesEnd::new("li")))?;
    }

    write(writer, Event::End(BytesEnd::new(tag)))?;
    Ok(ix)
}

fn write_inline(
    writer: &mut HtmlWriter,
    content: &ContentState,
    block: &ContentBlock,
    in_code_block: bool,
) -> Result<(), MarkupError> {
    if block.is_empty() {
        return write(writer, Event::Empty(BytesStart::new("br")));
    }

    let runs = block.inline_runs();
    let mut after_space = true;
    let mut ix = 0;
    while ix < runs.len() {
        let entity = runs[ix].entity;
        let link = entity
            .and_then(|key| content.entity(key))
            .filter(|entity| entity.is_link())
            .and_then(|entity| entity.url().map(|url| (url, entity)));
        let group_end = runs[ix..]
            .iter()
            .position(|run| run.entity != entity)
            .map_or(runs.len(), |len| ix + len);

        if let Some((url, entity)) = link {
            let mut anchor = BytesStart::new("a");
            anchor.push_attribute(("href", url));
            if let Some(target) = entity.data.get("target").and_then(|v| v.as_str()) {
                anchor.push_attribute(("target", target));
            }
            write(writer, Event::Start(anchor))?;
            for run in &runs[ix..group_end] {
                write_run(writer, run, in_code_block, &mut after_space)?;
            }
            write(writer, Event::End(BytesEnd::new("a")))?;
        } else {
            for run in &runs[ix..group_end] {
                write_run(writer, run, in_code_block, &mut after_space)?;
            }
        }
        ix = group_end;
    }
    Ok(())
}

fn write_run(
    writer: &mut HtmlWriter,
    run: &InlineRun<'_>,
    in_code_block: bool,
    after_space: &mut bool,
) -> Result<(), MarkupError> {
    let tags: Vec<&str> = STYLE_TAGS
        .iter()
        .filter(|(style, _)| run.style.contains(*style))
        .filter(|(style, _)| !(in_code_block && *style == CODE))
        .map(|(_, tag)| *tag)
        .collect();

    for tag in &tags {
        write(writer, Event::Start(BytesStart::new(*tag)))?;
    }
    for (ix, line) in run.text.split('\n').enumerate() {
        if ix > 0 {
            write(writer, Event::Empty(BytesStart::new("br")))?;
            *after_space = true;
        }
        if line.is_empty() {
            continue;
        }
        let text = if in_code_block {
            BytesText::new(line)
        } else {
            BytesText::from_escaped(escape_spaced(line, after_space))
        };
        write(writer, Event::Text(text))?;
    }
    for tag in tags.iter().rev() {
        write(writer, Event::End(BytesEnd::new(*tag)))?;
    }
    Ok(())
}

/// Escapes `text`, turning every space a reader would collapse (at line
/// start or right after another space) into `&nbsp;`.
fn escape_spaced(text: &str, after_space: &mut bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending = String::new();
    for ch in text.chars() {
        if ch == ' ' && *after_space {
            out.push_str(&escape(pending.as_str()));
            out.push_str("&nbsp;");
            pending.clear();
        } else {
            pending.push(ch);
        }
        *after_space = ch == ' ';
    }
    out.push_str(&escape(pending.as_str()));
    out
}

/// Inline style carried by an html tag name.
pub(crate) fn inline_tag_style(tag: &str) -> Option<&'static str> {
    match tag {
        "b" | "strong" => Some(BOLD),
        "i" | "em" => Some(ITALIC),
        "u" | "ins" => Some(UNDERLINE),
        "s" | "del" | "strike" => Some(STRIKETHROUGH),
        "code" => Some(CODE),
        _ => None,
    }
}

#[derive(Debug)]
enum Frame {
    Block,
    Boundary,
    Quote,
    Pre,
    List(BlockType),
    Item(BlockType, u8),
    Style(&'static str),
    Link(EntityKey),
    Skip,
    Transparent,
}

struct Importer {
    builder: DocumentBuilder,
    stack: Vec<(String, Frame)>,
}

impl Importer {
    fn skipping(&self) -> bool {
        self.stack
            .iter()
            .any(|(_, frame)| matches!(frame, Frame::Skip))
    }

    fn in_pre(&self) -> bool {
        self.stack
            .iter()
            .any(|(_, frame)| matches!(frame, Frame::Pre))
    }

    fn list_depth(&self) -> usize {
        self.stack
            .iter()
            .filter(|(_, frame)| matches!(frame, Frame::List(_)))
            .count()
    }

    fn style(&self) -> InlineStyleSet {
        self.stack
            .iter()
            .filter_map(|(_, frame)| match frame {
                Frame::Style(style) => Some(style.to_string()),
                _ => None,
            })
            .collect()
    }

    fn link(&self) -> Option<&EntityKey> {
        self.stack.iter().rev().find_map(|(_, frame)| match frame {
            Frame::Link(key) => Some(key),
            _ => None,
        })
    }

    /// Block type (and depth) that loose text falls into here.
    fn context_block(&self) -> (BlockType, u8) {
        for (_, frame) in self.stack.iter().rev() {
            match frame {
                Frame::Item(block_type, depth) => return (*block_type, *depth),
                Frame::Quote => return (BlockType::Blockquote, 0),
                Frame::Pre => return (BlockType::CodeBlock, 0),
                _ => {}
            }
        }
        (BlockType::Unstyled, 0)
    }

    fn push_text(&mut self, text: &str) {
        if self.skipping() || text.is_empty() {
            return;
        }
        let text: Cow<'_, str> = if self.in_pre() {
            if self.builder.current_text().is_empty() {
                Cow::Borrowed(text.strip_prefix('\n').unwrap_or(text))
            } else {
                Cow::Borrowed(text)
            }
        } else {
            let mut collapsed = collapse_whitespace(text);
            let at_line_start = self
                .builder
                .current_text()
                .chars()
                .last()
                .is_none_or(|ch| ch == ' ' || ch == '\n');
            if at_line_start && collapsed.starts_with(' ') {
                collapsed.remove(0);
            }
            // Non-breaking spaces hold spacing that would otherwise collapse.
            Cow::Owned(collapsed.replace('\u{a0}', " "))
        };
        let style = self.style();
        let context = self.context_block();
        let link = self.link().cloned();
        self.builder
            .push_text(&text, &style, link.as_ref(), context);
    }

    fn push_break(&mut self) {
        if self.skipping() {
            return;
        }
        let style = self.style();
        let context = self.context_block();
        let link = self.link().cloned();
        self.builder.push_text("\n", &style, link.as_ref(), context);
    }

    fn open(&mut self, tag: String, start: &BytesStart<'_>) {
        if self.skipping() {
            if !VOID_TAGS.contains(&tag.as_str()) {
                self.stack.push((tag, Frame::Transparent));
            }
            return;
        }
        if tag == "br" {
            self.push_break();
            return;
        }
        if VOID_TAGS.contains(&tag.as_str()) {
            return;
        }

        let in_item = self.context_block().0.is_list_item();
        let frame = match tag.as_str() {
            name if SKIPPED_TAGS.contains(&name) => Frame::Skip,
            "p" if in_item => Frame::Transparent,
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let block_type = match tag.as_str() {
                    "h1" => BlockType::HeaderOne,
                    "h2" => BlockType::HeaderTwo,
                    "h3" | "h4" | "h5" | "h6" => BlockType::HeaderThree,
                    _ => self.context_block().0,
                };
                let block_type = if block_type.is_list_item() {
                    BlockType::Unstyled
                } else {
                    block_type
                };
                self.builder.start_block(block_type, 0);
                Frame::Block
            }
            "div" | "section" | "article" | "header" | "footer" | "main" | "body" => {
                self.builder.finish_block();
                Frame::Boundary
            }
            "blockquote" => {
                self.builder.finish_block();
                Frame::Quote
            }
            "pre" => {
                self.builder.start_block(BlockType::CodeBlock, 0);
                Frame::Pre
            }
            "ul" | "ol" => {
                self.builder.finish_block();
                Frame::List(if tag == "ol" {
                    BlockType::OrderedListItem
                } else {
                    BlockType::UnorderedListItem
                })
            }
            "li" => {
                let list_type = self
                    .stack
                    .iter()
                    .rev()
                    .find_map(|(_, frame)| match frame {
                        Frame::List(block_type) => Some(*block_type),
                        _ => None,
                    })
                    .unwrap_or(BlockType::UnorderedListItem);
                let depth = u8::try_from(self.list_depth().saturating_sub(1)).unwrap_or(u8::MAX);
                self.builder.start_block(list_type, depth);
                Frame::Item(list_type, depth)
            }
            "code" if self.in_pre() => Frame::Transparent,
            "a" => match attribute(start, "href") {
                Some(href) => {
                    let mut entity = Entity::link(href);
                    if let Some(target) = attribute(start, "target") {
                        entity = entity.with_data("target", target);
                    }
                    Frame::Link(self.builder.add_entity(entity))
                }
                None => Frame::Transparent,
            },
            name => inline_tag_style(name).map_or(Frame::Transparent, Frame::Style),
        };
        self.stack.push((tag, frame));
    }

    fn close(&mut self, tag: &str) {
        let Some(ix) = self.stack.iter().rposition(|(name, _)| name == tag) else {
            return;
        };
        while self.stack.len() > ix {
            let Some((_, frame)) = self.stack.pop() else {
                break;
            };
            match frame {
                Frame::Block
                | Frame::Pre
                | Frame::Item(..)
                | Frame::List(_)
                | Frame::Boundary
                | Frame::Quote => self.builder.finish_block(),
                _ => {}
            }
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

fn tag_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_ascii_lowercase()
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Option<String> {
    start
        .html_attributes()
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(name.as_bytes()))
        .map(|attr| unescape(&String::from_utf8_lossy(&attr.value)))
}

/// Resolves a character reference name (without `&` and `;`).
fn resolve_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        match tail.find(';').and_then(|semi| {
            resolve_reference(&tail[..semi]).map(|ch| (ch, semi))
        }) {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn import(html: &str) -> Result<ContentState, MarkupError> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut importer = Importer {
        builder: DocumentBuilder::new(),
        stack: Vec::new(),
    };

    loop {
        let event = reader
            .read_event()
            .map_err(|err| MarkupError::Html(err.to_string()))?;
        match event {
            Event::Start(start) => {
                let tag = tag_name(start.name().as_ref());
                importer.open(tag, &start);
            }
            Event::Empty(start) => {
                let tag = tag_name(start.name().as_ref());
                importer.open(tag.clone(), &start);
                importer.close(&tag);
            }
            Event::End(end) => importer.close(&tag_name(end.name().as_ref())),
            Event::Text(text) => {
                let text = String::from_utf8_lossy(&text).into_owned();
                importer.push_text(&text);
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                importer.push_text(&text);
            }
            Event::GeneralRef(reference) => {
                let name = String::from_utf8_lossy(&reference).into_owned();
                match resolve_reference(&name) {
                    Some(ch) => importer.push_text(ch.encode_utf8(&mut [0; 4])),
                    None => importer.push_text(&format!("&{name};")),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(importer.builder.finish())
}
