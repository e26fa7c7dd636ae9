use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};

use crate::content::{
    BOLD, BlockType, CODE, ContentBlock, ContentState, Entity, EntityKey, ITALIC, InlineRun,
    InlineStyleSet, STRIKETHROUGH,
};
use crate::markup::builder::DocumentBuilder;
use crate::markup::html::inline_tag_style;

struct Mark {
    style: &'static str,
    /// Tried in order; the first one that can open and close wins.
    delimiters: &'static [&'static str],
    open_tag: &'static str,
    close_tag: &'static str,
}

/// Emphasis in nesting order, outermost first. A span falls back to inline
/// html when none of its delimiters would be recognized where it starts and
/// ends. Code spans are written separately since they cannot contain other
/// markup.
const MARKS: [Mark; 3] = [
    Mark {
        style: BOLD,
        delimiters: &["**"],
        open_tag: "<strong>",
        close_tag: "</strong>",
    },
    Mark {
        style: ITALIC,
        delimiters: &["_", "*"],
        open_tag: "<em>",
        close_tag: "</em>",
    },
    Mark {
        style: STRIKETHROUGH,
        delimiters: &["~~"],
        open_tag: "<del>",
        close_tag: "</del>",
    },
];

const ESCAPED: &[char] = &[
    '\\', '*', '_', '`', '[', ']', '<', '>', '#', '~', '&', '!', '|',
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CharClass {
    Space,
    Punct,
    Word,
}

impl CharClass {
    fn of(ch: char) -> Self {
        if ch.is_whitespace() {
            CharClass::Space
        } else if ch.is_ascii_punctuation() {
            CharClass::Punct
        } else if ch.is_ascii() || ch.is_alphanumeric() {
            CharClass::Word
        } else {
            CharClass::Punct
        }
    }
}

/// Whether `delimiter` opens or closes emphasis with `inside` on the
/// emphasized side and `outside` on the other (CommonMark flanking rules).
fn flanks(delimiter: &str, inside: CharClass, outside: CharClass) -> bool {
    match inside {
        CharClass::Space => false,
        _ if delimiter.starts_with('_') => outside != CharClass::Word,
        CharClass::Punct => outside != CharClass::Word,
        CharClass::Word => true,
    }
}

#[derive(Clone, Copy)]
struct Cell {
    ch: char,
    marks: [bool; 3],
    code: bool,
}

impl Cell {
    fn is_loose_space(&self) -> bool {
        !self.code && self.ch.is_whitespace()
    }
}

fn nesting(marks: [bool; 3]) -> impl Iterator<Item = usize> {
    (0..MARKS.len()).filter(move |&mark| marks[mark])
}

/// Spaces take the emphasis both neighbours share, so every delimiter ends
/// up against a non-space character.
fn settle_spaces(cells: &mut [Cell]) {
    let mut ix = 0;
    while ix < cells.len() {
        if !cells[ix].is_loose_space() {
            ix += 1;
            continue;
        }
        let end = ix + cells[ix..].iter().take_while(|cell| cell.is_loose_space()).count();
        let before = ix.checked_sub(1).map(|prev| cells[prev].marks);
        let after = cells.get(end).map(|cell| cell.marks);
        let mut shared = [false; 3];
        if let (Some(before), Some(after)) = (before, after) {
            for (a, b) in nesting(before).zip(nesting(after)) {
                if a != b {
                    break;
                }
                shared[a] = true;
            }
        }
        for cell in &mut cells[ix..end] {
            cell.marks = shared;
        }
        ix = end;
    }
}

enum Piece {
    Text(String),
    Code(String),
    Open(usize),
    Close(usize),
}

impl Piece {
    fn first_class(&self) -> CharClass {
        match self {
            Piece::Text(text) => text.chars().next().map_or(CharClass::Space, CharClass::of),
            _ => CharClass::Punct,
        }
    }

    fn last_class(&self) -> CharClass {
        match self {
            Piece::Text(text) => text.chars().next_back().map_or(CharClass::Space, CharClass::of),
            _ => CharClass::Punct,
        }
    }
}

/// Splits a line into pieces with properly nested spans. Spans are numbered
/// in opening order; the second vector holds each span's index into `MARKS`.
fn split_pieces(cells: &[Cell]) -> (Vec<Piece>, Vec<usize>) {
    let mut pieces = Vec::new();
    let mut span_marks: Vec<usize> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut ix = 0;
    while ix < cells.len() {
        let cell = cells[ix];
        let desired: Vec<usize> = nesting(cell.marks).collect();
        let common = open
            .iter()
            .zip(&desired)
            .take_while(|(span, mark)| span_marks[**span] == **mark)
            .count();
        while open.len() > common {
            if let Some(span) = open.pop() {
                pieces.push(Piece::Close(span));
            }
        }
        for &mark in &desired[common..] {
            open.push(span_marks.len());
            pieces.push(Piece::Open(span_marks.len()));
            span_marks.push(mark);
        }

        let len = cells[ix..]
            .iter()
            .take_while(|next| next.marks == cell.marks && next.code == cell.code)
            .count();
        let text: String = cells[ix..ix + len].iter().map(|cell| cell.ch).collect();
        pieces.push(if cell.code {
            Piece::Code(text)
        } else {
            Piece::Text(text)
        });
        ix += len;
    }
    while let Some(span) = open.pop() {
        pieces.push(Piece::Close(span));
    }
    (pieces, span_marks)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Form {
    Delimiter(&'static str),
    Tag,
}

/// Whether the piece at `ix` sits next to a delimiter already chosen with
/// the same character, which would merge the two into one run.
fn touches_same_run(
    pieces: &[Piece],
    forms: &[Option<Form>],
    ix: usize,
    delimiter: &str,
) -> bool {
    [ix.checked_sub(1), Some(ix + 1)]
        .into_iter()
        .flatten()
        .filter_map(|neighbour| pieces.get(neighbour))
        .any(|piece| {
            let (Piece::Open(span) | Piece::Close(span)) = piece else {
                return false;
            };
            matches!(
                forms[*span],
                Some(Form::Delimiter(other)) if other.chars().next() == delimiter.chars().next()
            )
        })
}

/// Picks a delimiter or inline html for every span. `before` and `after`
/// classify what surrounds the line in the output.
fn choose_forms(
    pieces: &[Piece],
    span_marks: &[usize],
    before: CharClass,
    after: CharClass,
) -> Vec<Form> {
    let mut ends = vec![(0, 0); span_marks.len()];
    for (ix, piece) in pieces.iter().enumerate() {
        match piece {
            Piece::Open(span) => ends[*span].0 = ix,
            Piece::Close(span) => ends[*span].1 = ix,
            _ => {}
        }
    }
    let prev = |ix: usize| {
        ix.checked_sub(1)
            .map_or(before, |prev| pieces[prev].last_class())
    };
    let next = |ix: usize| pieces.get(ix + 1).map_or(after, Piece::first_class);

    let mut forms: Vec<Option<Form>> = vec![None; span_marks.len()];
    for (mark, spec) in MARKS.iter().enumerate() {
        for span in (0..span_marks.len()).filter(|&span| span_marks[span] == mark) {
            let (open, close) = ends[span];
            let delimiter = spec.delimiters.iter().copied().find(|delimiter| {
                flanks(delimiter, next(open), prev(open))
                    && flanks(delimiter, prev(close), next(close))
                    && !touches_same_run(pieces, &forms, open, delimiter)
                    && !touches_same_run(pieces, &forms, close, delimiter)
            });
            forms[span] = Some(delimiter.map_or(Form::Tag, Form::Delimiter));
        }
    }
    forms
        .into_iter()
        .map(|form| form.unwrap_or(Form::Tag))
        .collect()
}

struct InlineWriter<'a> {
    out: &'a mut String,
    at_line_start: bool,
    continuation: &'a str,
    line_breaks: bool,
}

impl InlineWriter<'_> {
    fn line_break(&mut self) {
        if self.line_breaks {
            self.out.push_str("\\\n");
            self.out.push_str(self.continuation);
            self.at_line_start = true;
        } else {
            self.out.push(' ');
        }
    }

    fn text(&mut self, text: &str) {
        let mut chars = text.chars().peekable();
        if self.at_line_start {
            let digits: String = text.chars().take_while(char::is_ascii_digit).collect();
            let after = text[digits.len()..].chars().next();
            if !digits.is_empty() && matches!(after, Some('.' | ')')) {
                self.out.push_str(&digits);
                for _ in 0..digits.len() {
                    chars.next();
                }
                self.out.push('\\');
            } else if matches!(chars.peek(), Some('-' | '+' | '=')) {
                self.out.push('\\');
            }
        }
        for ch in chars {
            if ESCAPED.contains(&ch) {
                self.out.push('\\');
            }
            self.out.push(ch);
        }
        if !text.is_empty() {
            self.at_line_start = false;
        }
    }

    fn code(&mut self, text: &str) {
        let longest = text.split(|ch| ch != '`').map(str::len).max().unwrap_or(0);
        let fence = "`".repeat(longest + 1);
        let edge_space = text.starts_with(' ') || text.ends_with(' ');
        let padded = text.contains('`') || (edge_space && !text.chars().all(|ch| ch == ' '));
        let pad = if padded { " " } else { "" };
        self.out.push_str(&fence);
        self.out.push_str(pad);
        self.out.push_str(text);
        self.out.push_str(pad);
        self.out.push_str(&fence);
        self.at_line_start = false;
    }

    fn delimiter(&mut self, token: &str) {
        self.out.push_str(token);
        self.at_line_start = false;
    }

    /// Writes runs that share one link (or none). `after` classifies what
    /// follows the last line.
    fn styled(&mut self, runs: &[InlineRun<'_>], after: CharClass) {
        let mut cells: Vec<Cell> = runs
            .iter()
            .flat_map(|run| {
                let mut marks = [false; 3];
                for (slot, mark) in marks.iter_mut().zip(&MARKS) {
                    *slot = run.style.contains(mark.style);
                }
                let code = run.style.contains(CODE);
                run.text.chars().map(move |ch| Cell { ch, marks, code })
            })
            .collect();
        let lines = cells.iter().filter(|cell| cell.ch == '\n').count() + 1;
        let break_class = if self.line_breaks {
            CharClass::Punct
        } else {
            CharClass::Space
        };
        for (ix, line) in cells.split_mut(|cell| cell.ch == '\n').enumerate() {
            if ix > 0 {
                self.line_break();
            }
            self.line(line, if ix + 1 < lines { break_class } else { after });
        }
    }

    fn line(&mut self, cells: &mut [Cell], after: CharClass) {
        if cells.is_empty() {
            return;
        }
        settle_spaces(cells);
        let before = self
            .out
            .chars()
            .next_back()
            .map_or(CharClass::Space, CharClass::of);
        let (pieces, span_marks) = split_pieces(cells);
        let forms = choose_forms(&pieces, &span_marks, before, after);
        for piece in &pieces {
            match piece {
                Piece::Text(text) => self.text(text),
                Piece::Code(text) => self.code(text),
                Piece::Open(span) => self.delimiter(match forms[*span] {
                    Form::Delimiter(delimiter) => delimiter,
                    Form::Tag => MARKS[span_marks[*span]].open_tag,
                }),
                Piece::Close(span) => self.delimiter(match forms[*span] {
                    Form::Delimiter(delimiter) => delimiter,
                    Form::Tag => MARKS[span_marks[*span]].close_tag,
                }),
            }
        }
    }
}

/// The link entity and url a run belongs to, if any.
fn run_link<'a>(
    content: &'a ContentState,
    run: &InlineRun<'a>,
) -> Option<(&'a EntityKey, &'a str)> {
    let key = run.entity?;
    let url = content
        .entity(key)
        .filter(|entity| entity.is_link())
        .and_then(Entity::url)?;
    Some((key, url))
}

fn write_inline(
    out: &mut String,
    content: &ContentState,
    block: &ContentBlock,
    continuation: &str,
    line_breaks: bool,
) {
    let mut writer = InlineWriter {
        out,
        at_line_start: true,
        continuation,
        line_breaks,
    };
    let runs = block.inline_runs();
    let mut ix = 0;
    while ix < runs.len() {
        let link = run_link(content, &runs[ix]);
        let group_end = runs[ix..]
            .iter()
            .position(|run| run_link(content, run) != link)
            .map_or(runs.len(), |len| ix + len);
        let group = &runs[ix..group_end];

        if let Some((_, url)) = link {
            writer.out.push('[');
            writer.at_line_start = false;
            writer.styled(group, CharClass::Punct);
            writer.out.push_str("](");
            if url.contains([' ', '(', ')']) {
                writer.out.push('<');
                writer.out.push_str(url);
                writer.out.push('>');
            } else {
                writer.out.push_str(url);
            }
            writer.out.push(')');
        } else {
            let after = if group_end < runs.len() {
                CharClass::Punct
            } else {
                CharClass::Space
            };
            writer.styled(group, after);
        }
        ix = group_end;
    }
}

pub(crate) fn export(content: &ContentState) -> String {
    let mut out = String::new();
    let mut marker_widths: Vec<usize> = Vec::new();
    let mut counters: Vec<usize> = Vec::new();
    let mut prev_list = false;
    let mut first = true;

    for block in content.blocks() {
        let block_type = block.block_type();
        if block.is_empty() && matches!(block_type, BlockType::Unstyled | BlockType::Blockquote) {
            continue;
        }
        let is_list = block.is_list_item();
        if !first {
            out.push_str(if is_list && prev_list { "\n" } else { "\n\n" });
        }
        first = false;
        if is_list && !prev_list {
            marker_widths.clear();
            counters.clear();
        }
        prev_list = is_list;

        match block_type {
            BlockType::HeaderOne | BlockType::HeaderTwo | BlockType::HeaderThree => {
                let hashes = match block_type {
                    BlockType::HeaderOne => "#",
                    BlockType::HeaderTwo => "##",
                    _ => "###",
                };
                out.push_str(hashes);
                if !block.is_empty() {
                    out.push(' ');
                    write_inline(&mut out, content, block, "", false);
                }
            }
            BlockType::Blockquote => {
                out.push_str("> ");
                write_inline(&mut out, content, block, "> ", true);
            }
            BlockType::CodeBlock => {
                out.push_str("```\n");
                if !block.is_empty() {
                    out.push_str(block.text());
                    out.push('\n');
                }
                out.push_str("```");
            }
            BlockType::UnorderedListItem | BlockType::OrderedListItem => {
                let depth = usize::from(block.depth());
                marker_widths.resize(depth + 1, 2);
                counters.resize(depth + 1, 0);
                let marker = if block_type == BlockType::OrderedListItem {
                    counters[depth] += 1;
                    format!("{}. ", counters[depth])
                } else {
                    counters[depth] = 0;
                    "- ".to_string()
                };
                let indent: usize = marker_widths[..depth].iter().sum();
                marker_widths[depth] = marker.len();

                out.push_str(&" ".repeat(indent));
                if block.is_empty() {
                    out.push_str(marker.trim_end());
                } else {
                    out.push_str(&marker);
                    let continuation = " ".repeat(indent + marker.len());
                    write_inline(&mut out, content, block, &continuation, true);
                }
            }
            BlockType::Unstyled => write_inline(&mut out, content, block, "", true),
        }
    }
    out
}

enum Frame {
    Paragraph,
    Heading,
    Quote,
    Code,
    List(BlockType),
    Item {
        block_type: BlockType,
        depth: u8,
        paragraphs: usize,
    },
    Style(&'static str),
    /// Style opened by an inline html tag.
    Html(&'static str),
    Link(EntityKey),
    Other,
}

struct Importer {
    builder: DocumentBuilder,
    stack: Vec<Frame>,
}

impl Importer {
    fn style(&self) -> InlineStyleSet {
        self.stack
            .iter()
            .filter_map(|frame| match frame {
                Frame::Style(style) | Frame::Html(style) => Some(style.to_string()),
                _ => None,
            })
            .collect()
    }

    fn link(&self) -> Option<EntityKey> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Link(key) => Some(key.clone()),
            _ => None,
        })
    }

    fn context_block(&self) -> (BlockType, u8) {
        for frame in self.stack.iter().rev() {
            match frame {
                Frame::Item {
                    block_type, depth, ..
                } => return (*block_type, *depth),
                Frame::Quote => return (BlockType::Blockquote, 0),
                Frame::Code => return (BlockType::CodeBlock, 0),
                _ => {}
            }
        }
        (BlockType::Unstyled, 0)
    }

    fn push_text(&mut self, text: &str, extra_style: Option<&str>) {
        let mut style = self.style();
        if let Some(extra) = extra_style {
            style.insert(extra.to_string());
        }
        let link = self.link();
        let context = self.context_block();
        self.builder.push_text(text, &style, link.as_ref(), context);
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => {
                let quoted = matches!(self.context_block().0, BlockType::Blockquote);
                match self.stack.last_mut() {
                    Some(Frame::Item {
                        block_type,
                        depth,
                        paragraphs,
                    }) => {
                        *paragraphs += 1;
                        if *paragraphs > 1 {
                            let (block_type, depth) = (*block_type, *depth);
                            self.builder.start_block(block_type, depth);
                        }
                    }
                    _ if quoted => self.builder.start_block(BlockType::Blockquote, 0),
                    _ => self.builder.start_block(BlockType::Unstyled, 0),
                }
                Frame::Paragraph
            }
            Tag::Heading { level, .. } => {
                let block_type = match level {
                    HeadingLevel::H1 => BlockType::HeaderOne,
                    HeadingLevel::H2 => BlockType::HeaderTwo,
                    _ => BlockType::HeaderThree,
                };
                self.builder.start_block(block_type, 0);
                Frame::Heading
            }
            Tag::BlockQuote(_) => {
                self.builder.finish_block();
                Frame::Quote
            }
            Tag::CodeBlock(_) => {
                self.builder.start_block(BlockType::CodeBlock, 0);
                Frame::Code
            }
            Tag::List(start) => {
                self.builder.finish_block();
                Frame::List(if start.is_some() {
                    BlockType::OrderedListItem
                } else {
                    BlockType::UnorderedListItem
                })
            }
            Tag::Item => {
                let block_type = self
                    .stack
                    .iter()
                    .rev()
                    .find_map(|frame| match frame {
                        Frame::List(block_type) => Some(*block_type),
                        _ => None,
                    })
                    .unwrap_or(BlockType::UnorderedListItem);
                let lists = self
                    .stack
                    .iter()
                    .filter(|frame| matches!(frame, Frame::List(_)))
                    .count();
                let depth = u8::try_from(lists.saturating_sub(1)).unwrap_or(u8::MAX);
                self.builder.start_block(block_type, depth);
                Frame::Item {
                    block_type,
                    depth,
                    paragraphs: 0,
                }
            }
            Tag::Emphasis => Frame::Style(ITALIC),
            Tag::Strong => Frame::Style(BOLD),
            Tag::Strikethrough => Frame::Style(STRIKETHROUGH),
            Tag::Link { dest_url, .. } => {
                Frame::Link(self.builder.add_entity(Entity::link(dest_url.to_string())))
            }
            _ => Frame::Other,
        };
        self.stack.push(frame);
    }

    fn inline_html(&mut self, html: &str) {
        let tag = html.trim().to_ascii_lowercase();
        let (closing, name) = match tag.strip_prefix("</") {
            Some(name) => (true, name),
            None => (false, tag.strip_prefix('<').unwrap_or(tag.as_str())),
        };
        let Some(style) = inline_tag_style(name.trim_end_matches('>').trim()) else {
            return;
        };
        if !closing {
            self.stack.push(Frame::Html(style));
        } else if let Some(ix) = self
            .stack
            .iter()
            .rposition(|frame| matches!(frame, Frame::Html(open) if *open == style))
        {
            self.stack.remove(ix);
        }
    }

    /// Closes the innermost markdown frame. Html styles left open inside a
    /// block end with it.
    fn end(&mut self) {
        let Some(ix) = self
            .stack
            .iter()
            .rposition(|frame| !matches!(frame, Frame::Html(_)))
        else {
            return;
        };
        match self.stack.remove(ix) {
            Frame::Code => {
                self.stack.truncate(ix);
                self.builder.trim_trailing_newline();
                self.builder.finish_block();
            }
            Frame::Paragraph
            | Frame::Heading
            | Frame::Quote
            | Frame::List(_)
            | Frame::Item { .. } => {
                self.stack.truncate(ix);
                self.builder.finish_block();
            }
            _ => {}
        }
    }
}

pub(crate) fn import(markdown: &str) -> ContentState {
    let mut importer = Importer {
        builder: DocumentBuilder::new(),
        stack: Vec::new(),
    };

    for event in Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Start(tag) => importer.start(tag),
            Event::End(_) => importer.end(),
            Event::Text(text) => importer.push_text(&text, None),
            Event::Code(text) => importer.push_text(&text, Some(CODE)),
            Event::InlineHtml(html) => importer.inline_html(&html),
            Event::SoftBreak => importer.push_text(" ", None),
            Event::HardBreak => importer.push_text("\n", None),
            _ => {}
        }
    }
    importer.builder.finish()
}
