//! HTML parser – converts an HTML string into a simple DOM tree.
//!
//! The parser is tolerant rather than conforming: unknown tags are kept,
//! stray end tags are dropped, and the usual implied end tags (`p`, `li`,
//! `td`, `th`, `tr`) are closed when a sibling opens. Contents of
//! `<style>`, `<script>`, `<title>` and `<textarea>` are kept verbatim.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// Element kinds the flow engine distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Body,
    Title,
    Style,
    Script,
    /// Void or metadata elements that never render (`meta`, `link`, ...).
    Meta,
    Div,
    P,
    /// `h1` … `h6`.
    Heading(u8),
    Pre,
    Ul,
    Ol,
    Li,
    Table,
    /// `thead`, `tbody`, `tfoot`.
    TableSection,
    Tr,
    Td,
    Th,
    Br,
    Hr,
    Img,
    /// `b`, `strong`.
    Strong,
    /// `i`, `em`, `cite`.
    Em,
    /// `u`, `ins`.
    Underline,
    /// Any other inline element (`span`, `a`, `code`, ...).
    Span,
    /// Unknown elements are kept and flowed like `div`.
    Unknown(String),
}

impl Tag {
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "html" => Tag::Html,
            "head" => Tag::Head,
            "body" => Tag::Body,
            "title" => Tag::Title,
            "style" => Tag::Style,
            "script" | "noscript" | "template" | "textarea" => Tag::Script,
            "meta" | "link" | "base" | "input" | "col" | "colgroup" | "source" | "area"
            | "wbr" => Tag::Meta,
            "div" | "section" | "article" | "header" | "footer" | "main" | "nav" | "aside"
            | "blockquote" | "figure" | "figcaption" | "address" | "form" | "center"
            | "caption" | "dl" | "dt" | "dd" => Tag::Div,
            "p" => Tag::P,
            "h1" => Tag::Heading(1),
            "h2" => Tag::Heading(2),
            "h3" => Tag::Heading(3),
            "h4" => Tag::Heading(4),
            "h5" => Tag::Heading(5),
            "h6" => Tag::Heading(6),
            "pre" => Tag::Pre,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "thead" | "tbody" | "tfoot" => Tag::TableSection,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "br" => Tag::Br,
            "hr" => Tag::Hr,
            "img" => Tag::Img,
            "b" | "strong" => Tag::Strong,
            "i" | "em" | "cite" | "var" => Tag::Em,
            "u" | "ins" => Tag::Underline,
            "span" | "a" | "code" | "small" | "sub" | "sup" | "label" | "abbr" | "mark"
            | "kbd" | "samp" | "q" | "s" | "del" | "font" | "time" => Tag::Span,
            _ => Tag::Unknown(lower),
        }
    }

    /// Elements that never have children or an end tag.
    pub fn is_void(&self) -> bool {
        matches!(self, Tag::Meta | Tag::Br | Tag::Hr | Tag::Img)
    }

    /// Elements whose content is raw text up to the matching end tag.
    pub fn is_raw_text(&self) -> bool {
        matches!(self, Tag::Style | Tag::Script | Tag::Title)
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Tag::Strong | Tag::Em | Tag::Underline | Tag::Span | Tag::Br
        )
    }

    /// Elements that are never painted, nor anything inside them.
    pub fn is_hidden(&self) -> bool {
        matches!(
            self,
            Tag::Head | Tag::Title | Tag::Style | Tag::Script | Tag::Meta
        )
    }
}

/// A node in our DOM tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attr("style")
    }

    pub fn src(&self) -> Option<&str> {
        self.attr("src")
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[DomNode], out: &mut String) {
    for node in nodes {
        match node {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element(e) => collect_text(&e.children, out),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Deepest element nesting kept in the tree. Start tags opened below this
/// depth are dropped and their content joins the deepest open element, so
/// tree walks stay within a thread's stack.
pub const MAX_DEPTH: usize = 128;

/// Parse an HTML string into a list of top-level DOM nodes.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    Parser::new(html).run()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    /// Open elements; index 0 is a synthetic root.
    stack: Vec<ElementNode>,
    /// Start tags dropped past [`MAX_DEPTH`], awaiting their end tags.
    flattened: Vec<Tag>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            stack: vec![ElementNode::new(Tag::Unknown("#root".to_string()))],
            flattened: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<DomNode> {
        while !self.eof() {
            if self.starts_with("<!--") {
                self.skip_past("-->");
            } else if self.starts_with("<!") || self.starts_with("<?") {
                self.skip_past(">");
            } else if self.starts_with("</") {
                self.parse_end_tag();
            } else if self.starts_with("<") && self.next_is_tag_start() {
                self.parse_start_tag();
            } else {
                self.parse_text();
            }
        }
        while self.stack.len() > 1 {
            self.pop();
        }
        self.stack.pop().map(|root| root.children).unwrap_or_default()
    }

    fn parse_text(&mut self) {
        let start = self.pos;
        // Always consume at least one char so a lone '<' cannot stall us.
        self.advance_char();
        while !self.eof() && !self.starts_with("<") {
            self.advance_char();
        }
        let text = decode_entities(&self.input[start..self.pos]);
        self.append(DomNode::Text(text));
    }

    fn parse_start_tag(&mut self) {
        self.pos += 1; // '<'
        let name = self.parse_name();
        let tag = Tag::from_name(&name);
        let mut elem = ElementNode::new(tag.clone());

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if !key.is_empty() {
                elem.attributes.entry(key).or_insert(value);
            }
            if self.pos == before {
                // Unparseable junk such as a stray quote.
                self.advance_char();
            }
        }
        let self_closing = self.starts_with("/>");
        if self_closing {
            self.pos += 2;
        } else if self.starts_with(">") {
            self.pos += 1;
        }

        self.close_implied(&tag);

        if tag.is_void() || self_closing {
            self.append(DomNode::Element(elem));
            return;
        }

        if tag.is_raw_text() {
            let end = self.find_raw_text_end(&name);
            let raw = &self.input[self.pos..end];
            if !raw.is_empty() {
                let text = if tag == Tag::Title {
                    decode_entities(raw)
                } else {
                    raw.to_string()
                };
                elem.children.push(DomNode::Text(text));
            }
            self.pos = end;
            self.append(DomNode::Element(elem));
            if self.starts_with("</") {
                self.skip_past(">");
            }
            return;
        }

        if self.stack.len() > MAX_DEPTH {
            self.flattened.push(tag);
            return;
        }
        self.stack.push(elem);
    }

    fn parse_end_tag(&mut self) {
        self.pos += 2; // '</'
        let name = self.parse_name();
        self.skip_past(">");
        if name.is_empty() {
            return;
        }
        let tag = Tag::from_name(&name);
        if self.flattened.last() == Some(&tag) {
            self.flattened.pop();
            return;
        }
        // Pop up to the nearest matching open element; ignore stray end tags.
        if let Some(idx) = self.stack.iter().rposition(|e| e.tag == tag) {
            if idx == 0 {
                return;
            }
            while self.stack.len() > idx {
                self.pop();
            }
        }
    }

    /// Close elements whose end tag HTML lets authors omit.
    fn close_implied(&mut self, opening: &Tag) {
        let closes: &[Tag] = match opening {
            Tag::Li => &[Tag::Li],
            Tag::Td | Tag::Th => &[Tag::Td, Tag::Th],
            Tag::Tr => &[Tag::Tr, Tag::Td, Tag::Th],
            Tag::TableSection => &[Tag::TableSection, Tag::Tr, Tag::Td, Tag::Th],
            Tag::P
            | Tag::Div
            | Tag::Heading(_)
            | Tag::Pre
            | Tag::Ul
            | Tag::Ol
            | Tag::Table
            | Tag::Hr => &[Tag::P],
            _ => &[],
        };
        if closes.is_empty() {
            return;
        }
        let is_boundary = |t: &Tag| match opening {
            Tag::Li => matches!(t, Tag::Ul | Tag::Ol),
            Tag::Td | Tag::Th | Tag::Tr | Tag::TableSection => matches!(t, Tag::Table),
            _ => !t.is_inline() && !closes.contains(t),
        };
        let scope = self
            .stack
            .iter()
            .rposition(|e| is_boundary(&e.tag))
            .unwrap_or(0);
        if let Some(offset) = self.stack[scope + 1..]
            .iter()
            .position(|e| closes.contains(&e.tag))
        {
            let idx = scope + 1 + offset;
            while self.stack.len() > idx {
                self.pop();
            }
        }
    }

    fn pop(&mut self) {
        if let Some(done) = self.stack.pop() {
            self.append(DomNode::Element(done));
        }
    }

    fn append(&mut self, node: DomNode) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
        }
    }

    fn find_raw_text_end(&self, name: &str) -> usize {
        let needle = format!("</{}", name.to_ascii_lowercase());
        let rest = self.input[self.pos..].to_ascii_lowercase();
        rest.find(&needle)
            .map(|i| self.pos + i)
            .unwrap_or(self.input.len())
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name().to_ascii_lowercase();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.pos += 1;
        self.skip_whitespace();
        (key, self.parse_attr_value())
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ['"', '\''] {
            if self.peek() == Some(quote) {
                self.pos += 1;
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c == quote {
                        break;
                    }
                    self.pos += c.len_utf8();
                }
                let val = decode_entities(&self.input[start..self.pos]);
                if !self.eof() {
                    self.pos += 1;
                }
                return val;
            }
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '>' {
                break;
            }
            self.pos += c.len_utf8();
        }
        decode_entities(&self.input[start..self.pos])
    }

    fn next_is_tag_start(&self) -> bool {
        self.input[self.pos + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn skip_past(&mut self, marker: &str) {
        match self.input[self.pos..].find(marker) {
            Some(i) => self.pos += i + marker.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }
}

/// Decode named and numeric character references.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        "euro" => '\u{20AC}',
        "pound" => '\u{00A3}',
        "yen" => '\u{00A5}',
        "sect" => '\u{00A7}',
        "deg" => '\u{00B0}',
        "middot" => '\u{00B7}',
        "bull" => '\u{2022}',
        "hellip" => '\u{2026}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "laquo" => '\u{00AB}',
        "raquo" => '\u{00BB}',
        "times" => '\u{00D7}',
        "eacute" => '\u{00E9}',
        "egrave" => '\u{00E8}',
        "agrave" => '\u{00E0}',
        "ccedil" => '\u{00E7}',
        _ => return None,
    };
    Some(c)
}

// ---------------------------------------------------------------------------
// Convenience helpers
// ---------------------------------------------------------------------------

/// Text of every `<style>` element, in document order.
pub fn style_sheets(nodes: &[DomNode]) -> Vec<String> {
    let mut sheets = Vec::new();
    visit_elements(nodes, &mut |e| {
        if e.tag == Tag::Style {
            sheets.push(e.text_content());
        }
    });
    sheets
}

/// The trimmed `<title>` text, if any.
pub fn document_title(nodes: &[DomNode]) -> Option<String> {
    let mut title = None;
    visit_elements(nodes, &mut |e| {
        if title.is_none() && e.tag == Tag::Title {
            let text = e.text_content().split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                title = Some(text);
            }
        }
    });
    title
}

fn visit_elements<F: FnMut(&ElementNode)>(nodes: &[DomNode], f: &mut F) {
    for node in nodes {
        if let DomNode::Element(e) = node {
            f(e);
            visit_elements(&e.children, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &DomNode) -> &ElementNode {
        match node {
            DomNode::Element(e) => e,
            DomNode::Text(t) => panic!("expected element, got text {t:?}"),
        }
    }

    #[test]
    fn parse_nested_spans() {
        let nodes = parse_html(r#"<p>Hello <span class="x">world</span>!</p>"#);
        assert_eq!(nodes.len(), 1);
        let p = element(&nodes[0]);
        assert_eq!(p.tag, Tag::P);
        assert_eq!(p.children.len(), 3);
        assert_eq!(p.text_content(), "Hello world!");
    }

    #[test]
    fn void_elements_have_no_children() {
        let nodes = parse_html(r#"<p>a<br>b<img src="data:x"></p>"#);
        let p = element(&nodes[0]);
        assert_eq!(p.children.len(), 4);
        assert_eq!(element(&p.children[3]).src(), Some("data:x"));
    }

    #[test]
    fn implied_list_item_close() {
        let nodes = parse_html("<ul><li>one<li>two<li>three</ul><p>after</p>");
        assert_eq!(nodes.len(), 2);
        let ul = element(&nodes[0]);
        assert_eq!(ul.children.len(), 3);
        assert!(ul.children.iter().all(|c| element(c).tag == Tag::Li));
    }

    #[test]
    fn implied_cell_and_row_close() {
        let nodes = parse_html("<table><tr><td>a<td>b<tr><td>c</table>");
        let table = element(&nodes[0]);
        assert_eq!(table.children.len(), 2);
        assert_eq!(element(&table.children[0]).children.len(), 2);
    }

    #[test]
    fn paragraph_closed_by_block() {
        let nodes = parse_html("<p>one<div>two</div>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(element(&nodes[0]).tag, Tag::P);
        assert_eq!(element(&nodes[1]).tag, Tag::Div);
    }

    #[test]
    fn style_is_raw_text() {
        let html = "<html><head><title>T &amp; C</title><style>p > b { color: red }</style></head><body><p>x</p></body></html>";
        let nodes = parse_html(html);
        assert_eq!(style_sheets(&nodes), vec!["p > b { color: red }".to_string()]);
        assert_eq!(document_title(&nodes).as_deref(), Some("T & C"));
    }

    #[test]
    fn comments_and_doctype_skipped() {
        let nodes = parse_html("<!DOCTYPE html><!-- note --><p>x</p>");
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn stray_end_tag_ignored() {
        let nodes = parse_html("<div>a</span>b</div>");
        assert_eq!(element(&nodes[0]).text_content(), "ab");
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let nodes = parse_html("<p>1 < 2</p>");
        assert_eq!(element(&nodes[0]).text_content(), "1 < 2");
    }

    #[test]
    fn entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#65;&#x42; &unknown; &"), "a <b> AB &unknown; &");
        assert_eq!(decode_entities("&nbsp;"), "\u{00A0}");
    }

    #[test]
    fn unquoted_and_bare_attributes() {
        let nodes = parse_html("<img src=data:abc alt hidden>");
        let img = element(&nodes[0]);
        assert_eq!(img.src(), Some("data:abc"));
        assert_eq!(img.attr("alt"), Some(""));
    }

    #[test]
    fn nesting_is_capped() {
        let html = format!("{}x{}<p>after</p>", "<div>".repeat(10_000), "</div>".repeat(10_000));
        let nodes = parse_html(&html);
        assert_eq!(nodes.len(), 2);
        assert_eq!(element(&nodes[1]).text_content(), "after");

        let mut depth = 0;
        let mut current = element(&nodes[0]);
        loop {
            depth += 1;
            match current.children.first() {
                Some(DomNode::Element(child)) => current = child,
                Some(DomNode::Text(t)) => {
                    assert_eq!(t, "x");
                    break;
                }
                None => panic!("innermost element lost its text"),
            }
        }
        assert_eq!(depth, MAX_DEPTH);
    }
}
