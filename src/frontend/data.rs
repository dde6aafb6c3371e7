//! Common data types: the tag vocabulary.
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

///////////////////////////////////////////////////////////////////////////////
// BASICS
///////////////////////////////////////////////////////////////////////////////

/// Reserved element name of the synthetic document root. Never emitted.
pub static ROOT_TAG: &'static str = "[root]";

/// HTML elements that never take a closing tag.
pub static VOID_ELEMENTS: &'static [&'static str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "param", "source", "track", "wbr",
];

/// Passthrough elements whose body is raw text, never markup.
pub static RAW_TEXT_ELEMENTS: &'static [&'static str] = &["script", "style"];

/// Element name of a tag spelling, `<h1 class="x">` gives `h1` and `</h1>`
/// gives `h1`.
pub fn tag_name(spelling: &str) -> &str {
    let inner = spelling.strip_prefix('<').unwrap_or(spelling);
    let inner = inner.strip_prefix('/').unwrap_or(inner);
    let end = inner
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(inner.len());
    &inner[..end]
}

pub fn is_closing_tag(tag: &str) -> bool {
    tag.starts_with("</")
}

/// Whether `tag` is exactly the closing spelling of the opening `spelling`.
pub fn is_closing_of(tag: &str, spelling: &str) -> bool {
    match tag.strip_prefix("</").and_then(|x| x.strip_suffix('>')) {
        Some(name) => name == tag_name(spelling),
        None => false,
    }
}

/// Markup that can never have children: declarations, processing
/// instructions, self-closing tags and HTML void elements.
pub fn is_void_markup(tag: &str) -> bool {
    if tag.starts_with("<!") || tag.starts_with("<?") || tag.ends_with("/>") {
        return true;
    }
    let name = tag_name(tag).to_ascii_lowercase();
    VOID_ELEMENTS.contains(&name.as_str())
}

pub fn closing_spelling(spelling: &str) -> String {
    format!("</{}>", tag_name(spelling))
}

pub fn is_raw_text_element(tag: &str) -> bool {
    let name = tag_name(tag).to_ascii_lowercase();
    RAW_TEXT_ELEMENTS.contains(&name.as_str())
}

///////////////////////////////////////////////////////////////////////////////
// VOCABULARY
///////////////////////////////////////////////////////////////////////////////

/// The language of a foreign-code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    /// Compiled with a native toolchain, then executed.
    NativeCompiled,
    /// Handed to an interpreter process.
    Interpreted,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::NativeCompiled => "c",
            Language::Interpreted => "python",
        }
    }
    /// Extension of the extracted source file, also its file name infix.
    pub fn extension(&self) -> &'static str {
        match self {
            Language::NativeCompiled => "c",
            Language::Interpreted => "py",
        }
    }
}

/// An opening tag spelling and its HTML replacement. Closing spellings are
/// derived from the element names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub source: String,
    pub replacement: String,
    /// Body is captured verbatim until the matching closer.
    #[serde(default)]
    pub raw_text: bool,
}

impl VocabularyEntry {
    pub fn new(source: &str, replacement: &str) -> Self {
        VocabularyEntry {
            source: source.to_owned(),
            replacement: replacement.to_owned(),
            raw_text: false,
        }
    }
    pub fn raw(mut self) -> Self {
        self.raw_text = true;
        self
    }
    /// Element name emitted in place of this entry.
    pub fn name(&self) -> &str {
        tag_name(&self.replacement)
    }
    /// Either the source or the replacement closing spelling.
    pub fn is_closed_by(&self, tag: &str) -> bool {
        is_closing_of(tag, &self.source) || is_closing_of(tag, &self.replacement)
    }
    /// Closing spellings of the source and the replacement, in that order.
    pub fn closers(&self) -> [String; 2] {
        [closing_spelling(&self.source), closing_spelling(&self.replacement)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeTag {
    pub open: String,
    pub close: String,
    pub language: Language,
}

impl CodeTag {
    pub fn new(open: &str, close: &str, language: Language) -> Self {
        CodeTag {
            open: open.to_owned(),
            close: close.to_owned(),
            language,
        }
    }
}

/// How the parser should treat one tag token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TagKind<'v> {
    /// Opening spelling of a foreign-code tag.
    CodeOpen(&'v CodeTag),
    /// Opening vocabulary tag, or its already-converted replacement.
    Open(&'v VocabularyEntry),
    /// Closing vocabulary tag or closing replacement spelling.
    Close,
    /// Wrapper tag dropped from the output.
    Elided,
    /// Plain markup outside the vocabulary that can not have children.
    Void,
    /// Plain markup outside the vocabulary.
    PassthroughOpen,
    PassthroughClose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagVocabulary {
    pub entries: Vec<VocabularyEntry>,
    pub code_tags: Vec<CodeTag>,
    /// Wrapper spellings (opening and closing) that are dropped.
    #[serde(default)]
    pub elided: Vec<String>,
}

lazy_static! {
    pub static ref DEFAULT_VOCABULARY: TagVocabulary = TagVocabulary::webthon();
}

impl Default for TagVocabulary {
    fn default() -> Self {
        DEFAULT_VOCABULARY.clone()
    }
}

impl TagVocabulary {
    /// The stock WebThon vocabulary.
    pub fn webthon() -> Self {
        TagVocabulary {
            entries: vec![
                VocabularyEntry::new("<css>", "<style>").raw(),
                VocabularyEntry::new("<js>", "<script>").raw(),
                VocabularyEntry::new("<print>", "<h1>"),
            ],
            code_tags: vec![
                CodeTag::new("<c>", "</c>", Language::NativeCompiled),
                CodeTag::new("<python>", "</python>", Language::Interpreted),
            ],
            elided: vec!["<webthon>".to_owned(), "</webthon>".to_owned()],
        }
    }
    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }
    /// Replacement spelling of a vocabulary opening or closing tag.
    pub fn substitute(&self, tag: &str) -> Option<String> {
        self.entries.iter().find_map(|x| {
            if x.source == tag {
                Some(x.replacement.clone())
            } else if is_closing_of(tag, &x.source) {
                Some(closing_spelling(&x.replacement))
            } else {
                None
            }
        })
    }
    pub fn classify<'v>(&'v self, tag: &str) -> TagKind<'v> {
        if let Some(code) = self.code_tags.iter().find(|x| x.open == tag) {
            return TagKind::CodeOpen(code);
        }
        // A code closer outside of a code block has nothing to close.
        if self.elided.iter().any(|x| x == tag) || self.code_tags.iter().any(|x| x.close == tag) {
            return TagKind::Elided;
        }
        let entry = self.entries
            .iter()
            .find(|x| x.source == tag || x.replacement == tag);
        if let Some(entry) = entry {
            return TagKind::Open(entry);
        }
        if self.entries.iter().any(|x| x.is_closed_by(tag)) {
            return TagKind::Close;
        }
        if is_closing_tag(tag) {
            TagKind::PassthroughClose
        } else if is_void_markup(tag) {
            TagKind::Void
        } else {
            TagKind::PassthroughOpen
        }
    }
}
