//! Parsing, printing and the final text cleanups.

use swc_core::{
    common::{
        comments::{Comment, CommentKind, Comments, SingleThreadedComments},
        sync::Lrc,
        BytePos, FileName, SourceMap, Span, DUMMY_SP,
    },
    ecma::{
        ast::{EsVersion, JSXOpeningElement, Module},
        codegen::{text_writer::JsWriter, Config, Emitter},
        parser::{lexer::Lexer, Parser, StringInput, Syntax, TsSyntax},
        visit::{Visit, VisitWith},
    },
};
use tracing::warn;

use crate::error::ConvertError;

/// One source map and comment store shared by parsing, synthesized comments
/// and printing.
pub struct Session {
    cm: Lrc<SourceMap>,
    comments: SingleThreadedComments,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            cm: Lrc::new(SourceMap::default()),
            comments: SingleThreadedComments::default(),
        }
    }

    /// Parses `source` as TSX, which also accepts plain JSX.
    pub fn parse(&self, source: &str) -> Result<Module, ConvertError> {
        self.parse_file(source).map(|(_, module)| module)
    }

    /// Like [`Session::parse`], also returning where the file starts in the
    /// source map.
    fn parse_file(&self, source: &str) -> Result<(BytePos, Module), ConvertError> {
        let fm = self.cm.new_source_file(
            Lrc::new(FileName::Custom("input.tsx".into())),
            source.to_string(),
        );
        let lexer = Lexer::new(
            Syntax::Typescript(TsSyntax {
                tsx: true,
                ..Default::default()
            }),
            EsVersion::latest(),
            StringInput::from(&*fm),
            Some(&self.comments),
        );
        let mut parser = Parser::new_from(lexer);
        let module = parser.parse_module().map_err(|err| ConvertError::Parse {
            message: err.kind().msg().to_string(),
        })?;
        for err in parser.take_errors() {
            warn!(message = %err.kind().msg(), "recovered from parse error");
        }
        Ok((fm.start_pos, module))
    }

    /// A fresh position carrying `text` as a leading line comment. Statements
    /// built at this span print with the comment above them.
    pub fn note(&self, text: &str) -> Span {
        let fm = self
            .cm
            .new_source_file(Lrc::new(FileName::Anon), " ".to_string());
        let pos = fm.start_pos;
        self.comments.add_leading(
            pos,
            Comment {
                kind: CommentKind::Line,
                span: DUMMY_SP,
                text: format!(" {text}").into(),
            },
        );
        Span::new(pos, pos)
    }

    pub fn print(&self, module: &Module) -> Result<String, ConvertError> {
        let mut buf = Vec::new();
        {
            let mut emitter = Emitter {
                cfg: Config::default().with_target(EsVersion::latest()),
                cm: self.cm.clone(),
                comments: Some(&self.comments),
                wr: JsWriter::new(self.cm.clone(), "\n", &mut buf, None),
            };
            emitter.emit_module(module)?;
        }
        Ok(String::from_utf8(buf)?)
    }
}

// -----------------------------------------------------------------------------
// Text cleanups
// -----------------------------------------------------------------------------

#[derive(Default)]
struct SelfClosingEnds(Vec<BytePos>);

impl Visit for SelfClosingEnds {
    fn visit_jsx_opening_element(&mut self, n: &JSXOpeningElement) {
        if n.self_closing {
            self.0.push(n.span.hi);
        }
        n.visit_children_with(self);
    }
}

/// `<input/>` → `<input />`. Tag ends are found by parsing the printed code
/// again, so text inside literals and comments is never touched.
fn space_self_closing(printed: &str) -> String {
    let Ok((start, module)) = Session::new().parse_file(printed) else {
        return printed.to_string();
    };
    let mut ends = SelfClosingEnds::default();
    module.visit_with(&mut ends);

    let mut cuts: Vec<usize> = ends
        .0
        .iter()
        .filter_map(|hi| (hi.0.checked_sub(start.0)? as usize).checked_sub(2))
        .filter(|&at| {
            printed.get(at..at + 2) == Some("/>")
                && printed[..at]
                    .chars()
                    .next_back()
                    .is_some_and(|c| !c.is_whitespace())
        })
        .collect();
    cuts.sort_unstable();

    let mut out = String::with_capacity(printed.len() + cuts.len());
    let mut last = 0;
    for at in cuts {
        out.push_str(&printed[last..at]);
        out.push(' ');
        last = at;
    }
    out.push_str(&printed[last..]);
    out
}

/// Readability cleanups on printed code: whitespace only.
pub fn tidy(printed: &str) -> String {
    let spaced = space_self_closing(printed);
    let lines: Vec<&str> = spaced.lines().collect();
    let last_import = lines
        .iter()
        .rposition(|l| l.starts_with("import ") && l.trim_end().ends_with(';'));

    let mut out = String::with_capacity(spaced.len() + 16);
    for (i, line) in lines.iter().enumerate() {
        out.push_str(line);
        out.push('\n');
        let Some(next) = lines.get(i + 1) else {
            continue;
        };
        if next.trim().is_empty() {
            continue;
        }
        let ends_imports = Some(i) == last_import;
        let ends_top_level_block = line.starts_with('}')
            && !line.trim_end().ends_with('{')
            && !next.starts_with('}');
        if ends_imports || ends_top_level_block {
            out.push('\n');
        }
    }
    if out.is_empty() {
        out.push('\n');
    }
    out
}
