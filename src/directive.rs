//! `{% … %}` directives in template entry and block files.
//!
//! A template file is plain markup interleaved with directives. Parsing splits
//! it into [`Node`]s; the layout walks the nodes, copying text through and
//! replacing each directive with what the matching trigger returns.
//!
//! | Directive | Arguments |
//! |-----------|-----------|
//! | `title`, `charset`, `metadata`, `http_equiv`, `breadcrumb` | none |
//! | `css`, `js` | none (all), tags (any of), or `except` + tags |
//! | `section`, `block`, `include` | exactly one name |

use crate::asset::TagFilter;
use crate::types::{AssetKind, Tags};
use thiserror::Error;

const OPEN: &str = "{%";
const CLOSE: &str = "%}";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("line {line}: unterminated directive (missing '{}')", CLOSE)]
    Unterminated { line: usize },
    #[error("line {line}: empty directive")]
    Empty { line: usize },
    #[error("line {line}: unknown directive '{name}'")]
    Unknown { name: String, line: usize },
    #[error("line {line}: '{directive}' needs an argument")]
    MissingArgument { directive: String, line: usize },
    #[error("line {line}: unexpected argument '{argument}' to '{directive}'")]
    UnexpectedArgument {
        directive: String,
        argument: String,
        line: usize,
    },
}

/// A parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Title,
    Charset,
    Metadata,
    HttpEquiv,
    Breadcrumb,
    Assets(AssetKind, TagFilter),
    Section(String),
    Block(String),
    Include(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    Text(&'a str),
    Directive(Directive),
}

/// Split `source` into text runs and directives.
pub fn parse(source: &str) -> Result<Vec<Node<'_>>, DirectiveError> {
    let mut nodes = Vec::new();
    let mut rest = source;
    let mut offset = 0;

    while let Some(start) = rest.find(OPEN) {
        let line = line_at(source, offset + start);
        if start > 0 {
            nodes.push(Node::Text(&rest[..start]));
        }
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            return Err(DirectiveError::Unterminated { line });
        };
        nodes.push(Node::Directive(interpret(&after_open[..end], line)?));

        let consumed = start + OPEN.len() + end + CLOSE.len();
        rest = &rest[consumed..];
        offset += consumed;
    }
    if !rest.is_empty() {
        nodes.push(Node::Text(rest));
    }
    Ok(nodes)
}

fn line_at(source: &str, byte: usize) -> usize {
    source[..byte].matches('\n').count() + 1
}

fn interpret(body: &str, line: usize) -> Result<Directive, DirectiveError> {
    let mut words = body.split_whitespace();
    let Some(name) = words.next() else {
        return Err(DirectiveError::Empty { line });
    };
    let args: Vec<&str> = words.collect();

    let no_args = |directive: Directive| match args.first() {
        None => Ok(directive),
        Some(arg) => Err(DirectiveError::UnexpectedArgument {
            directive: name.to_string(),
            argument: arg.to_string(),
            line,
        }),
    };
    let one_arg = || match args.as_slice() {
        [arg] => Ok(arg.to_string()),
        [] => Err(DirectiveError::MissingArgument {
            directive: name.to_string(),
            line,
        }),
        [_, extra, ..] => Err(DirectiveError::UnexpectedArgument {
            directive: name.to_string(),
            argument: extra.to_string(),
            line,
        }),
    };

    match name {
        "title" => no_args(Directive::Title),
        "charset" => no_args(Directive::Charset),
        "metadata" => no_args(Directive::Metadata),
        "http_equiv" => no_args(Directive::HttpEquiv),
        "breadcrumb" => no_args(Directive::Breadcrumb),
        "css" => tag_filter(name, &args, line).map(|f| Directive::Assets(AssetKind::Css, f)),
        "js" => tag_filter(name, &args, line).map(|f| Directive::Assets(AssetKind::Js, f)),
        "section" => one_arg().map(Directive::Section),
        "block" => one_arg().map(Directive::Block),
        "include" => one_arg().map(Directive::Include),
        other => Err(DirectiveError::Unknown {
            name: other.to_string(),
            line,
        }),
    }
}

fn tag_filter(name: &str, args: &[&str], line: usize) -> Result<TagFilter, DirectiveError> {
    match args {
        [] => Ok(TagFilter::All),
        ["except"] => Err(DirectiveError::MissingArgument {
            directive: format!("{name} except"),
            line,
        }),
        ["except", tags @ ..] => Ok(TagFilter::Except(collect_tags(tags))),
        tags => Ok(TagFilter::Any(collect_tags(tags))),
    }
}

fn collect_tags(words: &[&str]) -> Tags {
    words.iter().map(|w| w.to_string()).collect()
}
