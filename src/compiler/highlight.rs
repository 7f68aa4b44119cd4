use logos::Logos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Logos)]
pub enum HighlightToken {
    #[regex(r"\d+(\.\d+)?([eE][+-]?\d+)?", priority = 2)]
    Number,
    #[regex(r"'([^'\\\n]|\\.)*'?")]
    #[regex(r#""([^"\\\n]|\\.)*"?"#)]
    Text,
    #[regex(r"\$[_\p{L}\p{N}#]+")]
    Variable,
    #[regex(r"`[^`\n]*`?")]
    ModelLiteral,
    #[regex(r"[_\p{L}][_\p{L}\p{N}]*", priority = 1)]
    Ident,

    #[token("true")]
    #[token("false")]
    #[token("null")]
    #[token("and")]
    #[token("or")]
    Keyword,

    #[regex(r"[\s]+")]
    #[regex(r"//[^\n]*")]
    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    Unused,

    #[token("(")]
    RoBracketS,

    #[token(")")]
    #[token("[")]
    #[token("]")]
    #[token("{")]
    #[token("}")]
    Brackets,

    #[regex(r"(\+|\-|\*|/|%|<|>|!|==|!=|<=|>=|->|\?|:|=)", priority = 2)]
    Operator,

    #[token(",")]
    #[token(";")]
    Separator,

    #[regex(r".", priority = 0)]
    Unknown,
}

impl HighlightToken {
    pub fn highlight(self, next: Option<Self>, text: &str) -> String {
        use HighlightToken::*;
        let color = match (self, next) {
            (Ident, Some(RoBracketS)) => "34",
            (Ident | RoBracketS | Brackets | Separator, _) => "37",
            (Number | Text, _) => "33",
            (Variable, _) => "36",
            (ModelLiteral, _) => "32",
            (Keyword | Operator, _) => "35",
            (Unused, _) => "90",
            (Unknown, _) => "1;31",
        };

        format!("\x1b[{color}m{text}\x1b[0m")
    }
}

/// Colors one line of search-expression source for a terminal.
pub fn highlight_line(line: &str) -> String {
    let mut lexer = HighlightToken::lexer(line);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        tokens.push((token.unwrap_or(HighlightToken::Unknown), lexer.slice().replace('\t', "    ")));
    }

    let mut out = String::new();
    for (i, (token, text)) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1).map(|(t, _)| *t);
        out += &token.highlight(next, text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<HighlightToken> {
        HighlightToken::lexer(src)
            .map(|t| t.unwrap_or(HighlightToken::Unknown))
            .filter(|t| *t != HighlightToken::Unused)
            .collect()
    }

    #[test]
    fn tokens() {
        use HighlightToken::*;
        assert_eq!(kinds("filter($x, 'a') and true"), vec![
            Ident, RoBracketS, Variable, Separator, Text, Brackets, Keyword, Keyword
        ]);
        assert_eq!(kinds("$p -> $p.get(`Person#name`) + 1.5"), vec![
            Variable,
            Operator,
            Variable,
            Unknown,
            Ident,
            RoBracketS,
            ModelLiteral,
            Brackets,
            Operator,
            Number
        ]);
    }

    #[test]
    fn functions_are_colored_differently() {
        let call = HighlightToken::Ident.highlight(Some(HighlightToken::RoBracketS), "size");
        let name = HighlightToken::Ident.highlight(None, "size");
        assert_eq!(call, "\x1b[34msize\x1b[0m");
        assert_eq!(name, "\x1b[37msize\x1b[0m");
    }

    #[test]
    fn plain_text_survives() {
        let line = highlight_line("size($x)\t");
        let stripped: String = line
            .split("\x1b[")
            .map(|chunk| chunk.split_once('m').map_or(chunk, |(_, rest)| rest))
            .collect();
        assert_eq!(stripped, "size($x)    ");
    }
}
