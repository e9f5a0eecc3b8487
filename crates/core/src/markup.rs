//! Minimal template scanning: double-quoted attributes and a tokenizer for
//! the expressions inside them. Not an HTML parser; just enough structure
//! for the patcher and validator rules to work on tokens instead of text.

/// A `name="value"` pair found in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

/// One token of a binding expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A run of word characters (letters, digits, `_`).
    Ident(&'a str),
    /// A lone `=`.
    Assign,
    /// A lone `!`.
    Not,
    /// Any other operator or punctuation, including `==`, `!=` and `=>`.
    Other(&'a str),
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_attr_name_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '<' | '>' | '"' | '\'' | '=' | '/')
}

/// Every double-quoted attribute in document order. Attributes without a
/// closing quote end the scan.
pub fn attributes(markup: &str) -> Vec<Attribute<'_>> {
    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(rel) = markup[pos..].find("=\"") {
        let eq = pos + rel;
        let value_start = eq + 2;
        let Some(value_len) = markup[value_start..].find('"') else {
            break;
        };
        let value_end = value_start + value_len;

        let name_start = markup[..eq]
            .char_indices()
            .rev()
            .take_while(|&(_, c)| is_attr_name_char(c))
            .last()
            .map_or(eq, |(i, _)| i);

        if name_start < eq {
            out.push(Attribute {
                name: &markup[name_start..eq],
                value: &markup[value_start..value_end],
            });
        }
        pos = value_end + 1;
    }
    out
}

/// Tokenize a binding expression. Whitespace is dropped.
pub fn tokenize(expr: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }

        if is_word(c) {
            let mut end = start + c.len_utf8();
            while let Some(&(i, next)) = chars.peek() {
                if !is_word(next) {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
            tokens.push(Token::Ident(&expr[start..end]));
            continue;
        }

        match c {
            '=' | '!' | '<' | '>' => {
                // Swallow a following run of '=' / '>' so that `==`, `===`,
                // `!=`, `!==`, `<=`, `>=` and `=>` are never read as `=`/`!`.
                let mut end = start + 1;
                while let Some(&(i, next)) = chars.peek() {
                    let joins = next == '=' || (c == '=' && next == '>' && end == start + 1);
                    if !joins {
                        break;
                    }
                    end = i + 1;
                    chars.next();
                }
                let op = &expr[start..end];
                tokens.push(match op {
                    "=" => Token::Assign,
                    "!" => Token::Not,
                    _ => Token::Other(op),
                });
            }
            _ => tokens.push(Token::Other(&expr[start..start + c.len_utf8()])),
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes() {
        let html = r#"<div class="card big" *ngIf="open"><button (click)="open = !open">x</button></div>"#;
        let attrs = attributes(html);
        assert_eq!(
            attrs,
            vec![
                Attribute { name: "class", value: "card big" },
                Attribute { name: "*ngIf", value: "open" },
                Attribute { name: "(click)", value: "open = !open" },
            ]
        );
    }

    #[test]
    fn test_attribute_names_are_exact() {
        let html = r#"<div [class]="dyn" ngClass="x" data-class="y"></div>"#;
        let names: Vec<&str> = attributes(html).iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["[class]", "ngClass", "data-class"]);
    }

    #[test]
    fn test_unterminated_attribute_stops_scan() {
        let html = r#"<div class="a"><p class="b>"#;
        let attrs = attributes(html);
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value, "a");
    }

    #[test]
    fn test_empty_value() {
        let attrs = attributes(r#"<img alt="">"#);
        assert_eq!(attrs, vec![Attribute { name: "alt", value: "" }]);
    }

    #[test]
    fn test_tokenize_toggle() {
        assert_eq!(
            tokenize("menuOpen = !menuOpen"),
            vec![
                Token::Ident("menuOpen"),
                Token::Assign,
                Token::Not,
                Token::Ident("menuOpen"),
            ]
        );
    }

    #[test]
    fn test_tokenize_comparisons_are_not_assignments() {
        for (expr, op) in [
            ("a == b", "=="),
            ("a === b", "==="),
            ("a != b", "!="),
            ("a !== b", "!=="),
            ("a <= b", "<="),
            ("a >= b", ">="),
            ("a => b", "=>"),
        ] {
            assert_eq!(
                tokenize(expr),
                vec![Token::Ident("a"), Token::Other(op), Token::Ident("b")],
                "expr: {}",
                expr
            );
        }
    }

    #[test]
    fn test_tokenize_call_and_member() {
        assert_eq!(
            tokenize("select(item.id)"),
            vec![
                Token::Ident("select"),
                Token::Other("("),
                Token::Ident("item"),
                Token::Other("."),
                Token::Ident("id"),
                Token::Other(")"),
            ]
        );
    }
}
