use crate::tpl::token::DOUBLE_TOLERANCE;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            '^' => Some(Operator::Pow),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
            Operator::Pow => '^',
        }
    }
}

/// An atomic value inside a tag body.
#[derive(Debug, Clone)]
pub enum Element {
    ConstantInteger(i64),
    ConstantDouble(f64),
    Variable(String),
    Function(String),
    Operator(Operator),
    StringLiteral(String),
}

impl Element {
    /// Canonical template text for this element; lexing it back yields an equal element.
    pub fn as_text(&self) -> String {
        match self {
            Element::ConstantInteger(v) => v.to_string(),
            Element::ConstantDouble(v) => {
                let text = v.to_string();
                if text.contains('.') {
                    text
                } else {
                    format!("{}.0", text)
                }
            }
            Element::Variable(name) => name.clone(),
            Element::Function(name) => format!("@{}", name),
            Element::Operator(op) => op.symbol().to_string(),
            Element::StringLiteral(value) => {
                let mut out = String::with_capacity(value.len() + 2);
                out.push('"');
                for c in value.chars() {
                    if c == '\\' || c == '"' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
                out
            }
        }
    }

    /// Whether this element may appear as a FOR tag start, end or step expression.
    pub fn is_loop_expression(&self) -> bool {
        matches!(
            self,
            Element::Variable(_)
                | Element::ConstantInteger(_)
                | Element::ConstantDouble(_)
                | Element::StringLiteral(_)
        )
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Element::ConstantInteger(a), Element::ConstantInteger(b)) => a == b,
            (Element::ConstantDouble(a), Element::ConstantDouble(b)) => {
                a == b || (a - b).abs() < DOUBLE_TOLERANCE
            }
            (Element::Variable(a), Element::Variable(b))
            | (Element::Function(a), Element::Function(b))
            | (Element::StringLiteral(a), Element::StringLiteral(b)) => a == b,
            (Element::Operator(a), Element::Operator(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literal_escapes_quotes_and_backslashes() {
        let e = Element::StringLiteral(r#"Joe "Long" \ Smith"#.to_string());
        assert_eq!(e.as_text(), r#""Joe \"Long\" \\ Smith""#);
    }

    #[test]
    fn double_text_keeps_decimal_point() {
        assert_eq!(Element::ConstantDouble(2.0).as_text(), "2.0");
        assert_eq!(Element::ConstantDouble(-1.35).as_text(), "-1.35");
    }

    #[test]
    fn double_equality_is_reflexive_for_large_values() {
        let huge = Element::ConstantDouble(f64::MAX);
        assert_eq!(huge, huge.clone());
        assert_eq!(Element::ConstantDouble(f64::INFINITY), Element::ConstantDouble(f64::INFINITY));
    }

    #[test]
    fn function_and_operator_text() {
        assert_eq!(Element::Function("sin".into()).as_text(), "@sin");
        assert_eq!(Element::Operator(Operator::Pow).to_string(), "^");
    }

    #[test]
    fn loop_expressions_exclude_operators_and_functions() {
        assert!(Element::ConstantDouble(0.5).is_loop_expression());
        assert!(!Element::Operator(Operator::Add).is_loop_expression());
        assert!(!Element::Function("sin".into()).is_loop_expression());
    }
}
