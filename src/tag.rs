//! Classification of compound element tokens like `div.main.row#hero`
//! into element name, class names and id.

use kstring::KString;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpec {
    /// The leading run of characters before the first `.` or `#`.
    pub element: KString,
    /// All `.`-delimited runs, left to right, duplicates preserved.
    pub classes: Vec<KString>,
    /// The first `#`-delimited run; later `#` runs are dropped.
    pub id: Option<KString>,
}

impl TagSpec {
    /// The class names joined for use as a `class` attribute value, if
    /// there are any.
    pub fn class_attribute(&self) -> Option<KString> {
        if self.classes.is_empty() {
            None
        } else {
            let mut s = String::new();
            for (i, c) in self.classes.iter().enumerate() {
                if i > 0 {
                    s.push(' ');
                }
                s.push_str(c);
            }
            Some(KString::from_string(s))
        }
    }
}

fn delimiter(c: char) -> bool {
    c == '.' || c == '#'
}

/// Split a compound element token. Total: malformed tokens degrade to
/// empty name/class/id fields, never an error.
pub fn parse_tag(token: &str) -> TagSpec {
    let end = token.find(delimiter).unwrap_or(token.len());
    let element = &token[..end];
    let mut rest = &token[end..];

    let mut classes = Vec::new();
    let mut id = None;
    while let Some(delim) = rest.chars().next() {
        rest = &rest[1..];
        let end = rest.find(delimiter).unwrap_or(rest.len());
        let run = &rest[..end];
        rest = &rest[end..];
        if delim == '.' {
            classes.push(KString::from_ref(run));
        } else if id.is_none() {
            id = Some(KString::from_ref(run));
        }
    }

    TagSpec {
        element: KString::from_ref(element),
        classes,
        id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(token: &str) -> (String, Vec<String>, Option<String>) {
        let spec = parse_tag(token);
        (spec.element.to_string(),
         spec.classes.iter().map(|c| c.to_string()).collect(),
         spec.id.map(|id| id.to_string()))
    }

    #[test]
    fn t_plain() {
        assert_eq!(t("div"), ("div".into(), vec![], None));
        assert_eq!(t("h3"), ("h3".into(), vec![], None));
    }

    #[test]
    fn t_classes() {
        assert_eq!(t("div.main"), ("div".into(), vec!["main".into()], None));
        assert_eq!(t("div.main.row"),
                   ("div".into(), vec!["main".into(), "row".into()], None));
        // Duplicates are preserved, order is left to right.
        assert_eq!(t("span.a.b.a"),
                   ("span".into(),
                    vec!["a".into(), "b".into(), "a".into()], None));
    }

    #[test]
    fn t_id() {
        assert_eq!(t("div#hero"), ("div".into(), vec![], Some("hero".into())));
        assert_eq!(t("div.main.row#hero"),
                   ("div".into(), vec!["main".into(), "row".into()],
                    Some("hero".into())));
        // Classes may follow the id.
        assert_eq!(t("div#hero.main"),
                   ("div".into(), vec!["main".into()], Some("hero".into())));
        // Only the first id run is taken.
        assert_eq!(t("div#a.b#c"),
                   ("div".into(), vec!["b".into()], Some("a".into())));
    }

    #[test]
    fn t_degenerate() {
        assert_eq!(t(""), ("".into(), vec![], None));
        assert_eq!(t(".only-class"),
                   ("".into(), vec!["only-class".into()], None));
        assert_eq!(t("#only-id"), ("".into(), vec![], Some("only-id".into())));
        assert_eq!(t("div."), ("div".into(), vec!["".into()], None));
    }

    #[test]
    fn t_class_attribute() {
        assert_eq!(parse_tag("div").class_attribute(), None);
        assert_eq!(parse_tag("div.a.b").class_attribute(),
                   Some(KString::from_ref("a b")));
    }
}
