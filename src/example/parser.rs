//! Line-oriented text format for sequence data.
//!
//! ```text
//! 2:0.5 |w the |s suffix=he
//! 1 |w cat |s suffix=at
//!
//! |w unlabeled |s test=yes
//! ```
//!
//! Each line is one example: an optional `label[:weight]` followed by one or
//! more `|namespace feature[:value] ...` groups. A line without a label is a
//! test example. A blank line ends the current sequence.

use crate::error::{Result, SearnError};
use crate::learner::TableLayout;

use super::types::{
    Example, Feature, MulticlassLabel, CONSTANT_FEATURE, CONSTANT_NAMESPACE,
};

const FNV32_OFFSET: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// Namespace id used when a `|` is followed directly by whitespace.
pub const DEFAULT_NAMESPACE: u8 = b' ';

/// 32-bit FNV-1a over `bytes`, starting from the offset basis mixed with `seed`.
pub fn fnv1a32(bytes: &[u8], seed: u32) -> u32 {
    let mut h = FNV32_OFFSET ^ seed;
    for b in bytes {
        h ^= *b as u32;
        h = h.wrapping_mul(FNV32_PRIME);
    }
    h
}

/// Hash a feature name inside a namespace. All-digit names are used as numbers.
pub fn hash_feature(name: &str, namespace_seed: u32) -> u32 {
    match name.parse::<u32>() {
        Ok(n) if name.bytes().all(|b| b.is_ascii_digit()) => n.wrapping_add(namespace_seed),
        _ => fnv1a32(name.as_bytes(), namespace_seed),
    }
}

/// Parses text lines into [`Example`]s addressed into a weight table.
#[derive(Debug, Clone)]
pub struct ExampleParser {
    parse_mask: u32,
    audit: bool,
}

impl ExampleParser {
    pub fn new(layout: TableLayout, audit: bool) -> Self {
        Self {
            parse_mask: layout.parse_mask(),
            audit,
        }
    }

    /// Parse one line. `line_no` is only used in error messages.
    pub fn parse_line(&self, line: &str, line_no: usize) -> Result<Example> {
        if line.trim().is_empty() {
            return Ok(Example::boundary());
        }

        let (head, body) = match line.find('|') {
            Some(pos) => (&line[..pos], &line[pos + 1..]),
            None => (line, ""),
        };

        let label = parse_label(head.trim(), line_no)?;
        let mut example = Example::new(label);

        if !body.is_empty() {
            for group in body.split('|') {
                self.parse_group(&mut example, group, line_no)?;
            }
        }

        if example.num_features() > 0 {
            let constant = example.namespace_entry(CONSTANT_NAMESPACE);
            constant.push(Feature::new(CONSTANT_FEATURE & self.parse_mask, 1.0));
            if self.audit {
                constant.audit.push("constant".to_string());
            }
        }

        Ok(example)
    }

    fn parse_group(&self, example: &mut Example, group: &str, line_no: usize) -> Result<()> {
        let mut tokens = group.split_whitespace();
        let (id, seed, name) = if group.starts_with(char::is_whitespace) || group.is_empty() {
            (DEFAULT_NAMESPACE, 0, " ")
        } else {
            match tokens.next() {
                Some(name) => (name.as_bytes()[0], fnv1a32(name.as_bytes(), 0), name),
                None => return Ok(()),
            }
        };

        for token in tokens {
            let (feature_name, value) = match token.rsplit_once(':') {
                Some((feature_name, raw)) => {
                    let value = raw.parse::<f32>().map_err(|_| SearnError::Parse {
                        line: line_no,
                        message: format!("bad feature value in '{token}'"),
                    })?;
                    (feature_name, value)
                }
                None => (token, 1.0),
            };
            if value == 0.0 {
                continue;
            }

            let index = hash_feature(feature_name, seed) & self.parse_mask;
            let namespace = example.namespace_entry(id);
            namespace.push(Feature::new(index, value));
            if self.audit {
                namespace.audit.push(format!("{}^{feature_name}", name.trim()));
            }
        }
        Ok(())
    }
}

fn parse_label(head: &str, line_no: usize) -> Result<MulticlassLabel> {
    let Some(token) = head.split_whitespace().next() else {
        return Ok(MulticlassLabel::test());
    };

    let bad = |what: &str| SearnError::Parse {
        line: line_no,
        message: format!("bad {what} in label '{token}'"),
    };

    let (class, weight) = match token.split_once(':') {
        Some((class, weight)) => (class, weight.parse::<f32>().map_err(|_| bad("weight"))?),
        None => (token, 1.0),
    };
    let class = class.parse::<u32>().map_err(|_| bad("class"))?;
    Ok(MulticlassLabel::new(class, weight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example::types::HISTORY_NAMESPACE;

    fn parser() -> ExampleParser {
        ExampleParser::new(TableLayout::new(18), true)
    }

    #[test]
    fn test_blank_line_is_boundary() {
        let ex = parser().parse_line("   ", 1).unwrap();
        assert!(ex.is_boundary());
    }

    #[test]
    fn test_label_weight_and_namespaces() {
        let ex = parser().parse_line("3:0.5 |w the cat |s suf=he:2", 1).unwrap();
        let label = ex.multiclass().unwrap();
        assert_eq!(label.class, Some(3));
        assert!((label.weight - 0.5).abs() < 1e-6);

        let ids: Vec<u8> = ex.namespaces().iter().map(|ns| ns.id).collect();
        assert_eq!(ids, vec![b'w', b's', CONSTANT_NAMESPACE]);
        assert_eq!(ex.num_features(), 4);
        // 1 + 1 + 4 + constant
        assert!((ex.total_sum_feat_sq() - 7.0).abs() < 1e-6);
        assert_eq!(ex.namespaces()[1].audit, vec!["s^suf=he".to_string()]);
    }

    #[test]
    fn test_missing_label_is_test_example() {
        let ex = parser().parse_line("| a b c", 7).unwrap();
        assert!(ex.is_test());
        assert_eq!(ex.namespaces()[0].id, DEFAULT_NAMESPACE);
        assert_eq!(ex.num_features(), 4);
    }

    #[test]
    fn test_indices_respect_mask() {
        let layout = TableLayout::new(4);
        let ex = ExampleParser::new(layout, false)
            .parse_line("1 |x alpha beta gamma 123456", 1)
            .unwrap();
        assert!(ex.features().all(|f| f.weight_index < 16));
        assert!(!ex.has_namespace(HISTORY_NAMESPACE));
    }

    #[test]
    fn test_zero_valued_features_are_dropped() {
        let ex = parser().parse_line("1 |x a:0 b", 1).unwrap();
        assert_eq!(ex.namespaces()[0].len(), 1);
    }

    #[test]
    fn test_bad_label_is_an_error() {
        let err = parser().parse_line("x1 |a b", 12).unwrap_err();
        assert!(matches!(err, SearnError::Parse { line: 12, .. }));
    }

    #[test]
    fn test_bad_value_is_an_error() {
        assert!(parser().parse_line("1 |a b:zz", 1).is_err());
    }

    #[test]
    fn test_numeric_feature_names_hash_as_numbers() {
        assert_eq!(hash_feature("42", 0), 42);
        assert_eq!(hash_feature("42", 8), 50);
        assert_ne!(hash_feature("4a", 0), hash_feature("4b", 0));
    }
}
