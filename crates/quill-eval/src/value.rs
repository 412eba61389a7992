//! Runtime values.

use quill_syntax::{DiceKeep, Expr};
use std::collections::BTreeMap;
use std::fmt;

/// A runtime value.
#[derive(Clone, PartialEq)]
pub enum RuntimeValue {
    Numeric(f64),
    String(String),
    Boolean(bool),
    /// Structured value, optionally carrying a numeric representation
    Object(ObjectValue),
    List(Vec<RuntimeValue>),
    Nil,
    DiceRoll(DiceRollValue),
    /// Dice arithmetic kept symbolic, e.g. `3d6 + 2`
    DiceNotation(Expr),
}

impl RuntimeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeValue::Numeric(_) => "numeric",
            RuntimeValue::String(_) => "string",
            RuntimeValue::Boolean(_) => "boolean",
            RuntimeValue::Object(_) => "object",
            RuntimeValue::List(_) => "list",
            RuntimeValue::Nil => "nil",
            RuntimeValue::DiceRoll(_) => "dice-roll",
            RuntimeValue::DiceNotation(_) => "dice-notation",
        }
    }

    /// Number this value stands for in arithmetic.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RuntimeValue::Numeric(n) => Some(*n),
            RuntimeValue::Object(object) => object.numeric,
            RuntimeValue::DiceRoll(roll) => roll.total(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RuntimeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RuntimeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Values that still describe a computation rather than its result.
    pub fn is_symbolic(&self) -> bool {
        match self {
            RuntimeValue::DiceRoll(roll) => !roll.was_rolled(),
            RuntimeValue::DiceNotation(_) => true,
            _ => false,
        }
    }
}

impl From<f64> for RuntimeValue {
    fn from(value: f64) -> Self {
        RuntimeValue::Numeric(value)
    }
}

impl From<bool> for RuntimeValue {
    fn from(value: bool) -> Self {
        RuntimeValue::Boolean(value)
    }
}

impl From<&str> for RuntimeValue {
    fn from(value: &str) -> Self {
        RuntimeValue::String(value.to_string())
    }
}

impl From<String> for RuntimeValue {
    fn from(value: String) -> Self {
        RuntimeValue::String(value)
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Numeric(n) => write_number(f, *n),
            RuntimeValue::String(s) => f.write_str(s),
            RuntimeValue::Boolean(b) => write!(f, "{b}"),
            RuntimeValue::Object(object) => write!(f, "{object}"),
            RuntimeValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            RuntimeValue::Nil => Ok(()),
            RuntimeValue::DiceRoll(roll) => write!(f, "{roll}"),
            RuntimeValue::DiceNotation(expr) => write!(f, "{expr}"),
        }
    }
}

impl fmt::Debug for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Numeric(n) => write_number(f, *n),
            RuntimeValue::String(s) => write!(f, "\"{s}\""),
            RuntimeValue::Boolean(b) => write!(f, "{b}"),
            RuntimeValue::Object(object) => write!(f, "{object:?}"),
            RuntimeValue::List(items) => f.debug_list().entries(items).finish(),
            RuntimeValue::Nil => f.write_str("nil"),
            RuntimeValue::DiceRoll(roll) => write!(f, "{roll:?}"),
            RuntimeValue::DiceNotation(expr) => write!(f, "<{expr}>"),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        write!(f, "{}", value as i64)
    } else {
        write!(f, "{value}")
    }
}

/// Named fields with an optional numeric face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectValue {
    pub fields: BTreeMap<String, RuntimeValue>,
    pub numeric: Option<f64>,
}

impl ObjectValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<RuntimeValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_numeric(mut self, numeric: f64) -> Self {
        self.numeric = Some(numeric);
        self
    }
}

impl fmt::Display for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(numeric) = self.numeric {
            return write_number(f, numeric);
        }
        f.write_str("{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value:?}")?;
        }
        f.write_str("}")
    }
}

/// Dice of one kind, rolled or not.
/// 一组同类骰子，可能尚未掷出。
#[derive(Clone, PartialEq, Eq)]
pub struct DiceRollValue {
    pub size: u32,
    pub faces: u32,
    pub keep: DiceKeep,
    /// Individual results, once rolled.
    pub rolls: Option<Vec<u32>>,
}

impl DiceRollValue {
    pub fn new(size: u32, faces: u32, keep: DiceKeep) -> Self {
        Self {
            size,
            faces,
            keep,
            rolls: None,
        }
    }

    pub fn was_rolled(&self) -> bool {
        self.rolls.is_some()
    }

    /// Same faces and keep rules, so the counts can be combined.
    pub fn compatible(&self, other: &DiceRollValue) -> bool {
        self.faces == other.faces && self.keep.keep_equals(&other.keep)
    }

    /// Rolls kept by the keep rules, highest first.
    ///
    /// A player's-choice count keeps the highest dice, and `kh`/`kl` counts
    /// never keep the same die twice.
    pub fn kept(&self) -> Option<Vec<u32>> {
        let mut sorted = self.rolls.clone()?;
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        if self.keep.is_empty() {
            return Some(sorted);
        }
        let count = sorted.len();
        let high = self
            .keep
            .highest
            .unwrap_or(0)
            .max(self.keep.players_choice.unwrap_or(0)) as usize;
        let high = high.min(count);
        let low = (self.keep.lowest.unwrap_or(0) as usize).min(count - high);
        let mut kept = sorted[..high].to_vec();
        kept.extend_from_slice(&sorted[count - low..]);
        Some(kept)
    }

    /// Sum of the kept dice, once rolled.
    pub fn total(&self) -> Option<f64> {
        self.kept()
            .map(|kept| kept.iter().map(|&roll| f64::from(roll)).sum())
    }
}

impl fmt::Display for DiceRollValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total() {
            Some(total) => write_number(f, total),
            None => write!(f, "{}d{}{}", self.size, self.faces, self.keep),
        }
    }
}

impl fmt::Debug for DiceRollValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}{}", self.size, self.faces, self.keep)?;
        if let Some(rolls) = &self.rolls {
            write!(f, " {rolls:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rolled(rolls: &[u32], keep: DiceKeep) -> DiceRollValue {
        DiceRollValue {
            size: rolls.len() as u32,
            faces: 6,
            keep,
            rolls: Some(rolls.to_vec()),
        }
    }

    #[test]
    fn test_total_keeps_all_by_default() {
        assert_eq!(rolled(&[1, 4, 6], DiceKeep::default()).total(), Some(11.0));
        assert_eq!(DiceRollValue::new(3, 6, DiceKeep::default()).total(), None);
    }

    #[test]
    fn test_keep_highest_and_lowest() {
        let highest = DiceKeep {
            highest: Some(2),
            ..DiceKeep::default()
        };
        assert_eq!(rolled(&[1, 4, 6], highest).total(), Some(10.0));

        let lowest = DiceKeep {
            lowest: Some(1),
            ..DiceKeep::default()
        };
        assert_eq!(rolled(&[3, 4, 6], lowest).total(), Some(3.0));

        let both = DiceKeep {
            highest: Some(2),
            lowest: Some(5),
            players_choice: None,
        };
        assert_eq!(rolled(&[1, 2, 6], both).total(), Some(9.0));
    }

    #[test]
    fn test_display() {
        let keep = DiceKeep {
            highest: Some(2),
            ..DiceKeep::default()
        };
        assert_eq!(DiceRollValue::new(3, 6, keep).to_string(), "3d6kh2");
        assert_eq!(rolled(&[2, 5], DiceKeep::default()).to_string(), "7");
        assert_eq!(RuntimeValue::Numeric(2.5).to_string(), "2.5");
        assert_eq!(
            RuntimeValue::List(vec![1.0.into(), "a".into()]).to_string(),
            "1, a"
        );
    }

    #[test]
    fn test_object_numeric_face() {
        let object = ObjectValue::new().with_field("name", "Broadsword").with_numeric(12.0);
        let value = RuntimeValue::Object(object);
        assert_eq!(value.as_number(), Some(12.0));
        assert_eq!(value.to_string(), "12");
    }
}
