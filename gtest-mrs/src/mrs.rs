//! MRS data structures

use std::collections::BTreeMap;
use std::fmt;

/// Sort of handle variables
pub const HANDLE_SORT: &str = "h";

/// Role holding a predication's label
pub const LABEL_ROLE: &str = "LBL";
/// Role holding a predication's intrinsic variable
pub const INTRINSIC_ROLE: &str = "ARG0";
/// Restriction role, only present on quantifiers
pub const RESTRICTION_ROLE: &str = "RSTR";
/// Scope of a quantifier, normally unconstrained
pub const BODY_ROLE: &str = "BODY";
/// Constant argument role
pub const CARG_ROLE: &str = "CARG";

/// A variable such as `x3` or `h0`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var {
    pub sort: String,
    pub id: u32,
}

impl Var {
    pub fn new(sort: impl Into<String>, id: u32) -> Self {
        Self { sort: sort.into(), id }
    }

    /// Parse `<sort><id>`; the sort must be alphabetic and non-empty
    pub fn parse(text: &str) -> Option<Self> {
        let split = text.find(|c: char| c.is_ascii_digit())?;
        let (sort, id) = text.split_at(split);
        if sort.is_empty() || !sort.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        Some(Self { sort: sort.to_string(), id: id.parse().ok()? })
    }

    pub fn is_handle(&self) -> bool {
        self.sort == HANDLE_SORT
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sort, self.id)
    }
}

/// Value of a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Var(Var),
    Const(String),
}

impl Arg {
    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Self::Var(v) => Some(v),
            Self::Const(_) => None,
        }
    }
}

/// A predication: predicate, label and role arguments (the label is kept
/// apart from `args`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementaryPredication {
    pub predicate: String,
    pub lnk: Option<String>,
    pub label: Option<Var>,
    pub args: Vec<(String, Arg)>,
}

impl ElementaryPredication {
    pub fn arg(&self, role: &str) -> Option<&Arg> {
        self.args.iter().find(|(r, _)| r == role).map(|(_, a)| a)
    }

    /// The ARG0 variable
    pub fn intrinsic(&self) -> Option<&Var> {
        self.arg(INTRINSIC_ROLE).and_then(Arg::as_var)
    }

    pub fn carg(&self) -> Option<&str> {
        match self.arg(CARG_ROLE) {
            Some(Arg::Const(c)) => Some(c),
            _ => None,
        }
    }

    pub fn is_quantifier(&self) -> bool {
        self.arg(RESTRICTION_ROLE).is_some()
    }

    /// Predicate in comparable form: unquoted, lower-cased, no `_rel` suffix
    pub fn normalized_predicate(&self) -> String {
        normalize_predicate(&self.predicate)
    }
}

pub fn normalize_predicate(pred: &str) -> String {
    let pred = pred.trim_matches('"').to_lowercase();
    match pred.strip_suffix("_rel") {
        Some(stripped) => stripped.to_string(),
        None => pred,
    }
}

/// Relation between two handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeRelation {
    Qeq,
    Lheq,
    Outscopes,
}

impl ScopeRelation {
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_lowercase().as_str() {
            "qeq" => Some(Self::Qeq),
            "lheq" => Some(Self::Lheq),
            "outscopes" => Some(Self::Outscopes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleConstraint {
    pub hi: Var,
    pub relation: ScopeRelation,
    pub lo: Var,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndividualConstraint {
    pub left: Var,
    pub relation: String,
    pub right: Var,
}

/// A decoded MRS
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mrs {
    pub top: Option<Var>,
    pub index: Option<Var>,
    pub eps: Vec<ElementaryPredication>,
    pub hcons: Vec<HandleConstraint>,
    pub icons: Vec<IndividualConstraint>,
    /// Variable properties, names upper-cased and values lower-cased
    pub properties: BTreeMap<Var, BTreeMap<String, String>>,
}

impl Mrs {
    pub fn properties_of(&self, var: &Var) -> Option<&BTreeMap<String, String>> {
        self.properties.get(var).filter(|props| !props.is_empty())
    }

    /// Indices of predications labelled `label`
    pub fn labelled(&self, label: &Var) -> impl Iterator<Item = usize> + '_ {
        let label = label.clone();
        self.eps.iter().enumerate().filter(move |(_, ep)| ep.label.as_ref() == Some(&label)).map(|(i, _)| i)
    }

    pub fn is_label(&self, var: &Var) -> bool {
        self.labelled(var).next().is_some()
    }

    /// The low handle of the constraint whose high handle is `hi`
    pub fn qeq_target(&self, hi: &Var) -> Option<&Var> {
        self.hcons.iter().find(|hc| &hc.hi == hi).map(|hc| &hc.lo)
    }

    /// Predications a handle refers to, directly or through a handle constraint
    pub fn handle_targets(&self, handle: &Var) -> Vec<usize> {
        let mut targets: Vec<usize> = self.labelled(handle).collect();
        if let Some(lo) = self.qeq_target(handle) {
            targets.extend(self.labelled(lo));
        }
        targets
    }

    /// Handle-valued arguments of all predications, excluding labels
    pub fn handle_args(&self) -> impl Iterator<Item = &Var> {
        self.eps.iter().flat_map(|ep| ep.args.iter()).filter_map(|(_, a)| a.as_var()).filter(|v| v.is_handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_parse() {
        assert_eq!(Var::parse("x3"), Some(Var::new("x", 3)));
        assert_eq!(Var::parse("h10"), Some(Var::new("h", 10)));
        assert_eq!(Var::parse("x"), None);
        assert_eq!(Var::parse("3"), None);
        assert_eq!(Var::parse("_dog_n_1"), None);
        assert_eq!(Var::new("e", 2).to_string(), "e2");
    }

    #[test]
    fn test_normalize_predicate() {
        assert_eq!(normalize_predicate("\"_dog_n_1_rel\""), "_dog_n_1");
        assert_eq!(normalize_predicate("PROPER_Q_REL"), "proper_q");
        assert_eq!(normalize_predicate("named"), "named");
    }
}
