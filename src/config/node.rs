//! Configuration tree nodes
//!
//! Every option is one [`ConfigNode`]. The four kinds are a closed set:
//!
//! - [`Flag`]: presence only (`diag_e`)
//! - [`Leaf`]: one typed scalar (`num_warmup=10`)
//! - [`Record`]: a namespace whose children are always present (`adapt`)
//! - [`Choice`]: exactly one active alternative out of several (`algorithm=hmc`)

use super::scalar::{Rule, Scalar, ScalarValue};

/// Presence-only option
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    pub name: String,
    pub description: String,
    pub present: bool,
}

impl Flag {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            present: false,
        }
    }
}

/// Option holding one scalar of type `T`
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf<T: Scalar> {
    pub name: String,
    pub description: String,
    value: T,
    default_value: T,
    rule: Rule,
    known_good: T,
    known_bad: Option<T>,
}

impl<T: Scalar> Leaf<T> {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        default_value: T,
        rule: Rule,
        known_good: T,
        known_bad: Option<T>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value: default_value.clone(),
            default_value,
            rule,
            known_good,
            known_bad,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn known_good(&self) -> &T {
        &self.known_good
    }

    pub fn known_bad(&self) -> Option<&T> {
        self.known_bad.as_ref()
    }

    pub fn is_default(&self) -> bool {
        self.value == self.default_value
    }

    pub fn is_valid(&self, candidate: &T) -> bool {
        self.rule.check(candidate)
    }

    pub fn validity(&self) -> String {
        self.rule
            .describe(&self.name)
            .unwrap_or_else(|| T::ANY_VALIDITY.to_string())
    }

    /// Convert and validate `raw`; the stored value is untouched on failure
    pub fn try_set(&mut self, raw: &str) -> bool {
        match T::parse_token(raw) {
            Some(candidate) if self.is_valid(&candidate) => {
                self.value = candidate;
                true
            }
            _ => false,
        }
    }

    /// Store a value without validation. Only the probe harness does this,
    /// on its own copy of the tree.
    pub(crate) fn set_unchecked(&mut self, value: T) {
        self.value = value;
    }
}

/// A [`Leaf`] of any supported scalar type
#[derive(Debug, Clone, PartialEq)]
pub enum AnyLeaf {
    Bool(Leaf<bool>),
    Int(Leaf<i32>),
    Long(Leaf<i64>),
    UInt(Leaf<u32>),
    Real(Leaf<f64>),
    Text(Leaf<String>),
}

macro_rules! each_leaf {
    ($any:expr, $leaf:ident => $body:expr) => {
        match $any {
            AnyLeaf::Bool($leaf) => $body,
            AnyLeaf::Int($leaf) => $body,
            AnyLeaf::Long($leaf) => $body,
            AnyLeaf::UInt($leaf) => $body,
            AnyLeaf::Real($leaf) => $body,
            AnyLeaf::Text($leaf) => $body,
        }
    };
}

/// Which self-test constant to install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownValue {
    Good,
    Bad,
}

impl AnyLeaf {
    pub fn name(&self) -> &str {
        each_leaf!(self, leaf => &leaf.name)
    }

    pub fn description(&self) -> &str {
        each_leaf!(self, leaf => &leaf.description)
    }

    pub fn type_name(&self) -> &'static str {
        fn of<T: Scalar>(_: &Leaf<T>) -> &'static str {
            T::TYPE_NAME
        }
        each_leaf!(self, leaf => of(leaf))
    }

    pub fn value(&self) -> ScalarValue {
        each_leaf!(self, leaf => leaf.value().to_value())
    }

    pub fn default_value(&self) -> ScalarValue {
        each_leaf!(self, leaf => leaf.default_value().to_value())
    }

    pub fn known_good(&self) -> ScalarValue {
        each_leaf!(self, leaf => leaf.known_good().to_value())
    }

    pub fn known_bad(&self) -> Option<ScalarValue> {
        each_leaf!(self, leaf => leaf.known_bad().map(Scalar::to_value))
    }

    pub fn is_default(&self) -> bool {
        each_leaf!(self, leaf => leaf.is_default())
    }

    pub fn validity(&self) -> String {
        each_leaf!(self, leaf => leaf.validity())
    }

    pub fn try_set(&mut self, raw: &str) -> bool {
        each_leaf!(self, leaf => leaf.try_set(raw))
    }

    /// Install the known-good or known-bad constant, bypassing validation.
    /// Returns `false` when the leaf has no such constant.
    pub(crate) fn install(&mut self, which: KnownValue) -> bool {
        each_leaf!(self, leaf => {
            let chosen = match which {
                KnownValue::Good => Some(leaf.known_good().clone()),
                KnownValue::Bad => leaf.known_bad().cloned(),
            };
            match chosen {
                Some(v) => {
                    leaf.set_unchecked(v);
                    true
                }
                None => false,
            }
        })
    }
}

/// Named, ordered set of always-present children
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub description: String,
    pub children: Vec<ConfigNode>,
}

impl Record {
    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|c| c.name() == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut ConfigNode> {
        self.children.iter_mut().find(|c| c.name() == name)
    }
}

/// Single-choice union over named alternatives
///
/// Alternatives are [`Record`]s or, for alternatives without sub-options,
/// [`Flag`]s. `active` always indexes into `alternatives`.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub name: String,
    pub description: String,
    pub alternatives: Vec<ConfigNode>,
    active: usize,
    default: usize,
    selected: bool,
}

impl Choice {
    /// `default` must index into a non-empty `alternatives`; the builder
    /// checks this before construction.
    pub(crate) fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        alternatives: Vec<ConfigNode>,
        default: usize,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            alternatives,
            active: default,
            default,
            selected: false,
        }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn default_index(&self) -> usize {
        self.default
    }

    /// Whether a token selected or entered this choice during parsing
    pub fn was_selected(&self) -> bool {
        self.selected
    }

    pub fn is_default(&self) -> bool {
        self.active == self.default
    }

    pub fn active_alternative(&self) -> &ConfigNode {
        &self.alternatives[self.active]
    }

    pub fn active_alternative_mut(&mut self) -> &mut ConfigNode {
        &mut self.alternatives[self.active]
    }

    pub fn active_name(&self) -> &str {
        self.active_alternative().name()
    }

    pub fn default_name(&self) -> &str {
        self.alternatives[self.default].name()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.alternatives.iter().position(|a| a.name() == name)
    }

    pub fn alternative_names(&self) -> Vec<&str> {
        self.alternatives.iter().map(ConfigNode::name).collect()
    }

    /// Make `index` the active alternative and mark the choice as selected
    pub(crate) fn select(&mut self, index: usize) {
        if index < self.alternatives.len() {
            if let ConfigNode::Flag(previous) = &mut self.alternatives[self.active] {
                previous.present = false;
            }
            self.active = index;
            self.selected = true;
            if let ConfigNode::Flag(flag) = &mut self.alternatives[index] {
                flag.present = true;
            }
        }
    }

    pub(crate) fn mark_selected(&mut self) {
        self.selected = true;
    }
}

/// One entry in the configuration schema
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Flag(Flag),
    Leaf(AnyLeaf),
    Record(Record),
    Choice(Choice),
}

impl ConfigNode {
    pub fn name(&self) -> &str {
        match self {
            ConfigNode::Flag(f) => &f.name,
            ConfigNode::Leaf(l) => l.name(),
            ConfigNode::Record(r) => &r.name,
            ConfigNode::Choice(c) => &c.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ConfigNode::Flag(f) => &f.description,
            ConfigNode::Leaf(l) => l.description(),
            ConfigNode::Record(r) => &r.description,
            ConfigNode::Choice(c) => &c.description,
        }
    }

    pub fn as_leaf(&self) -> Option<&AnyLeaf> {
        match self {
            ConfigNode::Leaf(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&Choice> {
        match self {
            ConfigNode::Choice(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            ConfigNode::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Resolve a path relative to this node
    ///
    /// Records are entered by child name. Through a choice the next segment
    /// must name the *active* alternative, so inactive subtrees are never
    /// reachable. An empty path yields the node itself.
    pub fn lookup(&self, path: &[&str]) -> Option<&ConfigNode> {
        let Some((head, rest)) = path.split_first() else {
            return Some(self);
        };
        match self {
            ConfigNode::Record(r) => r.child(head)?.lookup(rest),
            ConfigNode::Choice(c) if c.active_name() == *head => {
                c.active_alternative().lookup(rest)
            }
            _ => None,
        }
    }

    pub fn lookup_mut(&mut self, path: &[&str]) -> Option<&mut ConfigNode> {
        let Some((head, rest)) = path.split_first() else {
            return Some(self);
        };
        match self {
            ConfigNode::Record(r) => r.child_mut(head)?.lookup_mut(rest),
            ConfigNode::Choice(c) if c.active_name() == *head => {
                c.active_alternative_mut().lookup_mut(rest)
            }
            _ => None,
        }
    }

    /// Like [`lookup_mut`](Self::lookup_mut), but selects any alternative the
    /// path names along the way. Used to reach leaves of inactive alternatives.
    pub fn route_mut(&mut self, path: &[&str]) -> Option<&mut ConfigNode> {
        let Some((head, rest)) = path.split_first() else {
            return Some(self);
        };
        match self {
            ConfigNode::Record(r) => r.child_mut(head)?.route_mut(rest),
            ConfigNode::Choice(c) => {
                let index = c.position(head)?;
                c.select(index);
                c.active_alternative_mut().route_mut(rest)
            }
            _ => None,
        }
    }

    /// Every path below this node that ends at a leaf, across all alternatives
    pub fn leaf_paths(&self) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        self.collect_leaf_paths(&mut Vec::new(), &mut paths);
        paths
    }

    fn collect_leaf_paths(&self, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        match self {
            ConfigNode::Flag(_) => {}
            ConfigNode::Leaf(_) => out.push(prefix.clone()),
            ConfigNode::Record(r) => {
                for child in &r.children {
                    prefix.push(child.name().to_string());
                    child.collect_leaf_paths(prefix, out);
                    prefix.pop();
                }
            }
            ConfigNode::Choice(c) => {
                for alt in &c.alternatives {
                    prefix.push(alt.name().to_string());
                    alt.collect_leaf_paths(prefix, out);
                    prefix.pop();
                }
            }
        }
    }
}

/// Split a dotted path such as `method.sample.adapt.delta`
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('.').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta() -> Leaf<f64> {
        Leaf::new("delta", "Adaptation target acceptance statistic", 0.8, Rule::Open(0.0, 1.0), 0.5, Some(1.5))
    }

    fn metric() -> Choice {
        Choice::new(
            "metric",
            "Geometry of base manifold",
            vec![
                ConfigNode::Flag(Flag::new("unit_e", "Euclidean manifold with unit metric")),
                ConfigNode::Flag(Flag::new("diag_e", "Euclidean manifold with diag metric")),
            ],
            1,
        )
    }

    #[test]
    fn test_leaf_starts_at_default() {
        let leaf = delta();
        assert_eq!(*leaf.value(), 0.8);
        assert!(leaf.is_default());
    }

    #[test]
    fn test_leaf_try_set() {
        let mut leaf = delta();
        assert!(leaf.try_set("0.9"));
        assert_eq!(*leaf.value(), 0.9);
        assert!(!leaf.is_default());

        assert!(!leaf.try_set("1.5"));
        assert!(!leaf.try_set("abc"));
        assert_eq!(*leaf.value(), 0.9);
    }

    #[test]
    fn test_leaf_validity_text() {
        assert_eq!(delta().validity(), "0 < delta < 1");
        let flag = Leaf::new("save_warmup", "", false, Rule::Any, true, None);
        assert_eq!(flag.validity(), "[0, 1]");
    }

    #[test]
    fn test_any_leaf_install() {
        let mut leaf = AnyLeaf::Real(delta());
        assert!(leaf.install(KnownValue::Bad));
        assert_eq!(leaf.value(), ScalarValue::Real(1.5));

        let mut text = AnyLeaf::Text(Leaf::new("file", "", String::new(), Rule::Any, "a".to_string(), None));
        assert!(!text.install(KnownValue::Bad));
        assert!(text.install(KnownValue::Good));
        assert_eq!(text.value(), ScalarValue::Text("a".to_string()));
    }

    #[test]
    fn test_choice_select_marks_flag() {
        let mut choice = metric();
        assert_eq!(choice.active_name(), "diag_e");
        assert!(!choice.was_selected());

        choice.select(0);
        assert_eq!(choice.active_name(), "unit_e");
        assert!(choice.was_selected());
        assert!(!choice.is_default());
        assert!(matches!(&choice.alternatives[0], ConfigNode::Flag(f) if f.present));
    }

    #[test]
    fn test_choice_reselect_clears_previous_flag() {
        let mut choice = metric();
        choice.select(0);
        choice.select(1);
        assert!(matches!(&choice.alternatives[0], ConfigNode::Flag(f) if !f.present));
        assert!(matches!(&choice.alternatives[1], ConfigNode::Flag(f) if f.present));

        choice.select(1);
        assert!(matches!(&choice.alternatives[1], ConfigNode::Flag(f) if f.present));
    }

    #[test]
    fn test_choice_select_out_of_range_is_ignored() {
        let mut choice = metric();
        choice.select(7);
        assert_eq!(choice.active_index(), 1);
    }

    #[test]
    fn test_lookup_only_through_active_alternative() {
        let hmc = ConfigNode::Record(Record {
            name: "hmc".to_string(),
            description: String::new(),
            children: vec![ConfigNode::Choice(metric())],
        });
        let fixed = ConfigNode::Flag(Flag::new("fixed_param", ""));
        let mut algorithm = ConfigNode::Choice(Choice::new("algorithm", "", vec![hmc, fixed], 0));

        assert!(algorithm.lookup(&["hmc", "metric"]).is_some());
        assert!(algorithm.lookup(&["fixed_param"]).is_none());

        assert!(algorithm.route_mut(&["fixed_param"]).is_some());
        assert!(algorithm.lookup(&["hmc", "metric"]).is_none());
        assert!(algorithm.lookup(&["fixed_param"]).is_some());
    }

    #[test]
    fn test_leaf_paths_cover_all_alternatives() {
        let static_alt = ConfigNode::Record(Record {
            name: "static".to_string(),
            description: String::new(),
            children: vec![ConfigNode::Leaf(AnyLeaf::Real(delta()))],
        });
        let nuts_alt = ConfigNode::Record(Record {
            name: "nuts".to_string(),
            description: String::new(),
            children: vec![ConfigNode::Leaf(AnyLeaf::Int(Leaf::new(
                "max_depth",
                "",
                10,
                Rule::Positive,
                2,
                Some(-1),
            )))],
        });
        let engine = ConfigNode::Choice(Choice::new("engine", "", vec![static_alt, nuts_alt], 1));
        let paths = engine.leaf_paths();
        assert_eq!(
            paths,
            vec![
                vec!["static".to_string(), "delta".to_string()],
                vec!["nuts".to_string(), "max_depth".to_string()],
            ]
        );
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("method.sample.adapt.delta"), vec!["method", "sample", "adapt", "delta"]);
        assert_eq!(split_path(""), Vec::<&str>::new());
    }
}
