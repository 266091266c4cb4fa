//! Rule-driven canonicalisation of model and scenario names.
//!
//! Usage:
//! ```
//! use benchtab_ingestion::normalise::NameNormaliser;
//!
//! let n = NameNormaliser::default();
//! assert_eq!(n.canonicalize_model("meta-llama/Meta-Llama-3-8B"), "llama3_8b");
//! assert_eq!(n.canonicalize_scenario("GSM 8K"), "gsm8k");
//! ```

use benchtab_common::DisplayNameRegistry;
use serde::{Deserialize, Serialize};

/// One rewriting step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NameRule {
    Trim,
    Lowercase,
    /// Literal substitution. An occurrence of `from` already inside an
    /// occurrence of `to` is left alone.
    Replace { from: String, to: String },
    /// Keep only the text after the last `separator`.
    LastPathSegment { separator: char },
}

impl NameRule {
    pub fn replace(from: &str, to: &str) -> Self {
        NameRule::Replace { from: from.to_string(), to: to.to_string() }
    }

    pub fn apply(&self, input: &str) -> String {
        match self {
            NameRule::Trim => input.trim().to_string(),
            NameRule::Lowercase => input.to_lowercase(),
            NameRule::Replace { from, to } => guarded_replace(input, from, to),
            NameRule::LastPathSegment { separator } => input
                .rsplit(*separator)
                .next()
                .unwrap_or(input)
                .to_string(),
        }
    }
}

fn guarded_replace(input: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return input.to_string();
    }
    // Offsets at which `from` occurs inside `to`
    let offsets: Vec<usize> = to.match_indices(from).map(|(k, _)| k).collect();
    let bytes = input.as_bytes();

    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for (i, _) in input.match_indices(from) {
        let inside_to = offsets
            .iter()
            .any(|&k| i >= k && bytes[i - k..].starts_with(to.as_bytes()));
        out.push_str(&input[last..i]);
        out.push_str(if inside_to { from } else { to });
        last = i + from.len();
    }
    out.push_str(&input[last..]);
    out
}

/// Ordered, versioned list of rules. Pure data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub version: u32,
    pub rules: Vec<NameRule>,
}

impl RuleSet {
    pub fn new(version: u32, rules: Vec<NameRule>) -> Self {
        Self { version, rules }
    }

    pub fn apply(&self, input: &str) -> String {
        self.rules
            .iter()
            .fold(input.to_string(), |acc, rule| rule.apply(&acc))
    }

    /// Whitespace runs and parentheses, shared by both default sets.
    fn prelude() -> Vec<NameRule> {
        vec![
            NameRule::Trim,
            NameRule::Lowercase,
            NameRule::replace("   ", "-"),
            NameRule::replace("  ", "-"),
            NameRule::replace(" ", "-"),
            NameRule::replace("(", ""),
            NameRule::replace(")", ""),
        ]
    }

    pub fn default_models() -> Self {
        let mut rules = Self::prelude();
        rules.extend([
            NameRule::replace("β", "beta"),
            NameRule::replace("command-r+", "command-r-plus"),
            NameRule::replace("dbrx-inst", "dbrx-instruct"),
            NameRule::replace("-hf", ""),
            NameRule::replace("-", "_"),
            NameRule::replace("llama_3", "llama3"),
            NameRule::replace("ul2", "flan_ul2"),
            NameRule::LastPathSegment { separator: '/' },
            NameRule::replace("meta_", ""),
            NameRule::replace(".", "_"),
            NameRule::replace("v01", "v0_1"),
            NameRule::replace("v02", "v0_2"),
            NameRule::replace("v03", "v0_3"),
            NameRule::replace("wml/", ""),
        ]);
        Self::new(1, rules)
    }

    pub fn default_scenarios() -> Self {
        let mut rules = Self::prelude();
        rules.extend([
            NameRule::replace("gsm-8k", "gsm8k"),
            NameRule::replace("open-book", "open"),
            NameRule::replace("closed-book", "closed"),
            NameRule::replace("agi-eval", "agieval"),
            NameRule::replace("alpacaeval2-wr", "alpacav2"),
            NameRule::replace("alpacav2,-len-adj", "alpacaeval2-lc"),
            NameRule::replace("hswag", "hellaswag"),
            NameRule::replace("obqa", "openbookqa"),
            NameRule::replace("winogrande", "winog"),
            NameRule::replace("winog", "winogrande"),
            NameRule::replace("-", "_"),
        ]);
        Self::new(1, rules)
    }
}

/// Canonicalises model and scenario labels.
/// Build once per session and share by reference.
#[derive(Debug, Clone)]
pub struct NameNormaliser {
    model_rules: RuleSet,
    scenario_rules: RuleSet,
    display_names: DisplayNameRegistry,
}

impl Default for NameNormaliser {
    fn default() -> Self {
        Self::new(DisplayNameRegistry::default())
    }
}

impl NameNormaliser {
    /// Default rule sets with the given scenario display names.
    pub fn new(display_names: DisplayNameRegistry) -> Self {
        Self {
            model_rules: RuleSet::default_models(),
            scenario_rules: RuleSet::default_scenarios(),
            display_names,
        }
    }

    pub fn with_model_rules(mut self, rules: RuleSet) -> Self {
        self.model_rules = rules;
        self
    }

    pub fn with_scenario_rules(mut self, rules: RuleSet) -> Self {
        self.scenario_rules = rules;
        self
    }

    pub fn model_rules(&self) -> &RuleSet {
        &self.model_rules
    }

    pub fn scenario_rules(&self) -> &RuleSet {
        &self.scenario_rules
    }

    pub fn canonicalize_model(&self, raw: &str) -> String {
        self.model_rules.apply(raw)
    }

    /// Rules first, then the display-name lookup. Registered display names
    /// pass through unchanged.
    pub fn canonicalize_scenario(&self, raw: &str) -> String {
        if self.display_names.is_display_name(raw) {
            return raw.to_string();
        }
        let key = self.scenario_rules.apply(raw);
        match self.display_names.display_name(&key) {
            Some(display) => display.to_string(),
            None => key,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn normaliser() -> NameNormaliser {
        NameNormaliser::new(DisplayNameRegistry::new([
            ("mmlu", "MMLU"),
            ("alpacaeval2_lc", "AlpacaEval 2 LC"),
        ]))
    }

    #[test]
    fn test_model_examples() {
        let n = normaliser();
        let cases = [
            ("Mixtral 8x7B (Instruct)", "mixtral_8x7b_instruct"),
            ("meta-llama/Meta-Llama-3-70B-Instruct", "llama3_70b_instruct"),
            ("Command-R+", "command_r_plus"),
            ("dbrx-inst", "dbrx_instruct"),
            ("dbrx-instruct", "dbrx_instruct"),
            ("Llama-2-7b-hf", "llama_2_7b"),
            ("google/ul2", "flan_ul2"),
            ("mistralai/Mistral-7B-Instruct-v0.2", "mistral_7b_instruct_v0_2"),
            ("StableLM-β", "stablelm_beta"),
            ("  gpt-4  ", "gpt_4"),
        ];
        for (raw, expected) in cases {
            assert_eq!(n.canonicalize_model(raw), expected, "input: {raw}");
        }
    }

    #[test]
    fn test_scenario_examples() {
        let n = normaliser();
        let cases = [
            ("GSM 8K", "gsm8k"),
            ("ARC (Challenge)", "arc_challenge"),
            ("NaturalQuestions Open-Book", "naturalquestions_open"),
            ("AGI Eval", "agieval"),
            ("HSwag", "hellaswag"),
            ("OBQA", "openbookqa"),
            ("Winogrande", "winogrande"),
            ("WinoG", "winogrande"),
            ("MMLU", "MMLU"),
            ("mmlu", "MMLU"),
            ("AlpacaV2, len adj", "AlpacaEval 2 LC"),
        ];
        for (raw, expected) in cases {
            assert_eq!(n.canonicalize_scenario(raw), expected, "input: {raw}");
        }
    }

    #[test]
    fn test_canonicalisation_is_idempotent() {
        let n = normaliser();
        let models = [
            "Mixtral 8x7B (Instruct)",
            "dbrx-inst",
            "google/ul2",
            "flan-ul2",
            "Command-R+",
            "meta-llama/Meta-Llama-3-8B",
            "ibm/wml/granite-13b",
            "Yi-34B-Chat v01",
        ];
        for raw in models {
            let once = n.canonicalize_model(raw);
            assert_eq!(n.canonicalize_model(&once), once, "input: {raw}");
        }

        let scenarios = [
            "GSM 8K",
            "Winogrande",
            "AlpacaEval2 WR",
            "AlpacaV2, len adj",
            "Closed-Book QA",
            "mmlu",
        ];
        for raw in scenarios {
            let once = n.canonicalize_scenario(raw);
            assert_eq!(n.canonicalize_scenario(&once), once, "input: {raw}");
        }
    }

    #[test]
    fn test_guarded_replace() {
        assert_eq!(guarded_replace("dbrx-inst", "dbrx-inst", "dbrx-instruct"), "dbrx-instruct");
        assert_eq!(guarded_replace("dbrx-instruct", "dbrx-inst", "dbrx-instruct"), "dbrx-instruct");
        assert_eq!(guarded_replace("flan_ul2", "ul2", "flan_ul2"), "flan_ul2");
        assert_eq!(guarded_replace("a.b.c", ".", "_"), "a_b_c");
        assert_eq!(guarded_replace("abc", "", "x"), "abc");
    }

    #[test]
    fn test_last_path_segment() {
        let rule = NameRule::LastPathSegment { separator: '/' };
        assert_eq!(rule.apply("org/team/model"), "model");
        assert_eq!(rule.apply("model"), "model");
    }

    #[test]
    fn test_rule_set_from_json() {
        let json = r#"{"version": 2, "rules": [
            {"kind": "trim"},
            {"kind": "replace", "from": "x", "to": "y"},
            {"kind": "last_path_segment", "separator": ":"}
        ]}"#;
        let rules: RuleSet = serde_json::from_str(json).unwrap();
        assert_eq!(rules.version, 2);
        assert_eq!(rules.apply(" a:xx "), "yy");

        let n = NameNormaliser::default().with_model_rules(rules);
        assert_eq!(n.model_rules().version, 2);
        assert_eq!(n.canonicalize_model("p:x"), "y");
    }
}
