//! Built-in validation rules.
//!
//! Rules are stateless after construction and never mutate shared state; a
//! [`RuleSet`] keeps at most one rule per [`Stage`] in stage order and reports
//! the first failure.
use serde::{Deserialize, Serialize};

use super::{CommandInvocation, Stage};
use crate::host::{ActorHost, ActorKind};

/// Which actor kinds may run a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SenderPolicy {
    #[serde(alias = "player_only", alias = "players")]
    InteractiveOnly,
    #[serde(alias = "console_only", alias = "console")]
    PassiveOnly,
    #[default]
    #[serde(alias = "both")]
    Any,
}

impl SenderPolicy {
    /// Fails closed: a kind outside the allowed set is rejected.
    pub fn allows(self, kind: ActorKind) -> bool {
        match self {
            SenderPolicy::InteractiveOnly => kind == ActorKind::Interactive,
            SenderPolicy::PassiveOnly => kind == ActorKind::Passive,
            SenderPolicy::Any => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SenderPolicy::InteractiveOnly => "players",
            SenderPolicy::PassiveOnly => "console",
            SenderPolicy::Any => "any",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    /// Interactive actors must hold `node`. Passive actors always pass.
    Permission { node: String, message: String },
    SenderKind { policy: SenderPolicy, message: String },
    /// Fails on an absent argument list or fewer than `minimum` arguments.
    ArgumentCount { minimum: usize, message: String },
}

impl ValidationRule {
    pub fn stage(&self) -> Stage {
        match self {
            ValidationRule::Permission { .. } => Stage::Permission,
            ValidationRule::SenderKind { .. } => Stage::SenderKind,
            ValidationRule::ArgumentCount { .. } => Stage::ArgumentCount,
        }
    }

    /// Message sent to the actor when this rule fails.
    pub fn message(&self) -> &str {
        match self {
            ValidationRule::Permission { message, .. }
            | ValidationRule::SenderKind { message, .. }
            | ValidationRule::ArgumentCount { message, .. } => message,
        }
    }

    pub fn evaluate<H: ActorHost + ?Sized>(
        &self,
        host: &H,
        invocation: &CommandInvocation,
    ) -> bool {
        let actor = invocation.actor();
        match self {
            ValidationRule::Permission { node, .. } => {
                !actor.is_interactive() || host.has_permission(actor, node)
            }
            ValidationRule::SenderKind { policy, .. } => policy.allows(actor.kind),
            ValidationRule::ArgumentCount { minimum, .. } => match invocation.args() {
                Some(args) => args.len() >= *minimum,
                None => false,
            },
        }
    }
}

/// Ordered rule list, one slot per stage, last set wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<ValidationRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `rule`, replacing any rule already set for the same stage.
    pub fn set(&mut self, rule: ValidationRule) {
        let stage = rule.stage();
        self.rules.retain(|r| r.stage() != stage);
        let pos = self
            .rules
            .iter()
            .position(|r| r.stage() > stage)
            .unwrap_or(self.rules.len());
        self.rules.insert(pos, rule);
    }

    pub fn get(&self, stage: Stage) -> Option<&ValidationRule> {
        self.rules.iter().find(|r| r.stage() == stage)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Short-circuiting walk in stage order; the first failing rule, if any.
    pub fn first_failure<H: ActorHost + ?Sized>(
        &self,
        host: &H,
        invocation: &CommandInvocation,
    ) -> Option<&ValidationRule> {
        self.rules.iter().find(|rule| !rule.evaluate(host, invocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::Actor;

    fn count(min: usize) -> ValidationRule {
        ValidationRule::ArgumentCount {
            minimum: min,
            message: format!("need {}", min),
        }
    }

    #[test]
    fn rule_set_keeps_stage_order_and_last_write() {
        let mut set = RuleSet::new();
        set.set(count(1));
        set.set(ValidationRule::SenderKind {
            policy: SenderPolicy::Any,
            message: "s".into(),
        });
        set.set(ValidationRule::Permission {
            node: "a.b".into(),
            message: "p".into(),
        });
        set.set(count(3));
        let stages: Vec<Stage> = set.iter().map(ValidationRule::stage).collect();
        assert_eq!(stages, vec![Stage::Permission, Stage::SenderKind, Stage::ArgumentCount]);
        assert_eq!(set.get(Stage::ArgumentCount).unwrap().message(), "need 3");
    }

    #[test]
    fn argument_count_rejects_absent_and_short_lists() {
        let host = MemoryHost::new();
        let rule = count(0);
        let absent = CommandInvocation::without_args(Actor::console(), "x");
        let empty = CommandInvocation::new(Actor::console(), "x", vec![]);
        assert!(!rule.evaluate(&host, &absent));
        assert!(rule.evaluate(&host, &empty));
        assert!(!count(1).evaluate(&host, &empty));
    }

    #[test]
    fn sender_policy_fails_closed() {
        assert!(SenderPolicy::InteractiveOnly.allows(ActorKind::Interactive));
        assert!(!SenderPolicy::InteractiveOnly.allows(ActorKind::Passive));
        assert!(!SenderPolicy::PassiveOnly.allows(ActorKind::Interactive));
        assert!(SenderPolicy::Any.allows(ActorKind::Passive));
    }

    #[test]
    fn permission_applies_to_interactive_actors() {
        let mut host = MemoryHost::new();
        let alice = Actor::player("alice");
        let rule = ValidationRule::Permission {
            node: "x.y".into(),
            message: "no".into(),
        };
        let inv = CommandInvocation::new(alice.clone(), "x", vec![]);
        assert!(!rule.evaluate(&host, &inv));
        host.grant_permission(&alice, "x.y");
        assert!(rule.evaluate(&host, &inv));
        let console = CommandInvocation::new(Actor::console(), "x", vec![]);
        assert!(rule.evaluate(&MemoryHost::new(), &console));
    }

    #[test]
    fn policy_parses_aliases() {
        let table: std::collections::HashMap<String, SenderPolicy> =
            toml::from_str("p = \"player_only\"").unwrap();
        let p = table["p"];
        assert_eq!(p, SenderPolicy::InteractiveOnly);
    }
}
