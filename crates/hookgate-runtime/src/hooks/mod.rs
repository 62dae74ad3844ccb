pub mod decision;
pub mod definition;
pub mod effect;
pub mod engine;
pub mod events;
pub mod executor;
pub mod matcher;
pub mod merger;
pub mod output;
pub mod payload;
pub mod resolver;
pub mod result;
pub mod scheduler;

pub use decision::{BlockDecision, Decision, PermissionDecision};
pub use definition::{HookConfig, HookGroup, HookKind, HookKindTag, HookRef, DEFAULT_TIMEOUT_SECS};
pub use effect::{
    plan, Effect, EffectAction, EffectApplier, EffectSink, NoopSink, DEFAULT_APPLIED_CAPACITY,
};
pub use engine::{Evaluation, HookEngine};
pub use events::{
    CompactTrigger, EventFields, EventPayload, HookEventName, MatcherTarget, SessionStartSource,
    UnknownEvent,
};
pub use executor::{ExecutorSet, HookExecutor};
pub use matcher::{FilePatterns, Matcher};
pub use merger::{merge, BLOCKING_EXIT_CODE};
pub use output::{extract_first_json, DecisionSource, HookOutput, HookSpecificOutput, LegacyDecision};
pub use payload::PayloadBuilder;
pub use resolver::{MatcherResolver, ResolvedGroup};
pub use result::HookResult;
pub use scheduler::Scheduler;
